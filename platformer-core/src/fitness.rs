//! Per-tick reward shaping.
//!
//! All components are additive and independent of each other; which ones
//! are active is purely a matter of [`RewardConfig`] values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::body::AgentBody;
use crate::collision::Collision;
use crate::constants::{
    DEFAULT_ALIVE_BONUS, DEFAULT_APPROACH_WEIGHT, DEFAULT_GOAL_BONUS,
    DEFAULT_IDLE_PENALTY, DEFAULT_IDLE_THRESHOLD_TICKS, DEFAULT_LAND_REWARD,
    DEFAULT_OUT_OF_BOUNDS_PENALTY, DEFAULT_PAD_BONUS, DEFAULT_PROGRESS_WEIGHT,
    DEFAULT_REGRESS_PENALTY, DEFAULT_SLIDE_REWARD,
};
use crate::level::{Bounds, Level, PlatformId, PlatformRole};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Every tick the agent is simulated.
    pub alive_bonus: f64,
    /// Per pixel of rightward movement this tick.
    pub progress_weight: f64,
    /// Per tick with no rightward movement.
    pub regress_penalty: f64,
    /// First landing on each pad.
    pub pad_bonus: f64,
    pub idle_threshold_ticks: u32,
    /// Per landed tick on the same platform past the threshold.
    pub idle_penalty: f64,
    pub goal_bonus: f64,
    pub out_of_bounds_penalty: f64,
    pub slide_reward: f64,
    /// Scales `1 / (|dx| + |dy| + 5)` toward the next platform ahead.
    pub approach_weight: f64,
    /// Every landing on a platform different from the previous one.
    pub land_reward: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            alive_bonus: DEFAULT_ALIVE_BONUS,
            progress_weight: DEFAULT_PROGRESS_WEIGHT,
            regress_penalty: DEFAULT_REGRESS_PENALTY,
            pad_bonus: DEFAULT_PAD_BONUS,
            idle_threshold_ticks: DEFAULT_IDLE_THRESHOLD_TICKS,
            idle_penalty: DEFAULT_IDLE_PENALTY,
            goal_bonus: DEFAULT_GOAL_BONUS,
            out_of_bounds_penalty: DEFAULT_OUT_OF_BOUNDS_PENALTY,
            slide_reward: DEFAULT_SLIDE_REWARD,
            approach_weight: DEFAULT_APPROACH_WEIGHT,
            land_reward: DEFAULT_LAND_REWARD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Goal,
    OutOfBounds,
    Culled,
    Timeout,
}

impl Terminal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::OutOfBounds => "out_of_bounds",
            Self::Culled => "culled",
            Self::Timeout => "timeout",
        }
    }
}

/// Landing history of one agent. Lives exactly as long as the agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PadLedger {
    credited: BTreeSet<PlatformId>,
    last_platform: Option<PlatformId>,
    stay_ticks: u32,
}

impl PadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a pad is credited.
    pub fn credit(&mut self, pad: PlatformId) -> bool {
        self.credited.insert(pad)
    }

    pub fn is_credited(&self, pad: PlatformId) -> bool {
        self.credited.contains(&pad)
    }

    pub fn credited_count(&self) -> usize {
        self.credited.len()
    }

    pub fn credited(&self) -> impl Iterator<Item = PlatformId> + '_ {
        self.credited.iter().copied()
    }

    pub fn last_platform(&self) -> Option<PlatformId> {
        self.last_platform
    }

    pub fn stay_ticks(&self) -> u32 {
        self.stay_ticks
    }

    /// Records a landing; returns `true` if it is on a different platform
    /// than the previous landing.
    fn record_landing(&mut self, platform: PlatformId) -> bool {
        if self.last_platform == Some(platform) {
            self.stay_ticks = self.stay_ticks.saturating_add(1);
            false
        } else {
            self.last_platform = Some(platform);
            self.stay_ticks = 0;
            true
        }
    }
}

/// Post-collision view of one agent tick.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    pub prev_x: f64,
    pub body: &'a AgentBody,
    pub collision: Collision,
    pub level: &'a Level,
    pub bounds: &'a Bounds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shaped {
    pub reward: f64,
    pub terminal: Option<Terminal>,
    pub new_pad: Option<PlatformId>,
}

pub fn shape(cfg: &RewardConfig, ledger: &mut PadLedger, t: &Transition<'_>) -> Shaped {
    let mut reward = cfg.alive_bonus;
    let mut terminal = None;
    let mut new_pad = None;

    let dx = t.body.x - t.prev_x;
    if dx > 0.0 {
        reward += cfg.progress_weight * dx;
    } else {
        reward -= cfg.regress_penalty;
    }

    if cfg.approach_weight != 0.0 {
        let (_, target) = t.level.nearest_ahead(t.body.x);
        let dist = (target.left() - t.body.x).abs() + (target.top() - t.body.y).abs();
        reward += cfg.approach_weight / (dist + 5.0);
    }

    match t.collision {
        Collision::None => {}
        Collision::Slide(_) => reward += cfg.slide_reward,
        Collision::Land(id) => {
            if ledger.record_landing(id) {
                reward += cfg.land_reward;
            } else if ledger.stay_ticks > cfg.idle_threshold_ticks {
                reward -= cfg.idle_penalty;
            }

            match t.level.get(id).map(|p| p.role()) {
                Some(PlatformRole::Pad) => {
                    if ledger.credit(id) {
                        reward += cfg.pad_bonus;
                        new_pad = Some(id);
                    }
                }
                Some(PlatformRole::End) => {
                    reward += cfg.goal_bonus;
                    terminal = Some(Terminal::Goal);
                }
                Some(PlatformRole::Start) | None => {}
            }
        }
    }

    if terminal.is_none() && t.body.is_out_of_bounds(t.bounds) {
        reward -= cfg.out_of_bounds_penalty;
        terminal = Some(Terminal::OutOfBounds);
    }

    Shaped {
        reward,
        terminal,
        new_pad,
    }
}
