//! Single-agent tick simulation.
//!
//! One tick runs in a fixed order: action resolution, gravity, integration,
//! collision, reward shaping, termination check. Reward shaping always sees
//! the post-collision body.

use serde::{Deserialize, Serialize};

use crate::body::{AgentBody, AimConfig, AimState};
use crate::collision::Collision;
use crate::constants::{
    DEFAULT_GRAVITY, DEFAULT_LAND_TOLERANCE_PX, DEFAULT_SLIDE_FRICTION,
    DEFAULT_TERMINAL_VELOCITY,
};
use crate::control::ControlConfig;
use crate::error::{ActionError, ConfigError};
use crate::fitness::{PadLedger, RewardConfig, Terminal};
use crate::level::{Level, PlatformId};

mod agent;

pub use agent::AgentSim;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f64,
    pub terminal_velocity: f64,
    pub land_tolerance_px: f64,
    pub slide_friction: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            terminal_velocity: DEFAULT_TERMINAL_VELOCITY,
            land_tolerance_px: DEFAULT_LAND_TOLERANCE_PX,
            slide_friction: DEFAULT_SLIDE_FRICTION,
        }
    }
}

/// Everything that shapes a single agent's behaviour, independent of who
/// controls it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub physics: PhysicsConfig,
    pub aim: AimConfig,
    pub reward: RewardConfig,
    pub control: ControlConfig,
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.physics.terminal_velocity > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "physics.terminal_velocity",
            });
        }
        if !(self.physics.land_tolerance_px > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "physics.land_tolerance_px",
            });
        }
        if !(self.control.direct_power > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "control.direct_power",
            });
        }
        self.aim.validate()
    }
}

/// What happened to one agent during one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub collision: Collision,
    pub launched: Option<(f64, f64)>,
    pub new_pad: Option<PlatformId>,
    pub terminal: Option<Terminal>,
    pub rejected: Option<ActionError>,
}

impl StepOutcome {
    fn rejected(reward: f64, err: ActionError) -> Self {
        Self {
            reward,
            collision: Collision::None,
            launched: None,
            new_pad: None,
            terminal: Some(Terminal::OutOfBounds),
            rejected: Some(err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub tick: u32,
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub grounded: bool,
    pub charging: bool,
    pub pads_credited: usize,
    pub last_platform: Option<PlatformId>,
    pub stay_ticks: u32,
    pub terminal: Option<Terminal>,
}

impl AgentSnapshot {
    fn capture(tick: u32, body: &AgentBody, ledger: &PadLedger, terminal: Option<Terminal>) -> Self {
        Self {
            tick,
            x: body.x,
            y: body.y,
            vel_x: body.vel_x,
            vel_y: body.vel_y,
            grounded: body.grounded,
            charging: matches!(body.aim, AimState::Charging { .. }),
            pads_credited: ledger.credited_count(),
            last_platform: ledger.last_platform(),
            stay_ticks: ledger.stay_ticks(),
            terminal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub ticks: u32,
    pub fitness: f64,
    pub pads_credited: usize,
    pub terminal: Option<Terminal>,
}

/// Re-runs a recorded action sequence. Stops early at a terminal tick.
pub fn replay(level: &Level, params: &SimParams, actions: &[Vec<f64>]) -> ReplayResult {
    let mut sim = AgentSim::spawn(level);
    let mut fitness = 0.0;
    for action in actions {
        if sim.is_terminal() {
            break;
        }
        fitness += sim.step(action, level, params).reward;
    }
    sim.result(fitness)
}

/// Like [`replay`] but samples a snapshot every `sample_every` ticks plus the
/// first and last tick.
pub fn replay_with_checkpoints(
    level: &Level,
    params: &SimParams,
    actions: &[Vec<f64>],
    sample_every: u32,
) -> Vec<AgentSnapshot> {
    let mut sim = AgentSim::spawn(level);
    let stride = if sample_every == 0 { 1 } else { sample_every };
    let mut checkpoints = vec![sim.snapshot()];

    for action in actions {
        if sim.is_terminal() {
            break;
        }
        sim.step(action, level, params);
        if sim.ticks() % stride == 0 || sim.is_terminal() {
            checkpoints.push(sim.snapshot());
        }
    }

    let last_tick = checkpoints.last().map(|c| c.tick);
    if last_tick != Some(sim.ticks()) {
        checkpoints.push(sim.snapshot());
    }
    checkpoints
}
