//! Agent physics and the charge-to-launch aiming state machine.

use serde::{Deserialize, Serialize};

use crate::constants::{
    AGENT_HEIGHT, AGENT_WIDTH, DEFAULT_AIM_MAX_ANGLE_DEG, DEFAULT_AIM_MAX_CHARGE_TICKS,
    DEFAULT_AIM_MAX_POWER, DEFAULT_AIM_MIN_ANGLE_DEG, DEFAULT_AIM_MIN_POWER,
    DEFAULT_AIM_PERIOD_TICKS,
};
use crate::error::ConfigError;
use crate::level::{Bounds, Platform};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
    pub min_power: f64,
    pub max_power: f64,
    pub period_ticks: u32,
    pub max_charge_ticks: u32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: DEFAULT_AIM_MIN_ANGLE_DEG,
            max_angle_deg: DEFAULT_AIM_MAX_ANGLE_DEG,
            min_power: DEFAULT_AIM_MIN_POWER,
            max_power: DEFAULT_AIM_MAX_POWER,
            period_ticks: DEFAULT_AIM_PERIOD_TICKS,
            max_charge_ticks: DEFAULT_AIM_MAX_CHARGE_TICKS,
        }
    }
}

impl AimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ticks == 0 {
            return Err(ConfigError::NonPositive {
                field: "aim.period_ticks",
            });
        }
        if self.max_charge_ticks == 0 {
            return Err(ConfigError::NonPositive {
                field: "aim.max_charge_ticks",
            });
        }
        if self.min_angle_deg > self.max_angle_deg {
            return Err(ConfigError::InvertedRange { field: "aim.angle" });
        }
        if self.min_power > self.max_power {
            return Err(ConfigError::InvertedRange { field: "aim.power" });
        }
        Ok(())
    }
}

/// Launch angle (radians above horizontal) and power after `elapsed` ticks of
/// charging. Both sweep min -> max -> min once per `period_ticks`.
pub fn aim_at(elapsed: u32, cfg: &AimConfig) -> (f64, f64) {
    let period = cfg.period_ticks.max(1);
    let phase = (elapsed % period) as f64 / period as f64;
    let t = if phase < 0.5 {
        phase * 2.0
    } else {
        2.0 - phase * 2.0
    };
    let angle_deg = cfg.min_angle_deg + (cfg.max_angle_deg - cfg.min_angle_deg) * t;
    let power = cfg.min_power + (cfg.max_power - cfg.min_power) * t;
    (angle_deg.to_radians(), power)
}

/// Velocity for a rightward launch at `angle` above horizontal.
#[inline]
pub fn launch_velocity(angle: f64, power: f64) -> (f64, f64) {
    (angle.cos() * power, -angle.sin() * power)
}

pub fn aim_vector(elapsed: u32, cfg: &AimConfig) -> (f64, f64) {
    let (angle, power) = aim_at(elapsed, cfg);
    launch_velocity(angle, power)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AimState {
    Idle,
    Charging { elapsed: u32, max_duration: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub width: f64,
    pub height: f64,
    pub grounded: bool,
    pub aim: AimState,
}

impl AgentBody {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            width: AGENT_WIDTH,
            height: AGENT_HEIGHT,
            grounded: false,
            aim: AimState::Idle,
        }
    }

    /// A body standing still on `platform`, `inset` pixels from its left edge.
    pub fn resting_on(platform: &Platform, inset: f64) -> Self {
        let mut body = Self::new(platform.left() + inset, 0.0);
        body.snap_onto(platform);
        body
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn apply_gravity(&mut self, gravity: f64, terminal_velocity: f64) {
        self.vel_y = (self.vel_y + gravity).min(terminal_velocity);
    }

    /// Moves by one tick of velocity. Grounding is only re-established by the
    /// collision pass that follows.
    pub fn integrate(&mut self) {
        self.x += self.vel_x;
        self.y += self.vel_y;
        self.grounded = false;
    }

    pub fn jump(&mut self, vel_x: f64, vel_y: f64) {
        self.vel_x = vel_x;
        self.vel_y = vel_y;
        self.grounded = false;
        self.aim = AimState::Idle;
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.aim, AimState::Charging { .. })
    }

    /// Starts charging. Only a grounded, idle body can aim.
    pub fn begin_aim(&mut self, max_duration: u32) -> bool {
        if !self.grounded || self.aim != AimState::Idle {
            return false;
        }
        self.aim = AimState::Charging {
            elapsed: 0,
            max_duration,
        };
        true
    }

    /// Advances an active charge by one tick and launches automatically once
    /// `max_duration` is reached.
    pub fn charge(&mut self, cfg: &AimConfig) -> Option<(f64, f64)> {
        let AimState::Charging {
            elapsed,
            max_duration,
        } = self.aim
        else {
            return None;
        };
        let elapsed = elapsed + 1;
        self.aim = AimState::Charging {
            elapsed,
            max_duration,
        };
        if elapsed >= max_duration {
            return self.release_aim(cfg);
        }
        None
    }

    pub fn release_aim(&mut self, cfg: &AimConfig) -> Option<(f64, f64)> {
        let AimState::Charging { elapsed, .. } = self.aim else {
            return None;
        };
        let (vx, vy) = aim_vector(elapsed, cfg);
        self.jump(vx, vy);
        Some((vx, vy))
    }

    /// Puts the bottom edge exactly on the platform top and stops the body.
    pub fn snap_onto(&mut self, platform: &Platform) {
        self.y = platform.top() - self.height;
        self.vel_x = 0.0;
        self.vel_y = 0.0;
        self.grounded = true;
    }

    pub fn damp_horizontal(&mut self, friction: f64) {
        self.vel_x *= friction;
    }

    pub fn is_out_of_bounds(&self, bounds: &Bounds) -> bool {
        !self.is_finite() || !bounds.contains(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vel_x.is_finite() && self.vel_y.is_finite()
    }
}
