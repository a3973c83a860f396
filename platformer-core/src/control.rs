//! Observation encoding and controller action decoding.

use core::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::body::{launch_velocity, AgentBody, AimConfig};
use crate::constants::{
    ACTION_LEN, DEFAULT_ACTION_THRESHOLD, DEFAULT_DIRECT_POWER, OBSERVATION_LEN, VELOCITY_NORM,
};
use crate::error::ActionError;
use crate::level::Level;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationMode {
    Raw,
    Normalized,
}

/// How the two action outputs drive a jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// `trigger` launches immediately; `aim` in `[0, 1]` picks the angle
    /// from horizontal to straight up at `direct_power`.
    Direct,
    /// `trigger` held starts and sustains a charge; dropping it releases
    /// through the aim sweep.
    Charge,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub observation: ObservationMode,
    pub action: ActionMode,
    pub threshold: f64,
    pub direct_power: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            observation: ObservationMode::Normalized,
            action: ActionMode::Direct,
            threshold: DEFAULT_ACTION_THRESHOLD,
            direct_power: DEFAULT_DIRECT_POWER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Action {
    pub trigger: f64,
    pub aim: f64,
}

pub type Observation = [f64; OBSERVATION_LEN];

/// `[x, y, vel_x, vel_y, dx, dy]` where `dx, dy` point at the top-left corner
/// of the nearest platform ahead.
pub fn observe(body: &AgentBody, level: &Level, mode: ObservationMode) -> Observation {
    let (_, target) = level.nearest_ahead(body.x);
    let dx = target.left() - body.x;
    let dy = target.top() - body.y;
    match mode {
        ObservationMode::Raw => [body.x, body.y, body.vel_x, body.vel_y, dx, dy],
        ObservationMode::Normalized => {
            let w = level.width();
            let h = level.height();
            [
                body.x / w,
                body.y / h,
                body.vel_x / VELOCITY_NORM,
                body.vel_y / VELOCITY_NORM,
                dx / w,
                dy / h,
            ]
        }
    }
}

pub fn decode_action(raw: &[f64]) -> Result<Action, ActionError> {
    if raw.len() != ACTION_LEN {
        return Err(ActionError::WrongLength {
            expected: ACTION_LEN,
            actual: raw.len(),
        });
    }
    if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
        return Err(ActionError::NonFinite { index });
    }
    Ok(Action {
        trigger: raw[0],
        aim: raw[1],
    })
}

/// Applies a decoded action to the body. Returns the launch velocity when
/// this tick produced a jump.
pub fn apply_action(
    body: &mut AgentBody,
    action: Action,
    control: &ControlConfig,
    aim: &AimConfig,
) -> Option<(f64, f64)> {
    let held = action.trigger > control.threshold;
    match control.action {
        ActionMode::Direct => {
            if !held || !body.grounded {
                return None;
            }
            let angle = action.aim.clamp(0.0, 1.0) * FRAC_PI_2;
            let (vx, vy) = launch_velocity(angle, control.direct_power);
            body.jump(vx, vy);
            Some((vx, vy))
        }
        ActionMode::Charge => {
            if held {
                if body.is_charging() {
                    body.charge(aim)
                } else {
                    body.begin_aim(aim.max_charge_ticks);
                    None
                }
            } else {
                body.release_aim(aim)
            }
        }
    }
}
