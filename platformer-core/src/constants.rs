//! Simulation constants.
//!
//! Every tunable magnitude has a named default here; the config structs in
//! [`crate::fitness`], [`crate::body`] and [`crate::collision`] start from these
//! and can be overridden field by field.

// World dimensions (pixels)
pub const WORLD_WIDTH: f64 = 1400.0;
pub const WORLD_HEIGHT: f64 = 600.0;

// Simulation rate
pub const TICKS_PER_SECOND: u32 = 90;

// Agent body
pub const AGENT_WIDTH: f64 = 20.0;
pub const AGENT_HEIGHT: f64 = 20.0;
pub const SPAWN_INSET_X: f64 = 20.0;

// Physics
pub const DEFAULT_GRAVITY: f64 = 0.4;
pub const DEFAULT_TERMINAL_VELOCITY: f64 = 15.0;
pub const DEFAULT_LAND_TOLERANCE_PX: f64 = 10.0;
pub const DEFAULT_SLIDE_FRICTION: f64 = 0.5;

// Out-of-bounds margins around the world rectangle
pub const OOB_MARGIN_BOTTOM: f64 = 50.0;
pub const OOB_MARGIN_TOP: f64 = 20.0;
pub const OOB_MARGIN_SIDE: f64 = 50.0;

// Aiming: triangle wave between (min angle, min power) and (max angle, max power)
pub const DEFAULT_AIM_MIN_ANGLE_DEG: f64 = 20.0;
pub const DEFAULT_AIM_MAX_ANGLE_DEG: f64 = 75.0;
pub const DEFAULT_AIM_MIN_POWER: f64 = 4.0;
pub const DEFAULT_AIM_MAX_POWER: f64 = 14.0;
pub const DEFAULT_AIM_PERIOD_TICKS: u32 = 60;
pub const DEFAULT_AIM_MAX_CHARGE_TICKS: u32 = 120;

// Direct launch (controller picks the angle, power is fixed)
pub const DEFAULT_DIRECT_POWER: f64 = 13.0;
pub const DEFAULT_ACTION_THRESHOLD: f64 = 0.5;

// Rewards
pub const DEFAULT_ALIVE_BONUS: f64 = 0.01;
pub const DEFAULT_PROGRESS_WEIGHT: f64 = 0.01;
pub const DEFAULT_REGRESS_PENALTY: f64 = 0.0;
pub const DEFAULT_PAD_BONUS: f64 = 15.0;
pub const DEFAULT_IDLE_THRESHOLD_TICKS: u32 = 2 * TICKS_PER_SECOND;
pub const DEFAULT_IDLE_PENALTY: f64 = 0.05;
pub const DEFAULT_GOAL_BONUS: f64 = 100.0;
pub const DEFAULT_OUT_OF_BOUNDS_PENALTY: f64 = 20.0;
pub const DEFAULT_SLIDE_REWARD: f64 = 0.0;
pub const DEFAULT_APPROACH_WEIGHT: f64 = 0.0;
pub const DEFAULT_LAND_REWARD: f64 = 0.0;

// Controller I/O
pub const OBSERVATION_LEN: usize = 6;
pub const ACTION_LEN: usize = 2;
pub const VELOCITY_NORM: f64 = 10.0;

// Generation control
pub const DEFAULT_MAX_TICKS: u32 = 1000;
pub const DEFAULT_CULL_INTERVAL_SECS: f64 = 5.0;
pub const DEFAULT_MIN_POPULATION: usize = 4;
