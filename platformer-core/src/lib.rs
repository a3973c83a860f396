//! Deterministic single-agent physics and fitness shaping for a 2D
//! jump-platformer course.

pub mod body;
pub mod collision;
pub mod constants;
pub mod control;
pub mod error;
pub mod fitness;
pub mod level;
pub mod rng;
pub mod sim;

pub use body::{AgentBody, AimConfig, AimState};
pub use collision::{Collision, Contact};
pub use control::{ActionMode, ControlConfig, Observation, ObservationMode};
pub use error::{ActionError, ConfigError, LevelError};
pub use fitness::{PadLedger, RewardConfig, Terminal};
pub use level::{Bounds, Level, Platform, PlatformId, PlatformRole};
pub use rng::SeededRng;
pub use sim::{replay, replay_with_checkpoints, AgentSim, SimParams, StepOutcome};
