use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelError {
    EmptyLevel,
    InvalidPlatform { index: usize },
    MissingStart,
    MissingEnd,
    InvalidWorld,
    OutsideWorld { index: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLevel => write!(f, "level has no platforms"),
            Self::InvalidPlatform { index } => write!(
                f,
                "platform {index} has a non-finite position or a non-positive size"
            ),
            Self::MissingStart => write!(f, "level has no start platform"),
            Self::MissingEnd => write!(f, "level has no end platform"),
            Self::InvalidWorld => write!(f, "level width and height must be finite and > 0"),
            Self::OutsideWorld { index } => {
                write!(f, "platform {index} does not lie inside the level")
            }
        }
    }
}

impl std::error::Error for LevelError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionError {
    WrongLength { expected: usize, actual: usize },
    NonFinite { index: usize },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { expected, actual } => write!(
                f,
                "controller output has {actual} values, expected {expected}"
            ),
            Self::NonFinite { index } => {
                write!(f, "controller output value {index} is not finite")
            }
        }
    }
}

impl std::error::Error for ActionError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NonPositive { field: &'static str },
    InvertedRange { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field } => write!(f, "{field} must be > 0"),
            Self::InvertedRange { field } => write!(f, "{field}: min must not exceed max"),
        }
    }
}

impl std::error::Error for ConfigError {}
