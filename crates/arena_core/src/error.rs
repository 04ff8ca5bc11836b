use std::time::Duration;

use thiserror::Error;

use crate::engine::stage::StageState;
use crate::engine::strategy::StrategyState;

/// Failures detected while loading or validating a run configuration.
///
/// All of these are fatal and are reported before the control loop starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("No run config path given and ${env} is not set")]
    MissingPath { env: &'static str },

    #[error("Field validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Invalid weighted list `{field}`: {source}")]
    Weights {
        field: &'static str,
        #[source]
        source: WeightError,
    },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter { field: field.into(), reason: reason.into() }
    }

    pub fn weights(field: &'static str) -> impl FnOnce(WeightError) -> Self {
        move |source| ConfigError::Weights { field, source }
    }
}

/// Problems with a `(value, weight)` list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    #[error("weighted choice has no entries")]
    Empty,

    #[error("{values} values but {weights} weights")]
    LengthMismatch { values: usize, weights: usize },

    #[error("weight #{index} is {weight}, weights must be finite and non-negative")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("at least one weight must be positive")]
    NoPositiveWeight,
}

/// Transport-level failure reported by a motion sink.
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Motion transport error: {0}")]
    Transport(String),

    #[error("Motion sink disconnected")]
    Disconnected,
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Boot activation not observed within {0:?}")]
    BootTimeout(Duration),

    #[error("Boot sequence already completed")]
    BootAlreadyCompleted,

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error("No strategy branch matched (state {state:?}, stage {stage:?})")]
    NoBranch { state: StrategyState, stage: StageState },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RunError {
    /// Every run error halts the loop; this only separates operator-facing
    /// conditions from internal invariant violations for reporting.
    pub fn is_operator_facing(&self) -> bool {
        match self {
            RunError::BootTimeout(_) => true,
            RunError::Motion(_) => true,
            RunError::Config(_) => true,
            RunError::BootAlreadyCompleted => false,
            RunError::NoBranch { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
