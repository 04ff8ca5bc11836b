use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct PerfConfig {
    /// Shortest hold and the boot-button poll period, seconds.
    #[validate(range(min = 0.0005, max = 1.0))]
    pub min_sync_interval: f64,
    /// Fractions of each action's duration where abort conditions and the
    /// stop signal are sampled.
    pub checkpoint_fractions: Vec<f32>,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self { min_sync_interval: 0.007, checkpoint_fractions: vec![0.25, 0.5, 0.75] }
    }
}
