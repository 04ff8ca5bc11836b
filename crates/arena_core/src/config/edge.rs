use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Edge (cliff) guard. Threshold arrays are indexed front-left,
/// front-right, rear-left, rear-right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct EdgeConfig {
    /// Per-channel lower bound of the in-band window.
    pub lower_threshold: Vec<u16>,
    /// Per-channel upper bound of the in-band window.
    pub upper_threshold: Vec<u16>,
    #[validate(range(min = -10000, max = 10000))]
    pub fallback_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub fallback_duration: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub advance_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub advance_duration: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub turn_speed: i32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub turn_left_prob: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub full_turn_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub half_turn_duration: f64,
    /// Also treat the shovel gray IO sensors as front edge channels.
    pub use_gray_io: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            lower_threshold: vec![1700; 4],
            upper_threshold: vec![2200; 4],
            fallback_speed: 2600,
            fallback_duration: 0.2,
            advance_speed: 2400,
            advance_duration: 0.35,
            turn_speed: 2800,
            turn_left_prob: 0.5,
            full_turn_duration: 0.45,
            half_turn_duration: 0.225,
            use_gray_io: true,
        }
    }
}
