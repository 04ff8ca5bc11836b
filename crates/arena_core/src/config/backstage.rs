use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Climb back onto the stage from the surrounding floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct BackstageConfig {
    #[validate(range(min = 0.0, max = 10.0))]
    pub time_to_stabilize: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub small_advance_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub small_advance_duration: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub dash_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub dash_duration: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub turn_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub full_turn_duration: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub turn_left_prob: f64,
    /// Stop the dash as soon as the gray sensor reads on-stage.
    pub use_is_on_stage_check: bool,
    /// Stop the dash if the chassis tips sideways.
    pub use_side_away_check: bool,
    /// Dash progress (0..1) after which the checks above run.
    #[validate(range(min = 0.0, max = 1.0))]
    pub check_start_percent: f64,
    /// Tilt angle, degrees, counted as tipped over.
    #[validate(range(min = 0.0, max = 90.0))]
    pub side_away_degree_tolerance: f64,
}

impl Default for BackstageConfig {
    fn default() -> Self {
        Self {
            time_to_stabilize: 0.1,
            small_advance_speed: 1500,
            small_advance_duration: 0.6,
            dash_speed: 7000,
            dash_duration: 0.55,
            turn_speed: 2150,
            full_turn_duration: 0.35,
            turn_left_prob: 0.5,
            use_is_on_stage_check: true,
            use_side_away_check: true,
            check_start_percent: 0.9,
            side_away_degree_tolerance: 10.0,
        }
    }
}
