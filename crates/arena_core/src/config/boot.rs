use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Boot sprint off the start line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct BootConfig {
    /// IO level of the boot button that means "pressed". Also the stop
    /// signal once the robot is running.
    #[validate(range(max = 1))]
    pub button_io_activate_case_value: u8,
    /// Longest wait for the button, seconds. Exceeding it is fatal.
    #[validate(range(min = 0.0, max = 600.0))]
    pub max_holding_duration: f64,
    /// Settle time after activation, seconds.
    #[validate(range(min = 0.0, max = 10.0))]
    pub time_to_stabilize: f64,
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
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            button_io_activate_case_value: 0,
            max_holding_duration: 180.0,
            time_to_stabilize: 0.1,
            dash_speed: 7000,
            dash_duration: 0.55,
            turn_speed: 2150,
            full_turn_duration: 0.45,
            turn_left_prob: 0.5,
        }
    }
}
