use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Engagement with objects around the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct SurroundingConfig {
    /// IO level meaning "object at this corner".
    #[validate(range(max = 1))]
    pub io_encounter_object_value: u8,

    // Proximity ADC: an object is encountered below these.
    #[validate(range(max = 4095))]
    pub front_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub back_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub left_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub right_adc_lower_threshold: u16,

    /// Attack ends once the front reading rises above this.
    #[validate(range(max = 4095))]
    pub atk_break_front_lower_threshold: u16,
    /// Attack also ends when a front edge channel leaves its band.
    pub atk_break_use_edge_sensors: bool,

    #[validate(range(min = -10000, max = 10000))]
    pub atk_speed_enemy_car: i32,
    #[validate(range(min = -10000, max = 10000))]
    pub atk_speed_enemy_box: i32,
    #[validate(range(min = -10000, max = 10000))]
    pub atk_speed_neutral_box: i32,
    #[validate(range(min = -10000, max = 10000))]
    pub fallback_speed_ally_box: i32,
    #[validate(range(min = -10000, max = 10000))]
    pub fallback_speed_edge: i32,

    #[validate(range(min = 0.0, max = 10.0))]
    pub atk_enemy_car_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub atk_enemy_box_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub atk_neutral_box_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub fallback_duration_ally_box: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub fallback_duration_edge: f64,

    #[validate(range(min = -10000, max = 10000))]
    pub turn_speed: i32,
    /// Pick the trailing turn speed from `rand_turn_speeds`.
    pub use_rand_turn_speed: bool,
    pub rand_turn_speeds: Vec<i32>,
    pub rand_turn_speed_weights: Vec<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub turn_left_prob: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub full_turn_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub half_turn_duration: f64,
    /// Cut turns short once something shows up in front.
    pub turn_to_front_use_front_sensor: bool,
}

impl Default for SurroundingConfig {
    fn default() -> Self {
        Self {
            io_encounter_object_value: 0,
            front_adc_lower_threshold: 1000,
            back_adc_lower_threshold: 1100,
            left_adc_lower_threshold: 1000,
            right_adc_lower_threshold: 1000,
            atk_break_front_lower_threshold: 1500,
            atk_break_use_edge_sensors: true,
            atk_speed_enemy_car: 2300,
            atk_speed_enemy_box: 2500,
            atk_speed_neutral_box: 2500,
            fallback_speed_ally_box: 2900,
            fallback_speed_edge: 2400,
            atk_enemy_car_duration: 4.2,
            atk_enemy_box_duration: 3.6,
            atk_neutral_box_duration: 3.6,
            fallback_duration_ally_box: 0.3,
            fallback_duration_edge: 0.2,
            turn_speed: 2900,
            use_rand_turn_speed: true,
            rand_turn_speeds: vec![1600, 2100, 3000],
            rand_turn_speed_weights: vec![2.0, 3.0, 1.0],
            turn_left_prob: 0.5,
            full_turn_duration: 0.45,
            half_turn_duration: 0.225,
            turn_to_front_use_front_sensor: false,
        }
    }
}
