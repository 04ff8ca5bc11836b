use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which way to spin while aligning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlignDirection {
    Left,
    Right,
    Random,
}

/// Recovery when trapped against the perimeter fence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct FenceConfig {
    // Proximity ADC: fence is close below these.
    #[validate(range(max = 4095))]
    pub front_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub rear_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub left_adc_lower_threshold: u16,
    #[validate(range(max = 4095))]
    pub right_adc_lower_threshold: u16,
    /// IO level meaning "fence at this corner".
    #[validate(range(max = 1))]
    pub io_encounter_fence_value: u8,

    /// Allowed yaw error, degrees, from a multiple of 90.
    #[validate(range(min = 0.0, max = 45.0))]
    pub max_yaw_tolerance: f64,
    pub use_mpu_align_stage: bool,
    pub use_mpu_align_direction: bool,

    pub stage_align_direction: AlignDirection,
    #[validate(range(min = -10000, max = 10000))]
    pub stage_align_speed: i32,
    #[validate(range(min = 0.0, max = 30.0))]
    pub max_stage_align_duration: f64,

    pub direction_align_direction: AlignDirection,
    #[validate(range(min = -10000, max = 10000))]
    pub direction_align_speed: i32,
    #[validate(range(min = 0.0, max = 30.0))]
    pub max_direction_align_duration: f64,

    #[validate(range(min = -10000, max = 10000))]
    pub exit_corner_speed: i32,
    #[validate(range(min = 0.0, max = 30.0))]
    pub max_exit_corner_duration: f64,

    #[validate]
    pub rand_walk: RandWalkConfig,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            front_adc_lower_threshold: 900,
            rear_adc_lower_threshold: 1100,
            left_adc_lower_threshold: 900,
            right_adc_lower_threshold: 900,
            io_encounter_fence_value: 0,
            max_yaw_tolerance: 20.0,
            use_mpu_align_stage: false,
            use_mpu_align_direction: false,
            stage_align_direction: AlignDirection::Random,
            stage_align_speed: 850,
            max_stage_align_duration: 4.5,
            direction_align_direction: AlignDirection::Random,
            direction_align_speed: 850,
            max_direction_align_duration: 4.5,
            exit_corner_speed: 1200,
            max_exit_corner_duration: 1.5,
            rand_walk: RandWalkConfig::default(),
        }
    }
}

/// Alternating straight and turn segments with weighted speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct RandWalkConfig {
    pub use_straight: bool,
    pub straight_speeds: Vec<i32>,
    pub straight_weights: Vec<f64>,
    pub use_turn: bool,
    /// Signed: positive turns left, negative turns right.
    pub turn_speeds: Vec<i32>,
    pub turn_weights: Vec<f64>,
    /// Length of each segment, seconds.
    #[validate(range(min = 0.0, max = 10.0))]
    pub walk_duration: f64,
    #[validate(range(min = 1, max = 64))]
    pub walk_segments: u32,
}

impl Default for RandWalkConfig {
    fn default() -> Self {
        Self {
            use_straight: true,
            straight_speeds: vec![-800, -500, 500, 800],
            straight_weights: vec![1.0, 3.0, 3.0, 1.0],
            use_turn: true,
            turn_speeds: vec![-1200, -800, 800, 1200],
            turn_weights: vec![1.0, 3.0, 3.0, 1.0],
            walk_duration: 0.3,
            walk_segments: 4,
        }
    }
}
