use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Exploration when nothing else needs doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct SearchConfig {
    pub use_gradient_move: bool,
    #[validate(range(min = 0.0))]
    pub gradient_move_weight: f64,
    pub use_scan_move: bool,
    #[validate(range(min = 0.0))]
    pub scan_move_weight: f64,
    pub use_rand_turn: bool,
    #[validate(range(min = 0.0))]
    pub rand_turn_weight: f64,

    #[validate]
    pub gradient_move: GradientMoveConfig,
    #[validate]
    pub scan_move: ScanMoveConfig,
    #[validate]
    pub rand_turn: RandTurnConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_gradient_move: true,
            gradient_move_weight: 100.0,
            use_scan_move: true,
            scan_move_weight: 1.96,
            use_rand_turn: true,
            rand_turn_weight: 0.05,
            gradient_move: GradientMoveConfig::default(),
            scan_move: ScanMoveConfig::default(),
            rand_turn: RandTurnConfig::default(),
        }
    }
}

/// Straight move with speed following an external gradient signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct GradientMoveConfig {
    #[validate(range(min = -10000, max = 10000))]
    pub max_speed: i32,
    #[validate(range(min = -10000, max = 10000))]
    pub min_speed: i32,
    /// Gradient value mapped to `min_speed`.
    pub lower_bound: f64,
    /// Gradient value mapped to `max_speed`.
    pub upper_bound: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub move_duration: f64,
}

impl Default for GradientMoveConfig {
    fn default() -> Self {
        Self { max_speed: 2800, min_speed: 500, lower_bound: 2900.0, upper_bound: 3700.0, move_duration: 0.2 }
    }
}

/// Forward sweep watching the proximity channels for change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct ScanMoveConfig {
    #[validate(range(min = -10000, max = 10000))]
    pub scan_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub scan_duration: f64,

    // Allowed drift from the readings taken at scan start.
    #[validate(range(max = 4095))]
    pub front_max_tolerance: u16,
    #[validate(range(max = 4095))]
    pub rear_max_tolerance: u16,
    #[validate(range(max = 4095))]
    pub left_max_tolerance: u16,
    #[validate(range(max = 4095))]
    pub right_max_tolerance: u16,
    /// IO level meaning "object at this corner".
    #[validate(range(max = 1))]
    pub io_encounter_object_value: u8,

    /// Abort the scan when an edge channel leaves its band.
    pub check_edge_before_scan: bool,
    /// Abort the scan when the gray ADC drops below `gray_adc_lower_threshold`.
    pub check_gray_adc_before_scan: bool,
    #[validate(range(max = 4095))]
    pub gray_adc_lower_threshold: u16,

    #[validate(range(min = -10000, max = 10000))]
    pub fall_back_speed: i32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub fall_back_duration: f64,
    #[validate(range(min = -10000, max = 10000))]
    pub turn_speed: i32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub turn_left_prob: f64,
    /// Probability the trailing turn is a full turn rather than a half.
    #[validate(range(min = 0.0, max = 1.0))]
    pub full_turn_prob: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub full_turn_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub half_turn_duration: f64,
}

impl Default for ScanMoveConfig {
    fn default() -> Self {
        Self {
            scan_speed: 300,
            scan_duration: 4.5,
            front_max_tolerance: 760,
            rear_max_tolerance: 760,
            left_max_tolerance: 760,
            right_max_tolerance: 760,
            io_encounter_object_value: 0,
            check_edge_before_scan: true,
            check_gray_adc_before_scan: true,
            gray_adc_lower_threshold: 3100,
            fall_back_speed: 3250,
            fall_back_duration: 0.2,
            turn_speed: 2700,
            turn_left_prob: 0.5,
            full_turn_prob: 0.5,
            full_turn_duration: 0.45,
            half_turn_duration: 0.225,
        }
    }
}

/// Spin in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct RandTurnConfig {
    #[validate(range(min = -10000, max = 10000))]
    pub turn_speed: i32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub turn_left_prob: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub full_turn_prob: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub full_turn_duration: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    pub half_turn_duration: f64,
    /// Stop turning once something is in front.
    pub use_turn_to_front: bool,
}

impl Default for RandTurnConfig {
    fn default() -> Self {
        Self {
            turn_speed: 2300,
            turn_left_prob: 0.5,
            full_turn_prob: 0.5,
            full_turn_duration: 0.45,
            half_turn_duration: 0.225,
            use_turn_to_front: true,
        }
    }
}
