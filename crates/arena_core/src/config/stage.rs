use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Gray-scale stage classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct StageConfig {
    /// Readings at or below this are off the stage.
    #[validate(range(max = 4095))]
    pub gray_adc_off_stage_upper_threshold: u16,
    /// Readings at or above this are on the stage.
    #[validate(range(max = 4095))]
    pub gray_adc_on_stage_lower_threshold: u16,
    /// Half-width of the UNCLEAR band around the boundary midpoint.
    #[validate(range(max = 4095))]
    pub unclear_zone_tolerance: u16,
    /// Gray IO level meaning "shovel is over the edge".
    #[validate(range(max = 1))]
    pub gray_io_off_stage_case_value: u8,
}

impl StageConfig {
    /// Boundary estimate between the two thresholds.
    pub fn boundary_midpoint(&self) -> u16 {
        let lo = self.gray_adc_off_stage_upper_threshold as u32;
        let hi = self.gray_adc_on_stage_lower_threshold as u32;
        ((lo + hi) / 2) as u16
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            gray_adc_off_stage_upper_threshold: 2630,
            gray_adc_on_stage_lower_threshold: 2830,
            unclear_zone_tolerance: 90,
            gray_io_off_stage_case_value: 1,
        }
    }
}
