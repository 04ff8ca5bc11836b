//! Gray-scale stage classification with hysteresis.

use serde::Serialize;

use crate::config::StageConfig;
use crate::sensors::{SensorSnapshot, ADC_MAX};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageState {
    OnStage,
    OffStage,
    #[default]
    Unclear,
}

/// Holds the thresholds; the state itself is owned by the caller.
#[derive(Debug, Clone)]
pub struct StageClassifier {
    off_upper: u16,
    on_lower: u16,
    midpoint: u16,
    tolerance: u16,
}

impl StageClassifier {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            off_upper: config.gray_adc_off_stage_upper_threshold,
            on_lower: config.gray_adc_on_stage_lower_threshold,
            midpoint: config.boundary_midpoint(),
            tolerance: config.unclear_zone_tolerance,
        }
    }

    /// Classify a raw reading given the state from the previous cycle.
    pub fn classify_reading(&self, reading: u16, previous: StageState) -> StageState {
        let r = reading.min(ADC_MAX);
        if r <= self.off_upper {
            StageState::OffStage
        } else if r >= self.on_lower {
            StageState::OnStage
        } else if r.abs_diff(self.midpoint) <= self.tolerance {
            StageState::Unclear
        } else {
            previous
        }
    }

    /// A snapshot without a gray reading keeps the previous state.
    pub fn classify(&self, snapshot: &SensorSnapshot, previous: StageState) -> StageState {
        match snapshot.gray_adc {
            Some(r) => self.classify_reading(r, previous),
            None => previous,
        }
    }

    /// Update `state` in place.
    pub fn update(&self, snapshot: &SensorSnapshot, state: &mut StageState) -> StageState {
        *state = self.classify(snapshot, *state);
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn classifier() -> StageClassifier {
        StageClassifier::new(&StageConfig::default())
    }

    #[test]
    fn test_thresholds_inclusive() {
        let c = classifier();
        assert_eq!(c.classify_reading(2630, StageState::OnStage), StageState::OffStage);
        assert_eq!(c.classify_reading(2830, StageState::OffStage), StageState::OnStage);
        assert_eq!(c.classify_reading(2730, StageState::OnStage), StageState::Unclear);
    }

    #[test]
    fn test_between_band_and_threshold_keeps_previous() {
        // midpoint 2730, tolerance 90: 2631..=2639 and 2821..=2829 retain
        let c = classifier();
        assert_eq!(c.classify_reading(2635, StageState::OnStage), StageState::OnStage);
        assert_eq!(c.classify_reading(2825, StageState::OffStage), StageState::OffStage);
        assert_eq!(c.classify_reading(2825, StageState::Unclear), StageState::Unclear);
    }

    #[test]
    fn test_missing_reading_keeps_previous() {
        let c = classifier();
        let snap = SensorSnapshot::at(Duration::ZERO);
        assert_eq!(c.classify(&snap, StageState::OnStage), StageState::OnStage);
    }

    #[test]
    fn test_sweep_has_no_oscillation() {
        let c = classifier();
        let mut state = StageState::Unclear;
        let mut changes = 0;
        let readings: Vec<u16> = (2500..=2950).chain((2500..=2950).rev()).collect();
        let mut last = state;
        for r in readings {
            let snap = SensorSnapshot::at(Duration::ZERO).with_gray(r);
            c.update(&snap, &mut state);
            if state != last {
                changes += 1;
                last = state;
            }
        }
        // initial unclear -> off, then off -> unclear -> on going up, on -> unclear -> off going down
        assert_eq!(changes, 5);
        assert_eq!(state, StageState::OffStage);
    }

    proptest! {
        #[test]
        fn prop_thresholds_dominate(r in 0u16..=u16::MAX, prev in 0usize..3) {
            let prev = [StageState::OnStage, StageState::OffStage, StageState::Unclear][prev];
            let c = classifier();
            let out = c.classify_reading(r, prev);
            if r <= 2630 {
                prop_assert_eq!(out, StageState::OffStage);
            } else if r >= 2830 {
                prop_assert_eq!(out, StageState::OnStage);
            } else {
                prop_assert!(out == StageState::Unclear || out == prev);
            }
        }

        #[test]
        fn prop_classification_is_idempotent(r in 0u16..=4095, prev in 0usize..3) {
            let prev = [StageState::OnStage, StageState::OffStage, StageState::Unclear][prev];
            let c = classifier();
            let once = c.classify_reading(r, prev);
            prop_assert_eq!(c.classify_reading(r, once), once);
        }
    }
}
