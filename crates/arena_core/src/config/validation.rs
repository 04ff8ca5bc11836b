//! Cross-field checks the field-level range attributes cannot express.

use crate::error::ConfigError;
use crate::motion::SPEED_LIMIT;
use crate::weighted::check_weights;

use super::RunConfig;

pub(super) fn check_semantics(cfg: &RunConfig) -> Result<(), ConfigError> {
    check_edge_bands(cfg)?;
    check_stage(cfg)?;
    check_weight_lists(cfg)?;
    check_speed_lists(cfg)?;
    check_gradient(cfg)?;
    check_fractions(cfg)?;
    Ok(())
}

fn check_edge_bands(cfg: &RunConfig) -> Result<(), ConfigError> {
    let edge = &cfg.edge;
    for (name, arr) in [("edge.lower_threshold", &edge.lower_threshold), ("edge.upper_threshold", &edge.upper_threshold)] {
        if arr.len() != 4 {
            return Err(ConfigError::invalid(name, format!("expected 4 channel values, got {}", arr.len())));
        }
        if let Some(v) = arr.iter().find(|v| **v > crate::sensors::ADC_MAX) {
            return Err(ConfigError::invalid(name, format!("{v} exceeds ADC range")));
        }
    }
    for (i, (lo, hi)) in edge.lower_threshold.iter().zip(&edge.upper_threshold).enumerate() {
        if lo > hi {
            return Err(ConfigError::invalid(
                format!("edge.lower_threshold[{i}]"),
                format!("lower {lo} above upper {hi}"),
            ));
        }
    }
    Ok(())
}

fn check_stage(cfg: &RunConfig) -> Result<(), ConfigError> {
    let stage = &cfg.stage;
    if stage.gray_adc_off_stage_upper_threshold >= stage.gray_adc_on_stage_lower_threshold {
        return Err(ConfigError::invalid(
            "stage.gray_adc_off_stage_upper_threshold",
            format!(
                "must be below gray_adc_on_stage_lower_threshold ({} >= {})",
                stage.gray_adc_off_stage_upper_threshold, stage.gray_adc_on_stage_lower_threshold
            ),
        ));
    }
    Ok(())
}

fn check_weight_lists(cfg: &RunConfig) -> Result<(), ConfigError> {
    let s = &cfg.surrounding;
    if s.use_rand_turn_speed {
        check_weights(s.rand_turn_speeds.len(), &s.rand_turn_speed_weights)
            .map_err(ConfigError::weights("surrounding.rand_turn_speed_weights"))?;
    }

    let search = &cfg.search;
    let branches = [
        (search.use_gradient_move, search.gradient_move_weight),
        (search.use_scan_move, search.scan_move_weight),
        (search.use_rand_turn, search.rand_turn_weight),
    ];
    if branches.iter().any(|(on, _)| *on) && !branches.iter().any(|(on, w)| *on && *w > 0.0) {
        return Err(ConfigError::invalid("search", "enabled search behaviors all have zero weight"));
    }

    let walk = &cfg.fence.rand_walk;
    if walk.use_straight {
        check_weights(walk.straight_speeds.len(), &walk.straight_weights)
            .map_err(ConfigError::weights("fence.rand_walk.straight_weights"))?;
    }
    if walk.use_turn {
        check_weights(walk.turn_speeds.len(), &walk.turn_weights)
            .map_err(ConfigError::weights("fence.rand_walk.turn_weights"))?;
    }
    Ok(())
}

/// Speeds drawn from weighted lists obey the same limit as scalar speeds.
fn check_speed_lists(cfg: &RunConfig) -> Result<(), ConfigError> {
    let lists = [
        ("surrounding.rand_turn_speeds", &cfg.surrounding.rand_turn_speeds),
        ("fence.rand_walk.straight_speeds", &cfg.fence.rand_walk.straight_speeds),
        ("fence.rand_walk.turn_speeds", &cfg.fence.rand_walk.turn_speeds),
    ];
    for (name, speeds) in lists {
        if let Some((i, v)) = speeds.iter().enumerate().find(|(_, v)| !(-SPEED_LIMIT..=SPEED_LIMIT).contains(*v)) {
            return Err(ConfigError::invalid(format!("{name}[{i}]"), format!("{v} outside ±{SPEED_LIMIT}")));
        }
    }
    Ok(())
}

fn check_gradient(cfg: &RunConfig) -> Result<(), ConfigError> {
    let g = &cfg.search.gradient_move;
    if !g.lower_bound.is_finite() || !g.upper_bound.is_finite() || g.lower_bound >= g.upper_bound {
        return Err(ConfigError::invalid(
            "search.gradient_move.lower_bound",
            format!("bounds must be finite with lower < upper ({} / {})", g.lower_bound, g.upper_bound),
        ));
    }
    Ok(())
}

fn check_fractions(cfg: &RunConfig) -> Result<(), ConfigError> {
    if let Some(f) = cfg.perf.checkpoint_fractions.iter().find(|f| !(**f > 0.0 && **f < 1.0)) {
        return Err(ConfigError::invalid("perf.checkpoint_fractions", format!("{f} is outside (0, 1)")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidParameter { field, .. } => field,
            ConfigError::Weights { field, .. } => field.to_string(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_short_threshold_array() {
        let mut cfg = RunConfig::default();
        cfg.edge.upper_threshold = vec![2200; 3];
        assert_eq!(field_of(cfg.validate().unwrap_err()), "edge.upper_threshold");
    }

    #[test]
    fn test_rejects_inverted_band() {
        let mut cfg = RunConfig::default();
        cfg.edge.lower_threshold[2] = 3000;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "edge.lower_threshold[2]");
    }

    #[test]
    fn test_rejects_inverted_stage_thresholds() {
        let mut cfg = RunConfig::default();
        cfg.stage.gray_adc_on_stage_lower_threshold = 2000;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "stage.gray_adc_off_stage_upper_threshold");
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut cfg = RunConfig::default();
        cfg.surrounding.rand_turn_speed_weights = vec![2.0, -3.0, 1.0];
        let field = field_of(cfg.validate().unwrap_err());
        assert_eq!(field, "surrounding.rand_turn_speed_weights");
    }

    #[test]
    fn test_rejects_out_of_range_list_speeds() {
        let mut cfg = RunConfig::default();
        cfg.fence.rand_walk.turn_speeds = vec![800, i32::MIN, 1200, -800];
        assert_eq!(field_of(cfg.validate().unwrap_err()), "fence.rand_walk.turn_speeds[1]");

        let mut cfg = RunConfig::default();
        cfg.surrounding.rand_turn_speeds[2] = 10_001;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "surrounding.rand_turn_speeds[2]");

        let mut cfg = RunConfig::default();
        cfg.fence.rand_walk.straight_speeds[0] = -SPEED_LIMIT;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_disabled_weight_list_is_not_checked() {
        let mut cfg = RunConfig::default();
        cfg.surrounding.use_rand_turn_speed = false;
        cfg.surrounding.rand_turn_speed_weights.clear();
        cfg.validate().unwrap();
    }

    #[test]
    fn test_rejects_checkpoint_at_end() {
        let mut cfg = RunConfig::default();
        cfg.perf.checkpoint_fractions = vec![0.5, 1.0];
        assert_eq!(field_of(cfg.validate().unwrap_err()), "perf.checkpoint_fractions");
    }

    #[test]
    fn test_range_violation_reported_by_validator() {
        let mut cfg = RunConfig::default();
        cfg.edge.turn_left_prob = 1.5;
        assert!(matches!(cfg.validate().unwrap_err(), ConfigError::Validation(_)));
    }
}
