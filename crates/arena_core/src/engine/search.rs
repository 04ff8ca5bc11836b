//! Search explorer: gradient move, scan sweep, random turn.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::action::{AbortCondition, Action, ActionKind, ActionSequence};
use crate::config::{secs, GradientMoveConfig, RunConfig};
use crate::error::ConfigError;
use crate::motion::TurnDirection;
use crate::sensors::SensorSnapshot;
use crate::weighted::{bernoulli, WeightedChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchMove {
    Gradient,
    Scan,
    RandTurn,
    /// Nothing enabled.
    Idle,
}

/// Linear map of the gradient signal onto `[min_speed, max_speed]`,
/// clamped at both ends. A missing signal drives at `min_speed`.
pub fn gradient_speed(conf: &GradientMoveConfig, gradient: Option<f32>) -> i32 {
    let Some(g) = gradient else {
        return conf.min_speed;
    };
    let span = conf.upper_bound - conf.lower_bound;
    if span <= 0.0 {
        return conf.min_speed;
    }
    let t = ((g as f64 - conf.lower_bound) / span).clamp(0.0, 1.0);
    let speed = conf.min_speed as f64 + t * (conf.max_speed - conf.min_speed) as f64;
    speed.round() as i32
}

pub struct SearchExplorer<'a> {
    config: &'a RunConfig,
    moves: Option<WeightedChoice<SearchMove>>,
}

impl<'a> SearchExplorer<'a> {
    /// With every move disabled the explorer idles.
    pub fn new(config: &'a RunConfig) -> Result<Self, ConfigError> {
        let s = &config.search;
        let mut values = Vec::new();
        let mut weights = Vec::new();
        for (enabled, weight, mv) in [
            (s.use_gradient_move, s.gradient_move_weight, SearchMove::Gradient),
            (s.use_scan_move, s.scan_move_weight, SearchMove::Scan),
            (s.use_rand_turn, s.rand_turn_weight, SearchMove::RandTurn),
        ] {
            if enabled {
                values.push(mv);
                weights.push(weight);
            }
        }
        let moves = if values.is_empty() {
            None
        } else {
            Some(WeightedChoice::new(values, weights).map_err(ConfigError::weights("search"))?)
        };
        Ok(Self { config, moves })
    }

    pub fn choose<R: Rng>(&self, rng: &mut R) -> SearchMove {
        match &self.moves {
            Some(choice) => *choice.pick(rng),
            None => SearchMove::Idle,
        }
    }

    /// Always produces a sequence; with every move disabled it is a short hold.
    pub fn evaluate<R: Rng>(&self, snap: &SensorSnapshot, rng: &mut R) -> ActionSequence {
        let mv = self.choose(rng);
        debug!(?mv, "search");
        self.plan(mv, snap, rng)
    }

    pub fn plan<R: Rng>(&self, mv: SearchMove, snap: &SensorSnapshot, rng: &mut R) -> ActionSequence {
        match mv {
            SearchMove::Gradient => self.gradient_move(snap),
            SearchMove::Scan => self.scan_move(snap, rng),
            SearchMove::RandTurn => self.rand_turn(rng),
            SearchMove::Idle => ActionSequence::new().then(Action::hold(ActionKind::Hold, self.config.min_sync_interval())),
        }
    }

    fn gradient_move(&self, snap: &SensorSnapshot) -> ActionSequence {
        let g = &self.config.search.gradient_move;
        let speed = gradient_speed(g, snap.gradient);
        ActionSequence::new().then(Action::straight(ActionKind::GradientMove, speed, secs(g.move_duration)))
    }

    /// Sweep forward watching for change against the readings taken now,
    /// then back off and turn.
    fn scan_move<R: Rng>(&self, snap: &SensorSnapshot, rng: &mut R) -> ActionSequence {
        let conf = &self.config.search.scan_move;
        let fractions = &self.config.perf.checkpoint_fractions;
        let baseline = snap.proximity;

        let direction = TurnDirection::draw(rng, conf.turn_left_prob);
        let turn_duration =
            if bernoulli(rng, conf.full_turn_prob) { conf.full_turn_duration } else { conf.half_turn_duration };

        ActionSequence::new()
            .then(
                Action::straight(ActionKind::Scan, conf.scan_speed, secs(conf.scan_duration))
                    .watch(AbortCondition::ScanDeviation { baseline }, fractions),
            )
            .then(
                Action::straight(ActionKind::Fallback, -conf.fall_back_speed, secs(conf.fall_back_duration))
                    .watch(AbortCondition::RearEdge, fractions),
            )
            .then(Action::turn(direction, conf.turn_speed, secs(turn_duration)))
    }

    fn rand_turn<R: Rng>(&self, rng: &mut R) -> ActionSequence {
        let conf = &self.config.search.rand_turn;
        let direction = TurnDirection::draw(rng, conf.turn_left_prob);
        let duration =
            if bernoulli(rng, conf.full_turn_prob) { conf.full_turn_duration } else { conf.half_turn_duration };
        ActionSequence::new().then(Action::turn(direction, conf.turn_speed, secs(duration)).watch_if(
            conf.use_turn_to_front,
            AbortCondition::FrontAcquired,
            &self.config.perf.checkpoint_fractions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeightError;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn scan_only() -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.search.use_gradient_move = false;
        cfg.search.use_rand_turn = false;
        cfg
    }

    #[test]
    fn test_gradient_clamps() {
        let g = GradientMoveConfig::default();
        assert_eq!(gradient_speed(&g, Some(0.0)), g.min_speed);
        assert_eq!(gradient_speed(&g, Some(10_000.0)), g.max_speed);
        assert_eq!(gradient_speed(&g, None), g.min_speed);
        let mid = ((g.lower_bound + g.upper_bound) / 2.0) as f32;
        assert_eq!(gradient_speed(&g, Some(mid)), (g.min_speed + g.max_speed) / 2);
    }

    #[test]
    fn test_scan_sequence_shape() {
        let cfg = scan_only();
        let explorer = SearchExplorer::new(&cfg).unwrap();
        let snap = SensorSnapshot::at(Duration::ZERO).with_all_proximity(3000);
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let seq = explorer.evaluate(&snap, &mut rng);
            assert_eq!(seq.kinds(), vec![ActionKind::Scan, ActionKind::Fallback, ActionKind::Turn]);
            let conf = &cfg.search.scan_move;
            assert_eq!(seq.actions[0].duration, secs(conf.scan_duration));
            assert_eq!(seq.actions[1].duration, secs(conf.fall_back_duration));
            let turn = seq.actions[2].duration;
            assert!(turn == secs(conf.full_turn_duration) || turn == secs(conf.half_turn_duration));
            match &seq.actions[0].checks[0].condition {
                AbortCondition::ScanDeviation { baseline } => assert_eq!(*baseline, [Some(3000); 4]),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_all_disabled_holds() {
        let mut cfg = scan_only();
        cfg.search.use_scan_move = false;
        let explorer = SearchExplorer::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(explorer.choose(&mut rng), SearchMove::Idle);
        let seq = explorer.evaluate(&SensorSnapshot::default(), &mut rng);
        assert_eq!(seq.kinds(), vec![ActionKind::Hold]);
        assert!(seq.actions[0].speeds.is_stop());
        assert_eq!(seq.total_duration(), cfg.min_sync_interval());
    }

    #[test]
    fn test_only_enabled_moves_are_chosen() {
        let mut cfg = RunConfig::default();
        cfg.search.use_gradient_move = false;
        let explorer = SearchExplorer::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            assert_ne!(explorer.choose(&mut rng), SearchMove::Gradient);
        }
    }

    #[test]
    fn test_rand_turn_watches_front() {
        let cfg = RunConfig::default();
        let explorer = SearchExplorer::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let seq = explorer.plan(SearchMove::RandTurn, &SensorSnapshot::default(), &mut rng);
        assert!(seq.actions[0].checks.iter().all(|c| c.condition == AbortCondition::FrontAcquired));
        assert!(!seq.actions[0].checks.is_empty());
    }

    proptest! {
        #[test]
        fn prop_gradient_within_bounds_and_monotonic(a in -1e4f32..1e4, b in -1e4f32..1e4) {
            let g = GradientMoveConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = gradient_speed(&g, Some(lo));
            let s_hi = gradient_speed(&g, Some(hi));
            prop_assert!(s_lo >= g.min_speed && s_lo <= g.max_speed);
            prop_assert!(s_hi >= g.min_speed && s_hi <= g.max_speed);
            prop_assert!(s_lo <= s_hi);
        }
    }

    #[test]
    fn test_enabled_moves_without_weight_fail_construction() {
        let mut cfg = RunConfig::default();
        cfg.search.gradient_move_weight = 0.0;
        cfg.search.scan_move_weight = 0.0;
        cfg.search.rand_turn_weight = 0.0;
        let err = SearchExplorer::new(&cfg).err().unwrap();
        assert!(matches!(err, ConfigError::Weights { source: WeightError::NoPositiveWeight, .. }));
    }
}
