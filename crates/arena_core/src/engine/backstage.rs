//! Stage-hold: climb back onto the stage.

use rand::Rng;

use crate::action::{AbortCondition, Action, ActionKind, ActionSequence};
use crate::config::{secs, RunConfig};
use crate::motion::TurnDirection;

pub struct BackstageHold<'a> {
    config: &'a RunConfig,
}

impl<'a> BackstageHold<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Small advance, stabilise, dash, stabilise, turn. The dash checks only
    /// run once its progress reaches `check_start_percent`.
    pub fn evaluate<R: Rng>(&self, rng: &mut R) -> ActionSequence {
        let b = &self.config.backstage;
        let start = b.check_start_percent as f32;
        let mut late: Vec<f32> =
            self.config.perf.checkpoint_fractions.iter().copied().filter(|f| *f >= start).collect();
        if !late.contains(&start) {
            late.push(start);
        }

        let dash = Action::straight(ActionKind::Dash, b.dash_speed, secs(b.dash_duration))
            .watch_if(b.use_is_on_stage_check, AbortCondition::OnStage, &late)
            .watch_if(b.use_side_away_check, AbortCondition::SideAway, &late);

        let direction = TurnDirection::draw(rng, b.turn_left_prob);
        ActionSequence::new()
            .then(Action::straight(ActionKind::Advance, b.small_advance_speed, secs(b.small_advance_duration)))
            .then(Action::hold(ActionKind::Stabilize, secs(b.time_to_stabilize)))
            .then(dash)
            .then(Action::hold(ActionKind::Stabilize, secs(b.time_to_stabilize)))
            .then(Action::turn(direction, b.turn_speed, secs(b.full_turn_duration)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sequence_shape() {
        let cfg = RunConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let seq = BackstageHold::new(&cfg).evaluate(&mut rng);
        assert_eq!(
            seq.kinds(),
            vec![ActionKind::Advance, ActionKind::Stabilize, ActionKind::Dash, ActionKind::Stabilize, ActionKind::Turn]
        );
    }

    #[test]
    fn test_dash_checks_start_late() {
        let mut cfg = RunConfig::default();
        cfg.backstage.check_start_percent = 0.5;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let seq = BackstageHold::new(&cfg).evaluate(&mut rng);
        let dash = &seq.actions[2];
        assert_eq!(dash.fractions(), vec![0.5, 0.75]);
        assert_eq!(dash.conditions_at(0.5).count(), 2);

        cfg.backstage.use_is_on_stage_check = false;
        cfg.backstage.use_side_away_check = false;
        let seq = BackstageHold::new(&cfg).evaluate(&mut rng);
        assert!(seq.actions[2].checks.is_empty());
    }

    #[test]
    fn test_dash_checked_at_start_percent() {
        let cfg = RunConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let seq = BackstageHold::new(&cfg).evaluate(&mut rng);
        assert_eq!(seq.actions[2].fractions(), vec![cfg.backstage.check_start_percent as f32]);
    }
}
