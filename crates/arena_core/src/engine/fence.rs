//! Fence escaper: recover when boxed in against the perimeter.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::action::{AbortCondition, Action, ActionKind, ActionSequence};
use crate::config::{secs, AlignDirection, RunConfig};
use crate::error::ConfigError;
use crate::motion::{TurnDirection, WheelSpeeds};
use crate::sensors::{Direction, SensorSnapshot};
use crate::weighted::WeightedChoice;

use super::breakers::{fence_blocked, front_io_pair_on_fence, rear_io_pair_on_fence};
use super::stage::StageState;

/// Boxed in: every proximity channel reads the fence, or off the stage
/// with a full IO pair on the fence.
pub fn is_trapped(cfg: &RunConfig, snap: &SensorSnapshot, stage: StageState) -> bool {
    if Direction::ALL.iter().all(|d| fence_blocked(cfg, snap, *d)) {
        return true;
    }
    stage != StageState::OnStage && (front_io_pair_on_fence(cfg, snap) || rear_io_pair_on_fence(cfg, snap))
}

fn align_turn<R: Rng>(direction: AlignDirection, rng: &mut R) -> TurnDirection {
    match direction {
        AlignDirection::Left => TurnDirection::Left,
        AlignDirection::Right => TurnDirection::Right,
        AlignDirection::Random => TurnDirection::draw(rng, 0.5),
    }
}

pub struct FenceEscaper<'a> {
    config: &'a RunConfig,
    straight: Option<WeightedChoice<i32>>,
    turn: Option<WeightedChoice<i32>>,
}

impl<'a> FenceEscaper<'a> {
    pub fn new(config: &'a RunConfig) -> Result<Self, ConfigError> {
        let walk = &config.fence.rand_walk;
        let straight = if walk.use_straight {
            let choice = WeightedChoice::from_slices(&walk.straight_speeds, &walk.straight_weights)
                .map_err(ConfigError::weights("fence.rand_walk.straight_weights"))?;
            Some(choice)
        } else {
            None
        };
        let turn = if walk.use_turn {
            let choice = WeightedChoice::from_slices(&walk.turn_speeds, &walk.turn_weights)
                .map_err(ConfigError::weights("fence.rand_walk.turn_weights"))?;
            Some(choice)
        } else {
            None
        };
        Ok(Self { config, straight, turn })
    }

    /// Turn back onto the stage, then square up with the arena.
    ///
    /// `elapsed` is the time already spent in this fence episode; it is
    /// charged against the stage alignment budget.
    pub fn align<R: Rng>(&self, elapsed: Duration, rng: &mut R) -> ActionSequence {
        let f = &self.config.fence;
        let fractions = &self.config.perf.checkpoint_fractions;
        let mut seq = ActionSequence::new();

        let stage_budget = secs(f.max_stage_align_duration).saturating_sub(elapsed);
        if !stage_budget.is_zero() {
            let dir = align_turn(f.stage_align_direction, rng);
            seq.push(
                Action::new(ActionKind::Align, WheelSpeeds::turn(dir, f.stage_align_speed), stage_budget)
                    .watch(AbortCondition::StageAligned, fractions),
            );
        }

        let dir = align_turn(f.direction_align_direction, rng);
        seq.push(
            Action::new(
                ActionKind::Align,
                WheelSpeeds::turn(dir, f.direction_align_speed),
                secs(f.max_direction_align_duration),
            )
            .watch(AbortCondition::DirectionAligned, fractions),
        );
        debug!(actions = seq.len(), ?elapsed, "fence align");
        seq
    }

    /// Leave the corner and wander off. `snap` must be read after the
    /// alignment finished: the exit runs away from whatever the front
    /// faces now.
    pub fn escape<R: Rng>(&self, snap: &SensorSnapshot, rng: &mut R) -> ActionSequence {
        let f = &self.config.fence;
        let front_blocked = fence_blocked(self.config, snap, Direction::Front) || front_io_pair_on_fence(self.config, snap);
        let exit_speed = if front_blocked { -f.exit_corner_speed } else { f.exit_corner_speed };
        let mut seq = ActionSequence::new()
            .then(Action::straight(ActionKind::ExitCorner, exit_speed, secs(f.max_exit_corner_duration)));
        seq.extend(self.rand_walk(rng));
        debug!(actions = seq.len(), front_blocked, "fence escape");
        seq
    }

    /// Alternating straight and turn segments, straight first.
    pub fn rand_walk<R: Rng>(&self, rng: &mut R) -> ActionSequence {
        let walk = &self.config.fence.rand_walk;
        let duration = secs(walk.walk_duration);
        let mut seq = ActionSequence::new();
        if self.straight.is_none() && self.turn.is_none() {
            return seq;
        }
        let mut straight_next = true;
        while seq.len() < walk.walk_segments as usize {
            match (straight_next, &self.straight, &self.turn) {
                (true, Some(choice), _) => {
                    seq.push(Action::straight(ActionKind::Walk, *choice.pick(rng), duration));
                }
                (false, _, Some(choice)) => {
                    seq.push(Action::new(ActionKind::Walk, WheelSpeeds::turn(TurnDirection::Left, *choice.pick(rng)), duration));
                }
                _ => {}
            }
            straight_next = !straight_next;
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::IoBits;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn boxed_in() -> SensorSnapshot {
        SensorSnapshot::at(Duration::ZERO).with_all_proximity(400)
    }

    #[test]
    fn test_trapped_rules() {
        let cfg = RunConfig::default();
        assert!(is_trapped(&cfg, &boxed_in(), StageState::OnStage));
        let open = SensorSnapshot::at(Duration::ZERO).with_all_proximity(3000);
        assert!(!is_trapped(&cfg, &open, StageState::OffStage));

        let io = open.with_io(IoBits { rear_left: Some(0), rear_right: Some(0), ..IoBits::default() });
        assert!(is_trapped(&cfg, &io, StageState::OffStage));
        assert!(!is_trapped(&cfg, &io, StageState::OnStage));
    }

    #[test]
    fn test_align_then_escape() {
        let cfg = RunConfig::default();
        let escaper = FenceEscaper::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let align = escaper.align(Duration::ZERO, &mut rng);
        assert_eq!(align.kinds(), vec![ActionKind::Align, ActionKind::Align]);
        assert_eq!(align.actions[0].duration, secs(cfg.fence.max_stage_align_duration));

        let escape = escaper.escape(&boxed_in(), &mut rng);
        let kinds = escape.kinds();
        assert_eq!(kinds[0], ActionKind::ExitCorner);
        assert_eq!(kinds.len(), 1 + cfg.fence.rand_walk.walk_segments as usize);
        assert!(kinds[1..].iter().all(|k| *k == ActionKind::Walk));
        // front blocked: exit backwards
        assert_eq!(escape.actions[0].speeds, WheelSpeeds::straight(-cfg.fence.exit_corner_speed));
    }

    #[test]
    fn test_exit_follows_the_snapshot_it_is_given() {
        let cfg = RunConfig::default();
        let escaper = FenceEscaper::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let facing_open = boxed_in().with_proximity(Direction::Front, 3000);
        let seq = escaper.escape(&facing_open, &mut rng);
        assert_eq!(seq.actions[0].speeds, WheelSpeeds::straight(cfg.fence.exit_corner_speed));

        let on_fence = facing_open.with_io(IoBits { front_left: Some(0), front_right: Some(0), ..IoBits::default() });
        let seq = escaper.escape(&on_fence, &mut rng);
        assert_eq!(seq.actions[0].speeds, WheelSpeeds::straight(-cfg.fence.exit_corner_speed));
    }

    #[test]
    fn test_stage_align_budget_is_consumed() {
        let cfg = RunConfig::default();
        let escaper = FenceEscaper::new(&cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let partial = escaper.align(Duration::from_secs(4), &mut rng);
        assert_eq!(partial.actions[0].duration, Duration::from_millis(500));

        let spent = escaper.align(Duration::from_secs(10), &mut rng);
        assert_eq!(spent.len(), 1);
        assert_eq!(spent.actions[0].kind, ActionKind::Align);
        assert_eq!(spent.actions[0].duration, secs(cfg.fence.max_direction_align_duration));
    }

    #[test]
    fn test_walk_alternates() {
        let cfg = RunConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let walk = FenceEscaper::new(&cfg).unwrap().rand_walk(&mut rng);
        for (i, a) in walk.actions.iter().enumerate() {
            let straight = a.speeds.left == a.speeds.right;
            assert_eq!(straight, i % 2 == 0, "segment {i}");
            assert_eq!(a.duration, secs(cfg.fence.rand_walk.walk_duration));
        }
    }

    #[test]
    fn test_walk_with_turns_only() {
        let mut cfg = RunConfig::default();
        cfg.fence.rand_walk.use_straight = false;
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let walk = FenceEscaper::new(&cfg).unwrap().rand_walk(&mut rng);
        assert_eq!(walk.len(), cfg.fence.rand_walk.walk_segments as usize);
        assert!(walk.actions.iter().all(|a| a.speeds.left == -a.speeds.right));
    }
}
