//! Edge guard: back away from the stage edge.

use rand::Rng;
use tracing::debug;

use crate::action::{AbortCondition, Action, ActionKind, ActionSequence};
use crate::config::{secs, RunConfig};
use crate::motion::TurnDirection;
use crate::sensors::{EdgeCorner, SensorSnapshot};

use super::breakers::edge_triggered;

/// Which corners are out of band, in [`EdgeCorner::ALL`] order.
pub fn edge_code(cfg: &RunConfig, snap: &SensorSnapshot) -> [bool; 4] {
    EdgeCorner::ALL.map(|c| edge_triggered(cfg, snap, c))
}

#[derive(Debug, Clone)]
pub struct EdgeGuard<'a> {
    config: &'a RunConfig,
}

impl<'a> EdgeGuard<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// `None` when every edge channel is in band.
    ///
    /// Front triggers win over rear triggers. A lone corner turns the robot
    /// away from it; a full pair draws the direction. With all four corners
    /// out of band there is no way out, so the robot holds still.
    pub fn evaluate<R: Rng>(&self, snap: &SensorSnapshot, rng: &mut R) -> Option<ActionSequence> {
        let [fl, fr, rl, rr] = edge_code(self.config, snap);
        let e = &self.config.edge;
        let fractions = &self.config.perf.checkpoint_fractions;

        if fl && fr && rl && rr {
            debug!("edge: every corner out of band, holding");
            return Some(ActionSequence::new().then(Action::hold(ActionKind::Hold, self.config.min_sync_interval())));
        }

        if fl || fr {
            debug!(fl, fr, rl, rr, "edge: front branch");
            let direction = self.turn_away(fl, fr, rng);
            let seq = ActionSequence::new()
                .then(
                    Action::straight(ActionKind::Fallback, -e.fallback_speed, secs(e.fallback_duration))
                        .watch(AbortCondition::RearEdge, fractions),
                )
                .then(Action::turn(direction, e.turn_speed, secs(e.full_turn_duration)));
            return Some(seq);
        }

        if rl || rr {
            debug!(fl, fr, rl, rr, "edge: rear branch");
            let direction = self.turn_away(rl, rr, rng);
            let seq = ActionSequence::new()
                .then(
                    Action::straight(ActionKind::Advance, e.advance_speed, secs(e.advance_duration))
                        .watch(AbortCondition::FrontEdge, fractions),
                )
                .then(Action::turn(direction, e.turn_speed, secs(e.half_turn_duration)));
            return Some(seq);
        }

        None
    }

    fn turn_away<R: Rng>(&self, left: bool, right: bool, rng: &mut R) -> TurnDirection {
        match (left, right) {
            (true, false) => TurnDirection::Right,
            (false, true) => TurnDirection::Left,
            _ => TurnDirection::draw(rng, self.config.edge.turn_left_prob),
        }
    }
}
