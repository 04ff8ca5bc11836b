//! Timed motion actions and the abort conditions watched while they run.

use std::time::Duration;

use serde::Serialize;

use crate::motion::{TurnDirection, WheelSpeeds};

/// What an action is for. Carried into telemetry only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Hold,
    Stabilize,
    Dash,
    Advance,
    Fallback,
    Turn,
    Attack,
    Scan,
    GradientMove,
    Align,
    ExitCorner,
    Walk,
}

/// Conditions that cut an action short when observed at a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AbortCondition {
    /// A rear edge sensor left its band.
    RearEdge,
    /// A front edge sensor left its band.
    FrontEdge,
    /// The attacked object is gone, or the shovel is off the stage.
    AttackLost,
    /// Something is in front again.
    FrontAcquired,
    /// Scan checks against proximity readings taken when the scan started.
    ScanDeviation { baseline: [Option<u16>; 4] },
    /// Square to the stage edge.
    StageAligned,
    /// Square to the fence.
    DirectionAligned,
    /// Back on the stage.
    OnStage,
    /// Chassis tipped past the side-away tolerance.
    SideAway,
}

/// One condition evaluated at `fraction` of the action duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub fraction: f32,
    pub condition: AbortCondition,
}

/// A single timed wheel command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub speeds: WheelSpeeds,
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Checkpoint>,
}

impl Action {
    pub fn new(kind: ActionKind, speeds: WheelSpeeds, duration: Duration) -> Self {
        Self { kind, speeds, duration, checks: Vec::new() }
    }

    pub fn hold(kind: ActionKind, duration: Duration) -> Self {
        Self::new(kind, WheelSpeeds::STOP, duration)
    }

    pub fn straight(kind: ActionKind, speed: i32, duration: Duration) -> Self {
        Self::new(kind, WheelSpeeds::straight(speed), duration)
    }

    pub fn turn(direction: TurnDirection, speed: i32, duration: Duration) -> Self {
        Self::new(ActionKind::Turn, WheelSpeeds::turn(direction, speed), duration)
    }

    /// Watch `condition` at each of `fractions`. Fractions outside (0, 1)
    /// are dropped.
    pub fn watch(mut self, condition: AbortCondition, fractions: &[f32]) -> Self {
        for f in fractions.iter().copied().filter(|f| *f > 0.0 && *f < 1.0) {
            self.checks.push(Checkpoint { fraction: f, condition: condition.clone() });
        }
        self
    }

    pub fn watch_if(self, enabled: bool, condition: AbortCondition, fractions: &[f32]) -> Self {
        if enabled {
            self.watch(condition, fractions)
        } else {
            self
        }
    }

    /// Distinct checkpoint fractions in ascending order.
    pub fn fractions(&self) -> Vec<f32> {
        let mut out: Vec<f32> = self.checks.iter().map(|c| c.fraction).collect();
        out.sort_by(|a, b| a.total_cmp(b));
        out.dedup();
        out
    }

    pub fn conditions_at(&self, fraction: f32) -> impl Iterator<Item = &AbortCondition> {
        self.checks.iter().filter(move |c| c.fraction == fraction).map(|c| &c.condition)
    }
}

/// Ordered, finite list of actions produced by one behavior invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionSequence {
    pub actions: Vec<Action>,
}

impl ActionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, other: ActionSequence) {
        self.actions.extend(other.actions);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Upper bound on wall-clock time to execute the sequence.
    pub fn total_duration(&self) -> Duration {
        self.actions.iter().map(|a| a.duration).sum()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|a| a.kind).collect()
    }
}

impl From<Vec<Action>> for ActionSequence {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}
