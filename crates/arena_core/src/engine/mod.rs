//! # Behavior Decision Engine
//!
//! Per cycle: one sensor read feeds the stage classifier, the strategy
//! selector picks a behavior, the behavior emits an [`ActionSequence`], and
//! the sequencer executes it against the motion sink, re-reading sensors at
//! checkpoints.
//!
//! [`ActionSequence`]: crate::action::ActionSequence

pub mod backstage;
pub mod boot;
pub mod breakers;
pub mod control;
pub mod edge;
pub mod fence;
pub mod search;
pub mod sequencer;
pub mod stage;
pub mod strategy;
pub mod surrounding;

#[cfg(test)]
mod scenario_tests;

pub use backstage::BackstageHold;
pub use boot::BootSequencer;
pub use breakers::{AbortCause, Breakers};
pub use control::{ControlLoop, CycleReport, RunSummary};
pub use edge::EdgeGuard;
pub use fence::FenceEscaper;
pub use search::{SearchExplorer, SearchMove};
pub use sequencer::{ActionRecord, ActionSequencer, ExecutionOutcome, ExecutionReport};
pub use stage::{StageClassifier, StageState};
pub use strategy::{Behavior, Decision, StrategySelector, StrategyState};
pub use surrounding::{FrontEntity, SurroundingEngager};

use tracing::warn;

use crate::sensors::{SensorSnapshot, SensorSource};

/// Read and sanitise one snapshot.
pub(crate) fn sample<S: SensorSource + ?Sized>(sensors: &mut S) -> SensorSnapshot {
    let (snap, dropped) = sensors.read().sanitized();
    if dropped > 0 {
        warn!(dropped, ts = ?snap.timestamp, "degraded sensor channels ignored");
    }
    snap
}
