//! In-process stand-ins for the hardware collaborators.
//!
//! A [`ManualClock`] only advances when something sleeps on it, so a whole
//! run replays instantly and deterministically. [`ScriptedSensors`] serves
//! snapshots scheduled on that clock and [`RecordingMotion`] keeps every
//! command it receives.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::error::MotionError;
use crate::motion::{MotionSink, WheelSpeeds};
use crate::sensors::{SensorSnapshot, SensorSource};

/// Simulated clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration);
    }
}

/// Replays snapshots keyed by the time they become current.
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    clock: ManualClock,
    script: Vec<SensorSnapshot>,
    latency: Duration,
    reads: usize,
}

impl ScriptedSensors {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, script: Vec::new(), latency: Duration::ZERO, reads: 0 }
    }

    /// Each snapshot's `timestamp` is the time it becomes current.
    pub fn from_snapshots(clock: ManualClock, mut snapshots: Vec<SensorSnapshot>) -> Self {
        snapshots.sort_by_key(|s| s.timestamp);
        Self { clock, script: snapshots, latency: Duration::ZERO, reads: 0 }
    }

    /// Make `snapshot` current from `at` on.
    pub fn at(mut self, at: Duration, mut snapshot: SensorSnapshot) -> Self {
        snapshot.timestamp = at;
        let pos = self.script.partition_point(|s| s.timestamp <= at);
        self.script.insert(pos, snapshot);
        self
    }

    /// Every read takes this long on the clock.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorSource for ScriptedSensors {
    fn read(&mut self) -> SensorSnapshot {
        if !self.latency.is_zero() {
            self.clock.advance(self.latency);
        }
        self.reads += 1;
        let now = self.clock.now();
        let idx = self.script.partition_point(|s| s.timestamp <= now);
        let mut snap = match idx {
            0 => SensorSnapshot::default(),
            i => self.script[i - 1].clone(),
        };
        snap.timestamp = now;
        snap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionCommand {
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub at: Duration,
    pub speeds: WheelSpeeds,
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub duration: Duration,
}

/// Keeps every accepted command; can be told to fail after `n` of them.
#[derive(Debug, Clone)]
pub struct RecordingMotion {
    clock: ManualClock,
    commands: Vec<MotionCommand>,
    fail_after: Option<usize>,
}

impl RecordingMotion {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, commands: Vec::new(), fail_after: None }
    }

    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    pub fn speeds(&self) -> Vec<WheelSpeeds> {
        self.commands.iter().map(|c| c.speeds).collect()
    }
}

impl MotionSink for RecordingMotion {
    fn command(&mut self, speeds: WheelSpeeds, duration: Duration) -> Result<(), MotionError> {
        if matches!(self.fail_after, Some(n) if self.commands.len() >= n) {
            return Err(MotionError::Transport(format!("injected failure after {} commands", self.commands.len())));
        }
        let at = self.clock.now();
        debug!(?at, left = speeds.left, right = speeds.right, ?duration, "motion command");
        self.commands.push(MotionCommand { at, speeds, duration });
        Ok(())
    }
}
