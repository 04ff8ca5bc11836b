//! Executes action sequences against the motion sink.
//!
//! Each action is commanded once and then waited out on the clock. At every
//! checkpoint fraction the sensors are read again: the stop signal is checked
//! first, then the action's abort conditions. An abort ends the current
//! action only; the stop signal ends the whole sequence.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::action::{ActionKind, ActionSequence};
use crate::clock::Clock;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::motion::MotionSink;
use crate::sensors::{SensorSnapshot, SensorSource};

use super::breakers::{AbortCause, Breakers};
use super::sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionOutcome {
    Completed,
    /// Stop signal observed; motors were zeroed.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub planned: Duration,
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub elapsed: Duration,
    pub aborted: Option<AbortCause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub outcome: ExecutionOutcome,
    pub actions: Vec<ActionRecord>,
}

impl ExecutionReport {
    pub fn stopped(&self) -> bool {
        self.outcome == ExecutionOutcome::Stopped
    }

    pub fn elapsed(&self) -> Duration {
        self.actions.iter().map(|a| a.elapsed).sum()
    }
}

pub struct ActionSequencer<'a> {
    config: &'a RunConfig,
    breakers: Breakers<'a>,
}

impl<'a> ActionSequencer<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config, breakers: Breakers::new(config) }
    }

    fn stop_requested(&self, snap: &SensorSnapshot) -> bool {
        snap.io.reboot_button == Some(self.config.boot.button_io_activate_case_value)
    }

    /// Run `seq` to completion or until stopped. Motion errors abort the run.
    pub fn execute<S, M, C>(
        &self,
        seq: &ActionSequence,
        sensors: &mut S,
        motion: &mut M,
        clock: &mut C,
        watch_stop: bool,
    ) -> Result<ExecutionReport, RunError>
    where
        S: SensorSource + ?Sized,
        M: MotionSink + ?Sized,
        C: Clock + ?Sized,
    {
        let mut records = Vec::with_capacity(seq.len());

        for action in &seq.actions {
            if action.duration.is_zero() {
                continue;
            }
            let start = clock.now();
            motion.command(action.speeds, action.duration)?;

            let mut points = action.fractions();
            points.push(1.0);
            let mut aborted = None;

            for fraction in points {
                clock.sleep_until(start + checkpoint_offset(action.duration, fraction));
                let snap = sample(sensors);

                if watch_stop && self.stop_requested(&snap) {
                    motion.stop()?;
                    info!(kind = ?action.kind, "stop signal, halting sequence");
                    records.push(ActionRecord {
                        kind: action.kind,
                        planned: action.duration,
                        elapsed: clock.now().saturating_sub(start),
                        aborted: None,
                    });
                    return Ok(ExecutionReport { outcome: ExecutionOutcome::Stopped, actions: records });
                }

                if fraction < 1.0 {
                    aborted = action.conditions_at(fraction).find_map(|c| self.breakers.check(c, &snap));
                    if let Some(cause) = aborted {
                        debug!(kind = ?action.kind, ?cause, fraction, "action aborted");
                        break;
                    }
                }

                // a slow read may already have run past the end
                if snap.timestamp.saturating_sub(start) >= action.duration {
                    break;
                }
            }

            records.push(ActionRecord {
                kind: action.kind,
                planned: action.duration,
                elapsed: clock.now().saturating_sub(start),
                aborted,
            });
        }

        Ok(ExecutionReport { outcome: ExecutionOutcome::Completed, actions: records })
    }
}

/// Offset of a checkpoint into an action; the end point is exact.
fn checkpoint_offset(duration: Duration, fraction: f32) -> Duration {
    if fraction >= 1.0 {
        duration
    } else {
        duration.mul_f64(f64::from(fraction))
    }
}
