//! The control loop: read, classify, select, execute, repeat.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::action::ActionSequence;
use crate::clock::Clock;
use crate::config::{RunConfig, RunMode};
use crate::error::{ConfigError, RunError};
use crate::motion::MotionSink;
use crate::sensors::SensorSource;

use super::boot::BootSequencer;
use super::sample;
use super::sequencer::{ActionSequencer, ExecutionOutcome, ExecutionReport};
use super::stage::{StageClassifier, StageState};
use super::strategy::{Behavior, StrategySelector, StrategyState};

/// What happened in one cycle, for telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    #[serde(serialize_with = "crate::sensors::duration_secs::serialize")]
    pub timestamp: Duration,
    pub state: StrategyState,
    /// `None` when the cycle only observed the stop signal.
    pub behavior: Option<Behavior>,
    pub stage: StageState,
    pub sequence: ActionSequence,
    pub execution: ExecutionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub stopped: bool,
}

pub struct ControlLoop<'a, S, M, C, R> {
    config: &'a RunConfig,
    sensors: S,
    motion: M,
    clock: C,
    rng: R,
    classifier: StageClassifier,
    stage: StageState,
    selector: StrategySelector<'a>,
    boot: BootSequencer<'a>,
    sequencer: ActionSequencer<'a>,
    cycle: u64,
    /// The stop signal is only honoured after the button has been seen
    /// released once, so the press that started the run does not end it.
    stop_armed: bool,
    halted: bool,
}

impl<'a, S, M, C, R> ControlLoop<'a, S, M, C, R>
where
    S: SensorSource,
    M: MotionSink,
    C: Clock,
    R: Rng,
{
    /// Validates `config` before anything is built from it.
    pub fn new(config: &'a RunConfig, sensors: S, motion: M, clock: C, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sensors,
            motion,
            clock,
            rng,
            classifier: StageClassifier::new(&config.stage),
            stage: StageState::Unclear,
            selector: StrategySelector::new(config)?,
            boot: BootSequencer::new(config),
            sequencer: ActionSequencer::new(config),
            cycle: 0,
            stop_armed: false,
            halted: false,
        })
    }

    pub fn stage(&self) -> StageState {
        self.stage
    }

    pub fn state(&self) -> StrategyState {
        self.selector.state()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_parts(self) -> (S, M, C, R) {
        (self.sensors, self.motion, self.clock, self.rng)
    }

    /// Stage as the selector should see it under the configured run mode.
    fn effective_stage(&self) -> StageState {
        match self.config.strategy.mode {
            RunMode::AlwaysOnStage => StageState::OnStage,
            RunMode::AlwaysOffStage => StageState::OffStage,
            RunMode::OffStageStart | RunMode::OnStageStart | RunMode::OffStageDashLoop => self.stage,
        }
    }

    /// One cycle. Errors are fatal for the run.
    pub fn step(&mut self) -> Result<CycleReport, RunError> {
        self.cycle += 1;

        if self.selector.state() == StrategyState::Boot {
            return self.boot_cycle();
        }

        let snap = sample(&mut self.sensors);
        let activate = Some(self.config.boot.button_io_activate_case_value);
        if snap.io.reboot_button != activate {
            self.stop_armed = true;
        } else if self.stop_armed {
            self.motion.stop()?;
            self.halted = true;
            info!(cycle = self.cycle, "stop signal, control loop halted");
            return Ok(CycleReport {
                cycle: self.cycle,
                timestamp: snap.timestamp,
                state: self.selector.state(),
                behavior: None,
                stage: self.stage,
                sequence: ActionSequence::new(),
                execution: ExecutionReport { outcome: ExecutionOutcome::Stopped, actions: Vec::new() },
            });
        }

        self.classifier.update(&snap, &mut self.stage);
        let stage = self.effective_stage();

        let decision = match self.selector.select(&snap, stage, &mut self.rng) {
            Ok(d) => d,
            Err(e) => {
                self.halt_after_error();
                return Err(e);
            }
        };

        let executed = self.sequencer.execute(
            &decision.sequence,
            &mut self.sensors,
            &mut self.motion,
            &mut self.clock,
            self.stop_armed,
        );
        let execution = match executed {
            Ok(report) => report,
            Err(e) => {
                self.halt_after_error();
                return Err(e);
            }
        };
        if execution.stopped() {
            self.halted = true;
        }

        Ok(CycleReport {
            cycle: self.cycle,
            timestamp: snap.timestamp,
            state: self.selector.state(),
            behavior: Some(decision.behavior),
            stage,
            sequence: decision.sequence,
            execution,
        })
    }

    fn boot_cycle(&mut self) -> Result<CycleReport, RunError> {
        let timestamp = self.clock.now();
        let sequence = match self.boot.run(&mut self.sensors, &mut self.clock, &mut self.rng) {
            Ok(seq) => seq,
            Err(e) => {
                self.halt_after_error();
                return Err(e);
            }
        };
        let executed = self.sequencer.execute(&sequence, &mut self.sensors, &mut self.motion, &mut self.clock, false);
        let execution = match executed {
            Ok(report) => report,
            Err(e) => {
                self.halt_after_error();
                return Err(e);
            }
        };
        if self.config.strategy.mode.repeats_boot() {
            self.boot.rearm();
        } else {
            self.selector.boot_completed();
        }
        Ok(CycleReport {
            cycle: self.cycle,
            timestamp,
            state: StrategyState::Boot,
            behavior: Some(Behavior::Boot),
            stage: self.stage,
            sequence,
            execution,
        })
    }

    fn halt_after_error(&mut self) {
        self.halted = true;
        if let Err(e) = self.motion.stop() {
            warn!(error = %e, "zero-speed command failed while halting");
        }
    }

    /// Cycle until halted or `max_cycles` is reached, handing each report
    /// to `observer`.
    pub fn run<F>(&mut self, max_cycles: Option<u64>, mut observer: F) -> Result<RunSummary, RunError>
    where
        F: FnMut(&CycleReport),
    {
        let start = self.cycle;
        info!(mode = %self.config.strategy.mode, ?max_cycles, "control loop started");
        while !self.halted && max_cycles.map_or(true, |max| self.cycle - start < max) {
            let report = self.step()?;
            observer(&report);
        }
        Ok(RunSummary { cycles: self.cycle - start, stopped: self.halted })
    }
}
