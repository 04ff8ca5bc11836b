//! Boot sprint gated on the boot button. Runs once, unless re-armed.

use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::action::{Action, ActionKind, ActionSequence};
use crate::clock::Clock;
use crate::config::{secs, RunConfig};
use crate::error::RunError;
use crate::motion::TurnDirection;
use crate::sensors::SensorSource;

pub struct BootSequencer<'a> {
    config: &'a RunConfig,
    completed: bool,
}

impl<'a> BootSequencer<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config, completed: false }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Allow the next [`BootSequencer::run`] to wait and sprint again.
    pub fn rearm(&mut self) {
        self.completed = false;
    }

    /// Poll the boot button every `min_sync_interval` until it reads the
    /// activation value. Returns the wait time.
    pub fn wait_for_activation<S, C>(&self, sensors: &mut S, clock: &mut C) -> Result<Duration, RunError>
    where
        S: SensorSource + ?Sized,
        C: Clock + ?Sized,
    {
        let boot = &self.config.boot;
        let budget = secs(boot.max_holding_duration);
        let poll = self.config.min_sync_interval();
        let start = clock.now();
        loop {
            let snap = super::sample(sensors);
            let waited = clock.now().saturating_sub(start);
            if snap.io.reboot_button == Some(boot.button_io_activate_case_value) {
                info!(?waited, "boot button activated");
                return Ok(waited);
            }
            if waited >= budget {
                warn!(?budget, "boot button never activated");
                return Err(RunError::BootTimeout(budget));
            }
            clock.sleep(poll.min(budget - waited));
        }
    }

    /// Stabilise, dash, turn.
    pub fn sequence<R: Rng>(&self, rng: &mut R) -> ActionSequence {
        let boot = &self.config.boot;
        let direction = TurnDirection::draw(rng, boot.turn_left_prob);
        ActionSequence::new()
            .then(Action::hold(ActionKind::Stabilize, secs(boot.time_to_stabilize)))
            .then(Action::straight(ActionKind::Dash, boot.dash_speed, secs(boot.dash_duration)))
            .then(Action::turn(direction, boot.turn_speed, secs(boot.full_turn_duration)))
    }

    /// Wait for activation and hand back the sprint. Runs at most once.
    pub fn run<S, C, R>(&mut self, sensors: &mut S, clock: &mut C, rng: &mut R) -> Result<ActionSequence, RunError>
    where
        S: SensorSource + ?Sized,
        C: Clock + ?Sized,
        R: Rng,
    {
        if self.completed {
            return Err(RunError::BootAlreadyCompleted);
        }
        self.wait_for_activation(sensors, clock)?;
        self.completed = true;
        Ok(self.sequence(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{IoBits, SensorSnapshot};
    use crate::sim::{ManualClock, ScriptedSensors};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pressed() -> SensorSnapshot {
        SensorSnapshot::default().with_io(IoBits { reboot_button: Some(0), ..IoBits::default() })
    }

    #[test]
    fn test_activation_then_sprint() {
        let cfg = RunConfig::default();
        let mut clock = ManualClock::new();
        let mut sensors = ScriptedSensors::new(clock.clone())
            .at(Duration::ZERO, SensorSnapshot::default())
            .at(Duration::from_millis(50), pressed());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut boot = BootSequencer::new(&cfg);

        let seq = boot.run(&mut sensors, &mut clock, &mut rng).unwrap();
        assert!(clock.now() >= Duration::from_millis(50));
        assert_eq!(seq.kinds(), vec![ActionKind::Stabilize, ActionKind::Dash, ActionKind::Turn]);
        assert_eq!(seq.actions[1].duration, secs(cfg.boot.dash_duration));
        assert!(boot.is_completed());

        assert!(matches!(boot.run(&mut sensors, &mut clock, &mut rng), Err(RunError::BootAlreadyCompleted)));

        boot.rearm();
        assert!(!boot.is_completed());
        assert!(boot.run(&mut sensors, &mut clock, &mut rng).is_ok());
    }

    #[test]
    fn test_timeout_without_button() {
        let mut cfg = RunConfig::default();
        cfg.boot.max_holding_duration = 0.5;
        let mut clock = ManualClock::new();
        let mut sensors = ScriptedSensors::new(clock.clone()).at(Duration::ZERO, SensorSnapshot::default());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut boot = BootSequencer::new(&cfg);

        let err = boot.run(&mut sensors, &mut clock, &mut rng).unwrap_err();
        assert!(matches!(err, RunError::BootTimeout(d) if d == Duration::from_millis(500)));
        assert!(!boot.is_completed());
        assert!(clock.now() >= Duration::from_millis(500));
        assert!(clock.now() < Duration::from_millis(520));
    }
}
