//! Wheel speed commands and the motion-sink collaborator.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Largest wheel speed magnitude a run config may ask for.
pub const SPEED_LIMIT: i32 = 10_000;

/// Signed speed for the left and right wheel pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub left: i32,
    pub right: i32,
}

impl WheelSpeeds {
    pub const STOP: WheelSpeeds = WheelSpeeds { left: 0, right: 0 };

    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Both wheels at `speed`. Negative drives backwards.
    pub const fn straight(speed: i32) -> Self {
        Self { left: speed, right: speed }
    }

    /// Spin in place. A negative `speed` spins the other way.
    pub fn turn(direction: TurnDirection, speed: i32) -> Self {
        match direction {
            TurnDirection::Left => Self { left: speed.saturating_neg(), right: speed },
            TurnDirection::Right => Self { left: speed, right: speed.saturating_neg() },
        }
    }

    pub fn is_stop(&self) -> bool {
        *self == Self::STOP
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Bernoulli draw: `Left` with probability `left_prob`.
    pub fn draw<R: Rng>(rng: &mut R, left_prob: f64) -> Self {
        if crate::weighted::bernoulli(rng, left_prob) {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

/// Sink for timed wheel commands.
///
/// `command` sets the wheel speeds and returns; the caller waits out
/// `duration` itself. Failures are never retried by the engine.
pub trait MotionSink {
    fn command(&mut self, speeds: WheelSpeeds, duration: Duration) -> Result<(), MotionError>;

    /// Immediate zero-speed override.
    fn stop(&mut self) -> Result<(), MotionError> {
        self.command(WheelSpeeds::STOP, Duration::ZERO)
    }
}
