//! Sensor snapshot and the sensor-source collaborator.
//!
//! A [`SensorSnapshot`] is one immutable read of every channel. Channels the
//! source failed to read are `None`; the engine treats a missing channel as
//! "condition not triggered".

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Full scale of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// Edge (cliff) sensor corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeCorner {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl EdgeCorner {
    /// Fixed evaluation order. Front before rear, left before right.
    pub const ALL: [EdgeCorner; 4] =
        [EdgeCorner::FrontLeft, EdgeCorner::FrontRight, EdgeCorner::RearLeft, EdgeCorner::RearRight];

    pub fn index(self) -> usize {
        match self {
            EdgeCorner::FrontLeft => 0,
            EdgeCorner::FrontRight => 1,
            EdgeCorner::RearLeft => 2,
            EdgeCorner::RearRight => 3,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, EdgeCorner::FrontLeft | EdgeCorner::FrontRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, EdgeCorner::FrontLeft | EdgeCorner::RearLeft)
    }
}

/// Proximity sensor directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Front,
    Rear,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Front, Direction::Rear, Direction::Left, Direction::Right];

    pub fn index(self) -> usize {
        match self {
            Direction::Front => 0,
            Direction::Rear => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// Pre-resolved identity of whatever sits in front of the robot.
///
/// Produced by the perception collaborator; the engine only looks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    EnemyCar,
    EnemyBox,
    NeutralBox,
    AllyBox,
}

/// Binary IO channels, raw levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoBits {
    /// Gray-scale IO sensors on the shovel.
    pub gray_left: Option<u8>,
    pub gray_right: Option<u8>,
    /// Object/fence IO sensors at the four corners.
    pub front_left: Option<u8>,
    pub front_right: Option<u8>,
    pub rear_left: Option<u8>,
    pub rear_right: Option<u8>,
    /// Boot / reboot button.
    pub reboot_button: Option<u8>,
}

/// One read of all sensor channels at a single instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSnapshot {
    /// Time of the read on the control loop clock.
    #[serde(with = "duration_secs")]
    pub timestamp: Duration,
    /// Edge ADC, indexed by [`EdgeCorner::index`].
    pub edge: [Option<u16>; 4],
    /// Proximity ADC, indexed by [`Direction::index`].
    pub proximity: [Option<u16>; 4],
    /// Gray-scale ADC under the chassis.
    pub gray_adc: Option<u16>,
    pub io: IoBits,
    /// Attitude yaw in degrees.
    pub yaw: Option<f32>,
    /// Z-axis acceleration in g.
    pub accel_z: Option<f32>,
    /// External steering signal used by the gradient move.
    pub gradient: Option<f32>,
    pub front_tag: Option<EntityTag>,
}

impl SensorSnapshot {
    pub fn at(timestamp: Duration) -> Self {
        Self { timestamp, ..Self::default() }
    }

    #[inline]
    pub fn edge_at(&self, corner: EdgeCorner) -> Option<u16> {
        self.edge[corner.index()]
    }

    #[inline]
    pub fn proximity_at(&self, direction: Direction) -> Option<u16> {
        self.proximity[direction.index()]
    }

    pub fn with_edge(mut self, corner: EdgeCorner, value: u16) -> Self {
        self.edge[corner.index()] = Some(value);
        self
    }

    pub fn with_all_edges(mut self, value: u16) -> Self {
        self.edge = [Some(value); 4];
        self
    }

    pub fn with_proximity(mut self, direction: Direction, value: u16) -> Self {
        self.proximity[direction.index()] = Some(value);
        self
    }

    pub fn with_all_proximity(mut self, value: u16) -> Self {
        self.proximity = [Some(value); 4];
        self
    }

    pub fn with_gray(mut self, value: u16) -> Self {
        self.gray_adc = Some(value);
        self
    }

    pub fn with_io(mut self, io: IoBits) -> Self {
        self.io = io;
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = Some(yaw);
        self
    }

    pub fn with_tag(mut self, tag: EntityTag) -> Self {
        self.front_tag = Some(tag);
        self
    }

    /// Drops implausible readings and clamps ADC channels to full scale.
    ///
    /// Returns the cleaned snapshot and the number of channels that were
    /// dropped (non-finite floats).
    pub fn sanitized(mut self) -> (Self, usize) {
        let mut dropped = 0;
        for v in self.edge.iter_mut().chain(self.proximity.iter_mut()).chain(std::iter::once(&mut self.gray_adc)) {
            if let Some(raw) = v {
                *raw = (*raw).min(ADC_MAX);
            }
        }
        for v in [&mut self.yaw, &mut self.accel_z, &mut self.gradient] {
            if matches!(v, Some(x) if !x.is_finite()) {
                *v = None;
                dropped += 1;
            }
        }
        (self, dropped)
    }
}

/// Source of sensor snapshots.
///
/// `read` must return promptly. Channels that could not be read are reported
/// as `None` rather than failing the whole read. Timestamps are on the same
/// clock the control loop waits on.
pub trait SensorSource {
    fn read(&mut self) -> SensorSnapshot;
}

/// Serde helper: durations as floating-point seconds.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid duration: {secs}")));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
