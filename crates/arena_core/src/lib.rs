//! # arena_core - Behavior Decision Engine for an Arena Robot
//!
//! Turns noisy multi-channel sensor snapshots into timed wheel commands for
//! an autonomous competition robot that must stay on a raised stage, push
//! opponents off, and recover from the perimeter fence.
//!
//! ## Features
//! - Hysteresis stage classification (ON_STAGE / OFF_STAGE / UNCLEAR)
//! - Priority strategy state machine: boot, backstage, edge, surrounding, search, fence
//! - Weighted random tie-breaking with an injected, seedable RNG
//! - Timed actions with mid-action abort checkpoints and a cooperative stop signal
//! - Typed run configuration (TOML / JSON / YAML) with validation and JSON schema
//! - Simulated clock, scripted sensors and recording motion sink for dry runs

#![allow(clippy::doc_lazy_continuation)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::field_reassign_with_default)]

pub mod action;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod motion;
pub mod sensors;
pub mod sim;
pub mod weighted;

pub use action::{AbortCondition, Action, ActionKind, ActionSequence};
pub use clock::{Clock, SystemClock};
pub use config::{load_run_config, RunConfig, RunMode};
pub use engine::{Behavior, ControlLoop, CycleReport, StageState, StrategyState};
pub use error::{ConfigError, MotionError, Result, RunError, WeightError};
pub use motion::{MotionSink, TurnDirection, WheelSpeeds};
pub use sensors::{SensorSnapshot, SensorSource};
pub use weighted::WeightedChoice;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
