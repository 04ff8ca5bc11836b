//! # Run Configuration
//!
//! Every behavior parameter lives in one [`RunConfig`] tree, split into a
//! group per component. Durations are seconds, speeds are signed wheel units,
//! probabilities are in [0, 1].
//!
//! ```rust
//! use arena_core::config::RunConfig;
//!
//! let config = RunConfig::default();
//! config.validate().unwrap();
//! ```
//!
//! The tree is validated once, before the control loop is built, and is
//! read-only afterwards.

mod backstage;
mod boot;
mod edge;
mod fence;
pub mod loader;
mod perf;
mod search;
mod stage;
mod strategy;
mod surrounding;
mod validation;

pub use backstage::BackstageConfig;
pub use boot::BootConfig;
pub use edge::EdgeConfig;
pub use fence::{AlignDirection, FenceConfig, RandWalkConfig};
pub use loader::{load_run_config, resolve_config_path, save_run_config, RUN_CONFIG_ENV};
pub use perf::PerfConfig;
pub use search::{GradientMoveConfig, RandTurnConfig, ScanMoveConfig, SearchConfig};
pub use stage::StageConfig;
pub use strategy::{RunMode, StrategyConfig};
pub use surrounding::SurroundingConfig;

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;

/// Full behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct RunConfig {
    #[validate]
    pub boot: BootConfig,
    #[validate]
    pub backstage: BackstageConfig,
    #[validate]
    pub stage: StageConfig,
    #[validate]
    pub edge: EdgeConfig,
    #[validate]
    pub surrounding: SurroundingConfig,
    #[validate]
    pub search: SearchConfig,
    #[validate]
    pub fence: FenceConfig,
    #[validate]
    pub strategy: StrategyConfig,
    #[validate]
    pub perf: PerfConfig,
}

impl RunConfig {
    /// Field ranges first, then cross-field semantics.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self)?;
        validation::check_semantics(self)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RunConfig)
    }

    /// Preset for bench testing: every random draw is biased left and the
    /// boot button wait is short.
    pub fn bench() -> Self {
        let mut cfg = Self::default();
        cfg.boot.max_holding_duration = 5.0;
        cfg.boot.turn_left_prob = 1.0;
        cfg.edge.turn_left_prob = 1.0;
        cfg.surrounding.turn_left_prob = 1.0;
        cfg.search.scan_move.turn_left_prob = 1.0;
        cfg.search.rand_turn.turn_left_prob = 1.0;
        cfg
    }

    pub fn min_sync_interval(&self) -> Duration {
        secs(self.perf.min_sync_interval)
    }
}

/// Seconds to [`Duration`]. Negative and non-finite values become zero.
pub fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
