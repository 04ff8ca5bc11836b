use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How a run starts and whether stage classification is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Wait for the boot button, sprint onto the stage, then classify.
    #[default]
    OffStageStart,
    /// Already on the stage: skip boot.
    OnStageStart,
    /// Skip boot and treat the robot as always on the stage.
    AlwaysOnStage,
    /// Skip boot and treat the robot as always off the stage.
    AlwaysOffStage,
    /// Bench drill: wait for the button and sprint, over and over. Nothing
    /// else runs.
    OffStageDashLoop,
}

impl RunMode {
    pub const ALL: [RunMode; 5] = [
        RunMode::OffStageStart,
        RunMode::OnStageStart,
        RunMode::AlwaysOnStage,
        RunMode::AlwaysOffStage,
        RunMode::OffStageDashLoop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::OffStageStart => "off_stage_start",
            RunMode::OnStageStart => "on_stage_start",
            RunMode::AlwaysOnStage => "always_on_stage",
            RunMode::AlwaysOffStage => "always_off_stage",
            RunMode::OffStageDashLoop => "off_stage_dash_loop",
        }
    }

    pub fn runs_boot(&self) -> bool {
        matches!(self, RunMode::OffStageStart | RunMode::OffStageDashLoop)
    }

    /// Boot is re-armed after every sprint instead of handing over.
    pub fn repeats_boot(&self) -> bool {
        matches!(self, RunMode::OffStageDashLoop)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        RunMode::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| format!("unknown run mode `{s}`"))
    }
}

/// Component switches for the strategy selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(default)]
pub struct StrategyConfig {
    pub mode: RunMode,
    pub use_edge_component: bool,
    pub use_surrounding_component: bool,
    /// Search branch.
    pub use_normal_component: bool,
    pub use_fence_component: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            use_edge_component: true,
            use_surrounding_component: true,
            use_normal_component: true,
            use_fence_component: true,
        }
    }
}
