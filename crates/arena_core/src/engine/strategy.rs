//! Priority state machine choosing one behavior per cycle.
//!
//! Order: fence interrupt, then stage-driven state, then within NORMAL the
//! chain edge > surrounding > search. BOOT is handled by the control loop
//! before the selector is consulted and is never re-entered once left.
//!
//! A fence episode alternates two cycles: alignment, then the escape planned
//! from the snapshot read after the alignment finished.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::action::ActionSequence;
use crate::config::{RunConfig, RunMode};
use crate::error::{ConfigError, RunError};
use crate::sensors::SensorSnapshot;

use super::backstage::BackstageHold;
use super::edge::EdgeGuard;
use super::fence::{is_trapped, FenceEscaper};
use super::search::SearchExplorer;
use super::stage::StageState;
use super::surrounding::SurroundingEngager;

/// Closed set of behaviors the selector can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Behavior {
    Boot,
    Backstage,
    Edge,
    Surrounding,
    Search,
    Fence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyState {
    Boot,
    Normal,
    Backstage,
    Fence,
}

/// Open fence episode: where to go back to and when it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FenceEpisode {
    resume: StrategyState,
    entered_at: Duration,
    /// Alignment ran last cycle; the escape is due.
    escape_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub behavior: Behavior,
    pub sequence: ActionSequence,
}

pub struct StrategySelector<'a> {
    config: &'a RunConfig,
    edge: EdgeGuard<'a>,
    surrounding: SurroundingEngager<'a>,
    search: SearchExplorer<'a>,
    fence: FenceEscaper<'a>,
    backstage: BackstageHold<'a>,
    state: StrategyState,
    fence_episode: Option<FenceEpisode>,
}

impl<'a> StrategySelector<'a> {
    pub fn new(config: &'a RunConfig) -> Result<Self, ConfigError> {
        let state = match config.strategy.mode {
            RunMode::OffStageStart | RunMode::OffStageDashLoop => StrategyState::Boot,
            RunMode::OnStageStart | RunMode::AlwaysOnStage => StrategyState::Normal,
            RunMode::AlwaysOffStage => StrategyState::Backstage,
        };
        Ok(Self {
            config,
            edge: EdgeGuard::new(config),
            surrounding: SurroundingEngager::new(config)?,
            search: SearchExplorer::new(config)?,
            fence: FenceEscaper::new(config)?,
            backstage: BackstageHold::new(config),
            state,
            fence_episode: None,
        })
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    /// Leave BOOT for good.
    pub fn boot_completed(&mut self) {
        if self.state == StrategyState::Boot {
            self.transition(StrategyState::Normal);
        }
    }

    fn transition(&mut self, next: StrategyState) {
        if next != self.state {
            info!(from = ?self.state, to = ?next, "strategy transition");
            self.state = next;
        }
    }

    /// Pick this cycle's behavior. The snapshot timestamp charges fence
    /// alignment across the cycles of one episode.
    pub fn select<R: Rng>(
        &mut self,
        snap: &SensorSnapshot,
        stage: StageState,
        rng: &mut R,
    ) -> Result<Decision, RunError> {
        if self.state == StrategyState::Boot {
            return Err(RunError::NoBranch { state: self.state, stage });
        }
        let now = snap.timestamp;
        let strategy = &self.config.strategy;

        if let Some(ep) = self.fence_episode.as_mut() {
            if ep.escape_pending {
                ep.escape_pending = false;
                return Ok(Decision { behavior: Behavior::Fence, sequence: self.fence.escape(snap, rng) });
            }
        }

        if strategy.use_fence_component && is_trapped(self.config, snap, stage) {
            let resume = self.state;
            let episode = self.fence_episode.get_or_insert_with(|| {
                info!(?resume, "fence episode started");
                FenceEpisode { resume, entered_at: now, escape_pending: false }
            });
            episode.escape_pending = true;
            let elapsed = now.saturating_sub(episode.entered_at);
            self.transition(StrategyState::Fence);
            return Ok(Decision { behavior: Behavior::Fence, sequence: self.fence.align(elapsed, rng) });
        }

        if let Some(ep) = self.fence_episode.take() {
            info!(resume = ?ep.resume, "fence episode finished");
            self.transition(ep.resume);
        }

        match stage {
            StageState::OffStage => self.transition(StrategyState::Backstage),
            StageState::OnStage => self.transition(StrategyState::Normal),
            StageState::Unclear => {}
        }

        match self.state {
            StrategyState::Backstage => {
                Ok(Decision { behavior: Behavior::Backstage, sequence: self.backstage.evaluate(rng) })
            }
            StrategyState::Normal => self.normal(snap, stage, rng),
            StrategyState::Boot | StrategyState::Fence => Err(RunError::NoBranch { state: self.state, stage }),
        }
    }

    fn normal<R: Rng>(&self, snap: &SensorSnapshot, stage: StageState, rng: &mut R) -> Result<Decision, RunError> {
        let strategy = &self.config.strategy;
        if strategy.use_edge_component {
            if let Some(sequence) = self.edge.evaluate(snap, rng) {
                return Ok(Decision { behavior: Behavior::Edge, sequence });
            }
        }
        if strategy.use_surrounding_component {
            if let Some(sequence) = self.surrounding.evaluate(snap, rng) {
                return Ok(Decision { behavior: Behavior::Surrounding, sequence });
            }
        }
        if strategy.use_normal_component {
            return Ok(Decision { behavior: Behavior::Search, sequence: self.search.evaluate(snap, rng) });
        }
        Err(RunError::NoBranch { state: self.state, stage })
    }
}
