//! Surrounding engager: attack what is in front, turn toward what is beside.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::action::{AbortCondition, Action, ActionKind, ActionSequence};
use crate::config::{secs, RunConfig};
use crate::error::ConfigError;
use crate::motion::TurnDirection;
use crate::sensors::{Direction, EntityTag, SensorSnapshot};
use crate::weighted::WeightedChoice;

use super::breakers::{front_edge_triggered, front_encountered, side_encountered};

/// What the robot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrontEntity {
    EnemyCar,
    EnemyBox,
    NeutralBox,
    AllyBox,
    /// Something in front while a front edge channel is out of band.
    EdgeAdjacent,
}

/// Front entity plus side occupancy for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SurroundingCode {
    pub front: Option<FrontEntity>,
    pub left: bool,
    pub right: bool,
    pub behind: bool,
}

impl SurroundingCode {
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && !self.left && !self.right && !self.behind
    }
}

/// Tag lookup. Untagged objects are treated as the enemy car. Box tags
/// are trusted without a proximity hit; car and neutral box need one.
pub fn classify_front(cfg: &RunConfig, snap: &SensorSnapshot) -> Option<FrontEntity> {
    let encountered = front_encountered(cfg, snap);
    if encountered && front_edge_triggered(cfg, snap) {
        return Some(FrontEntity::EdgeAdjacent);
    }
    match (snap.front_tag, encountered) {
        (Some(EntityTag::AllyBox), _) => Some(FrontEntity::AllyBox),
        (Some(EntityTag::EnemyBox), _) => Some(FrontEntity::EnemyBox),
        (Some(EntityTag::NeutralBox), true) => Some(FrontEntity::NeutralBox),
        (Some(EntityTag::EnemyCar), true) | (None, true) => Some(FrontEntity::EnemyCar),
        _ => None,
    }
}

pub fn surrounding_code(cfg: &RunConfig, snap: &SensorSnapshot) -> SurroundingCode {
    SurroundingCode {
        front: classify_front(cfg, snap),
        left: side_encountered(cfg, snap, Direction::Left),
        right: side_encountered(cfg, snap, Direction::Right),
        behind: side_encountered(cfg, snap, Direction::Rear),
    }
}

pub struct SurroundingEngager<'a> {
    config: &'a RunConfig,
    rand_speeds: Option<WeightedChoice<i32>>,
}

impl<'a> SurroundingEngager<'a> {
    pub fn new(config: &'a RunConfig) -> Result<Self, ConfigError> {
        let s = &config.surrounding;
        let rand_speeds = if s.use_rand_turn_speed {
            let choice = WeightedChoice::from_slices(&s.rand_turn_speeds, &s.rand_turn_speed_weights)
                .map_err(ConfigError::weights("surrounding.rand_turn_speed_weights"))?;
            Some(choice)
        } else {
            None
        };
        Ok(Self { config, rand_speeds })
    }

    /// `None` when nothing is around.
    pub fn evaluate<R: Rng>(&self, snap: &SensorSnapshot, rng: &mut R) -> Option<ActionSequence> {
        let code = surrounding_code(self.config, snap);
        if code.is_empty() {
            return None;
        }
        debug!(?code, "surrounding");
        let s = &self.config.surrounding;

        let seq = match (code.front, code.left, code.right, code.behind) {
            (Some(entity), ..) => self.engage(entity, rng),
            (None, true, false, false) => self.face(TurnDirection::Left, s.turn_speed, s.half_turn_duration, rng),
            (None, false, true, false) => self.face(TurnDirection::Right, s.turn_speed, s.half_turn_duration, rng),
            (None, true, true, false) => {
                let dir = TurnDirection::draw(rng, s.turn_left_prob);
                self.face(dir, s.turn_speed, s.half_turn_duration, rng)
            }
            (None, false, false, true) | (None, true, true, true) => {
                let dir = TurnDirection::draw(rng, s.turn_left_prob);
                self.face(dir, s.turn_speed, s.full_turn_duration, rng)
            }
            (None, true, false, true) => {
                let speed = self.trailing_speed(rng);
                self.face(TurnDirection::Left, speed, s.full_turn_duration, rng)
            }
            (None, false, true, true) => {
                let speed = self.trailing_speed(rng);
                self.face(TurnDirection::Right, speed, s.full_turn_duration, rng)
            }
            (None, false, false, false) => return None,
        };
        Some(seq)
    }

    /// Attack or back off from the front entity, then turn away.
    fn engage<R: Rng>(&self, entity: FrontEntity, rng: &mut R) -> ActionSequence {
        let s = &self.config.surrounding;
        let fractions = &self.config.perf.checkpoint_fractions;
        let mut seq = ActionSequence::new();

        let attack = |speed: i32, duration: f64| {
            Action::straight(ActionKind::Attack, speed, secs(duration)).watch(AbortCondition::AttackLost, fractions)
        };
        let back_off = |speed: i32, duration: f64| {
            Action::straight(ActionKind::Fallback, -speed, secs(duration)).watch(AbortCondition::RearEdge, fractions)
        };

        match entity {
            FrontEntity::EnemyCar => seq.push(attack(s.atk_speed_enemy_car, s.atk_enemy_car_duration)),
            FrontEntity::EnemyBox => seq.push(attack(s.atk_speed_enemy_box, s.atk_enemy_box_duration)),
            FrontEntity::NeutralBox => seq.push(attack(s.atk_speed_neutral_box, s.atk_neutral_box_duration)),
            FrontEntity::AllyBox => seq.push(back_off(s.fallback_speed_ally_box, s.fallback_duration_ally_box)),
            FrontEntity::EdgeAdjacent => {}
        }
        if entity != FrontEntity::AllyBox {
            seq.push(back_off(s.fallback_speed_edge, s.fallback_duration_edge));
        }
        let direction = TurnDirection::draw(rng, s.turn_left_prob);
        let speed = self.trailing_speed(rng);
        seq.push(self.turn(direction, speed, s.full_turn_duration));
        seq
    }

    /// Turn toward a side object, then go after it as the enemy car.
    fn face<R: Rng>(&self, direction: TurnDirection, speed: i32, duration: f64, rng: &mut R) -> ActionSequence {
        let mut seq = ActionSequence::new().then(self.turn(direction, speed, duration));
        seq.extend(self.engage(FrontEntity::EnemyCar, rng));
        seq
    }

    fn turn(&self, direction: TurnDirection, speed: i32, duration: f64) -> Action {
        let s = &self.config.surrounding;
        Action::turn(direction, speed, secs(duration)).watch_if(
            s.turn_to_front_use_front_sensor,
            AbortCondition::FrontAcquired,
            &self.config.perf.checkpoint_fractions,
        )
    }

    fn trailing_speed<R: Rng>(&self, rng: &mut R) -> i32 {
        match &self.rand_speeds {
            Some(choice) => *choice.pick(rng),
            None => self.config.surrounding.turn_speed,
        }
    }
}
