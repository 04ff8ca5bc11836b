//! Sensor predicates shared by the behaviors and the abort conditions
//! evaluated at action checkpoints.

use serde::Serialize;

use crate::action::AbortCondition;
use crate::config::RunConfig;
use crate::sensors::{Direction, EdgeCorner, SensorSnapshot};

/// Why an action was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbortCause {
    /// An edge channel left its band.
    Edge,
    /// The gray channels say the robot is leaving the stage.
    OffStage,
    /// A proximity channel moved past its scan tolerance.
    Deviation(Direction),
    /// The watched condition was satisfied.
    Met,
}

// ============================================================================
// Predicates
// ============================================================================

/// Edge channel outside its configured band. Front corners also trigger on
/// the shovel gray IO when enabled. Missing channels never trigger.
pub fn edge_triggered(cfg: &RunConfig, snap: &SensorSnapshot, corner: EdgeCorner) -> bool {
    let i = corner.index();
    let adc = match (snap.edge_at(corner), cfg.edge.lower_threshold.get(i), cfg.edge.upper_threshold.get(i)) {
        (Some(v), Some(lo), Some(hi)) => v < *lo || v > *hi,
        _ => false,
    };
    if adc || !cfg.edge.use_gray_io {
        return adc;
    }
    let off = Some(cfg.stage.gray_io_off_stage_case_value);
    match corner {
        EdgeCorner::FrontLeft => snap.io.gray_left == off,
        EdgeCorner::FrontRight => snap.io.gray_right == off,
        _ => false,
    }
}

pub fn front_edge_triggered(cfg: &RunConfig, snap: &SensorSnapshot) -> bool {
    edge_triggered(cfg, snap, EdgeCorner::FrontLeft) || edge_triggered(cfg, snap, EdgeCorner::FrontRight)
}

pub fn rear_edge_triggered(cfg: &RunConfig, snap: &SensorSnapshot) -> bool {
    edge_triggered(cfg, snap, EdgeCorner::RearLeft) || edge_triggered(cfg, snap, EdgeCorner::RearRight)
}

fn below(reading: Option<u16>, threshold: u16) -> bool {
    matches!(reading, Some(v) if v < threshold)
}

/// Something in front: either front IO corner fires or the front ADC is
/// below its threshold.
pub fn front_encountered(cfg: &RunConfig, snap: &SensorSnapshot) -> bool {
    let s = &cfg.surrounding;
    let hit = Some(s.io_encounter_object_value);
    snap.io.front_left == hit
        || snap.io.front_right == hit
        || below(snap.proximity_at(Direction::Front), s.front_adc_lower_threshold)
}

pub fn side_encountered(cfg: &RunConfig, snap: &SensorSnapshot, direction: Direction) -> bool {
    let s = &cfg.surrounding;
    let hit = Some(s.io_encounter_object_value);
    match direction {
        Direction::Front => front_encountered(cfg, snap),
        Direction::Rear => {
            snap.io.rear_left == hit
                || snap.io.rear_right == hit
                || below(snap.proximity_at(Direction::Rear), s.back_adc_lower_threshold)
        }
        Direction::Left => below(snap.proximity_at(Direction::Left), s.left_adc_lower_threshold),
        Direction::Right => below(snap.proximity_at(Direction::Right), s.right_adc_lower_threshold),
    }
}

/// Fence close in `direction` by its proximity ADC.
pub fn fence_blocked(cfg: &RunConfig, snap: &SensorSnapshot, direction: Direction) -> bool {
    let f = &cfg.fence;
    let threshold = match direction {
        Direction::Front => f.front_adc_lower_threshold,
        Direction::Rear => f.rear_adc_lower_threshold,
        Direction::Left => f.left_adc_lower_threshold,
        Direction::Right => f.right_adc_lower_threshold,
    };
    below(snap.proximity_at(direction), threshold)
}

pub fn front_io_pair_on_fence(cfg: &RunConfig, snap: &SensorSnapshot) -> bool {
    let v = Some(cfg.fence.io_encounter_fence_value);
    snap.io.front_left == v && snap.io.front_right == v
}

pub fn rear_io_pair_on_fence(cfg: &RunConfig, snap: &SensorSnapshot) -> bool {
    let v = Some(cfg.fence.io_encounter_fence_value);
    snap.io.rear_left == v && snap.io.rear_right == v
}

/// Yaw within `tolerance` degrees of a multiple of 90.
pub fn yaw_square(yaw: f32, tolerance: f64) -> bool {
    let m = (yaw as f64).rem_euclid(90.0);
    m.min(90.0 - m) <= tolerance
}

// ============================================================================
// Abort conditions
// ============================================================================

/// Evaluates [`AbortCondition`]s against a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Breakers<'a> {
    config: &'a RunConfig,
}

impl<'a> Breakers<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    pub fn check(&self, condition: &AbortCondition, snap: &SensorSnapshot) -> Option<AbortCause> {
        let cfg = self.config;
        match condition {
            AbortCondition::RearEdge => rear_edge_triggered(cfg, snap).then_some(AbortCause::Edge),
            AbortCondition::FrontEdge => front_edge_triggered(cfg, snap).then_some(AbortCause::Edge),
            AbortCondition::AttackLost => self.attack_lost(snap),
            AbortCondition::FrontAcquired => front_encountered(cfg, snap).then_some(AbortCause::Met),
            AbortCondition::ScanDeviation { baseline } => self.scan_deviation(baseline, snap),
            AbortCondition::StageAligned => self.stage_aligned(snap).then_some(AbortCause::Met),
            AbortCondition::DirectionAligned => self.direction_aligned(snap).then_some(AbortCause::Met),
            AbortCondition::OnStage => matches!(
                snap.gray_adc,
                Some(v) if v >= cfg.stage.gray_adc_on_stage_lower_threshold
            )
            .then_some(AbortCause::Met),
            AbortCondition::SideAway => {
                let limit = cfg.backstage.side_away_degree_tolerance.to_radians().cos();
                matches!(snap.accel_z, Some(z) if (z as f64) < limit).then_some(AbortCause::Met)
            }
        }
    }

    fn attack_lost(&self, snap: &SensorSnapshot) -> Option<AbortCause> {
        let cfg = self.config;
        let off = Some(cfg.stage.gray_io_off_stage_case_value);
        if snap.io.gray_left == off || snap.io.gray_right == off {
            return Some(AbortCause::OffStage);
        }
        if cfg.surrounding.atk_break_use_edge_sensors && front_edge_triggered(cfg, snap) {
            return Some(AbortCause::Edge);
        }
        match snap.proximity_at(Direction::Front) {
            Some(v) if v > cfg.surrounding.atk_break_front_lower_threshold => Some(AbortCause::Met),
            _ => None,
        }
    }

    /// Edge first, then the gray ADC, then per-direction tolerance.
    fn scan_deviation(&self, baseline: &[Option<u16>; 4], snap: &SensorSnapshot) -> Option<AbortCause> {
        let cfg = self.config;
        let scan = &cfg.search.scan_move;
        if scan.check_edge_before_scan && EdgeCorner::ALL.iter().any(|c| edge_triggered(cfg, snap, *c)) {
            return Some(AbortCause::Edge);
        }
        if scan.check_gray_adc_before_scan && below(snap.gray_adc, scan.gray_adc_lower_threshold) {
            return Some(AbortCause::OffStage);
        }
        let hit = Some(scan.io_encounter_object_value);
        for direction in Direction::ALL {
            let tolerance = match direction {
                Direction::Front => scan.front_max_tolerance,
                Direction::Rear => scan.rear_max_tolerance,
                Direction::Left => scan.left_max_tolerance,
                Direction::Right => scan.right_max_tolerance,
            };
            let drifted = match (baseline[direction.index()], snap.proximity_at(direction)) {
                (Some(base), Some(now)) => now.abs_diff(base) > tolerance,
                _ => false,
            };
            let io = match direction {
                Direction::Front => snap.io.front_left == hit || snap.io.front_right == hit,
                Direction::Rear => snap.io.rear_left == hit || snap.io.rear_right == hit,
                _ => false,
            };
            if drifted || io {
                return Some(AbortCause::Deviation(direction));
            }
        }
        None
    }

    /// Either front IO bit on the fence; without yaw, no rear bit may be.
    fn stage_aligned(&self, snap: &SensorSnapshot) -> bool {
        let cfg = self.config;
        let v = Some(cfg.fence.io_encounter_fence_value);
        let io = &snap.io;
        let front = io.front_left == v || io.front_right == v;
        if cfg.fence.use_mpu_align_stage {
            if let Some(yaw) = snap.yaw {
                return front && yaw_square(yaw, cfg.fence.max_yaw_tolerance);
            }
        }
        front && io.rear_left != v && io.rear_right != v
    }

    fn direction_aligned(&self, snap: &SensorSnapshot) -> bool {
        let cfg = self.config;
        if cfg.fence.use_mpu_align_direction {
            if let Some(yaw) = snap.yaw {
                return yaw_square(yaw, cfg.fence.max_yaw_tolerance);
            }
        }
        Direction::ALL.iter().filter(|d| fence_blocked(cfg, snap, **d)).count() == 2
    }
}
