//! Whole-loop scenarios on the simulated clock.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::action::ActionKind;
use crate::config::{secs, RunConfig, RunMode, StrategyConfig};
use crate::error::RunError;
use crate::motion::WheelSpeeds;
use crate::sensors::{Direction, EdgeCorner, IoBits, SensorSnapshot};
use crate::sim::{ManualClock, RecordingMotion, ScriptedSensors};

use super::breakers::AbortCause;
use super::control::ControlLoop;
use super::stage::StageState;
use super::strategy::{Behavior, StrategyState};

type SimLoop<'a> = ControlLoop<'a, ScriptedSensors, RecordingMotion, ManualClock, ChaCha8Rng>;

fn quiet() -> SensorSnapshot {
    SensorSnapshot::default().with_all_edges(2000).with_all_proximity(3000).with_gray(3500)
}

fn button(snap: SensorSnapshot, value: Option<u8>) -> SensorSnapshot {
    let io = IoBits { reboot_button: value, ..snap.io };
    snap.with_io(io)
}

fn sim_loop<'a>(cfg: &'a RunConfig, build: impl FnOnce(ScriptedSensors) -> ScriptedSensors, seed: u64) -> SimLoop<'a> {
    let clock = ManualClock::new();
    let sensors = build(ScriptedSensors::new(clock.clone()));
    let motion = RecordingMotion::new(clock.clone());
    ControlLoop::new(cfg, sensors, motion, clock, ChaCha8Rng::seed_from_u64(seed)).unwrap()
}

fn scan_only_on_stage() -> RunConfig {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::OnStageStart;
    cfg.search.use_gradient_move = false;
    cfg.search.use_rand_turn = false;
    cfg
}

#[test]
fn test_quiet_stage_runs_full_scan_then_fallback_and_turn() {
    let cfg = scan_only_on_stage();
    let scan = &cfg.search.scan_move;
    for seed in 0..10 {
        let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, quiet()), seed);
        let report = lp.step().unwrap();

        assert_eq!(report.stage, StageState::OnStage);
        assert_eq!(report.behavior, Some(Behavior::Search));
        assert_eq!(report.sequence.kinds(), vec![ActionKind::Scan, ActionKind::Fallback, ActionKind::Turn]);

        let exec = &report.execution.actions;
        assert_eq!(exec[0].elapsed, secs(scan.scan_duration));
        assert_eq!(exec[0].aborted, None);
        assert_eq!(exec[1].elapsed, secs(scan.fall_back_duration));
        let turn = exec[2].elapsed;
        assert!(turn == secs(scan.full_turn_duration) || turn == secs(scan.half_turn_duration));
    }
}

#[test]
fn test_scan_aborts_on_front_deviation_and_still_falls_back() {
    let cfg = scan_only_on_stage();
    let scan = &cfg.search.scan_move;
    let mut lp = sim_loop(
        &cfg,
        |s| {
            s.at(Duration::ZERO, quiet())
                .at(Duration::from_millis(1000), quiet().with_proximity(Direction::Front, 1500))
        },
        3,
    );
    let report = lp.step().unwrap();
    let exec = &report.execution.actions;

    assert_eq!(exec[0].kind, ActionKind::Scan);
    assert_eq!(exec[0].aborted, Some(AbortCause::Deviation(Direction::Front)));
    assert!(exec[0].elapsed < secs(scan.scan_duration));
    // first checkpoint after the change: a quarter into the scan
    assert_eq!(exec[0].elapsed, Duration::from_millis(1125));
    assert_eq!(exec[1].kind, ActionKind::Fallback);
    assert_eq!(exec[1].elapsed, secs(scan.fall_back_duration));
}

#[test]
fn test_boot_timeout_issues_no_dash() {
    let mut cfg = RunConfig::default();
    cfg.boot.max_holding_duration = 1.0;
    let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, quiet()), 0);

    let err = lp.step().unwrap_err();
    assert!(matches!(err, RunError::BootTimeout(_)));
    assert!(err.is_operator_facing());
    assert!(lp.is_halted());
    let dash = WheelSpeeds::straight(cfg.boot.dash_speed);
    assert!(!lp.motion().speeds().contains(&dash));
    assert_eq!(lp.motion().speeds(), vec![WheelSpeeds::STOP]);
}

#[test]
fn test_boot_runs_once_then_normal() {
    let mut cfg = RunConfig::default();
    cfg.search.use_gradient_move = false;
    cfg.search.use_scan_move = false;
    let mut lp = sim_loop(
        &cfg,
        |s| {
            s.at(Duration::ZERO, quiet())
                .at(Duration::from_millis(100), button(quiet(), Some(0)))
                .at(Duration::from_millis(300), button(quiet(), Some(1)))
        },
        1,
    );

    let boot = lp.step().unwrap();
    assert_eq!(boot.behavior, Some(Behavior::Boot));
    assert_eq!(boot.sequence.kinds(), vec![ActionKind::Stabilize, ActionKind::Dash, ActionKind::Turn]);
    assert!(lp.motion().speeds().contains(&WheelSpeeds::straight(cfg.boot.dash_speed)));

    for _ in 0..5 {
        let report = lp.step().unwrap();
        assert_ne!(report.behavior, Some(Behavior::Boot));
        assert_eq!(lp.state(), StrategyState::Normal);
    }
}

#[test]
fn test_edge_front_priority_end_to_end() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::AlwaysOnStage;
    let snap = quiet().with_edge(EdgeCorner::FrontRight, 100).with_edge(EdgeCorner::RearLeft, 100);
    for seed in 0..10 {
        let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, snap.clone()), seed);
        let report = lp.step().unwrap();
        assert_eq!(report.behavior, Some(Behavior::Edge));
        let first = lp.motion().commands()[0];
        assert_eq!(first.speeds, WheelSpeeds::straight(-cfg.edge.fallback_speed));
        // the rear edge is still out of band at the first checkpoint
        assert_eq!(report.execution.actions[0].aborted, Some(AbortCause::Edge));
    }
}

#[test]
fn test_fence_alignment_is_time_boxed_when_yaw_never_converges() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::AlwaysOnStage;
    cfg.fence.use_mpu_align_stage = true;
    cfg.fence.use_mpu_align_direction = true;
    let trapped = quiet().with_all_proximity(400).with_yaw(45.0);
    let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, trapped.clone()), 2);

    let budget = secs(cfg.fence.max_stage_align_duration);
    let mut stage_align_total = Duration::ZERO;
    for cycle in 0..4 {
        let report = lp.step().unwrap();
        assert_eq!(report.behavior, Some(Behavior::Fence));
        let first = &report.execution.actions[0];
        match cycle {
            0 => {
                assert_eq!(first.kind, ActionKind::Align);
                assert_eq!(first.elapsed, budget);
                assert_eq!(first.aborted, None);
                stage_align_total += first.elapsed;
            }
            1 | 3 => assert_eq!(first.kind, ActionKind::ExitCorner),
            _ => {
                // budget spent: only the direction alignment remains
                assert_eq!(report.sequence.len(), 1);
                assert_eq!(first.planned, secs(cfg.fence.max_direction_align_duration));
            }
        }
    }
    assert!(stage_align_total <= budget);
}

#[test]
fn test_fence_exit_uses_post_alignment_reading() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::AlwaysOnStage;
    cfg.fence.use_mpu_align_stage = false;
    cfg.fence.use_mpu_align_direction = false;
    let trapped = quiet().with_all_proximity(400);
    let turned_out = trapped.clone().with_proximity(Direction::Front, 3000);
    let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, trapped).at(Duration::from_secs(4), turned_out), 5);

    let align = lp.step().unwrap();
    assert!(align.sequence.actions.iter().all(|a| a.kind == ActionKind::Align));

    let escape = lp.step().unwrap();
    assert_eq!(escape.behavior, Some(Behavior::Fence));
    assert_eq!(escape.sequence.actions[0].kind, ActionKind::ExitCorner);
    assert_eq!(escape.sequence.actions[0].speeds, WheelSpeeds::straight(cfg.fence.exit_corner_speed));
    assert!(lp.motion().speeds().contains(&WheelSpeeds::straight(cfg.fence.exit_corner_speed)));
}

#[test]
fn test_fence_stage_align_stops_on_square_yaw() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::AlwaysOnStage;
    cfg.fence.use_mpu_align_stage = true;
    let on_fence = IoBits { front_left: Some(0), front_right: Some(0), ..IoBits::default() };
    let trapped = quiet().with_all_proximity(400).with_io(on_fence);
    let mut lp = sim_loop(
        &cfg,
        |s| {
            s.at(Duration::ZERO, trapped.clone().with_yaw(45.0))
                .at(Duration::from_millis(1500), trapped.with_yaw(88.0))
        },
        2,
    );
    let report = lp.step().unwrap();
    let first = &report.execution.actions[0];
    assert_eq!(first.aborted, Some(AbortCause::Met));
    assert!(first.elapsed < secs(cfg.fence.max_stage_align_duration));
}

#[test]
fn test_same_seed_same_run() {
    let cfg = RunConfig {
        strategy: StrategyConfig { mode: RunMode::OnStageStart, ..Default::default() },
        ..Default::default()
    };
    let script = |s: ScriptedSensors| {
        s.at(Duration::ZERO, quiet())
            .at(Duration::from_secs(2), quiet().with_proximity(Direction::Left, 600))
            .at(Duration::from_secs(4), quiet())
    };
    let collect = |seed| {
        let mut lp = sim_loop(&cfg, script, seed);
        let mut out = Vec::new();
        lp.run(Some(30), |r| out.push(serde_json::to_string(r).unwrap())).unwrap();
        out
    };
    assert_eq!(collect(17), collect(17));
}

#[test]
fn test_degraded_snapshot_is_not_fatal() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::OnStageStart;
    let mut degraded = SensorSnapshot::default();
    degraded.yaw = Some(f32::NAN);
    degraded.accel_z = Some(f32::INFINITY);
    let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, degraded), 0);

    let report = lp.step().unwrap();
    assert_eq!(report.stage, StageState::Unclear);
    assert_eq!(report.behavior, Some(Behavior::Search));
}

#[test]
fn test_motion_failure_aborts_run() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::AlwaysOnStage;
    let clock = ManualClock::new();
    let sensors = ScriptedSensors::new(clock.clone()).at(Duration::ZERO, quiet());
    let motion = RecordingMotion::new(clock.clone()).fail_after(0);
    let mut lp = ControlLoop::new(&cfg, sensors, motion, clock, ChaCha8Rng::seed_from_u64(0)).unwrap();
    let err = lp.run(Some(3), |_| {}).unwrap_err();
    assert!(matches!(err, RunError::Motion(_)));
    assert!(lp.is_halted());
    assert!(lp.motion().commands().is_empty());
}

#[test]
fn test_dash_loop_sprints_every_cycle() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::OffStageDashLoop;
    let mut lp = sim_loop(&cfg, |s| s.at(Duration::ZERO, button(quiet(), Some(0))), 4);

    let mut reports = Vec::new();
    lp.run(Some(3), |r| reports.push(r.sequence.kinds())).unwrap();
    assert_eq!(reports.len(), 3);
    for kinds in reports {
        assert_eq!(kinds, vec![ActionKind::Stabilize, ActionKind::Dash, ActionKind::Turn]);
    }
    assert_eq!(lp.state(), StrategyState::Boot);
    let dash = WheelSpeeds::straight(cfg.boot.dash_speed);
    assert_eq!(lp.motion().speeds().iter().filter(|s| **s == dash).count(), 3);
}

#[test]
fn test_dash_loop_waits_for_the_button_each_time() {
    let mut cfg = RunConfig::default();
    cfg.strategy.mode = RunMode::OffStageDashLoop;
    cfg.boot.max_holding_duration = 1.0;
    let mut lp = sim_loop(
        &cfg,
        |s| s.at(Duration::ZERO, button(quiet(), Some(0))).at(Duration::from_millis(10), button(quiet(), Some(1))),
        4,
    );

    assert_eq!(lp.step().unwrap().behavior, Some(Behavior::Boot));
    assert!(matches!(lp.step(), Err(RunError::BootTimeout(_))));
    assert!(lp.is_halted());
}
