//! 模式执行端到端场景
//!
//! 使用模拟控制器（串口 mock）与模拟相机，验证指令顺序、拍摄位置与资源释放。

mod common;

use common::{SimCamera, SimController};
use slider_control::*;
use slider_driver::{CancelToken, LinkBuilder, LinkError};
use slider_protocol::{Position, ProtocolError};
use slider_serial::mock::MockHandle;
use std::path::Path;
use std::time::Duration;

const SETUP: [&str; 4] = ["G90", "G21", "G10 P0 L20 X0 Y0 Z0", "G1 F1000"];

struct Harness {
    ctx: ExecutionContext<slider_serial::mock::MockSerial, SimCamera>,
    serial: MockHandle,
    camera: common::CameraLog,
}

fn harness(controller: &SimController, camera: SimCamera, cancel: CancelToken) -> Harness {
    let serial = controller.serial();
    let serial_handle = serial.handle();
    let link = LinkBuilder::new()
        .settle(Duration::ZERO)
        .build_with(serial)
        .unwrap();

    let camera_log = camera.log();
    let capture = CaptureCoordinator::new(camera, FilenameAllocator::new(".jpg"), CaptureTiming::ZERO);

    Harness {
        ctx: ExecutionContext::new(link, Some(capture), cancel),
        serial: serial_handle,
        camera: camera_log,
    }
}

fn config(dir: &Path) -> ExecutorConfig {
    ExecutorConfig {
        capture_dir: dir.to_path_buf(),
        ..ExecutorConfig::default()
    }
}

/// 去掉状态查询后的指令序列
fn commands(handle: &MockHandle) -> Vec<String> {
    handle.written().into_iter().filter(|l| l != "?").collect()
}

fn sorted_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_interval_three_shots() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new().run_polls(2);
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let request = ModeRequest::new(Position::new(10.0, 0.0, 0.0)).shutter_count(3);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();

    let mut executor = ModeExecutor::new(config(dir.path()));
    let summary = executor.run(&mut h.ctx, ShootingMode::Interval, &plan).unwrap();

    assert_eq!(executor.state(), ExecState::Done);
    assert_eq!(summary.steps, 3);
    assert!(summary.homed);
    assert_eq!(summary.captures.len(), 3);

    let mut expected: Vec<String> = SETUP.iter().map(|s| s.to_string()).collect();
    expected.extend([
        "G1 X0.000 Y0.000 Z0.000 F500".to_string(),
        "G1 X5.000 Y0.000 Z0.000 F500".to_string(),
        "G1 X10.000 Y0.000 Z0.000 F500".to_string(),
        "G1 X0.000 Y0.000 Z0.000".to_string(),
    ]);
    assert_eq!(commands(&h.serial), expected);

    let xs: Vec<f64> = h.camera.shots().iter().map(|s| s.position[0]).collect();
    assert_eq!(xs, vec![0.0, 5.0, 10.0]);
    assert_eq!(sorted_files(dir.path()), vec!["0000.jpg", "0001.jpg", "0002.jpg"]);

    assert_eq!(controller.position(), [0.0, 0.0, 0.0]);
    assert_eq!(h.serial.close_count(), 1);
    assert_eq!(h.camera.close_count(), 1);
}

#[test]
fn test_no_move_before_idle() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new().run_polls(3);
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let request = ModeRequest::new(Position::new(4.0, 0.0, 0.0)).shutter_count(2);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();
    ModeExecutor::new(config(dir.path()))
        .run(&mut h.ctx, ShootingMode::Interval, &plan)
        .unwrap();

    // 每条运动指令之后恰好是 3 次 Run + 1 次 Idle 的查询，然后才有下一条指令
    let written = h.serial.written();
    for (i, line) in written.iter().enumerate() {
        if line.starts_with("G1 X") {
            assert_eq!(&written[i + 1..i + 5], ["?", "?", "?", "?"], "after {}", line);
        }
    }
}

#[test]
fn test_macro_four_by_two() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new().run_polls(1);
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let request = ModeRequest::new(Position::new(6.0, 0.0, 0.0))
        .stack_count(4)
        .shutter_count(2);
    let plan = SequencePlanner::plan(ShootingMode::Macro, &request).unwrap();

    let summary = ModeExecutor::new(config(dir.path()))
        .run(&mut h.ctx, ShootingMode::Macro, &plan)
        .unwrap();

    assert_eq!(summary.captures.len(), 8);
    assert!(summary.homed);
    assert_eq!(sorted_files(dir.path()), vec!["stack_0", "stack_1"]);

    for stack in ["stack_0", "stack_1"] {
        let stack_dir = dir.path().join(stack);
        assert_eq!(
            sorted_files(&stack_dir),
            vec!["0000.jpg", "0001.jpg", "0002.jpg", "0003.jpg"]
        );

        let xs: Vec<f64> = h
            .camera
            .shots()
            .iter()
            .filter(|s| s.path.parent() == Some(stack_dir.as_path()))
            .map(|s| s.position[0])
            .collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, 6.0]);
    }
}

#[test]
fn test_disable_sends_single_command() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new();
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let mut executor = ModeExecutor::new(config(dir.path()));
    let summary = executor.run(&mut h.ctx, ShootingMode::Disable, &Plan::empty()).unwrap();

    assert_eq!(executor.state(), ExecState::Done);
    assert_eq!(summary.steps, 0);
    assert_eq!(h.serial.written(), vec!["$X"]);
    assert!(h.camera.shots().is_empty());
    assert!(sorted_files(dir.path()).is_empty());
    assert_eq!(h.serial.close_count(), 1);
}

#[test]
fn test_non_ok_move_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new().reject_containing("X5.000");
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let request = ModeRequest::new(Position::new(10.0, 0.0, 0.0)).shutter_count(3);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();

    let mut executor = ModeExecutor::new(config(dir.path()));
    let err = executor
        .run(&mut h.ctx, ShootingMode::Interval, &plan)
        .unwrap_err();

    match err {
        ExecError::Link(LinkError::Protocol(ProtocolError::NotOk { command, response })) => {
            assert_eq!(command, "G1 X5.000 Y0.000 Z0.000 F500");
            assert_eq!(response, "error20");
        },
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(executor.state(), ExecState::Aborted);

    // 被拒绝的指令是最后一条，之后只有释放
    assert_eq!(
        h.serial.written().last().map(String::as_str),
        Some("G1 X5.000 Y0.000 Z0.000 F500")
    );
    assert_eq!(h.camera.shots().len(), 1);
    assert_eq!(h.serial.close_count(), 1);
    assert_eq!(h.camera.close_count(), 1);
}

#[test]
fn test_missing_capture_output_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new();
    let camera = SimCamera::new(&controller).without_output();
    let mut h = harness(&controller, camera, CancelToken::new());

    let request = ModeRequest::new(Position::new(10.0, 0.0, 0.0)).shutter_count(3);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();

    let err = ModeExecutor::new(config(dir.path()))
        .run(&mut h.ctx, ShootingMode::Interval, &plan)
        .unwrap_err();

    assert!(matches!(err, ExecError::Capture(CaptureError::MissingOutputFile { .. })));
    // 第一步之后就中止：没有第二条运动指令，也没有回原点
    let moves: Vec<String> = commands(&h.serial)
        .into_iter()
        .filter(|l| l.starts_with("G1 X"))
        .collect();
    assert_eq!(moves, vec!["G1 X0.000 Y0.000 Z0.000 F500"]);
    assert_eq!(h.serial.close_count(), 1);
}

#[test]
fn test_cancelled_run_releases_resources() {
    let dir = tempfile::tempdir().unwrap();
    let controller = SimController::new();
    let cancel = CancelToken::new();
    let mut h = harness(&controller, SimCamera::new(&controller), cancel.clone());
    cancel.cancel();

    let request = ModeRequest::new(Position::new(10.0, 0.0, 0.0)).shutter_count(3);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();

    let err = ModeExecutor::new(config(dir.path()))
        .run(&mut h.ctx, ShootingMode::Interval, &plan)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(commands(&h.serial), SETUP);
    assert_eq!(h.serial.close_count(), 1);
    assert_eq!(h.camera.close_count(), 1);
}

#[test]
fn test_named_capture_directory_is_created() {
    let base = tempfile::tempdir().unwrap();
    let capture_dir = base.path().join("sunset").join("take_1");
    let controller = SimController::new();
    let mut h = harness(&controller, SimCamera::new(&controller), CancelToken::new());

    let request = ModeRequest::new(Position::new(0.0, 0.0, 3.0)).shutter_count(2);
    let plan = SequencePlanner::plan(ShootingMode::Interval, &request).unwrap();

    ModeExecutor::new(config(&capture_dir))
        .run(&mut h.ctx, ShootingMode::Interval, &plan)
        .unwrap();

    assert_eq!(sorted_files(&capture_dir), vec!["0000.jpg", "0001.jpg"]);
}
