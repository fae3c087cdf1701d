//! 模拟控制器与模拟相机
//!
//! `SimController` 按行解析运动指令并维护当前位置：每条运动指令之后的前
//! `run_polls` 次状态查询报告 `Run`，之后报告 `Idle`。
//! `SimCamera` 在拍摄时写入占位文件并记录当时的控制器位置。

#![allow(dead_code)]

use slider_control::{CaptureDevice, CaptureError};
use slider_serial::mock::{MockReply, MockSerial};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SimState {
    position: [f64; 3],
    busy_polls: u32,
    run_polls: u32,
    reject: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SimController {
    state: Arc<Mutex<SimState>>,
}

impl SimController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每条运动指令之后报告 `Run` 的查询次数
    pub fn run_polls(self, polls: u32) -> Self {
        self.state.lock().unwrap().run_polls = polls;
        self
    }

    /// 包含 `pattern` 的指令应答 `error:20`
    pub fn reject_containing(self, pattern: &str) -> Self {
        self.state.lock().unwrap().reject = Some(pattern.to_string());
        self
    }

    pub fn position(&self) -> [f64; 3] {
        self.state.lock().unwrap().position
    }

    pub fn serial(&self) -> MockSerial {
        let state = self.state.clone();
        MockSerial::new(move |line| respond(&mut state.lock().unwrap(), line))
            .with_banner("\r\nGrbl 1.1h ['$' for help]\r\n")
    }
}

fn respond(state: &mut SimState, line: &str) -> MockReply {
    if line == "?" {
        let [x, y, z] = state.position;
        let status = if state.busy_polls > 0 {
            state.busy_polls -= 1;
            "Run"
        } else {
            "Idle"
        };
        return MockReply::text(&format!("<{}|MPos:{:.3},{:.3},{:.3}|FS:0,0>\r\n", status, x, y, z));
    }

    if let Some(pattern) = &state.reject
        && line.contains(pattern.as_str())
    {
        return MockReply::text("error:20\r\n");
    }

    if line.starts_with("G1 ") {
        let mut moved = false;
        for token in line.split_whitespace().skip(1) {
            let (axis, value) = token.split_at(1);
            let index = match axis {
                "X" => 0,
                "Y" => 1,
                "Z" => 2,
                _ => continue,
            };
            state.position[index] = value.parse().unwrap();
            moved = true;
        }
        if moved {
            state.busy_polls = state.run_polls;
        }
    }

    // 回显 + ok，和真实控制器在回显打开时的行为一致
    MockReply::text(&format!("{}ok\r\n", line))
}

/// 一次拍摄记录
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub path: PathBuf,
    pub position: [f64; 3],
}

pub struct SimCamera {
    controller: SimController,
    shots: Arc<Mutex<Vec<Shot>>>,
    closes: Arc<Mutex<usize>>,
    write_file: bool,
}

impl SimCamera {
    pub fn new(controller: &SimController) -> Self {
        Self {
            controller: controller.clone(),
            shots: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(Mutex::new(0)),
            write_file: true,
        }
    }

    /// 模拟拍摄成功但没有产出文件
    pub fn without_output(mut self) -> Self {
        self.write_file = false;
        self
    }

    pub fn log(&self) -> CameraLog {
        CameraLog {
            shots: self.shots.clone(),
            closes: self.closes.clone(),
        }
    }
}

impl CaptureDevice for SimCamera {
    fn name(&self) -> &str {
        "sim"
    }

    fn capture(&mut self, output: &Path) -> Result<(), CaptureError> {
        if self.write_file {
            fs::write(output, b"jpeg").unwrap();
        }
        self.shots.lock().unwrap().push(Shot {
            path: output.to_path_buf(),
            position: self.controller.position(),
        });
        Ok(())
    }

    fn close(&mut self) {
        *self.closes.lock().unwrap() += 1;
    }
}

#[derive(Clone)]
pub struct CameraLog {
    shots: Arc<Mutex<Vec<Shot>>>,
    closes: Arc<Mutex<usize>>,
}

impl CameraLog {
    pub fn shots(&self) -> Vec<Shot> {
        self.shots.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}
