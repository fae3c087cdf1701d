//! 模式执行器
//!
//! 顶层编排状态机：
//!
//! ```text
//! Setup → Running(step_index) → Homing → Done
//!   │            │                │
//!   └────────────┴────────────────┴──→ Aborted
//! ```
//!
//! 每个运动步严格按 `移动 → 等待 Idle → 拍摄` 执行，上一步确认空闲之前不会发出下一步，
//! 因此控制器的运动缓冲与拍摄动作永远不会和进行中的移动重叠。
//! 无论 `Done` 还是 `Aborted`，执行上下文都会被释放恰好一次。

use crate::capture::{CaptureDevice, CaptureError};
use crate::context::ExecutionContext;
use crate::mode::ShootingMode;
use crate::plan::{DEFAULT_FEED_RATE, Plan};
use slider_driver::{LinkError, PollConfig, StatusPoller};
use slider_protocol::{GcodeCommand, Step, setup_sequence};
use slider_serial::SerialAdapter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Creating directory {} failed: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Mode '{0}' captures images but no capture device is configured")]
    MissingCaptureDevice(ShootingMode),

    #[error("Mode '{0}' captures images but the plan is empty")]
    EmptyPlan(ShootingMode),
}

impl ExecError {
    /// 是否由外部取消引起
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ExecError::Link(LinkError::Cancelled) | ExecError::Capture(CaptureError::Cancelled)
        )
    }
}

/// 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecState {
    #[default]
    Setup,
    Running {
        step_index: usize,
    },
    Homing,
    Done,
    Aborted,
}

/// 执行器配置
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// 启动配置序列中的默认进给速度
    pub setup_feed_rate: u32,
    /// 拍摄目录（焦点堆栈的子目录建在其下）
    pub capture_dir: PathBuf,
    /// wait 模式的暂停时长
    pub wait: Duration,
    pub poll: PollConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            setup_feed_rate: DEFAULT_FEED_RATE,
            capture_dir: PathBuf::from("/home/pi/storage"),
            wait: Duration::from_secs(10),
            poll: PollConfig::default(),
        }
    }
}

/// 运行结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: ShootingMode,
    /// 已确认空闲的运动步数（不含回原点）
    pub steps: usize,
    /// 按拍摄顺序的输出文件
    pub captures: Vec<PathBuf>,
    pub homed: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(mode: ShootingMode) -> Self {
        Self {
            mode,
            steps: 0,
            captures: Vec::new(),
            homed: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// 模式执行器
#[derive(Debug)]
pub struct ModeExecutor {
    config: ExecutorConfig,
    state: ExecState,
}

impl ModeExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            state: ExecState::Setup,
        }
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// 执行一个计划
    ///
    /// 返回前释放 `ctx`（关闭串口与相机），无论成功与否。
    pub fn run<A: SerialAdapter, D: CaptureDevice>(
        &mut self,
        ctx: &mut ExecutionContext<A, D>,
        mode: ShootingMode,
        plan: &Plan,
    ) -> Result<RunSummary, ExecError> {
        let start = Instant::now();
        let mut summary = RunSummary::new(mode);
        self.state = ExecState::Setup;

        let result = self.drive(ctx, mode, plan, &mut summary);
        ctx.release();

        match result {
            Ok(()) => {
                self.state = ExecState::Done;
                summary.elapsed = start.elapsed();
                info!("DONE");
                Ok(summary)
            },
            Err(e) => {
                self.state = ExecState::Aborted;
                if e.is_cancelled() {
                    warn!("{} run cancelled", mode);
                } else {
                    error!("{} run aborted: {}", mode, e);
                }
                Err(e)
            },
        }
    }

    fn drive<A: SerialAdapter, D: CaptureDevice>(
        &mut self,
        ctx: &mut ExecutionContext<A, D>,
        mode: ShootingMode,
        plan: &Plan,
        summary: &mut RunSummary,
    ) -> Result<(), ExecError> {
        if !mode.needs_setup() {
            info!("disabling motors...");
            let reply = ctx.link.execute(&GcodeCommand::Unlock)?;
            info!("controller: {}", reply.as_deref().unwrap_or("ok"));
            info!("motors disabled");
            return Ok(());
        }

        if mode.captures() {
            if ctx.capture.is_none() {
                return Err(ExecError::MissingCaptureDevice(mode));
            }
            if plan.is_empty() {
                return Err(ExecError::EmptyPlan(mode));
            }
            create_dir(&self.config.capture_dir)?;
        }

        // Setup
        for command in setup_sequence(self.config.setup_feed_rate) {
            ctx.link.execute(&command)?;
        }

        if mode == ShootingMode::Wait {
            info!("WAIT");
            ctx.cancel.sleep(self.config.wait)?;
            return Ok(());
        }

        let poller = StatusPoller::new(self.config.poll);
        let total = plan.step_count();
        let group_count = plan.groups().len();
        let mut index = 0;

        for (g, group) in plan.groups().iter().enumerate() {
            let dir = match &group.subdirectory {
                Some(sub) => self.config.capture_dir.join(sub),
                None => self.config.capture_dir.clone(),
            };
            if mode.captures() && group.subdirectory.is_some() {
                create_dir(&dir)?;
                debug!("created stack dir: {}", dir.display());
            }

            for (j, step) in group.steps.iter().enumerate() {
                self.state = ExecState::Running { step_index: index };
                ctx.cancel.check()?;

                log_progress(
                    mode,
                    Progress {
                        group: g,
                        group_count,
                        in_group: j,
                        group_len: group.steps.len(),
                        index,
                        total,
                    },
                    step,
                );

                ctx.link.execute(&GcodeCommand::LinearMove(*step))?;
                poller.wait_for_idle(&mut ctx.link, &ctx.cancel)?;
                summary.steps += 1;

                if mode.captures()
                    && let Some(capture) = ctx.capture.as_mut()
                {
                    let target = capture.capture(&dir, &ctx.cancel)?;
                    summary.captures.push(target.path());
                }
                index += 1;
            }

            if mode == ShootingMode::Macro {
                info!("stack {} finished", g);
            }
        }

        if mode.homes() {
            info!("return home");
            self.state = ExecState::Homing;
            ctx.link.execute(&GcodeCommand::return_home())?;
            poller.wait_for_idle(&mut ctx.link, &ctx.cancel)?;
            summary.homed = true;
        }

        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), ExecError> {
    fs::create_dir_all(path).map_err(|source| ExecError::Directory {
        path: path.to_path_buf(),
        source,
    })
}

/// 当前步在计划中的位置
struct Progress {
    group: usize,
    group_count: usize,
    in_group: usize,
    group_len: usize,
    index: usize,
    total: usize,
}

fn log_progress(mode: ShootingMode, p: Progress, step: &Step) {
    let feed = step.feed_rate.unwrap_or_default();
    match mode {
        ShootingMode::Interval => {
            info!("INTERVAL {}/{} | {}", p.index + 1, p.total, step.target)
        },
        ShootingMode::Macro => info!(
            "TRIGGER img in stack {}/{} | stack: {}/{} | total {}/{}",
            p.in_group + 1,
            p.group_len,
            p.group,
            p.group_count,
            p.index + 1,
            p.total
        ),
        ShootingMode::Move => info!("MOVE | {}", step.target),
        ShootingMode::Video => info!("VIDEO | {} F: {}", step.target, feed),
        ShootingMode::Bounce => info!("BOUNCE {}/{} | {} F: {}", p.index + 1, p.total, step.target, feed),
        ShootingMode::Wait | ShootingMode::Disable => {},
    }
}
