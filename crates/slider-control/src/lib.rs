//! # Slider Control
//!
//! 拍摄模式规划与运动/拍摄编排：
//!
//! - `mode`: 拍摄模式标识（interval、macro、bounce、move、video、wait、disable）
//! - `plan`: 各模式的步序规划（纯函数，无 IO）
//! - `filename`: 目标目录内下一个可用的顺序文件名
//! - `capture`: 拍摄设备抽象与前后延时包装
//! - `context`: 持有链路与相机的执行上下文（资源恰好释放一次）
//! - `executor`: 顶层状态机 `Setup → Running → Homing → Done`
//!
//! # 示例
//!
//! ```rust,no_run
//! use slider_control::*;
//! use slider_driver::{CancelToken, LinkBuilder};
//! use slider_protocol::Position;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ModeRequest::new(Position::new(10.0, 0.0, 0.0)).shutter_count(3);
//! let plan = SequencePlanner::plan(ShootingMode::Interval, &request)?;
//!
//! let link = LinkBuilder::new().build()?;
//! let camera = ExternalCommandCamera::gphoto2();
//! let capture = CaptureCoordinator::new(camera, FilenameAllocator::new(".jpg"), CaptureTiming::default());
//! let mut ctx = ExecutionContext::new(link, Some(capture), CancelToken::new());
//!
//! let summary = ModeExecutor::new(ExecutorConfig::default()).run(&mut ctx, ShootingMode::Interval, &plan)?;
//! println!("{} images", summary.captures.len());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod context;
pub mod executor;
pub mod filename;
pub mod mode;
pub mod plan;

pub use capture::{
    CaptureCoordinator, CaptureDevice, CaptureError, CaptureTiming, ExternalCommandCamera,
    OUTPUT_PLACEHOLDER, OutputMode,
};
pub use context::ExecutionContext;
pub use executor::{ExecError, ExecState, ExecutorConfig, ModeExecutor, RunSummary};
pub use filename::{AllocationError, CaptureTarget, FilenameAllocator, MAX_CANDIDATES};
pub use mode::ShootingMode;
pub use plan::{ModeRequest, Plan, PlanError, SequencePlanner, StepGroup};
