//! 步序规划
//!
//! 每个拍摄模式对应一个纯函数：输入请求参数，输出有序的运动步。
//! 规划在打开串口之前完成，参数错误不会触碰硬件。
//!
//! # 插值
//!
//! 线性等距位置按 `delta * (i / (n - 1))` 计算，首位置精确为原点，末位置精确等于 `delta`。
//!
//! ```text
//! interval, n = 3, x = 10:   [0, 0, 0] → [5, 0, 0] → [10, 0, 0]
//! macro, S = 4, N = 2, x = 6:
//!   stack_0: X = 0, 2, 4, 6  (Y/Z = 0)
//!   stack_1: X = 0, 2, 4, 6  (Y/Z = delta)
//! ```

use crate::mode::ShootingMode;
use slider_protocol::{Position, ProtocolError, Step};
use thiserror::Error;

/// 默认移动进给速度（mm/min）
pub const DEFAULT_FEED_RATE: u32 = 1000;

/// 拍摄模式下的慢速进给（mm/min）
pub const DEFAULT_CAPTURE_FEED_RATE: u32 = 500;

/// 规划（配置）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Interval mode needs a shutter count of at least 2, got {0}")]
    InvalidShutterCount(u32),

    #[error("Macro mode needs a stack count of at least 2, got {0}")]
    InvalidStackCount(u32),

    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] ProtocolError),
}

/// 一组运动步（焦点堆栈模式下对应一个输出子目录）
#[derive(Debug, Clone, PartialEq)]
pub struct StepGroup {
    /// 相对于拍摄目录的子目录名
    pub subdirectory: Option<String>,
    pub steps: Vec<Step>,
}

/// 运动计划
///
/// 构建后不可变，严格按顺序执行。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    groups: Vec<StepGroup>,
}

impl Plan {
    pub fn new(groups: Vec<StepGroup>) -> Self {
        Self { groups }
    }

    /// 单组、无子目录的计划
    pub fn flat(steps: Vec<Step>) -> Self {
        Self::new(vec![StepGroup {
            subdirectory: None,
            steps,
        }])
    }

    /// 空计划（wait、disable）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[StepGroup] {
        &self.groups
    }

    /// 按执行顺序遍历所有运动步
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.groups.iter().flat_map(|g| g.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.groups.iter().map(|g| g.steps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.step_count() == 0
    }

    /// 所有目标位置（按执行顺序）
    pub fn positions(&self) -> Vec<Position> {
        self.steps().map(|s| s.target).collect()
    }
}

/// 模式请求参数
///
/// 未指定的轴位移为 0。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeRequest {
    /// 目标位移 / 目标位置（mm）
    pub target: Position,
    pub shutter_count: Option<u32>,
    pub stack_count: Option<u32>,
    /// 移动类模式（bounce、move、video）的进给速度
    pub feed_rate: u32,
    /// 拍摄类模式（interval、macro）的进给速度
    pub capture_feed_rate: u32,
}

impl ModeRequest {
    pub fn new(target: Position) -> Self {
        Self {
            target,
            shutter_count: None,
            stack_count: None,
            feed_rate: DEFAULT_FEED_RATE,
            capture_feed_rate: DEFAULT_CAPTURE_FEED_RATE,
        }
    }

    pub fn shutter_count(mut self, count: u32) -> Self {
        self.shutter_count = Some(count);
        self
    }

    pub fn stack_count(mut self, count: u32) -> Self {
        self.stack_count = Some(count);
        self
    }

    pub fn feed_rate(mut self, feed_rate: u32) -> Self {
        self.feed_rate = feed_rate;
        self
    }

    pub fn capture_feed_rate(mut self, feed_rate: u32) -> Self {
        self.capture_feed_rate = feed_rate;
        self
    }
}

/// 步序规划器
pub struct SequencePlanner;

impl SequencePlanner {
    /// 按模式分派
    ///
    /// `Wait` 与 `Disable` 返回空计划：前者只暂停，后者是直接的单条控制器指令。
    pub fn plan(mode: ShootingMode, request: &ModeRequest) -> Result<Plan, PlanError> {
        match mode {
            ShootingMode::Interval => plan_interval(
                request.target,
                request.shutter_count,
                request.capture_feed_rate,
            ),
            ShootingMode::Macro => plan_macro(
                request.target,
                request.stack_count,
                request.shutter_count,
                request.capture_feed_rate,
            ),
            ShootingMode::Bounce => plan_bounce(request.target, request.feed_rate),
            ShootingMode::Move => plan_move(request.target, request.feed_rate),
            ShootingMode::Video => plan_video(request.target, request.feed_rate),
            ShootingMode::Wait | ShootingMode::Disable => Ok(Plan::empty()),
        }
    }
}

/// 第 `i` 个等距位置占总位移的比例（`count >= 2`）
fn fraction(i: u32, count: u32) -> f64 {
    i as f64 / (count - 1) as f64
}

/// 延时摄影：N 个等距位置，首位置为原点，末位置为 `delta`
///
/// 回原点由执行器追加，不在计划中。
pub fn plan_interval(
    delta: Position,
    shutter_count: Option<u32>,
    feed_rate: u32,
) -> Result<Plan, PlanError> {
    let count = shutter_count.unwrap_or(0);
    if count <= 1 {
        return Err(PlanError::InvalidShutterCount(count));
    }
    delta.check_finite()?;

    let steps = (0..count)
        .map(|i| Step::new(delta * fraction(i, count), feed_rate))
        .collect();
    Ok(Plan::flat(steps))
}

/// 焦点堆栈：N 个外层位置（Y/Z），每个外层位置内 S 个 X 位置
///
/// X 步长 `x / (S - 1)`；Y/Z 步长仅在 N > 1 时为 `delta / (N - 1)`，否则为 0。
/// 未指定 N（或 N = 0）时按 1 处理。
pub fn plan_macro(
    delta: Position,
    stack_count: Option<u32>,
    shutter_count: Option<u32>,
    feed_rate: u32,
) -> Result<Plan, PlanError> {
    let stacks = stack_count.unwrap_or(0);
    if stacks <= 1 {
        return Err(PlanError::InvalidStackCount(stacks));
    }
    delta.check_finite()?;

    let outer = shutter_count.unwrap_or(1).max(1);

    let groups = (0..outer)
        .map(|i| {
            let outer_fraction = if outer > 1 { fraction(i, outer) } else { 0.0 };
            let y = delta.y * outer_fraction;
            let z = delta.z * outer_fraction;

            let steps = (0..stacks)
                .map(|j| Step::new(Position::new(delta.x * fraction(j, stacks), y, z), feed_rate))
                .collect();

            StepGroup {
                subdirectory: Some(format!("stack_{}", i)),
                steps,
            }
        })
        .collect();

    Ok(Plan::new(groups))
}

/// 往返：目标位置，然后原点，速度相同
pub fn plan_bounce(target: Position, feed_rate: u32) -> Result<Plan, PlanError> {
    target.check_finite()?;
    Ok(Plan::flat(vec![
        Step::new(target, feed_rate),
        Step::new(Position::ORIGIN, feed_rate),
    ]))
}

/// 单步移动到目标位置
pub fn plan_move(target: Position, feed_rate: u32) -> Result<Plan, PlanError> {
    target.check_finite()?;
    Ok(Plan::flat(vec![Step::new(target, feed_rate)]))
}

/// 视频：以指定速度单步移动到目标位置，不拍摄
pub fn plan_video(target: Position, feed_rate: u32) -> Result<Plan, PlanError> {
    plan_move(target, feed_rate)
}
