//! 控制指令构建
//!
//! 本模块只负责生成单行 ASCII 指令文本，不包含行终止符（由 Link 追加）。

use crate::motion::{Position, Step};
use std::fmt;

/// 状态查询指令（实时指令，无需 `ok` 应答）
pub const STATUS_QUERY: &str = "?";

/// 解锁 / 清除告警指令
pub const UNLOCK: &str = "$X";

/// 控制器指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GcodeCommand {
    /// G90: 绝对坐标模式
    AbsolutePositioning,
    /// G21: 单位设置为毫米
    MetricUnits,
    /// G10 P0 L20: 将当前位置设置为工件坐标原点
    ZeroCurrentPosition,
    /// G1 F<n>: 设置默认进给速度（mm/min）
    FeedRate(u32),
    /// G1 X Y Z [F]: 直线移动
    LinearMove(Step),
    /// $X: 解锁（失能电机驱动前的告警清除）
    Unlock,
    /// ?: 状态查询
    StatusQuery,
}

impl GcodeCommand {
    /// 回原点的移动指令（沿用模态进给速度）
    pub fn return_home() -> Self {
        GcodeCommand::LinearMove(Step::modal(Position::ORIGIN))
    }

    /// 生成指令文本（不含行终止符）
    pub fn to_line(&self) -> String {
        match self {
            GcodeCommand::AbsolutePositioning => "G90".to_string(),
            GcodeCommand::MetricUnits => "G21".to_string(),
            GcodeCommand::ZeroCurrentPosition => "G10 P0 L20 X0 Y0 Z0".to_string(),
            GcodeCommand::FeedRate(feed) => format!("G1 F{}", feed),
            GcodeCommand::LinearMove(step) => {
                let target = step.target;
                let mut line = format!(
                    "G1 X{} Y{} Z{}",
                    format_coordinate(target.x),
                    format_coordinate(target.y),
                    format_coordinate(target.z)
                );
                if let Some(feed) = step.feed_rate {
                    line.push_str(&format!(" F{}", feed));
                }
                line
            },
            GcodeCommand::Unlock => UNLOCK.to_string(),
            GcodeCommand::StatusQuery => STATUS_QUERY.to_string(),
        }
    }
}

impl fmt::Display for GcodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// 启动时的固定配置序列（按顺序发送）
///
/// 1. 绝对坐标
/// 2. 毫米单位
/// 3. 当前位置设为原点
/// 4. 默认进给速度
pub fn setup_sequence(feed_rate: u32) -> [GcodeCommand; 4] {
    [
        GcodeCommand::AbsolutePositioning,
        GcodeCommand::MetricUnits,
        GcodeCommand::ZeroCurrentPosition,
        GcodeCommand::FeedRate(feed_rate),
    ]
}

/// 坐标格式化：固定 3 位小数，`-0.000` 归一化为 `0.000`
fn format_coordinate(value: f64) -> String {
    // -0.0 == 0.0 成立，借此把负零替换为正零
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.3}", value)
}
