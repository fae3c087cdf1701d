//! 坐标与步进值类型
//!
//! 所有坐标均为绝对机器坐标（毫米），原点为启动时的当前位置（`G10 P0 L20 X0 Y0 Z0`）。

use crate::ProtocolError;
use std::fmt;
use std::ops::Mul;

/// 三轴绝对坐标（mm）
///
/// 不可变值类型，`Copy` 语义。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// 坐标原点
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 以数组形式访问（顺序 X, Y, Z）
    pub fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// 检查三个坐标是否均为有限数
    ///
    /// # 错误
    /// 任一轴为 NaN 或无穷大时返回 `ProtocolError::InvalidCoordinate`
    pub fn check_finite(&self) -> Result<(), ProtocolError> {
        for (axis, value) in ['X', 'Y', 'Z'].into_iter().zip(self.axes()) {
            if !value.is_finite() {
                return Err(ProtocolError::InvalidCoordinate { axis, value });
            }
        }
        Ok(())
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, factor: f64) -> Position {
        Position::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {:5.2} Y: {:5.2} Z: {:5.2}", self.x, self.y, self.z)
    }
}

/// 运动步：目标位置 + 可选进给速度覆盖
///
/// 规划器输出的最小运动单元。`feed_rate` 为 `None` 时沿用控制器当前的模态进给速度。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// 目标位置
    pub target: Position,
    /// 进给速度（mm/min）
    pub feed_rate: Option<u32>,
}

impl Step {
    /// 带进给速度的运动步
    pub fn new(target: Position, feed_rate: u32) -> Self {
        Self {
            target,
            feed_rate: Some(feed_rate),
        }
    }

    /// 沿用模态进给速度的运动步
    pub fn modal(target: Position) -> Self {
        Self {
            target,
            feed_rate: None,
        }
    }
}
