//! 输入验证模块
//!
//! 在打开串口之前检查命令行参数，错误参数不会触碰硬件。

use anyhow::Result;

/// 校验坐标为有限数
pub fn validate_axis(axis: char, value: f64) -> Result<()> {
    if !value.is_finite() {
        anyhow::bail!("Axis {} value {} is not a finite number", axis, value);
    }
    Ok(())
}

/// 校验进给速度
pub fn validate_feed_rate(feed_rate: u32) -> Result<()> {
    if feed_rate == 0 {
        anyhow::bail!("Feed rate must be greater than 0 mm/min");
    }
    Ok(())
}

/// 校验拍摄名称
///
/// 名称作为输出目录下的一级子目录，不允许路径分隔符与 `.` / `..`。
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Capture name must not be empty");
    }
    if name == "." || name == ".." {
        anyhow::bail!("Capture name '{}' is not allowed", name);
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        anyhow::bail!("Capture name '{}' contains invalid character {:?}", name, c);
    }
    Ok(())
}
