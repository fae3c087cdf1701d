//! 机器状态报告解析

use std::fmt;

/// 控制器报告的机器状态
///
/// 只有 `Idle` 表示所有排队运动均已完成，可以安全地发送下一条移动或触发拍摄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineStatus {
    /// 空闲
    Idle,
    /// 运动中
    Run,
    /// 告警（需要 `$X` 解锁）
    Alarm,
    /// 进给保持
    Hold,
    /// 其他状态（Jog、Door、Home、Check、Sleep）或无法识别的报告
    #[default]
    Unknown,
}

impl MachineStatus {
    /// 从状态 token 解析（大小写敏感，完全匹配）
    pub fn from_token(token: &str) -> Self {
        match token {
            "Idle" => MachineStatus::Idle,
            "Run" => MachineStatus::Run,
            "Alarm" => MachineStatus::Alarm,
            "Hold" => MachineStatus::Hold,
            _ => MachineStatus::Unknown,
        }
    }

    pub fn is_idle(self) -> bool {
        self == MachineStatus::Idle
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Idle => "Idle",
            MachineStatus::Run => "Run",
            MachineStatus::Alarm => "Alarm",
            MachineStatus::Hold => "Hold",
            MachineStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状态报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// 首个 token 对应的状态
    pub status: MachineStatus,
    /// 清洗后的完整报告文本（用于日志）
    pub text: String,
}

impl StatusReport {
    /// 解析清洗后的状态报告（见 [`sanitize_status`](crate::sanitize_status)）
    ///
    /// 只看首个空白分隔的 token，`Idlewait` 或 `RunIdle` 之类的畸形报告不会被识别为 `Idle`。
    pub fn parse(sanitized: &str) -> Self {
        let status = sanitized
            .split_whitespace()
            .next()
            .map(MachineStatus::from_token)
            .unwrap_or_default();

        Self {
            status,
            text: sanitized.to_string(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status.is_idle()
    }
}
