//! 拍摄模式定义

use std::fmt;

/// 拍摄模式
///
/// # 模式说明
///
/// - **Interval**: 延时摄影，N 个等距位置各拍一张，最后回原点
/// - **Macro**: 焦点堆栈，N 组 × S 张，每组一个子目录，最后回原点
/// - **Bounce**: 移动到目标后返回原点，不拍摄
/// - **Move**: 移动到目标，不拍摄
/// - **Video**: 以指定速度移动到目标（视频录制由相机自行完成）
/// - **Wait**: 仅暂停固定时长
/// - **Disable**: 发送解锁指令后立即退出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShootingMode {
    Interval,
    Macro,
    Bounce,
    Move,
    Video,
    Wait,
    Disable,
}

impl ShootingMode {
    pub const ALL: [ShootingMode; 7] = [
        ShootingMode::Interval,
        ShootingMode::Macro,
        ShootingMode::Bounce,
        ShootingMode::Move,
        ShootingMode::Video,
        ShootingMode::Wait,
        ShootingMode::Disable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShootingMode::Interval => "interval",
            ShootingMode::Macro => "macro",
            ShootingMode::Bounce => "bounce",
            ShootingMode::Move => "move",
            ShootingMode::Video => "video",
            ShootingMode::Wait => "wait",
            ShootingMode::Disable => "disable",
        }
    }

    /// 每个运动步之后是否拍摄
    pub fn captures(self) -> bool {
        matches!(self, ShootingMode::Interval | ShootingMode::Macro)
    }

    /// 运行结束后是否回原点
    pub fn homes(self) -> bool {
        matches!(self, ShootingMode::Interval | ShootingMode::Macro)
    }

    /// 是否发送启动配置序列并产生运动
    pub fn needs_setup(self) -> bool {
        self != ShootingMode::Disable
    }
}

impl fmt::Display for ShootingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
