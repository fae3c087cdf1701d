//! # Slider Protocol
//!
//! 运动控制器（GRBL 方言）行式文本协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `motion`: 坐标与步进值类型（`Position`、`Step`）
//! - `gcode`: 控制指令构建（启动配置、直线移动、解锁、状态查询）
//! - `response`: 应答清洗与解码
//! - `status`: 机器状态报告解析
//!
//! ## 报文格式
//!
//! ```text
//! 请求:  <command>\n
//! 应答:  [<echoed-command>]("ok"[<payload>] | <error-text>)
//! 状态:  <Idle|MPos:17.530,0.000,0.000|FS:0,0>
//! ```

pub mod gcode;
pub mod motion;
pub mod response;
pub mod status;

// 重新导出常用类型
pub use gcode::*;
pub use motion::*;
pub use response::*;
pub use status::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 控制器应答不以 `ok` 开头（通常是 `error:NN` 或告警信息）
    #[error("Non-ok response to '{command}': '{response}'")]
    NotOk { command: String, response: String },

    /// 指令文本中包含换行符，会被控制器拆成多条指令
    #[error("Command must be a single line: {0:?}")]
    MultiLine(String),

    /// 坐标不是有限数（NaN 或无穷大）
    #[error("Invalid value for axis {axis}: {value}")]
    InvalidCoordinate { axis: char, value: f64 },
}
