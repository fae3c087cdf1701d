//! 驱动层错误类型定义

use slider_protocol::ProtocolError;
use slider_serial::SerialError;
use std::time::Duration;
use thiserror::Error;

/// 链路错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    /// 串口 IO 错误（读写失败、端口关闭），对当前指令总是致命的
    #[error("Transport error: {0}")]
    Transport(#[from] SerialError),

    /// 控制器返回非 `ok` 应答
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 读超时内没有收到任何字节
    #[error("Empty response to '{command}'")]
    EmptyResponse { command: String },

    /// 外部取消（Ctrl+C）
    #[error("Operation cancelled")]
    Cancelled,

    /// 在限定时间内未等到 `Idle`
    #[error("Controller did not report Idle within {0:?}")]
    IdleTimeout(Duration),
}

impl LinkError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LinkError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_error_display() {
        let err = LinkError::EmptyResponse {
            command: "G90".to_string(),
        };
        assert_eq!(err.to_string(), "Empty response to 'G90'");

        let err: LinkError = ProtocolError::NotOk {
            command: "G21".to_string(),
            response: "error20".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("G21") && msg.contains("error20"), "{}", msg);

        let err: LinkError = SerialError::Closed.into();
        assert!(err.to_string().contains("Port closed"));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(LinkError::Cancelled.is_cancelled());
        assert!(!LinkError::IdleTimeout(Duration::from_secs(1)).is_cancelled());
    }
}
