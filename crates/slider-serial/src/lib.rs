//! # Slider Serial Transport
//!
//! 串口传输抽象层，为运动控制器链路提供统一的字节收发接口。
//!
//! - [`SerialPortAdapter`]: 基于 `serialport` 的真实串口实现
//! - `mock::MockSerial`: 脚本化的模拟控制器（feature `mock`）

use std::time::Duration;
use thiserror::Error;

pub mod port;

pub use port::{SerialConfig, SerialPortAdapter};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// 串口传输层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device not found: {0}")]
    NoDevice(String),
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Write timeout")]
    Timeout,
    #[error("Port closed")]
    Closed,
}

impl From<serialport::Error> for SerialError {
    fn from(e: serialport::Error) -> Self {
        match e.kind {
            serialport::ErrorKind::NoDevice => SerialError::NoDevice(e.description),
            serialport::ErrorKind::Io(kind) => {
                SerialError::Io(std::io::Error::new(kind, e.description))
            },
            _ => SerialError::Device(e.description),
        }
    }
}

/// 串口适配器
///
/// 严格的请求/应答轮替：调用方写入一行后读取一个有界的应答窗口，
/// 不允许在应答读取完成前写入下一行。
pub trait SerialAdapter {
    /// 写入一行指令（实现负责追加行终止符）
    fn write_line(&mut self, line: &str) -> Result<(), SerialError>;

    /// 读取应答窗口
    ///
    /// 在 `timeout` 内最多读取 `max_bytes` 字节；超时前读到的字节原样返回，
    /// 什么都没收到时返回空 `Vec`（不是错误）。
    fn read_window(&mut self, max_bytes: usize, timeout: Duration)
    -> Result<Vec<u8>, SerialError>;

    /// 丢弃输入缓冲区中尚未读取的字节
    fn clear_input(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    /// 关闭端口（幂等）
    fn close(&mut self) {}

    /// 端口名（用于日志）
    fn name(&self) -> &str;
}

impl<A: SerialAdapter + ?Sized> SerialAdapter for Box<A> {
    fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        (**self).write_line(line)
    }

    fn read_window(
        &mut self,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, SerialError> {
        (**self).read_window(max_bytes, timeout)
    }

    fn clear_input(&mut self) -> Result<(), SerialError> {
        (**self).clear_input()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
