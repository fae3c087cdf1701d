//! 请求/应答链路

use crate::LinkError;
use slider_protocol::{
    GcodeCommand, ProtocolError, Response, STATUS_QUERY, StatusReport, sanitize, sanitize_status,
};
use slider_serial::SerialAdapter;
use std::time::Duration;
use tracing::{debug, error};

/// 链路参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// 单次应答窗口最大字节数
    pub response_window: usize,
    /// 读超时
    pub read_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            response_window: 100,
            read_timeout: Duration::from_millis(500),
        }
    }
}

/// 控制器链路
///
/// 独占串口，严格一问一答：`send` 返回前不会有第二个请求写入串口。
/// 关闭恰好发生一次（显式 [`close`](Self::close) 或 `Drop`）。
pub struct Link<A: SerialAdapter> {
    adapter: A,
    config: LinkConfig,
    closed: bool,
}

impl<A: SerialAdapter> Link<A> {
    pub fn new(adapter: A, config: LinkConfig) -> Self {
        Self {
            adapter,
            config,
            closed: false,
        }
    }

    /// 发送一条指令并解码应答
    ///
    /// - 状态查询 `?`: 返回归一化后的状态报告文本
    /// - 其他指令: 去掉回显后必须以 `ok` 开头，返回 `ok` 之后的负载（空负载为 `None`）
    ///
    /// # 错误
    /// - `Transport`: 串口读写失败
    /// - `EmptyResponse`: 读超时内没有收到应答，或应答清洗后为空（只有噪声）
    /// - `Protocol`: 非 `ok` 应答，或指令文本跨行
    pub fn send(&mut self, command: &str) -> Result<Option<String>, LinkError> {
        if command.contains(['\n', '\r']) {
            return Err(ProtocolError::MultiLine(command.to_string()).into());
        }

        self.adapter.write_line(command)?;
        let raw = self
            .adapter
            .read_window(self.config.response_window, self.config.read_timeout)?;
        let raw = String::from_utf8_lossy(&raw);
        debug!("-> {} | <- {:?}", command, raw);

        let is_status = command == STATUS_QUERY;
        let sanitized = if is_status { sanitize_status(&raw) } else { sanitize(&raw) };
        if sanitized.trim().is_empty() {
            return Err(LinkError::EmptyResponse {
                command: command.to_string(),
            });
        }

        if is_status {
            return Ok(Some(sanitized));
        }

        Response::decode(command, &sanitized).into_result(command).map_err(|e| {
            error!("{}", e);
            LinkError::from(e)
        })
    }

    /// 发送结构化指令
    pub fn execute(&mut self, command: &GcodeCommand) -> Result<Option<String>, LinkError> {
        self.send(&command.to_line())
    }

    /// 查询一次机器状态
    pub fn query_status(&mut self) -> Result<StatusReport, LinkError> {
        let text = self.send(STATUS_QUERY)?.unwrap_or_default();
        Ok(StatusReport::parse(&text))
    }

    /// 读取并丢弃一个应答窗口（控制器复位后的启动横幅），返回清洗后的文本
    pub fn drain_input(&mut self) -> Result<Option<String>, LinkError> {
        let raw = self
            .adapter
            .read_window(self.config.response_window, self.config.read_timeout)?;
        self.adapter.clear_input()?;

        let text = sanitize(&String::from_utf8_lossy(&raw)).trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }

    pub fn port_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 关闭串口（幂等）
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.adapter.close();
            debug!("Link to '{}' closed", self.adapter.name());
        }
    }
}

impl<A: SerialAdapter> Drop for Link<A> {
    fn drop(&mut self) {
        self.close();
    }
}
