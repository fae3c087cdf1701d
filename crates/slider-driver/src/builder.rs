//! Builder 模式实现
//!
//! 提供链式构造 `Link` 实例的便捷方式：按顺序探测候选端口，
//! 等待控制器复位，清空启动横幅。

use crate::{CancelToken, LinkError};
use crate::link::{Link, LinkConfig};
use slider_serial::{SerialAdapter, SerialConfig, SerialError, SerialPortAdapter};
use std::time::Duration;
use tracing::{debug, info};

/// 默认候选端口（按探测顺序）
pub const DEFAULT_PORTS: [&str; 3] = [
    "/dev/tty.wchusbserial14210",
    "/dev/ttyUSB0",
    "/dev/tty.usbserial-14420",
];

/// 打开串口后等待控制器复位的默认时长
const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

/// Link Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use slider_driver::LinkBuilder;
/// use std::time::Duration;
///
/// let mut link = LinkBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(115_200)
///     .settle(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// link.send("G90").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    /// 候选端口
    ports: Vec<String>,
    serial: SerialConfig,
    link: LinkConfig,
    /// 复位等待
    settle: Duration,
    /// 复位等待期间的取消信号
    cancel: CancelToken,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkBuilder {
    pub fn new() -> Self {
        Self {
            ports: DEFAULT_PORTS.iter().map(|p| p.to_string()).collect(),
            serial: SerialConfig::default(),
            link: LinkConfig::default(),
            settle: DEFAULT_SETTLE,
            cancel: CancelToken::new(),
        }
    }

    /// 替换候选端口列表
    pub fn ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// 只使用指定端口
    pub fn port(self, port: impl Into<String>) -> Self {
        self.ports([port.into()])
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.serial.write_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.link.read_timeout = timeout;
        self
    }

    /// 单次应答窗口大小（字节）
    pub fn response_window(mut self, bytes: usize) -> Self {
        self.link.response_window = bytes;
        self
    }

    /// 打开端口后等待控制器复位的时长
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// 复位等待可被该信号打断
    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn candidate_ports(&self) -> &[String] {
        &self.ports
    }

    /// 探测端口并构建链路
    ///
    /// # 错误
    /// 所有候选端口都无法打开时返回 `LinkError::Transport`，消息中列出每次尝试的失败原因。
    pub fn build(self) -> Result<Link<SerialPortAdapter>, LinkError> {
        let adapter = self.open_first()?;
        self.build_with(adapter)
    }

    /// 使用已打开的适配器构建链路（复位等待 + 横幅清空）
    pub fn build_with<A: SerialAdapter>(self, adapter: A) -> Result<Link<A>, LinkError> {
        let mut link = Link::new(adapter, self.link);

        if !self.settle.is_zero() {
            debug!("Waiting {:?} for controller reset", self.settle);
            self.cancel.sleep(self.settle)?;
        }

        match link.drain_input()? {
            Some(banner) => info!("Controller on '{}': {}", link.port_name(), banner),
            None => info!("Controller on '{}' (no banner)", link.port_name()),
        }
        Ok(link)
    }

    fn open_first(&self) -> Result<SerialPortAdapter, LinkError> {
        let mut attempts = Vec::with_capacity(self.ports.len());

        for path in &self.ports {
            match SerialPortAdapter::open(path, self.serial) {
                Ok(adapter) => return Ok(adapter),
                Err(e) => {
                    debug!("Port '{}' unavailable: {}", path, e);
                    attempts.push(format!("{}: {}", path, e));
                },
            }
        }

        let message = if attempts.is_empty() {
            "no candidate ports configured".to_string()
        } else {
            attempts.join("; ")
        };
        Err(SerialError::NoDevice(message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slider_serial::mock::MockSerial;

    #[test]
    fn test_defaults() {
        let builder = LinkBuilder::new();
        assert_eq!(builder.candidate_ports(), DEFAULT_PORTS);
        assert_eq!(builder.settle, Duration::from_secs(2));
        assert_eq!(builder.link, LinkConfig::default());
    }

    #[test]
    fn test_port_replaces_candidates() {
        let builder = LinkBuilder::new().port("/dev/ttyACM0");
        assert_eq!(builder.candidate_ports(), ["/dev/ttyACM0".to_string()]);
    }

    #[test]
    fn test_build_reports_all_failed_ports() {
        let err = LinkBuilder::new()
            .ports(["/dev/slider-missing-a", "/dev/slider-missing-b"])
            .settle(Duration::ZERO)
            .build()
            .err()
            .unwrap();

        match err {
            LinkError::Transport(SerialError::NoDevice(msg)) => {
                assert!(msg.contains("/dev/slider-missing-a"), "{}", msg);
                assert!(msg.contains("/dev/slider-missing-b"), "{}", msg);
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_build_without_candidates() {
        let err = LinkBuilder::new().ports(Vec::<String>::new()).build().err().unwrap();
        assert!(err.to_string().contains("no candidate ports"));
    }

    #[test]
    fn test_settle_is_cancellable() {
        let serial = MockSerial::always_ok();
        let handle = serial.handle();
        let cancel = CancelToken::new();
        cancel.cancel();

        let start = std::time::Instant::now();
        let err = LinkBuilder::new()
            .settle(Duration::from_secs(30))
            .cancel(cancel)
            .build_with(serial)
            .err()
            .unwrap();

        assert!(err.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(5));
        // 被打断的链路同样关闭
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_build_with_drains_banner() {
        let serial = MockSerial::always_ok().with_banner("Grbl 1.1h ['$' for help]\r\n");
        let handle = serial.handle();

        let mut link = LinkBuilder::new().settle(Duration::ZERO).build_with(serial).unwrap();
        assert_eq!(handle.clear_count(), 1);

        // 横幅已被清空，第一条指令只看到自己的应答
        assert_eq!(link.send("G90").unwrap(), None);
    }
}
