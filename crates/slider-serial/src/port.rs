//! 基于 `serialport` 的串口适配器

use crate::{SerialAdapter, SerialError};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 行终止符
pub const LINE_TERMINATOR: &str = "\n";

/// 串口参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// 波特率
    pub baud_rate: u32,
    /// 写超时
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            write_timeout: Duration::from_millis(500),
        }
    }
}

/// 真实串口适配器
pub struct SerialPortAdapter {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    config: SerialConfig,
}

impl SerialPortAdapter {
    /// 打开串口（8N1，无流控）
    pub fn open(path: &str, config: SerialConfig) -> Result<Self, SerialError> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.write_timeout)
            .open()?;

        debug!("Serial port '{}' opened at {} baud", path, config.baud_rate);

        Ok(Self {
            name: path.to_string(),
            port: Some(port),
            config,
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, SerialError> {
        self.port.as_mut().ok_or(SerialError::Closed)
    }
}

impl SerialAdapter for SerialPortAdapter {
    fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        let write_timeout = self.config.write_timeout;
        let port = self.port_mut()?;
        port.set_timeout(write_timeout)?;

        let framed = format!("{}{}", line, LINE_TERMINATOR);
        match port.write_all(framed.as_bytes()).and_then(|_| port.flush()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(SerialError::Timeout),
            Err(e) => Err(SerialError::Io(e)),
        }
    }

    fn read_window(
        &mut self,
        max_bytes: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, SerialError> {
        let port = self.port_mut()?;
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; max_bytes];
        let mut filled = 0;

        while filled < max_bytes {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            port.set_timeout(remaining)?;

            match port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SerialError::Io(e)),
            }
        }

        buf.truncate(filled);
        trace!("Read {} bytes from '{}'", filled, self.name);
        Ok(buf)
    }

    fn clear_input(&mut self) -> Result<(), SerialError> {
        self.port_mut()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Serial port '{}' closed", self.name);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for SerialPortAdapter {
    fn drop(&mut self) {
        self.close();
    }
}
