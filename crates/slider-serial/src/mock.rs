//! 模拟串口（无硬件依赖）
//!
//! 每写入一行，调用一次应答脚本 `responder`，其返回值进入读缓冲区，
//! 由随后的 `read_window` 取出。写入记录和关闭次数通过 [`MockHandle`] 在测试中观察。

use crate::{SerialAdapter, SerialError};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 对一行指令的模拟应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// 原样放入读缓冲区的字节
    Bytes(Vec<u8>),
    /// 无应答（读窗口超时为空）
    Silence,
    /// 写入时返回 IO 错误
    Fail(io::ErrorKind),
}

impl MockReply {
    pub fn text(text: &str) -> Self {
        MockReply::Bytes(text.as_bytes().to_vec())
    }

    /// 标准成功应答 `ok\r\n`
    pub fn ok() -> Self {
        Self::text("ok\r\n")
    }
}

type Responder = Box<dyn FnMut(&str) -> MockReply + Send>;

#[derive(Debug, Default)]
struct MockLog {
    written: Vec<String>,
    close_count: usize,
    clear_count: usize,
}

/// 测试侧观察句柄
#[derive(Debug, Clone)]
pub struct MockHandle {
    log: Arc<Mutex<MockLog>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 已写入的全部指令行（不含行终止符）
    pub fn written(&self) -> Vec<String> {
        self.lock().written.clone()
    }

    /// `close()` 实际生效的次数
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    /// `clear_input()` 调用次数
    pub fn clear_count(&self) -> usize {
        self.lock().clear_count
    }
}

/// 模拟串口
pub struct MockSerial {
    name: String,
    responder: Responder,
    pending: VecDeque<u8>,
    log: Arc<Mutex<MockLog>>,
    closed: bool,
}

impl MockSerial {
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> MockReply + Send + 'static,
    {
        Self {
            name: "mock".to_string(),
            responder: Box::new(responder),
            pending: VecDeque::new(),
            log: Arc::new(Mutex::new(MockLog::default())),
            closed: false,
        }
    }

    /// 所有指令都应答 `ok`
    pub fn always_ok() -> Self {
        Self::new(|_| MockReply::ok())
    }

    /// 打开后立即可读的启动横幅
    pub fn with_banner(mut self, banner: &str) -> Self {
        self.pending.extend(banner.as_bytes());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            log: self.log.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SerialAdapter for MockSerial {
    fn write_line(&mut self, line: &str) -> Result<(), SerialError> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        self.lock().written.push(line.to_string());

        match (self.responder)(line) {
            MockReply::Bytes(bytes) => self.pending.extend(bytes),
            MockReply::Silence => {},
            MockReply::Fail(kind) => {
                return Err(SerialError::Io(io::Error::new(kind, "mock transport failure")));
            },
        }
        Ok(())
    }

    fn read_window(
        &mut self,
        max_bytes: usize,
        _timeout: Duration,
    ) -> Result<Vec<u8>, SerialError> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        let n = max_bytes.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }

    fn clear_input(&mut self) -> Result<(), SerialError> {
        if self.closed {
            return Err(SerialError::Closed);
        }
        self.pending.clear();
        self.lock().clear_count += 1;
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.lock().close_count += 1;
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MockSerial {
    fn drop(&mut self) {
        self.close();
    }
}
