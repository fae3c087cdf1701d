//! 执行上下文
//!
//! 显式持有链路与相机句柄，替代进程级全局状态。
//! 释放（关闭串口、关闭相机）在任何退出路径上恰好执行一次：
//! 正常结束、错误中止、外部中断都经过 [`release`](ExecutionContext::release) 或 `Drop`。

use crate::capture::{CaptureCoordinator, CaptureDevice};
use slider_driver::{CancelToken, Link};
use slider_serial::SerialAdapter;
use tracing::debug;

pub struct ExecutionContext<A: SerialAdapter, D: CaptureDevice> {
    pub link: Link<A>,
    /// 不拍摄的模式可以不提供相机
    pub capture: Option<CaptureCoordinator<D>>,
    pub cancel: CancelToken,
    released: bool,
}

impl<A: SerialAdapter, D: CaptureDevice> ExecutionContext<A, D> {
    pub fn new(link: Link<A>, capture: Option<CaptureCoordinator<D>>, cancel: CancelToken) -> Self {
        Self {
            link,
            capture,
            cancel,
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// 释放所有持有的资源（幂等）
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.link.close();
        if let Some(capture) = self.capture.as_mut() {
            capture.close();
        }
        debug!("Execution context released");
    }
}

impl<A: SerialAdapter, D: CaptureDevice> Drop for ExecutionContext<A, D> {
    fn drop(&mut self) {
        self.release();
    }
}
