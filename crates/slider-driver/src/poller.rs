//! 空闲同步轮询
//!
//! 运动指令一旦被控制器接受（`ok`）就立即返回，实际运动在后台缓冲区中执行。
//! 在发出下一条运动指令或触发拍摄之前，必须等到控制器报告 `Idle`。

use crate::{CancelToken, Link, LinkError};
use slider_protocol::StatusReport;
use slider_serial::SerialAdapter;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 轮询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollConfig {
    /// 两次查询之间的间隔（默认 0：每次查询本身已受读超时约束）
    pub interval: Duration,
    /// 总超时（`None` 表示一直轮询直到被取消）
    pub timeout: Option<Duration>,
}

/// 状态轮询器
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPoller {
    config: PollConfig,
}

impl StatusPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// 阻塞直到控制器报告 `Idle`
    ///
    /// 轮询过程中的任何链路错误（超时、残帧、传输抖动）都被吞掉并立即重试，
    /// 只有取消信号或配置的总超时能让循环以错误退出。
    ///
    /// # 错误
    /// - `Cancelled`: 取消信号已触发
    /// - `IdleTimeout`: 超过 `PollConfig::timeout`
    pub fn wait_for_idle<A: SerialAdapter>(
        &self,
        link: &mut Link<A>,
        cancel: &CancelToken,
    ) -> Result<StatusReport, LinkError> {
        let start = Instant::now();
        let mut polls: u64 = 0;

        loop {
            cancel.check()?;
            if let Some(timeout) = self.config.timeout
                && start.elapsed() >= timeout
            {
                return Err(LinkError::IdleTimeout(timeout));
            }

            polls += 1;
            match link.query_status() {
                Ok(report) if report.is_idle() => {
                    trace!("Idle after {} polls ({:?})", polls, start.elapsed());
                    return Ok(report);
                },
                Ok(report) => trace!("Status: {}", report.text),
                Err(e) => debug!("Status poll failed, retrying: {}", e),
            }

            if !self.config.interval.is_zero() {
                cancel.sleep(self.config.interval)?;
            }
        }
    }
}
