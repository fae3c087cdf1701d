//! 取消信号

use crate::LinkError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 可分段睡眠的最大片长，决定取消响应延迟
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// 外部取消信号
///
/// 克隆共享同一个标志。信号处理器调用 [`cancel`](Self::cancel)，
/// 阻塞循环（状态轮询、等待模式）在每次迭代检查。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// 已取消时返回 `LinkError::Cancelled`
    pub fn check(&self) -> Result<(), LinkError> {
        if self.is_cancelled() {
            Err(LinkError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// 可被取消的睡眠
    pub fn sleep(&self, duration: Duration) -> Result<(), LinkError> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            std::thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(LinkError::Cancelled)));
    }

    #[test]
    fn test_sleep_completes() {
        let token = CancelToken::new();
        let start = Instant::now();
        token.sleep(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_sleep_interrupted() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });

        let start = Instant::now();
        let result = token.sleep(Duration::from_secs(10));
        handle.join().unwrap();

        assert!(matches!(result, Err(LinkError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
