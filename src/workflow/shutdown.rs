//! 协作式关闭标志
//!
//! worker 在每轮循环开头检查，协调器在结果排空循环里检查。
//! 没有强制终止：置位后 worker 处理完（或放弃）当前任务自行退出。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 全链路共享的关闭标志
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求关闭（幂等）
    pub fn request(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_across_clones() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();

        assert!(!clone.is_requested());
        flag.request();
        assert!(clone.is_requested());
    }
}
