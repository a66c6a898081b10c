use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 外部停止信号
///
/// 只在两个职位之间检查，正在处理的职位会走完
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
