//! 运行上下文
//!
//! 浏览器会话由运行持有，各组件通过这个上下文借用，不使用全局状态

use crate::config::Timeouts;
use crate::infrastructure::PageDriver;
use crate::models::ProviderStrategy;
use crate::services::SelectorResolver;

#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub driver: &'a dyn PageDriver,
    pub resolver: &'a SelectorResolver,
    pub strategy: &'a ProviderStrategy,
    pub timeouts: &'a Timeouts,
}

impl<'a> RunContext<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        resolver: &'a SelectorResolver,
        strategy: &'a ProviderStrategy,
        timeouts: &'a Timeouts,
    ) -> Self {
        Self {
            driver,
            resolver,
            strategy,
            timeouts,
        }
    }
}
