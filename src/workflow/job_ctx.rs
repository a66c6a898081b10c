//! 职位处理上下文
//!
//! 封装"我正在处理第几个职位"这一信息，只用于日志

use crate::models::JobListing;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 从 1 开始
    pub index: usize,
    pub total: usize,
    pub label: String,
}

impl JobCtx {
    pub fn new(index: usize, total: usize, listing: &JobListing) -> Self {
        Self {
            index,
            total,
            label: format!("{} @ {}", listing.title, listing.company),
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[职位 {}/{}]", self.index, self.total)
    }
}
