//! 失败记录服务 - 业务能力层
//!
//! 只负责"把投递失败的职位追加写入文件"，供人工后续跟进

use crate::models::ApplicationOutcome;
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 失败记录服务
pub struct FailureWriter {
    file_path: String,
}

impl FailureWriter {
    pub fn new() -> Self {
        Self {
            file_path: "failed_jobs.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    /// 追加一条失败记录，成功的结果直接忽略
    pub fn write(&self, outcome: &ApplicationOutcome) -> Result<()> {
        let Some(reason) = &outcome.failure_reason else {
            return Ok(());
        };
        let listing = &outcome.listing;
        debug!("写入失败记录: {} ({})", listing, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let line = format!(
            "{} | {} | {} | {} | {} | 原因: {}\n",
            outcome.completed_at.format("%Y-%m-%d %H:%M:%S"),
            listing.provider,
            listing.provider_job_id,
            listing.title,
            listing.url,
            reason
        );
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}
