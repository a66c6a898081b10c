//! 人工处理闸门
//!
//! 表单中出现无法自动完成的必填项时，阻塞当前职位，等待操作员在浏览器里补全后确认。
//! 生产环境用控制台确认，测试中注入自动放行实现。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// 需要人工处理的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterventionRequest {
    /// 职位标识（标题 @ 公司）
    pub job: String,
    pub url: String,
    pub reason: String,
    /// 需要补全的字段标签
    pub fields: Vec<String>,
}

/// 人工确认闸门
#[async_trait]
pub trait ManualGate: Send + Sync {
    /// 阻塞直到收到人工确认
    async fn await_human_ack(&self, request: &InterventionRequest) -> Result<()>;
}

/// 控制台确认：打印职位与原因，按回车继续
pub struct ConsoleGate;

#[async_trait]
impl ManualGate for ConsoleGate {
    async fn await_human_ack(&self, request: &InterventionRequest) -> Result<()> {
        warn!("✋ 需要人工处理: {}", request.job);
        warn!("   原因: {}", request.reason);
        for field in &request.fields {
            warn!("   - {}", field);
        }

        let prompt = format!(
            "\n请在浏览器中补全 [{}] 的表单后按回车继续...\n{}\n> ",
            request.job, request.url
        );

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut stdout = std::io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(())
        })
        .await
        .context("等待控制台输入的任务异常退出")??;

        info!("👍 已收到人工确认，继续处理");
        Ok(())
    }
}

/// 自动放行，并统计调用次数
#[derive(Debug, Default)]
pub struct AutoApproveGate {
    calls: AtomicUsize,
}

impl AutoApproveGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManualGate for AutoApproveGate {
    async fn await_human_ack(&self, request: &InterventionRequest) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!("🤖 自动放行人工处理: {} ({})", request.job, request.reason);
        Ok(())
    }
}
