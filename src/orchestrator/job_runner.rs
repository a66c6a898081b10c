//! 运行循环 - 编排层
//!
//! 先完成搜索，再逐个投递。只依赖 `PageDriver` / `TrackingService` / `ManualGate`
//! 三个接缝，不直接接触浏览器，测试中可以整体替换。

use crate::error::{AppError, AppResult};
use crate::models::{AttemptResult, JobListing, RunSummary};
use crate::orchestrator::stop::StopSignal;
use crate::services::{ConnectionStatus, FailureWriter, ManualGate, TrackingService};
use crate::workflow::{ApplicationFlow, DiscoveryOptions, JobCtx, JobDiscovery, RunContext};
use std::time::Duration;
use tracing::{error, info, warn};

/// 单次运行的参数
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub keyword: String,
    pub location: String,
    pub max_pages: usize,
    pub max_applications: usize,
    pub max_form_steps: usize,
    pub manual_timeout: Option<Duration>,
}

/// 预检：追踪服务必须可用，否则不打开浏览器
pub async fn preflight(tracking: &dyn TrackingService, endpoint: &str) -> AppResult<ConnectionStatus> {
    info!("🩺 检查追踪服务: {}", endpoint);
    match tracking.test_connection().await {
        Ok(status) if status.success => {
            info!("✓ 追踪服务可用: {} (已记录 {} 条)", status.message, status.count);
            Ok(status)
        }
        Ok(status) => Err(AppError::preflight(endpoint, status.message)),
        Err(e) => Err(AppError::preflight(endpoint, format!("{:#}", e))),
    }
}

/// 运行循环
pub struct JobRunner<'a> {
    ctx: RunContext<'a>,
    tracking: &'a dyn TrackingService,
    gate: &'a dyn ManualGate,
    failure_writer: Option<&'a FailureWriter>,
    stop: StopSignal,
    settings: RunSettings,
}

impl<'a> JobRunner<'a> {
    pub fn new(
        ctx: RunContext<'a>,
        tracking: &'a dyn TrackingService,
        gate: &'a dyn ManualGate,
        stop: StopSignal,
        settings: RunSettings,
    ) -> Self {
        Self {
            ctx,
            tracking,
            gate,
            failure_writer: None,
            stop,
            settings,
        }
    }

    pub fn with_failure_writer(mut self, writer: &'a FailureWriter) -> Self {
        self.failure_writer = Some(writer);
        self
    }

    /// 搜索并投递，会话失效时提前结束，总能得到统计结果
    pub async fn run(&self) -> RunSummary {
        let options = DiscoveryOptions {
            keyword: self.settings.keyword.clone(),
            location: self.settings.location.clone(),
            max_pages: self.settings.max_pages,
            max_listings: None,
        };

        let discovery = JobDiscovery::new(self.ctx, self.tracking);
        let summary = match discovery.discover(&options).await {
            Ok(report) => {
                info!(
                    "🔎 搜索完成: {} 页，{} 个职位（格式异常 {}，非快速申请 {}，已申请 {}）",
                    report.pages(),
                    report.listings.len(),
                    report.malformed,
                    report.not_easy_apply,
                    report.already_applied
                );
                self.apply_all(&report.listings).await
            }
            Err(e) => {
                error!("❌ 搜索中断: {}", e);
                RunSummary {
                    session_lost: matches!(e, AppError::SessionLost { .. }),
                    ..Default::default()
                }
            }
        };

        self.ctx.resolver.log_drift_report();
        summary
    }

    /// 逐个投递已发现的职位
    pub async fn apply_all(&self, listings: &[JobListing]) -> RunSummary {
        let mut summary = RunSummary {
            found: listings.len(),
            ..Default::default()
        };
        let flow = ApplicationFlow::new(
            self.ctx,
            self.gate,
            self.settings.max_form_steps,
            self.settings.manual_timeout,
        );

        for (index, listing) in listings.iter().enumerate() {
            if self.stop.is_stopped() {
                info!("⏹️ 收到停止信号，不再处理新职位");
                summary.stopped_early = true;
                break;
            }
            if summary.attempted() >= self.settings.max_applications {
                info!("达到投递上限 {}，结束运行", self.settings.max_applications);
                summary.stopped_early = true;
                break;
            }

            let job = JobCtx::new(index + 1, listings.len(), listing);
            match flow.run(listing, &job).await {
                Ok(AttemptResult::Skipped(_)) => summary.skipped += 1,
                Ok(AttemptResult::Completed(outcome)) => {
                    if outcome.success {
                        summary.applied += 1;
                    } else {
                        summary.failed += 1;
                        if let Some(writer) = self.failure_writer {
                            if let Err(e) = writer.write(&outcome) {
                                warn!("{} 写入失败记录出错: {:#}", job, e);
                            }
                        }
                    }
                    if let Err(e) = self.tracking.record_outcome(&outcome).await {
                        warn!("{} ⚠️ 投递结果上报失败: {:#}", job, e);
                    }
                }
                Err(e) => {
                    error!("{} ❌ {}，放弃剩余 {} 个职位", job, e, listings.len() - index - 1);
                    summary.session_lost = true;
                    break;
                }
            }
        }

        summary
    }
}
