//! 职位投递流程 - 流程层
//!
//! 状态流转：
//!
//! ```text
//! Start ─(已投递)─→ Skipped
//! Start → OpenDetails → ClickApply → FormStep* → ReviewOrSubmit → Submitted → Closed
//!              任意活动状态 ─(不可恢复)─→ Failed
//! ```
//!
//! 单个职位失败只产生 `Failed` 结果，不影响后续职位；
//! 只有浏览器会话失效才向上返回错误。

use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationOutcome, AttemptResult, ElementRef, FailureReason, JobListing, SkipReason,
};
use crate::services::field_assessment;
use crate::services::{InterventionRequest, ManualGate, SessionMonitor};
use crate::workflow::job_ctx::JobCtx;
use crate::workflow::run_ctx::RunContext;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 投递状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyState {
    Start,
    OpenDetails,
    ClickApply,
    /// 第 n 个表单步骤，从 1 开始
    FormStep(usize),
    ReviewOrSubmit,
    Submitted,
    Closed,
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl ApplyState {
    pub fn name(&self) -> &'static str {
        match self {
            ApplyState::Start => "Start",
            ApplyState::OpenDetails => "OpenDetails",
            ApplyState::ClickApply => "ClickApply",
            ApplyState::FormStep(_) => "FormStep",
            ApplyState::ReviewOrSubmit => "ReviewOrSubmit",
            ApplyState::Submitted => "Submitted",
            ApplyState::Closed => "Closed",
            ApplyState::Skipped(_) => "Skipped",
            ApplyState::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplyState::Closed | ApplyState::Skipped(_) | ApplyState::Failed(_)
        )
    }
}

/// 附加问题检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionCheck {
    Clear,
    Acknowledged,
    TimedOut,
}

/// 职位投递流程
///
/// - 编排单个职位的完整投递过程
/// - 不持有页面资源，只借用运行上下文
/// - 人工处理通过可替换的闸门完成
pub struct ApplicationFlow<'a> {
    ctx: RunContext<'a>,
    gate: &'a dyn ManualGate,
    max_form_steps: usize,
    manual_timeout: Option<Duration>,
}

impl<'a> ApplicationFlow<'a> {
    pub fn new(
        ctx: RunContext<'a>,
        gate: &'a dyn ManualGate,
        max_form_steps: usize,
        manual_timeout: Option<Duration>,
    ) -> Self {
        Self {
            ctx,
            gate,
            max_form_steps,
            manual_timeout,
        }
    }

    /// 处理一个职位
    ///
    /// 只有会话失效时返回 `Err`
    pub async fn run(&self, listing: &JobListing, job: &JobCtx) -> AppResult<AttemptResult> {
        if listing.previously_applied {
            info!("{} ⏭️ 已投递过，跳过: {}", job, job.label);
            return Ok(AttemptResult::Skipped(SkipReason::PreviouslyApplied));
        }

        let mut state = ApplyState::OpenDetails;
        let mut modal_open = false;

        loop {
            match state {
                ApplyState::Closed => {
                    info!("{} ✅ 投递成功: {}", job, job.label);
                    return Ok(AttemptResult::Completed(ApplicationOutcome::succeeded(
                        listing.clone(),
                    )));
                }
                ApplyState::Skipped(reason) => {
                    info!("{} ⏭️ 跳过 ({}): {}", job, reason, job.label);
                    return Ok(AttemptResult::Skipped(reason));
                }
                ApplyState::Failed(reason) => {
                    warn!("{} ❌ 投递失败 ({}): {}", job, reason, job.label);
                    if modal_open {
                        self.cleanup_modal(job).await;
                    }
                    return Ok(AttemptResult::Completed(ApplicationOutcome::failed(
                        listing.clone(),
                        reason,
                    )));
                }
                _ => {}
            }

            SessionMonitor::ensure(self.ctx.driver, state.name()).await?;

            let next = match self.step(&state, listing, job).await {
                Ok(next) => next,
                Err(e) => {
                    if !SessionMonitor::is_session_valid(self.ctx.driver).await {
                        return Err(AppError::session_lost(state.name()));
                    }
                    warn!("{} ❌ {} 阶段异常: {:#}", job, state.name(), e);
                    ApplyState::Failed(FailureReason::FormInteraction(format!("{:#}", e)))
                }
            };

            debug!("{} {} → {}", job, state.name(), next.name());
            if matches!(state, ApplyState::ClickApply) && matches!(next, ApplyState::FormStep(_)) {
                modal_open = true;
            }
            state = next;
        }
    }

    async fn step(&self, state: &ApplyState, listing: &JobListing, job: &JobCtx) -> Result<ApplyState> {
        match state {
            ApplyState::Start | ApplyState::OpenDetails => self.open_details(listing, job).await,
            ApplyState::ClickApply => self.click_apply(job).await,
            ApplyState::FormStep(n) => self.form_step(*n, listing, job).await,
            ApplyState::ReviewOrSubmit => self.review_or_submit(listing, job).await,
            ApplyState::Submitted => self.finish(job).await,
            terminal => Ok(terminal.clone()),
        }
    }

    /// 打开详情页，等页面出现申请按钮或"已申请"标记
    async fn open_details(&self, listing: &JobListing, job: &JobCtx) -> Result<ApplyState> {
        let driver = self.ctx.driver;
        let resolver = self.ctx.resolver;
        let strategy = self.ctx.strategy;

        info!("{} 📂 打开职位详情: {}", job, listing.url);
        driver.navigate(&listing.url).await?;

        resolver
            .wait_until(self.ctx.timeouts.element, || async move {
                resolver
                    .any_matches(driver, None, &strategy.apply_control_locators)
                    .await
                    || self.has_applied_marker().await
            })
            .await;

        if self.has_applied_marker().await {
            return Ok(ApplyState::Skipped(SkipReason::AlreadyAppliedMarker));
        }
        Ok(ApplyState::ClickApply)
    }

    async fn click_apply(&self, job: &JobCtx) -> Result<ApplyState> {
        let Some(apply) = self
            .ctx
            .resolver
            .resolve(
                self.ctx.driver,
                &self.ctx.strategy.apply_control_locators,
                self.ctx.timeouts.element,
            )
            .await
        else {
            return Ok(ApplyState::Failed(FailureReason::NoApplyButton));
        };

        info!("{} 🖱️ 点击申请按钮", job);
        self.ctx.driver.click(apply).await?;
        Ok(ApplyState::FormStep(1))
    }

    /// 一个表单步骤：检查附加问题 → 点击 Next / Review
    async fn form_step(&self, n: usize, listing: &JobListing, job: &JobCtx) -> Result<ApplyState> {
        if n > self.max_form_steps {
            return Ok(ApplyState::Failed(FailureReason::TooManySteps));
        }

        // 提交按钮已出现，或 Next / Review 都不存在
        let Some(mut control) = self.step_control().await else {
            return Ok(ApplyState::ReviewOrSubmit);
        };

        debug!("{} 表单第 {} 步", job, n);
        let before = self.ctx.driver.page_text().await.unwrap_or_default();
        match self.check_additional_questions(listing, job).await? {
            QuestionCheck::Clear => {}
            QuestionCheck::TimedOut => {
                return Ok(ApplyState::Failed(FailureReason::ManualInterventionTimedOut))
            }
            QuestionCheck::Acknowledged => {
                // 人工处理期间页面可能已被推进，旧句柄不再可信
                let now = self.ctx.driver.page_text().await.unwrap_or_default();
                if now != before {
                    info!("{} 人工处理后页面已变化，重新检查当前步骤", job);
                    return Ok(ApplyState::FormStep(n + 1));
                }
                let Some(fresh) = self.step_control().await else {
                    return Ok(ApplyState::ReviewOrSubmit);
                };
                control = fresh;
            }
        }

        self.ctx.driver.click(control).await?;
        self.wait_for_change(&before).await;

        Ok(ApplyState::FormStep(n + 1))
    }

    /// 当前步骤的 Review / Next 按钮；提交按钮先出现时返回 None
    async fn step_control(&self) -> Option<ElementRef> {
        let strategy = self.ctx.strategy;
        let sets = [
            &strategy.review_locators,
            &strategy.next_locators,
            &strategy.submit_locators,
        ];
        match self
            .ctx
            .resolver
            .resolve_any(self.ctx.driver, &sets, self.ctx.timeouts.element)
            .await
        {
            Some((0 | 1, control)) => Some(control),
            _ => None,
        }
    }

    async fn review_or_submit(&self, listing: &JobListing, job: &JobCtx) -> Result<ApplyState> {
        if self.check_additional_questions(listing, job).await? == QuestionCheck::TimedOut {
            return Ok(ApplyState::Failed(FailureReason::ManualInterventionTimedOut));
        }

        let driver = self.ctx.driver;
        let resolver = self.ctx.resolver;
        let strategy = self.ctx.strategy;

        let Some(submit) = resolver
            .resolve(driver, &strategy.submit_locators, self.ctx.timeouts.element)
            .await
        else {
            return Ok(ApplyState::Failed(FailureReason::NoSubmitButton));
        };

        info!("{} 📤 提交申请", job);
        driver.click(submit).await?;

        let settled = resolver
            .wait_until(self.ctx.timeouts.submit_processing, || async move {
                !resolver.any_matches(driver, None, &strategy.submit_locators).await
                    || resolver.any_matches(driver, None, &strategy.done_locators).await
            })
            .await;
        if !settled {
            debug!("{} 提交后页面未在时限内变化", job);
        }

        Ok(ApplyState::Submitted)
    }

    /// 点击完成按钮；没有完成按钮不算失败
    async fn finish(&self, job: &JobCtx) -> Result<ApplyState> {
        match self
            .ctx
            .resolver
            .resolve(
                self.ctx.driver,
                &self.ctx.strategy.done_locators,
                self.ctx.timeouts.element,
            )
            .await
        {
            Some(done) => {
                if let Err(e) = self.ctx.driver.click(done).await {
                    warn!("{} 点击完成按钮失败: {:#}", job, e);
                }
            }
            None => info!("{} 未找到完成按钮，弹窗可能已自动关闭", job),
        }
        Ok(ApplyState::Closed)
    }

    /// 检查附加问题模块，有空的必填项就交给人工处理
    async fn check_additional_questions(
        &self,
        listing: &JobListing,
        job: &JobCtx,
    ) -> Result<QuestionCheck> {
        // 一个问题一个模块的站点会匹配到多个元素，全部检查
        let modules = self
            .ctx
            .resolver
            .resolve_all(
                self.ctx.driver,
                None,
                &self.ctx.strategy.additional_questions_locators,
                self.ctx.timeouts.probe,
            )
            .await;
        if modules.is_empty() {
            return Ok(QuestionCheck::Clear);
        }

        let mut fields = Vec::new();
        for module in modules {
            fields.extend(self.ctx.driver.required_fields(module).await?);
        }
        if !field_assessment::needs_intervention(&fields) {
            debug!("{} 附加问题已全部填写 ({} 个必填项)", job, fields.len());
            return Ok(QuestionCheck::Clear);
        }

        let request = InterventionRequest {
            job: job.label.clone(),
            url: listing.url.clone(),
            reason: "附加问题中有未填写的必填项".to_string(),
            fields: field_assessment::unfilled_labels(&fields),
        };
        info!("{} ✋ 等待人工处理: {:?}", job, request.fields);

        match self.manual_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.gate.await_human_ack(&request)).await {
                Ok(ack) => ack?,
                Err(_) => return Ok(QuestionCheck::TimedOut),
            },
            None => self.gate.await_human_ack(&request).await?,
        }
        Ok(QuestionCheck::Acknowledged)
    }

    async fn has_applied_marker(&self) -> bool {
        let text = match self.ctx.driver.page_text().await {
            Ok(text) => text.to_lowercase(),
            Err(_) => return false,
        };
        self.ctx
            .strategy
            .already_applied_text_markers
            .iter()
            .any(|marker| text.contains(&marker.to_lowercase()))
    }

    /// 等待页面文本变化，超时也继续
    async fn wait_for_change(&self, before: &str) {
        let driver = self.ctx.driver;
        let changed = self
            .ctx
            .resolver
            .wait_until(self.ctx.timeouts.element, || async move {
                match driver.page_text().await {
                    Ok(now) => now != before,
                    Err(_) => true,
                }
            })
            .await;
        if !changed {
            debug!("点击后页面内容未变化");
        }
    }

    /// 尽力关闭弹窗，让会话能继续处理下一个职位
    async fn cleanup_modal(&self, job: &JobCtx) {
        let driver = self.ctx.driver;
        let resolver = self.ctx.resolver;
        let strategy = self.ctx.strategy;
        let timeout = self.ctx.timeouts.probe;

        info!("{} 🧹 清理弹窗", job);
        match resolver.resolve(driver, &strategy.close_locators, timeout).await {
            Some(close) => {
                if let Err(e) = driver.click(close).await {
                    debug!("{} 点击关闭按钮失败: {:#}", job, e);
                }
                if let Some(discard) = resolver
                    .resolve(driver, &strategy.discard_locators, self.ctx.timeouts.poll_interval)
                    .await
                {
                    if let Err(e) = driver.click(discard).await {
                        debug!("{} 点击放弃按钮失败: {:#}", job, e);
                    }
                }
            }
            None => {
                if let Err(e) = driver.press_escape().await {
                    debug!("{} 发送 Escape 失败: {:#}", job, e);
                }
            }
        }
    }
}
