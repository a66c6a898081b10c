//! 职位与投递结果的数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 招聘站点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(alias = "linkedin")]
    LinkedIn,
    #[serde(alias = "indeed")]
    Indeed,
    #[serde(alias = "dice")]
    Dice,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::LinkedIn, Provider::Indeed, Provider::Dice];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::LinkedIn => "LinkedIn",
            Provider::Indeed => "Indeed",
            Provider::Dice => "Dice",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Provider::LinkedIn),
            "indeed" => Ok(Provider::Indeed),
            "dice" => Ok(Provider::Dice),
            other => Err(format!("未知的招聘站点: {}", other)),
        }
    }
}

/// 搜索阶段抓取到的职位快照，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    /// 站点内部的职位ID，与 provider 一起唯一标识一个职位
    pub provider_job_id: String,
    pub url: String,
    pub provider: Provider,
    pub previously_applied: bool,
    pub discovered_at: DateTime<Utc>,
}

impl fmt::Display for JobListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}#{})",
            self.title, self.company, self.provider, self.provider_job_id
        )
    }
}

/// 单个职位投递失败的原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("未找到申请按钮")]
    NoApplyButton,
    #[error("未找到提交按钮")]
    NoSubmitButton,
    #[error("表单交互异常: {0}")]
    FormInteraction(String),
    #[error("表单步骤超过上限")]
    TooManySteps,
    #[error("等待人工处理超时")]
    ManualInterventionTimedOut,
}

/// 跳过职位的原因（不算失败）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 追踪服务记录中已投递过
    PreviouslyApplied,
    /// 详情页上出现"已申请"标记
    AlreadyAppliedMarker,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PreviouslyApplied => f.write_str("追踪服务显示已投递"),
            SkipReason::AlreadyAppliedMarker => f.write_str("页面显示已申请"),
        }
    }
}

/// 一次投递尝试的最终结果，生成后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationOutcome {
    pub listing: JobListing,
    pub success: bool,
    pub failure_reason: Option<FailureReason>,
    pub completed_at: DateTime<Utc>,
}

impl ApplicationOutcome {
    pub fn succeeded(listing: JobListing) -> Self {
        Self {
            listing,
            success: true,
            failure_reason: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(listing: JobListing, reason: FailureReason) -> Self {
        Self {
            listing,
            success: false,
            failure_reason: Some(reason),
            completed_at: Utc::now(),
        }
    }
}

/// 状态机对一个职位的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Completed(ApplicationOutcome),
    Skipped(SkipReason),
}

/// 整次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 浏览器会话中途失效
    pub session_lost: bool,
    /// 收到停止信号或达到投递上限
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.applied + self.failed
    }
}
