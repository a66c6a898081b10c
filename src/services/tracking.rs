//! 追踪服务客户端
//!
//! 封装与投递记录服务的 HTTP/JSON 交互：预检、已投递查询、写入投递结果。
//! 是否"失败放行"由调用方决定，客户端只如实返回错误。

use crate::models::ApplicationOutcome;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 预检接口的返回
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionStatus {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: i64,
}

/// 写入投递结果的请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobRecord {
    pub job_title: String,
    pub company: String,
    pub job_id: String,
    pub url: String,
    pub provider: String,
    pub applied_date: DateTime<Utc>,
    pub success: bool,
}

impl From<&ApplicationOutcome> for JobRecord {
    fn from(outcome: &ApplicationOutcome) -> Self {
        let listing = &outcome.listing;
        Self {
            job_title: listing.title.clone(),
            company: listing.company.clone(),
            job_id: listing.provider_job_id.clone(),
            url: listing.url.clone(),
            provider: listing.provider.to_string(),
            applied_date: outcome.completed_at,
            success: outcome.success,
        }
    }
}

/// 追踪服务协作方
#[async_trait]
pub trait TrackingService: Send + Sync {
    /// `GET /api/jobs/test-connection`
    async fn test_connection(&self) -> Result<ConnectionStatus>;

    /// `GET /api/jobs/check/{jobId}`
    async fn is_previously_applied(&self, job_id: &str) -> Result<bool>;

    /// `POST /api/jobs`，非 2xx 返回错误，不重试
    async fn record_outcome(&self, outcome: &ApplicationOutcome) -> Result<()>;
}

/// 基于 reqwest 的追踪服务客户端
pub struct TrackingClient {
    base_url: Url,
    http: Client,
}

impl TrackingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("追踪服务地址无效: {}", base_url))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("追踪服务地址不能作为基础路径: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl TrackingService for TrackingClient {
    async fn test_connection(&self) -> Result<ConnectionStatus> {
        let url = self.endpoint(&["api", "jobs", "test-connection"])?;
        let status = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("请求失败: {}", url))?
            .error_for_status()?
            .json::<ConnectionStatus>()
            .await
            .context("预检响应解析失败")?;
        Ok(status)
    }

    async fn is_previously_applied(&self, job_id: &str) -> Result<bool> {
        let url = self.endpoint(&["api", "jobs", "check", job_id])?;
        let applied = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<bool>()
            .await?;
        debug!("已投递查询 {} -> {}", job_id, applied);
        Ok(applied)
    }

    async fn record_outcome(&self, outcome: &ApplicationOutcome) -> Result<()> {
        let url = self.endpoint(&["api", "jobs"])?;
        let record = JobRecord::from(outcome);
        let response = self.http.post(url).json(&record).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("追踪服务返回 {}: {}", status, body);
        }
        Ok(())
    }
}
