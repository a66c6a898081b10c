//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，对上只提供脚本求值、导航和地址查询

use crate::utils::logging::truncate_text;
use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

/// JS 执行器
///
/// - 唯一的 Page 持有者
/// - 不认识职位、表单和定位器
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果，错误里附带脚本开头便于排查
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let js_code = js_code.into();
        let snippet = truncate_text(js_code.trim(), 60);
        let result = self
            .page
            .evaluate(js_code)
            .await
            .with_context(|| format!("脚本执行失败: {}", snippet))?;
        Ok(result.into_value()?)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let value = self.eval(js_code).await?;
        serde_json::from_value(value).context("脚本返回值类型不符")
    }

    /// 导航并等待页面加载
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    /// 当前地址，CDP 层面断开时返回错误
    pub async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await.context("读取页面地址失败")?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }
}
