//! 运行级别的致命错误
//!
//! 单个职位的失败不走这里，而是记录为 `FailureReason`；
//! 元素不存在也不是错误，由选择器解析返回 `None`。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 追踪服务不可用，在打开浏览器之前中止
    #[error("预检失败: 追踪服务不可用 ({endpoint}): {reason}")]
    Preflight { endpoint: String, reason: String },

    /// 浏览器会话失效，剩余职位全部放弃
    #[error("浏览器会话已失效 (阶段: {stage})")]
    SessionLost { stage: String },

    /// 浏览器连接或启动失败
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 策略加载失败
    #[error("站点策略错误: {0}")]
    Strategy(String),
}

impl AppError {
    pub fn session_lost(stage: impl Into<String>) -> Self {
        AppError::SessionLost {
            stage: stage.into(),
        }
    }

    pub fn preflight(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::Preflight {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
