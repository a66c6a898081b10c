//! 会话监测
//!
//! 读取当前页面地址作为廉价的存活探测，任何驱动异常都视为会话失效

use crate::error::{AppError, AppResult};
use crate::infrastructure::PageDriver;
use tracing::{debug, error};

/// 会话状态，每次按需计算，不长期保存
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    Invalid,
}

pub struct SessionMonitor;

impl SessionMonitor {
    pub async fn check(driver: &dyn PageDriver) -> SessionState {
        match driver.current_url().await {
            Ok(url) => {
                debug!("会话存活: {}", url);
                SessionState::Valid
            }
            Err(e) => {
                error!("浏览器会话探测失败: {:#}", e);
                SessionState::Invalid
            }
        }
    }

    pub async fn is_session_valid(driver: &dyn PageDriver) -> bool {
        Self::check(driver).await == SessionState::Valid
    }

    /// 状态转换前的守卫，失效时返回 `AppError::SessionLost`
    pub async fn ensure(driver: &dyn PageDriver, stage: &str) -> AppResult<()> {
        match Self::check(driver).await {
            SessionState::Valid => Ok(()),
            SessionState::Invalid => Err(AppError::session_lost(stage)),
        }
    }
}
