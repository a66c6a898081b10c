use crate::models::Provider;
use std::str::FromStr;
use std::time::Duration;

/// 各类等待的上限
///
/// 核心流程中只有有界的条件等待，没有固定 sleep
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// 轮询间隔，不超过 250ms
    pub poll_interval: Duration,
    /// 按钮、弹窗等控件
    pub element: Duration,
    /// 搜索结果卡片
    pub card: Duration,
    /// 卡片内子字段，只探测一次
    pub probe: Duration,
    /// 翻页后等待新卡片出现
    pub page_advance: Duration,
    /// 点击提交后等待处理完成
    pub submit_processing: Duration,
    /// 追踪服务请求
    pub tracking: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            element: Duration::from_secs(5),
            card: Duration::from_secs(8),
            probe: Duration::ZERO,
            page_advance: Duration::from_secs(10),
            submit_processing: Duration::from_secs(10),
            tracking: Duration::from_secs(5),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 为 true 时自行启动浏览器，否则连接已登录的浏览器
    pub browser_launch: bool,
    pub chrome_executable: Option<String>,
    /// 追踪服务地址
    pub tracking_api_base_url: String,
    pub provider: Provider,
    pub job_title: String,
    pub job_location: String,
    /// 搜索翻页上限
    pub max_pages: usize,
    /// 单次运行最多投递数
    pub max_applications: usize,
    /// 单个表单最多步骤数
    pub max_form_steps: usize,
    /// 策略覆盖文件所在目录
    pub strategy_folder: Option<String>,
    /// 人工处理等待上限，None 表示一直等待
    pub manual_timeout: Option<Duration>,
    /// 跳过人工确认，自动放行
    pub auto_approve: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    /// 失败职位记录文件
    pub failure_log_file: String,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            browser_launch: false,
            chrome_executable: None,
            tracking_api_base_url: "http://localhost:5000".to_string(),
            provider: Provider::LinkedIn,
            job_title: "Software Engineer".to_string(),
            job_location: "United States".to_string(),
            max_pages: 20,
            max_applications: 50,
            max_form_steps: 12,
            strategy_folder: None,
            manual_timeout: None,
            auto_approve: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            failure_log_file: "failed_jobs.txt".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let t = default.timeouts.clone();
        Self {
            browser_debug_port: env_or("BROWSER_DEBUG_PORT", default.browser_debug_port),
            browser_launch: env_or("BROWSER_LAUNCH", default.browser_launch),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            tracking_api_base_url: std::env::var("TRACKING_API_BASE_URL").unwrap_or(default.tracking_api_base_url),
            provider: env_or("PROVIDER", default.provider),
            job_title: std::env::var("JOB_TITLE").unwrap_or(default.job_title),
            job_location: std::env::var("JOB_LOCATION").unwrap_or(default.job_location),
            max_pages: env_or("MAX_PAGES", default.max_pages),
            max_applications: env_or("MAX_APPLICATIONS", default.max_applications),
            max_form_steps: env_or("MAX_FORM_STEPS", default.max_form_steps),
            strategy_folder: std::env::var("STRATEGY_FOLDER").ok().or(default.strategy_folder),
            manual_timeout: std::env::var("MANUAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .or(default.manual_timeout),
            auto_approve: env_or("AUTO_APPROVE", default.auto_approve),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            failure_log_file: std::env::var("FAILURE_LOG_FILE").unwrap_or(default.failure_log_file),
            timeouts: Timeouts {
                poll_interval: env_ms("POLL_INTERVAL_MS", t.poll_interval).min(Duration::from_millis(250)),
                element: env_ms("ELEMENT_TIMEOUT_MS", t.element),
                card: env_ms("CARD_TIMEOUT_MS", t.card),
                tracking: env_ms("TRACKING_TIMEOUT_MS", t.tracking),
                ..t
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_ms(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
