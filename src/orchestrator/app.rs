//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **启动**：日志文件、启动信息
//! 2. **预检**：追踪服务不可用时直接退出，不打开浏览器
//! 3. **资源管理**：唯一持有 Browser 和 ChromeDriver 的模块
//! 4. **组装**：按配置选择站点策略和人工处理闸门，交给 `JobRunner`
//! 5. **统计**：输出最终统计

use crate::browser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ChromeDriver, JsExecutor};
use crate::models::{apply_strategy_overrides, ProviderStrategy, RunSummary};
use crate::orchestrator::job_runner::{preflight, JobRunner, RunSettings};
use crate::orchestrator::stop::StopSignal;
use crate::services::{
    AutoApproveGate, ConsoleGate, FailureWriter, ManualGate, SelectorResolver, TrackingClient,
};
use crate::utils::logging;
use crate::workflow::RunContext;
use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::info;

/// 内置策略叠加策略文件夹中的覆盖
async fn load_strategy(config: &Config) -> AppResult<ProviderStrategy> {
    apply_strategy_overrides(config.strategy_folder.as_deref(), config.provider)
        .await
        .map_err(|e| AppError::Strategy(format!("{:#}", e)))
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: ChromeDriver,
    tracking: TrackingClient,
    strategy: ProviderStrategy,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        // 预检在打开浏览器之前
        let tracking = TrackingClient::new(&config.tracking_api_base_url, config.timeouts.tracking)
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        preflight(&tracking, tracking.base_url()).await?;

        let strategy = load_strategy(&config).await?;

        let (browser, page) = if config.browser_launch {
            browser::launch_browser(config.chrome_executable.as_deref()).await
        } else {
            browser::connect_to_browser(config.browser_debug_port).await
        }
        .map_err(|e| AppError::Browser(format!("{:#}", e)))
        .context("浏览器初始化失败")?;

        let driver = ChromeDriver::new(JsExecutor::new(page));

        Ok(Self {
            config,
            _browser: browser,
            driver,
            tracking,
            strategy,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, stop: StopSignal) -> Result<RunSummary> {
        let resolver = SelectorResolver::new(self.config.timeouts.poll_interval);
        let ctx = RunContext::new(&self.driver, &resolver, &self.strategy, &self.config.timeouts);

        let gate: Box<dyn ManualGate> = if self.config.auto_approve {
            info!("🤖 已启用自动放行，人工处理将被跳过");
            Box::new(AutoApproveGate::new())
        } else {
            Box::new(ConsoleGate)
        };
        let failure_writer = FailureWriter::with_path(self.config.failure_log_file.clone());

        let settings = RunSettings {
            keyword: self.config.job_title.clone(),
            location: self.config.job_location.clone(),
            max_pages: self.config.max_pages,
            max_applications: self.config.max_applications,
            max_form_steps: self.config.max_form_steps,
            manual_timeout: self.config.manual_timeout,
        };

        let summary = JobRunner::new(ctx, &self.tracking, gate.as_ref(), stop, settings)
            .with_failure_writer(&failure_writer)
            .run()
            .await;

        logging::print_final_stats(&summary, &self.config.output_log_file);
        Ok(summary)
    }
}
