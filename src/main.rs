use anyhow::Result;
use clap::Parser;
use quick_apply::models::Provider;
use quick_apply::utils::logging;
use quick_apply::{App, Config, StopSignal};
use tracing::warn;

/// 搜索职位并通过快速申请自动投递
#[derive(Debug, Parser)]
#[command(name = "quick-apply", version, about)]
struct Cli {
    /// 职位关键词
    job_title: Option<String>,
    /// 工作地点
    location: Option<String>,
    /// 招聘站点: linkedin / indeed / dice
    #[arg(long)]
    provider: Option<Provider>,
    /// 搜索翻页上限
    #[arg(long)]
    max_pages: Option<usize>,
    /// 单次运行最多投递数
    #[arg(long)]
    max_applications: Option<usize>,
    /// 自动放行人工处理，不等待控制台确认
    #[arg(long)]
    auto_approve: bool,
    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(title) = self.job_title {
            config.job_title = title;
        }
        if let Some(location) = self.location {
            config.job_location = location;
        }
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(max_applications) = self.max_applications {
            config.max_applications = max_applications;
        }
        config.auto_approve |= self.auto_approve;
        config.verbose_logging |= self.verbose;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置，命令行参数优先
    let config = Cli::parse().apply(Config::from_env());

    // 初始化日志
    logging::init(config.verbose_logging);

    let stop = StopSignal::new();
    let handle = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到 Ctrl-C，当前职位处理完后停止");
            handle.stop();
        }
    });

    // 初始化并运行应用
    App::initialize(config).await?.run(stop).await?;

    Ok(())
}
