//! # Quick Apply
//!
//! 在招聘站点上搜索职位，并通过站内"快速申请"流程自动投递的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面操作接缝，生产环境由 `ChromeDriver` 实现
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SelectorResolver` - 按优先级解析定位器，记录命中情况
//! - `SessionMonitor` - 会话存活探测
//! - `field_assessment` - 判断必填项是否真的填写了
//! - `TrackingService` - 投递记录服务
//! - `ManualGate` - 人工处理闸门
//! - `FailureWriter` - 写 failed_jobs.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"搜索"和"投递一个职位"的完整流程
//! - `JobDiscovery` - 翻页、解析卡片、过滤
//! - `ApplicationFlow` - 投递状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 组装协作方，管理浏览器资源
//! - `orchestrator/job_runner` - 运行循环
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Timeouts};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeDriver, PageDriver};
pub use models::{JobListing, Provider, ProviderStrategy, RunSummary};
pub use orchestrator::{App, JobRunner, RunSettings, StopSignal};
pub use workflow::{ApplicationFlow, JobDiscovery, RunContext};
