//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责组装协作方和调度运行，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 预检追踪服务，连接或启动浏览器
//! - 输出全局统计信息
//!
//! ### `job_runner` - 运行循环
//! - 先搜索，再逐个投递
//! - 处理投递上限、停止信号和会话失效
//! - 上报投递结果，记录失败职位
//!
//! ### `stop` - 停止信号
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser / ChromeDriver)
//!     ↓
//! job_runner (处理 Vec<JobListing>)
//!     ↓
//! workflow::JobDiscovery / ApplicationFlow (处理单个职位)
//!     ↓
//! services (能力层：selector / session / tracking / gate)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod app;
pub mod job_runner;
pub mod stop;

// 重新导出主要类型
pub use app::App;
pub use job_runner::{preflight, JobRunner, RunSettings};
pub use stop::StopSignal;
