pub mod application;
pub mod discovery;
pub mod job_ctx;
pub mod run_ctx;

pub use application::{ApplicationFlow, ApplyState};
pub use discovery::{DiscoveryOptions, DiscoveryReport, JobDiscovery, RunCursor};
pub use job_ctx::JobCtx;
pub use run_ctx::RunContext;
