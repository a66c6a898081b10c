//! 基础设施层：持有 Page，对上只暴露 `PageDriver` 能力

pub mod chrome_driver;
pub mod driver;
pub mod js_executor;

pub use chrome_driver::ChromeDriver;
pub use driver::PageDriver;
pub use js_executor::JsExecutor;
