//! 浏览器引导：连接已有浏览器或自行启动

mod connection;
mod launch;

pub use connection::connect_to_browser;
pub use launch::launch_browser;
