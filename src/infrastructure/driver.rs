//! 页面驱动抽象
//!
//! 上层（选择器解析、搜索流程、投递状态机）只依赖这个 trait，
//! 生产环境由 `ChromeDriver` 实现，测试中换成内存假页面。

use crate::models::{ElementRef, FieldSnapshot, Locator};
use anyhow::Result;
use async_trait::async_trait;

/// 对单个浏览器页面的最小操作集合
///
/// 所有方法在会话断开或句柄失效时返回错误；
/// "元素不存在"不是错误，`find_all` 返回空列表即可。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 当前页面地址，同时用作会话存活探测
    async fn current_url(&self) -> Result<String>;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// 在 `scope` 子树（None 为整个文档）中查找匹配的全部元素，按文档顺序返回
    async fn find_all(&self, scope: Option<ElementRef>, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// 可见且未禁用
    async fn is_interactable(&self, element: ElementRef) -> Result<bool>;

    async fn text(&self, element: ElementRef) -> Result<String>;

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>>;

    async fn scroll_into_view(&self, element: ElementRef) -> Result<()>;

    async fn click(&self, element: ElementRef) -> Result<()>;

    /// 向当前焦点发送 Escape
    async fn press_escape(&self) -> Result<()>;

    /// 整个页面的可见文本
    async fn page_text(&self) -> Result<String>;

    /// `container` 内所有可见且必填的字段
    async fn required_fields(&self, container: ElementRef) -> Result<Vec<FieldSnapshot>>;
}
