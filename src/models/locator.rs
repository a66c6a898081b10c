//! 定位器模型
//!
//! `Locator` 是与具体引擎无关的元素查询规则，`LocatorSet` 是按优先级排列的回退链：
//! 越靠前的定位器越具体、越稳定。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 页面元素的不透明句柄
///
/// 导航后句柄可能失效，失效句柄上的操作返回错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub u64);

/// 单条定位规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    Css { selector: String },
    #[serde(rename = "xpath")]
    XPath { expr: String },
    /// 匹配 `css` 且可见文本包含 `contains`（忽略大小写）的元素
    Text { css: String, contains: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath { expr: expr.into() }
    }

    pub fn text(css: impl Into<String>, contains: impl Into<String>) -> Self {
        Locator::Text {
            css: css.into(),
            contains: contains.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "css={}", selector),
            Locator::XPath { expr } => write!(f, "xpath={}", expr),
            Locator::Text { css, contains } => write!(f, "text={}~\"{}\"", css, contains),
        }
    }
}

/// 匹配条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPredicate {
    /// 可见且可用（按钮、输入框）
    #[default]
    Interactable,
    /// 存在于 DOM 即可（卡片内的文本节点）
    Present,
}

/// 按优先级排列的定位器集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSet {
    /// 仅用于日志和统计
    #[serde(default)]
    pub name: String,
    pub locators: Vec<Locator>,
    #[serde(default)]
    pub predicate: MatchPredicate,
}

impl LocatorSet {
    pub fn new(name: impl Into<String>, locators: Vec<Locator>) -> Self {
        Self {
            name: name.into(),
            locators,
            predicate: MatchPredicate::Interactable,
        }
    }

    /// 只要求元素存在
    pub fn present(name: impl Into<String>, locators: Vec<Locator>) -> Self {
        Self {
            predicate: MatchPredicate::Present,
            ..Self::new(name, locators)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}
