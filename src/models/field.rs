//! 表单字段快照
//!
//! 每次评估表单步骤时从页面重新读取，不跨步骤缓存

use serde::{Deserialize, Serialize};

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Select,
    RadioGroup,
    CheckboxGroup,
}

/// 一个可见且标记为必填的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    /// 读取的是 DOM 属性 `.value`，脚本写入的值也能拿到
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub placeholder: String,
    /// select 当前选中项的显示文本
    #[serde(default)]
    pub selected_text: String,
    /// radio / checkbox 组内是否有选中项
    #[serde(default)]
    pub any_checked: bool,
}

impl FieldSnapshot {
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Text,
            label: label.into(),
            value: value.into(),
            placeholder: String::new(),
            selected_text: String::new(),
            any_checked: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn select(label: impl Into<String>, value: impl Into<String>, selected_text: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Select,
            selected_text: selected_text.into(),
            ..Self::text(label, value)
        }
    }

    pub fn group(kind: FieldKind, label: impl Into<String>, any_checked: bool) -> Self {
        Self {
            kind,
            any_checked,
            ..Self::text(label, "")
        }
    }
}

/// 字段评估结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Empty,
    /// 值就是占位文本，升级人工处理时按空值对待
    Placeholder,
    Filled,
}

impl FieldState {
    pub fn requires_input(self) -> bool {
        matches!(self, FieldState::Empty | FieldState::Placeholder)
    }
}
