//! 字段评估 - 业务能力层
//!
//! 判断必填字段是"空"、"占位文本"还是"已填写"。
//!
//! 目标站点经常用脚本把个人资料预填进联系方式字段（DOM 上没有 value 属性），
//! 或者显示一段看起来像答案的占位文本。`Placeholder` 与 `Empty` 一样需要人工补全。

use crate::models::{FieldKind, FieldSnapshot, FieldState};
use phf::phf_set;

/// 常见的通用占位文本（小写）
static GENERIC_PLACEHOLDERS: phf::Set<&'static str> = phf_set! {
    "enter your email",
    "enter your email address",
    "enter your phone number",
    "enter your name",
    "enter a value",
    "enter value",
    "type here",
    "type your answer",
    "your answer",
    "select country",
    "select an option",
    "select one",
    "select...",
    "select",
    "choose...",
    "choose one",
    "choose an option",
    "please select",
    "please choose",
    "mm/dd/yyyy",
    "dd/mm/yyyy",
    "e.g.",
    "--",
};

/// 无意义的短值（小写）
static JUNK_TOKENS: phf::Set<&'static str> = phf_set! {
    "...",
    "..",
    ".",
    "-",
    "--",
    "---",
    "_",
    "x",
    "xx",
    "xxx",
    "test",
    "asdf",
    "qwerty",
    "sample",
    "placeholder",
    "lorem ipsum",
};

/// 常见的测试姓名，去掉非字母数字后整值比较，允许带数字后缀
const SAMPLE_NAMES: &[&str] = &[
    "johndoe",
    "janedoe",
    "johnsmith",
    "testuser",
    "testname",
    "firstlast",
    "loremipsum",
    "example",
];

/// 对单个字段分类
pub fn classify(field: &FieldSnapshot) -> FieldState {
    match field.kind {
        FieldKind::RadioGroup | FieldKind::CheckboxGroup => {
            if field.any_checked {
                FieldState::Filled
            } else {
                FieldState::Empty
            }
        }
        FieldKind::Select => classify_select(field),
        FieldKind::Text | FieldKind::TextArea => classify_text(field),
    }
}

/// 是否需要人工介入：任一字段为空或仅为占位文本
pub fn needs_intervention(fields: &[FieldSnapshot]) -> bool {
    fields.iter().any(|f| classify(f).requires_input())
}

/// 需要人工填写的字段标签
pub fn unfilled_labels(fields: &[FieldSnapshot]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| classify(f).requires_input())
        .map(|f| {
            if f.label.trim().is_empty() {
                "(无标签字段)".to_string()
            } else {
                f.label.trim().to_string()
            }
        })
        .collect()
}

fn classify_text(field: &FieldSnapshot) -> FieldState {
    let value = field.value.trim();
    if value.is_empty() {
        return FieldState::Empty;
    }
    if is_placeholder(value, &field.placeholder) {
        return FieldState::Placeholder;
    }
    if is_synthetic(value) {
        return FieldState::Empty;
    }
    FieldState::Filled
}

fn classify_select(field: &FieldSnapshot) -> FieldState {
    let value = field.value.trim();
    let shown = field.selected_text.trim();
    if value.is_empty() && shown.is_empty() {
        return FieldState::Empty;
    }
    let shown_lower = shown.to_lowercase();
    if value.is_empty()
        || shown_lower.starts_with("select")
        || shown_lower.starts_with("choose")
        || shown_lower.starts_with("please select")
        || GENERIC_PLACEHOLDERS.contains(shown_lower.as_str())
    {
        return FieldState::Empty;
    }
    FieldState::Filled
}

fn is_placeholder(value: &str, placeholder: &str) -> bool {
    let lower = value.to_lowercase();
    let placeholder = placeholder.trim();
    (!placeholder.is_empty() && lower == placeholder.to_lowercase())
        || GENERIC_PLACEHOLDERS.contains(lower.as_str())
}

fn is_synthetic(value: &str) -> bool {
    let lower = value.to_lowercase();
    if JUNK_TOKENS.contains(lower.as_str()) {
        return true;
    }

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if lower.chars().count() >= 3 && chars.all(|c| c == first) {
            return true;
        }
    }

    let compact: String = lower.chars().filter(|c| c.is_alphanumeric()).collect();
    if compact.is_empty() {
        // 只有标点
        return true;
    }
    SAMPLE_NAMES.iter().any(|name| {
        compact
            .strip_prefix(name)
            .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
    })
}
