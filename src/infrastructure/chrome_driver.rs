//! 基于 chromiumoxide 的页面驱动
//!
//! 元素句柄是页面内注册表 `window.__qaRefs` 的下标，导航后注册表随文档一起重置，
//! 旧句柄自然失效。所有脚本参数都经过 `serde_json::to_string` 转义后再拼接。

use crate::infrastructure::driver::PageDriver;
use crate::infrastructure::JsExecutor;
use crate::models::{ElementRef, FieldSnapshot, Locator};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// 取出注册表中的元素，失效时抛错
const ELEMENT_PRELUDE: &str = r#"
    const reg = (window.__qaRefs = window.__qaRefs || []);
    const el = reg[__ID__];
    if (!el || !el.isConnected) { throw new Error('stale element __ID__'); }
"#;

pub struct ChromeDriver {
    executor: JsExecutor,
}

impl ChromeDriver {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 包装一段以 `el` 为操作对象的脚本
    fn element_script(element: ElementRef, body: &str) -> String {
        let prelude = ELEMENT_PRELUDE.replace("__ID__", &element.0.to_string());
        format!("(() => {{ {} {} }})()", prelude, body)
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn current_url(&self) -> Result<String> {
        self.executor.current_url().await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.executor.goto(url).await
    }

    async fn find_all(&self, scope: Option<ElementRef>, locator: &Locator) -> Result<Vec<ElementRef>> {
        let (kind, selector, needle) = match locator {
            Locator::Css { selector } => ("css", selector.as_str(), ""),
            Locator::XPath { expr } => ("xpath", expr.as_str(), ""),
            Locator::Text { css, contains } => ("text", css.as_str(), contains.as_str()),
        };
        let scope_js = match scope {
            Some(el) => el.0.to_string(),
            None => "null".to_string(),
        };

        let js_code = format!(
            r#"
            (() => {{
                const reg = (window.__qaRefs = window.__qaRefs || []);
                const scope = {scope};
                const root = scope === null ? document : reg[scope];
                if (!root || (root !== document && !root.isConnected)) return [];
                const kind = {kind};
                const sel = {selector};
                const needle = {needle}.toLowerCase();
                let found = [];
                try {{
                    if (kind === 'xpath') {{
                        const snap = document.evaluate(sel, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                        for (let i = 0; i < snap.snapshotLength; i++) found.push(snap.snapshotItem(i));
                    }} else {{
                        found = Array.from(root.querySelectorAll(sel));
                        if (kind === 'text') {{
                            found = found.filter(e => (e.innerText || e.textContent || '').toLowerCase().includes(needle));
                        }}
                    }}
                }} catch (err) {{
                    return [];
                }}
                return found.map(e => {{
                    let i = reg.indexOf(e);
                    if (i < 0) {{ reg.push(e); i = reg.length - 1; }}
                    return i;
                }});
            }})()
            "#,
            scope = scope_js,
            kind = serde_json::to_string(kind)?,
            selector = serde_json::to_string(selector)?,
            needle = serde_json::to_string(needle)?,
        );

        let ids: Vec<u64> = self.executor.eval_as(js_code).await?;
        debug!("{} 匹配到 {} 个元素", locator, ids.len());
        Ok(ids.into_iter().map(ElementRef).collect())
    }

    async fn is_interactable(&self, element: ElementRef) -> Result<bool> {
        let js_code = Self::element_script(
            element,
            r#"
            const r = el.getBoundingClientRect();
            const s = getComputedStyle(el);
            const visible = r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
            const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
            return visible && enabled;
            "#,
        );
        self.executor.eval_as(js_code).await
    }

    async fn text(&self, element: ElementRef) -> Result<String> {
        let js_code = Self::element_script(element, "return (el.innerText || el.textContent || '').trim();");
        self.executor.eval_as(js_code).await
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        let body = format!("return el.getAttribute({});", serde_json::to_string(name)?);
        let js_code = Self::element_script(element, &body);
        self.executor.eval_as(js_code).await
    }

    async fn scroll_into_view(&self, element: ElementRef) -> Result<()> {
        let js_code = Self::element_script(
            element,
            "el.scrollIntoView({ block: 'center', inline: 'nearest' }); return true;",
        );
        self.executor.eval(js_code).await?;
        Ok(())
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        let js_code = Self::element_script(
            element,
            "el.scrollIntoView({ block: 'center' }); el.click(); return true;",
        );
        self.executor
            .eval(js_code)
            .await
            .with_context(|| format!("点击元素 {} 失败", element.0))?;
        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        let js_code = r#"
            (() => {
                const target = document.activeElement || document.body;
                for (const type of ['keydown', 'keyup']) {
                    target.dispatchEvent(new KeyboardEvent(type, {
                        key: 'Escape', code: 'Escape', keyCode: 27, which: 27, bubbles: true
                    }));
                }
                return true;
            })()
        "#;
        self.executor.eval(js_code).await?;
        Ok(())
    }

    async fn page_text(&self) -> Result<String> {
        self.executor
            .eval_as("document.body ? document.body.innerText : ''")
            .await
    }

    async fn required_fields(&self, container: ElementRef) -> Result<Vec<FieldSnapshot>> {
        let js_code = Self::element_script(
            container,
            r#"
            const root = el;
            const out = [];
            const seenGroups = new Set();
            const isVisible = e => {
                if (!e) return false;
                const r = e.getBoundingClientRect();
                const s = getComputedStyle(e);
                return (r.width > 0 || r.height > 0) && s.visibility !== 'hidden' && s.display !== 'none';
            };
            const labelOf = e => {
                if (e.id) {
                    const l = document.querySelector(`label[for="${CSS.escape(e.id)}"]`);
                    if (l) return l.innerText || '';
                }
                const wrap = e.closest('label');
                if (wrap) return wrap.innerText || '';
                return e.getAttribute('aria-label') || '';
            };
            const isRequired = (e, label) =>
                e.required ||
                e.getAttribute('aria-required') === 'true' ||
                /\*\s*$/.test(label.trim()) ||
                label.toLowerCase().includes('required');

            for (const e of root.querySelectorAll('input, textarea, select')) {
                const type = (e.type || '').toLowerCase();
                if (['hidden', 'submit', 'button', 'file', 'reset', 'image'].includes(type)) continue;

                if (type === 'radio' || type === 'checkbox') {
                    const key = type + ':' + (e.name || e.id);
                    if (seenGroups.has(key)) continue;
                    seenGroups.add(key);
                    const group = e.name
                        ? Array.from(root.querySelectorAll(`input[type="${type}"][name="${CSS.escape(e.name)}"]`))
                        : [e];
                    const fieldset = e.closest('fieldset');
                    const legend = fieldset && fieldset.querySelector('legend');
                    const label = ((legend && legend.innerText) || labelOf(e)).trim();
                    const required = group.some(g => isRequired(g, label)) ||
                        (fieldset && fieldset.getAttribute('aria-required') === 'true');
                    if (!required || !isVisible(fieldset || e.parentElement)) continue;
                    out.push({
                        kind: type === 'radio' ? 'radio_group' : 'checkbox_group',
                        label,
                        any_checked: group.some(g => g.checked),
                    });
                    continue;
                }

                const label = labelOf(e).trim();
                if (!isVisible(e) || !isRequired(e, label)) continue;
                if (e.tagName === 'SELECT') {
                    const opt = e.options[e.selectedIndex];
                    out.push({ kind: 'select', label, value: e.value || '', selected_text: opt ? opt.text : '' });
                } else {
                    out.push({
                        kind: e.tagName === 'TEXTAREA' ? 'text_area' : 'text',
                        label,
                        value: e.value || '',
                        placeholder: e.getAttribute('placeholder') || '',
                    });
                }
            }
            return out;
            "#,
        );
        self.executor.eval_as(js_code).await
    }
}
