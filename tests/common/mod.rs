//! 测试公共设施：内存假页面、假追踪服务、测试用站点策略
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use quick_apply::config::Timeouts;
use quick_apply::infrastructure::PageDriver;
use quick_apply::models::{
    ApplicationOutcome, ElementRef, FieldSnapshot, Locator, LocatorSet, Provider, ProviderStrategy,
};
use quick_apply::services::{ConnectionStatus, SelectorResolver, TrackingService};
use quick_apply::workflow::RunContext;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE_URL: &str = "https://jobs.test";
pub const KEYWORD: &str = "rust";
pub const LOCATION: &str = "remote";
pub const SEARCH_URL: &str = "https://jobs.test/search?q=rust&l=remote";

pub fn job_url(id: &str) -> String {
    format!("{}/job/{}", BASE_URL, id)
}

// ========== 假页面 ==========

/// 点击后的副作用
#[derive(Debug, Clone)]
pub enum Action {
    /// 切换到另一个页面
    Goto(String),
    /// 点击报错
    Fail(String),
    /// 点击成功，但浏览器随后断开
    KillSession,
}

/// 假页面上的元素，`tags` 与 `Locator::css` 的选择器逐字比较
#[derive(Debug, Clone, Default)]
pub struct El {
    tags: Vec<String>,
    text: String,
    attrs: Vec<(String, String)>,
    hidden: bool,
    disabled: bool,
    fields: Vec<FieldSnapshot>,
    on_click: Option<Action>,
    children: Vec<El>,
}

impl El {
    pub fn new(tag: &str) -> Self {
        Self {
            tags: vec![tag.to_string()],
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn fields(mut self, fields: Vec<FieldSnapshot>) -> Self {
        self.fields = fields;
        self
    }

    pub fn on_click(mut self, action: Action) -> Self {
        self.on_click = Some(action);
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    /// 跳转到 `url` 的按钮
    pub fn button(tag: &str, url: &str) -> Self {
        El::new(tag).on_click(Action::Goto(url.to_string()))
    }
}

struct Node {
    el: El,
    parent: Option<usize>,
}

#[derive(Default)]
struct PageState {
    nodes: Vec<Node>,
    screens: HashMap<String, Vec<usize>>,
    current: String,
    alive: bool,
    clicks: Vec<String>,
    escapes: usize,
    navigations: Vec<String>,
}

impl PageState {
    fn on_screen(&self, id: usize) -> bool {
        self.screens
            .get(&self.current)
            .is_some_and(|ids| ids.contains(&id))
    }

    fn node(&self, element: ElementRef) -> Result<&Node> {
        let id = element.0 as usize;
        if !self.on_screen(id) {
            return Err(anyhow!("stale element {}", id));
        }
        Ok(&self.nodes[id])
    }

    fn is_descendant(&self, id: usize, ancestor: usize) -> bool {
        let mut cursor = self.nodes[id].parent;
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.nodes[p].parent;
        }
        false
    }

    fn full_text(&self, id: usize) -> String {
        let mut parts = vec![self.nodes[id].el.text.clone()];
        if let Some(ids) = self.screens.get(&self.current) {
            for &other in ids {
                if self.nodes[other].parent == Some(id) {
                    parts.push(self.full_text(other));
                }
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    fn matches(&self, id: usize, locator: &Locator) -> bool {
        let el = &self.nodes[id].el;
        match locator {
            Locator::Css { selector } => el.tags.iter().any(|t| t == selector),
            Locator::XPath { .. } => false,
            Locator::Text { css, contains } => {
                el.tags.iter().any(|t| t == css)
                    && self
                        .full_text(id)
                        .to_lowercase()
                        .contains(&contains.to_lowercase())
            }
        }
    }
}

/// 内存中的假页面：按 URL 划分的一组页面，每个页面是一棵元素树
pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new() -> Self {
        let state = PageState {
            current: "about:blank".to_string(),
            alive: true,
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// 注册一个页面，重复注册会覆盖
    pub fn screen(&self, url: &str, elements: Vec<El>) -> &Self {
        let mut state = self.state.lock().unwrap();
        let mut ids = Vec::new();
        for el in elements {
            flatten(&mut state, &mut ids, el, None);
        }
        state.screens.insert(url.to_string(), ids);
        self
    }

    pub async fn navigate_to(&self, url: &str) {
        PageDriver::navigate(self, url).await.unwrap();
    }

    pub async fn text_of(&self, element: ElementRef) -> String {
        PageDriver::text(self, element).await.unwrap()
    }

    pub fn kill_session(&self) {
        self.state.lock().unwrap().alive = false;
    }

    /// 被点击元素的第一个 tag，按点击顺序
    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn clicked(&self, tag: &str) -> bool {
        self.clicks().iter().any(|c| c == tag)
    }

    pub fn escapes(&self) -> usize {
        self.state.lock().unwrap().escapes
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    fn alive(&self) -> Result<std::sync::MutexGuard<'_, PageState>> {
        let state = self.state.lock().unwrap();
        if !state.alive {
            return Err(anyhow!("browser session closed"));
        }
        Ok(state)
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten(state: &mut PageState, ids: &mut Vec<usize>, mut el: El, parent: Option<usize>) {
    let children = std::mem::take(&mut el.children);
    let id = state.nodes.len();
    state.nodes.push(Node { el, parent });
    ids.push(id);
    for child in children {
        flatten(state, ids, child, Some(id));
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn current_url(&self) -> Result<String> {
        Ok(self.alive()?.current.clone())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.alive()?;
        state.navigations.push(url.to_string());
        state.current = url.to_string();
        state.screens.entry(url.to_string()).or_default();
        Ok(())
    }

    async fn find_all(&self, scope: Option<ElementRef>, locator: &Locator) -> Result<Vec<ElementRef>> {
        let state = self.alive()?;
        let ids = state.screens.get(&state.current).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter(|&id| match scope {
                Some(s) => state.is_descendant(id, s.0 as usize),
                None => true,
            })
            .filter(|&id| state.matches(id, locator))
            .map(|id| ElementRef(id as u64))
            .collect())
    }

    async fn is_interactable(&self, element: ElementRef) -> Result<bool> {
        let state = self.alive()?;
        let node = state.node(element)?;
        Ok(!node.el.hidden && !node.el.disabled)
    }

    async fn text(&self, element: ElementRef) -> Result<String> {
        let state = self.alive()?;
        state.node(element)?;
        Ok(state.full_text(element.0 as usize))
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> Result<Option<String>> {
        let state = self.alive()?;
        let node = state.node(element)?;
        Ok(node
            .el
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    async fn scroll_into_view(&self, element: ElementRef) -> Result<()> {
        self.alive()?.node(element)?;
        Ok(())
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        let mut state = self.alive()?;
        let node = state.node(element)?;
        let tag = node.el.tags[0].clone();
        let action = node.el.on_click.clone();
        state.clicks.push(tag);
        match action {
            Some(Action::Goto(url)) => {
                state.current = url.clone();
                state.screens.entry(url).or_default();
                Ok(())
            }
            Some(Action::Fail(message)) => Err(anyhow!(message)),
            Some(Action::KillSession) => {
                state.alive = false;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn press_escape(&self) -> Result<()> {
        self.alive()?.escapes += 1;
        Ok(())
    }

    async fn page_text(&self) -> Result<String> {
        let state = self.alive()?;
        let ids = state.screens.get(&state.current).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .map(|&id| &state.nodes[id].el)
            .filter(|el| !el.hidden && !el.text.is_empty())
            .map(|el| el.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn required_fields(&self, container: ElementRef) -> Result<Vec<FieldSnapshot>> {
        let state = self.alive()?;
        state.node(container)?;
        let root = container.0 as usize;
        let ids = state.screens.get(&state.current).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter(|&id| id == root || state.is_descendant(id, root))
            .filter(|&id| !state.nodes[id].el.hidden)
            .flat_map(|id| state.nodes[id].el.fields.clone())
            .collect())
    }
}

// ========== 假追踪服务 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Normal,
    Error,
    Hang,
}

pub struct FakeTracking {
    applied: HashSet<String>,
    mode: CheckMode,
    reachable: bool,
    checks: AtomicUsize,
    recorded: Mutex<Vec<ApplicationOutcome>>,
}

impl FakeTracking {
    pub fn new() -> Self {
        Self {
            applied: HashSet::new(),
            mode: CheckMode::Normal,
            reachable: true,
            checks: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn with_applied(mut self, ids: &[&str]) -> Self {
        self.applied = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_mode(mut self, mode: CheckMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<ApplicationOutcome> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Default for FakeTracking {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingService for FakeTracking {
    async fn test_connection(&self) -> Result<ConnectionStatus> {
        if !self.reachable {
            return Err(anyhow!("connection refused"));
        }
        Ok(ConnectionStatus {
            success: true,
            message: "ok".into(),
            count: self.recorded.lock().unwrap().len() as i64,
        })
    }

    async fn is_previously_applied(&self, job_id: &str) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            CheckMode::Normal => Ok(self.applied.contains(job_id)),
            CheckMode::Error => Err(anyhow!("500 Internal Server Error")),
            CheckMode::Hang => {
                std::future::pending::<()>().await;
                Ok(false)
            }
        }
    }

    async fn record_outcome(&self, outcome: &ApplicationOutcome) -> Result<()> {
        self.recorded.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

// ========== 策略与上下文 ==========

fn css(selector: &str) -> Locator {
    Locator::css(selector)
}

/// 每个概念只用一个简单 tag 的站点策略
pub fn test_strategy() -> ProviderStrategy {
    ProviderStrategy {
        provider: Provider::LinkedIn,
        base_url: BASE_URL.into(),
        search_url_template: format!("{}/search?q={{keyword}}&l={{location}}", BASE_URL),
        job_url_template: format!("{}/job/{{id}}", BASE_URL),
        listing_card_locators: LocatorSet::present("test.card", vec![css("card")]),
        title_locators: LocatorSet::present("test.title", vec![css("title")]),
        company_locators: LocatorSet::present("test.company", vec![css("company")]),
        link_locators: LocatorSet::present("test.link", vec![css("link")]),
        job_id_attributes: vec!["data-id".into()],
        job_id_pattern: Some(r"/job/(\w+)".into()),
        easy_apply_indicator_locators: LocatorSet::present("test.easy", vec![css("easy")]),
        next_page_locators: LocatorSet::new("test.next_page", vec![css("next-page")]),
        apply_control_locators: LocatorSet::new("test.apply", vec![css("apply")]),
        additional_questions_locators: LocatorSet::present("test.questions", vec![css("questions")]),
        review_locators: LocatorSet::new("test.review", vec![css("review")]),
        next_locators: LocatorSet::new("test.next", vec![css("next")]),
        submit_locators: LocatorSet::new("test.submit", vec![css("submit")]),
        done_locators: LocatorSet::new("test.done", vec![css("done")]),
        close_locators: LocatorSet::new("test.close", vec![css("close")]),
        discard_locators: LocatorSet::new("test.discard", vec![css("discard")]),
        already_applied_text_markers: vec!["applied on".into()],
    }
}

pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        poll_interval: Duration::from_millis(5),
        element: Duration::from_millis(60),
        card: Duration::from_millis(60),
        probe: Duration::ZERO,
        page_advance: Duration::from_millis(100),
        submit_processing: Duration::from_millis(60),
        tracking: Duration::from_millis(50),
    }
}

/// 持有上下文所借用的数据
pub struct Harness {
    pub resolver: SelectorResolver,
    pub strategy: ProviderStrategy,
    pub timeouts: Timeouts,
}

impl Harness {
    pub fn new() -> Self {
        let timeouts = fast_timeouts();
        Self {
            resolver: SelectorResolver::new(timeouts.poll_interval),
            strategy: test_strategy(),
            timeouts,
        }
    }

    pub fn ctx<'a>(&'a self, page: &'a FakePage) -> RunContext<'a> {
        RunContext::new(page, &self.resolver, &self.strategy, &self.timeouts)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// 标准搜索结果卡片：带ID、标题、公司、链接和快速申请标识
pub fn card(id: &str, title: &str, company: &str) -> El {
    El::new("card")
        .attr("data-id", id)
        .child(El::new("title").text(title))
        .child(El::new("company").text(company))
        .child(El::new("link").attr("href", &format!("/job/{}", id)))
        .child(El::new("easy").text("Easy Apply"))
}

/// 注册一个"申请 → 提交 → 完成"的职位
pub fn simple_job(page: &FakePage, id: &str) {
    let form = format!("{}/apply/{}/form", BASE_URL, id);
    let done = format!("{}/apply/{}/done", BASE_URL, id);
    page.screen(
        &job_url(id),
        vec![El::new("job-title").text("Job details"), El::button("apply", &form).text("Easy Apply")],
    );
    page.screen(
        &form,
        vec![El::new("header").text("Review your application"), El::button("submit", &done).text("Submit")],
    );
    page.screen(
        &done,
        vec![El::new("header").text("Application sent"), El::button("done", "about:blank").text("Done")],
    );
}
