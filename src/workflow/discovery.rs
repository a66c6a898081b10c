//! 职位搜索流程 - 流程层
//!
//! 状态流转：`LoadPage → ExtractCards → CheckPagination → (循环 | 结束)`
//!
//! - 卡片定位器全部未命中时返回空结果而不是报错：页面上确实没有职位和选择器失效无法区分
//! - 缺标题或公司的卡片直接跳过
//! - 只保留带"快速申请"标识的卡片
//! - 追踪服务查询失败时按"未投递"处理（失败放行）
//! - 翻页有硬上限，并且每次翻页必须看到新卡片才继续

use crate::error::AppResult;
use crate::models::{ElementRef, JobListing, LocatorSet};
use crate::services::{SessionMonitor, TrackingService};
use crate::workflow::run_ctx::RunContext;
use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 卡片文本中表示可快速申请的关键词（小写）
const EASY_APPLY_MARKERS: &[&str] = &["easy apply", "quick apply", "instant apply", "1-click"];

/// 搜索参数
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub keyword: String,
    pub location: String,
    /// LoadPage 迭代次数上限
    pub max_pages: usize,
    /// 收集到这么多职位后提前结束
    pub max_listings: Option<usize>,
}

/// 搜索进度游标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCursor {
    pub iteration: usize,
    pub processed_cards: usize,
}

/// 搜索结果与统计
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub listings: Vec<JobListing>,
    pub cursor: RunCursor,
    /// 缺标题或公司
    pub malformed: usize,
    pub not_easy_apply: usize,
    /// 卡片上已有"已申请"标记
    pub already_applied: usize,
}

impl DiscoveryReport {
    /// 实际执行的 LoadPage 次数
    pub fn pages(&self) -> usize {
        self.cursor.iteration
    }
}

/// 单张卡片的处理结果
enum CardOutcome {
    Listing(JobListing),
    Duplicate,
    Malformed,
    NotEasyApply,
    AlreadyApplied,
}

/// 职位搜索流程
pub struct JobDiscovery<'a> {
    ctx: RunContext<'a>,
    tracking: &'a dyn TrackingService,
    id_pattern: Option<Regex>,
}

impl<'a> JobDiscovery<'a> {
    pub fn new(ctx: RunContext<'a>, tracking: &'a dyn TrackingService) -> Self {
        let id_pattern = ctx
            .strategy
            .job_id_pattern
            .as_deref()
            .and_then(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("职位ID正则无效，已忽略: {}", e);
                    None
                }
            });
        Self {
            ctx,
            tracking,
            id_pattern,
        }
    }

    /// 执行完整搜索
    ///
    /// 只有浏览器会话失效时返回错误
    pub async fn discover(&self, options: &DiscoveryOptions) -> AppResult<DiscoveryReport> {
        let strategy = self.ctx.strategy;
        let driver = self.ctx.driver;
        let search_url = strategy.search_url(&options.keyword, &options.location);
        let mut report = DiscoveryReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let max_pages = options.max_pages.max(1);

        info!("🔍 开始搜索 {}: {}", strategy.provider, search_url);

        'pages: for iteration in 1..=max_pages {
            // ========== LoadPage ==========
            SessionMonitor::ensure(driver, "LoadPage").await?;
            report.cursor.iteration = iteration;

            if iteration == 1 {
                if let Err(e) = driver.navigate(&search_url).await {
                    SessionMonitor::ensure(driver, "LoadPage").await?;
                    warn!("⚠️ 打开搜索页失败: {:#}", e);
                    break;
                }
            }

            let cards = self
                .ctx
                .resolver
                .resolve_all(driver, None, &strategy.listing_card_locators, self.ctx.timeouts.card)
                .await;
            if cards.is_empty() {
                info!("第 {} 页没有找到职位卡片，结束搜索", iteration);
                break;
            }
            info!("📄 第 {} 页: {} 张卡片", iteration, cards.len());

            // ========== ExtractCards ==========
            for &card in &cards {
                if options
                    .max_listings
                    .is_some_and(|max| report.listings.len() >= max)
                {
                    info!("已收集 {} 个职位，达到上限", report.listings.len());
                    break 'pages;
                }

                match self.extract_card(card, &mut seen).await {
                    CardOutcome::Listing(listing) => {
                        report.cursor.processed_cards += 1;
                        debug!("✓ 收录: {}", listing);
                        report.listings.push(listing);
                    }
                    CardOutcome::Duplicate => {}
                    CardOutcome::Malformed => {
                        report.cursor.processed_cards += 1;
                        report.malformed += 1;
                    }
                    CardOutcome::NotEasyApply => {
                        report.cursor.processed_cards += 1;
                        report.not_easy_apply += 1;
                    }
                    CardOutcome::AlreadyApplied => {
                        report.cursor.processed_cards += 1;
                        report.already_applied += 1;
                    }
                }
            }

            if iteration == max_pages {
                info!("达到翻页上限 {}，结束搜索", max_pages);
                break;
            }

            // ========== CheckPagination ==========
            SessionMonitor::ensure(driver, "CheckPagination").await?;
            if !self.advance_page(cards.len(), &seen).await {
                break;
            }
        }

        info!(
            "✓ 搜索完成: 共 {} 页, 收录 {} 个职位 (缺字段 {}, 非快速申请 {}, 已申请 {})",
            report.pages(),
            report.listings.len(),
            report.malformed,
            report.not_easy_apply,
            report.already_applied
        );
        Ok(report)
    }

    async fn extract_card(&self, card: ElementRef, seen: &mut HashSet<String>) -> CardOutcome {
        let strategy = self.ctx.strategy;
        let driver = self.ctx.driver;

        let probe = self.ctx.timeouts.probe;
        let link = self.card_link(card, probe).await;
        let attr_id = self.card_id(card, link.as_ref()).await;
        if let Some(id) = &attr_id {
            if !seen.insert(id.clone()) {
                return CardOutcome::Duplicate;
            }
        }

        let title = self.sub_text(card, &strategy.title_locators, probe).await;
        let company = self.sub_text(card, &strategy.company_locators, probe).await;
        let (Some(title), Some(company)) = (title, company) else {
            debug!("卡片缺少标题或公司，跳过");
            return CardOutcome::Malformed;
        };

        // 没有站点ID的卡片用标题+公司去重，无限滚动会重复渲染旧卡片
        if attr_id.is_none() && !seen.insert(format!("{}|{}", title, company)) {
            return CardOutcome::Duplicate;
        }

        let card_text = driver.text(card).await.unwrap_or_default().to_lowercase();
        if strategy
            .already_applied_text_markers
            .iter()
            .any(|marker| card_text.contains(&marker.to_lowercase()))
        {
            debug!("卡片已标记为已申请: {}", title);
            return CardOutcome::AlreadyApplied;
        }

        let has_badge = self
            .ctx
            .resolver
            .any_matches(driver, Some(card), &strategy.easy_apply_indicator_locators)
            .await;
        let has_indicator = has_badge || EASY_APPLY_MARKERS.iter().any(|m| card_text.contains(m));
        if !has_indicator {
            debug!("非快速申请职位: {}", title);
            return CardOutcome::NotEasyApply;
        }

        let provider_job_id = attr_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let url = link
            .as_deref()
            .map(|href| strategy.absolute_url(href))
            .unwrap_or_else(|| strategy.job_url(&provider_job_id));
        let previously_applied = self.check_previously_applied(&provider_job_id).await;

        CardOutcome::Listing(JobListing {
            title,
            company,
            provider_job_id,
            url,
            provider: strategy.provider,
            previously_applied,
            discovered_at: Utc::now(),
        })
    }

    /// 卡片内子字段文本，空文本视为缺失
    async fn sub_text(&self, card: ElementRef, set: &LocatorSet, wait: Duration) -> Option<String> {
        let element = self
            .ctx
            .resolver
            .resolve_in(self.ctx.driver, Some(card), set, wait)
            .await?;
        let text = self.ctx.driver.text(element).await.ok()?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// 卡片内职位链接的 href
    async fn card_link(&self, card: ElementRef, wait: Duration) -> Option<String> {
        let link = self
            .ctx
            .resolver
            .resolve_in(self.ctx.driver, Some(card), &self.ctx.strategy.link_locators, wait)
            .await?;
        self.ctx
            .driver
            .attribute(link, "href")
            .await
            .ok()
            .flatten()
            .filter(|h| !h.trim().is_empty())
    }

    /// 依次从卡片属性、链接属性、链接正则中取职位ID
    async fn card_id(&self, card: ElementRef, href: Option<&String>) -> Option<String> {
        let driver = self.ctx.driver;
        for attr in &self.ctx.strategy.job_id_attributes {
            if let Ok(Some(value)) = driver.attribute(card, attr).await {
                if !value.trim().is_empty() {
                    return Some(value.trim().to_string());
                }
            }
        }

        if let Some(link) = self
            .ctx
            .resolver
            .resolve_in(driver, Some(card), &self.ctx.strategy.link_locators, Duration::ZERO)
            .await
        {
            for attr in &self.ctx.strategy.job_id_attributes {
                if let Ok(Some(value)) = driver.attribute(link, attr).await {
                    if !value.trim().is_empty() {
                        return Some(value.trim().to_string());
                    }
                }
            }
        }

        let href = href?;
        let re = self.id_pattern.as_ref()?;
        re.captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// 卡片的去重键，与提取时一致：站点ID，否则标题+公司
    async fn card_key(&self, card: ElementRef) -> Option<String> {
        let link = self.card_link(card, Duration::ZERO).await;
        if let Some(id) = self.card_id(card, link.as_ref()).await {
            return Some(id);
        }
        let strategy = self.ctx.strategy;
        let title = self.sub_text(card, &strategy.title_locators, Duration::ZERO).await?;
        let company = self.sub_text(card, &strategy.company_locators, Duration::ZERO).await?;
        Some(format!("{}|{}", title, company))
    }

    /// 查询追踪服务；失败或超时按未投递处理，避免追踪服务故障卡住搜索
    async fn check_previously_applied(&self, job_id: &str) -> bool {
        match tokio::time::timeout(
            self.ctx.timeouts.tracking,
            self.tracking.is_previously_applied(job_id),
        )
        .await
        {
            Ok(Ok(applied)) => applied,
            Ok(Err(e)) => {
                warn!("⚠️ 已投递查询失败 ({})，按未投递处理: {:#}", job_id, e);
                false
            }
            Err(_) => {
                warn!("⚠️ 已投递查询超时 ({})，按未投递处理", job_id);
                false
            }
        }
    }

    /// 点击下一页并等待新卡片出现，没有前进则返回 false
    async fn advance_page(&self, previous_count: usize, seen: &HashSet<String>) -> bool {
        let driver = self.ctx.driver;
        let resolver = self.ctx.resolver;
        let strategy = self.ctx.strategy;

        let Some(next) = resolver
            .resolve(driver, &strategy.next_page_locators, self.ctx.timeouts.element)
            .await
        else {
            info!("没有下一页按钮，结束搜索");
            return false;
        };

        if self.looks_disabled(next).await {
            info!("下一页按钮已禁用，结束搜索");
            return false;
        }

        if let Err(e) = driver.scroll_into_view(next).await {
            debug!("滚动到下一页按钮失败: {:#}", e);
        }
        if let Err(e) = driver.click(next).await {
            warn!("⚠️ 点击下一页失败: {:#}", e);
            return false;
        }

        let progressed = resolver
            .wait_until(self.ctx.timeouts.page_advance, || async move {
                let cards = resolver
                    .resolve_all(driver, None, &strategy.listing_card_locators, Duration::ZERO)
                    .await;
                if cards.len() > previous_count {
                    return true;
                }
                for card in cards {
                    if let Some(key) = self.card_key(card).await {
                        if !seen.contains(&key) {
                            return true;
                        }
                    }
                }
                false
            })
            .await;

        if !progressed {
            info!("翻页后没有出现新职位，结束搜索");
        }
        progressed
    }

    async fn looks_disabled(&self, element: ElementRef) -> bool {
        let driver = self.ctx.driver;
        if let Ok(Some(v)) = driver.attribute(element, "aria-disabled").await {
            if v.eq_ignore_ascii_case("true") {
                return true;
            }
        }
        if let Ok(Some(_)) = driver.attribute(element, "disabled").await {
            return true;
        }
        matches!(
            driver.attribute(element, "class").await,
            Ok(Some(class)) if class.split_whitespace().any(|c| c.contains("disabled"))
        )
    }
}
