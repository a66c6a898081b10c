//! 站点策略
//!
//! 所有站点差异（URL 模板、定位器回退链、文本标记）都收敛在 `ProviderStrategy` 这一份数据里，
//! 搜索流程和投递状态机本身不区分站点。

use super::job::Provider;
use super::locator::{Locator, LocatorSet};
use serde::{Deserialize, Serialize};

/// 单个站点的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStrategy {
    pub provider: Provider,
    /// 用于补全相对链接
    pub base_url: String,
    /// 支持 `{keyword}` 和 `{location}` 占位符，模板自身负责带上"仅快速申请"筛选参数
    pub search_url_template: String,
    /// 支持 `{id}` 占位符，卡片里拿不到链接时使用
    pub job_url_template: String,

    pub listing_card_locators: LocatorSet,
    pub title_locators: LocatorSet,
    pub company_locators: LocatorSet,
    pub link_locators: LocatorSet,
    /// 依次读取卡片上的这些属性作为职位ID
    #[serde(default)]
    pub job_id_attributes: Vec<String>,
    /// 从职位链接中提取ID的正则，第一个捕获组为ID
    #[serde(default)]
    pub job_id_pattern: Option<String>,
    pub easy_apply_indicator_locators: LocatorSet,
    pub next_page_locators: LocatorSet,

    pub apply_control_locators: LocatorSet,
    pub additional_questions_locators: LocatorSet,
    pub review_locators: LocatorSet,
    pub next_locators: LocatorSet,
    pub submit_locators: LocatorSet,
    pub done_locators: LocatorSet,
    pub close_locators: LocatorSet,
    pub discard_locators: LocatorSet,

    /// 小写比较
    #[serde(default)]
    pub already_applied_text_markers: Vec<String>,
}

impl ProviderStrategy {
    /// 内置策略
    pub fn builtin(provider: Provider) -> Self {
        match provider {
            Provider::LinkedIn => linkedin(),
            Provider::Indeed => indeed(),
            Provider::Dice => dice(),
        }
    }

    /// 按模板生成搜索 URL，关键词和地点做百分号编码
    pub fn search_url(&self, keyword: &str, location: &str) -> String {
        self.search_url_template
            .replace("{keyword}", &encode(keyword))
            .replace("{location}", &encode(location))
    }

    pub fn job_url(&self, job_id: &str) -> String {
        self.job_url_template.replace("{id}", &encode(job_id))
    }

    /// 把卡片里的相对链接补全为绝对链接
    pub fn absolute_url(&self, href: &str) -> String {
        match url::Url::parse(&self.base_url).and_then(|base| base.join(href)) {
            Ok(u) => u.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.trim().as_bytes()).collect()
}

fn css(selector: &str) -> Locator {
    Locator::css(selector)
}

fn text(tag: &str, contains: &str) -> Locator {
    Locator::text(tag, contains)
}

fn linkedin() -> ProviderStrategy {
    ProviderStrategy {
        provider: Provider::LinkedIn,
        base_url: "https://www.linkedin.com".into(),
        search_url_template:
            "https://www.linkedin.com/jobs/search/?keywords={keyword}&location={location}&f_AL=true"
                .into(),
        job_url_template: "https://www.linkedin.com/jobs/view/{id}/".into(),
        listing_card_locators: LocatorSet::present(
            "linkedin.card",
            vec![
                css("li[data-occludable-job-id]"),
                css("div.job-card-container"),
                css("li.jobs-search-results__list-item"),
                css("ul.scaffold-layout__list-container > li"),
            ],
        ),
        title_locators: LocatorSet::present(
            "linkedin.title",
            vec![
                css("a.job-card-list__title--link strong"),
                css("a.job-card-list__title"),
                css(".job-card-container__link"),
                css("[class*='job-card'][class*='title']"),
            ],
        ),
        company_locators: LocatorSet::present(
            "linkedin.company",
            vec![
                css(".artdeco-entity-lockup__subtitle span"),
                css(".job-card-container__primary-description"),
                css(".job-card-container__company-name"),
            ],
        ),
        link_locators: LocatorSet::present(
            "linkedin.link",
            vec![css("a.job-card-list__title--link"), css("a[href*='/jobs/view/']")],
        ),
        job_id_attributes: vec!["data-occludable-job-id".into(), "data-job-id".into()],
        job_id_pattern: Some(r"/jobs/view/(\d+)".into()),
        easy_apply_indicator_locators: LocatorSet::present(
            "linkedin.easy_apply_badge",
            vec![
                css(".job-card-container__apply-method"),
                text("li.job-card-container__footer-item", "easy apply"),
            ],
        ),
        next_page_locators: LocatorSet::new(
            "linkedin.next_page",
            vec![
                css("button.jobs-search-pagination__button--next"),
                css("button[aria-label='View next page']"),
                css("li.artdeco-pagination__indicator--number.active + li button"),
            ],
        ),
        apply_control_locators: LocatorSet::new(
            "linkedin.apply",
            vec![
                css("button.jobs-apply-button"),
                css("div.jobs-apply-button--top-card button"),
                text("button", "easy apply"),
            ],
        ),
        additional_questions_locators: LocatorSet::new(
            "linkedin.additional_questions",
            vec![
                css("div.jobs-easy-apply-form-section__grouping"),
                css("div.jobs-easy-apply-modal form .ph5 > div"),
                xpath_questions(),
            ],
        ),
        review_locators: LocatorSet::new(
            "linkedin.review",
            vec![
                css("button[aria-label='Review your application']"),
                text("button", "review"),
            ],
        ),
        next_locators: LocatorSet::new(
            "linkedin.next",
            vec![
                css("button[aria-label='Continue to next step']"),
                css("button[data-easy-apply-next-button]"),
                text("footer button", "next"),
            ],
        ),
        submit_locators: LocatorSet::new(
            "linkedin.submit",
            vec![
                css("button[aria-label='Submit application']"),
                text("button", "submit application"),
            ],
        ),
        done_locators: LocatorSet::new(
            "linkedin.done",
            // 只在提交完成后的确认弹窗中出现
            vec![
                text("div[role='dialog'] button.artdeco-button--primary", "done"),
                text("button", "done"),
            ],
        ),
        close_locators: LocatorSet::new(
            "linkedin.close",
            vec![
                css("button.artdeco-modal__dismiss"),
                css("button[aria-label='Dismiss']"),
            ],
        ),
        discard_locators: LocatorSet::new(
            "linkedin.discard",
            vec![
                css("button[data-control-name='discard_application_confirm_btn']"),
                text("button", "discard"),
            ],
        ),
        already_applied_text_markers: vec![
            "application submitted".into(),
            "applied on".into(),
            "you applied".into(),
        ],
    }
}

fn xpath_questions() -> Locator {
    Locator::xpath(
        "//form//*[(label or legend) and (.//input or .//textarea or .//select)][not(ancestor::*[contains(@class,'contact-info')])]",
    )
}

fn indeed() -> ProviderStrategy {
    ProviderStrategy {
        provider: Provider::Indeed,
        base_url: "https://www.indeed.com".into(),
        search_url_template:
            "https://www.indeed.com/jobs?q={keyword}&l={location}&sc=0kf%3Aattr%28DSQF7%29%3B"
                .into(),
        job_url_template: "https://www.indeed.com/viewjob?jk={id}".into(),
        listing_card_locators: LocatorSet::present(
            "indeed.card",
            vec![
                css("div.job_seen_beacon"),
                css("td.resultContent"),
                css("ul.jobsearch-ResultsList > li div.cardOutline"),
                css("[data-testid='slider_item']"),
            ],
        ),
        title_locators: LocatorSet::present(
            "indeed.title",
            vec![
                css("h2.jobTitle span[title]"),
                css("h2.jobTitle a span"),
                css("a[data-jk] span"),
            ],
        ),
        company_locators: LocatorSet::present(
            "indeed.company",
            vec![
                css("[data-testid='company-name']"),
                css("span.companyName"),
                css(".company_location .css-1h7lukg"),
            ],
        ),
        link_locators: LocatorSet::present(
            "indeed.link",
            vec![css("h2.jobTitle a"), css("a[data-jk]")],
        ),
        job_id_attributes: vec!["data-jk".into()],
        job_id_pattern: Some(r"jk=([0-9a-f]+)".into()),
        easy_apply_indicator_locators: LocatorSet::present(
            "indeed.easy_apply_badge",
            vec![
                css("[data-testid='indeedApply']"),
                css("span.ialbl"),
                css(".iaLabel"),
            ],
        ),
        next_page_locators: LocatorSet::new(
            "indeed.next_page",
            vec![
                css("a[data-testid='pagination-page-next']"),
                css("a[aria-label='Next Page']"),
            ],
        ),
        apply_control_locators: LocatorSet::new(
            "indeed.apply",
            vec![
                css("#indeedApplyButton"),
                css("button[id*='indeedApplyButton']"),
                text("button", "apply now"),
            ],
        ),
        additional_questions_locators: LocatorSet::new(
            "indeed.additional_questions",
            vec![
                css("div.ia-Questions"),
                css("[data-testid*='questions-module']"),
                xpath_questions(),
            ],
        ),
        review_locators: LocatorSet::new(
            "indeed.review",
            vec![text("button", "review your application")],
        ),
        next_locators: LocatorSet::new(
            "indeed.next",
            vec![
                css("button[data-testid='continue-button']"),
                css("button.ia-continueButton"),
                text("button", "continue"),
            ],
        ),
        submit_locators: LocatorSet::new(
            "indeed.submit",
            vec![
                css("button[data-testid='submit-application-button']"),
                text("button", "submit your application"),
            ],
        ),
        done_locators: LocatorSet::new(
            "indeed.done",
            vec![text("a", "return to job search"), text("button", "done")],
        ),
        close_locators: LocatorSet::new(
            "indeed.close",
            vec![
                css("button[aria-label='close']"),
                css("button.ia-Modal-close"),
            ],
        ),
        discard_locators: LocatorSet::new(
            "indeed.discard",
            vec![text("button", "exit"), text("button", "discard")],
        ),
        already_applied_text_markers: vec![
            "you applied".into(),
            "applied on".into(),
            "application submitted".into(),
        ],
    }
}

fn dice() -> ProviderStrategy {
    ProviderStrategy {
        provider: Provider::Dice,
        base_url: "https://www.dice.com".into(),
        search_url_template:
            "https://www.dice.com/jobs?q={keyword}&location={location}&filters.easyApply=true"
                .into(),
        job_url_template: "https://www.dice.com/job-detail/{id}".into(),
        listing_card_locators: LocatorSet::present(
            "dice.card",
            vec![
                css("dhi-search-card"),
                css("div.card.search-card"),
                css("[data-cy='search-card']"),
                css("div[data-testid='job-search-serp-card']"),
            ],
        ),
        title_locators: LocatorSet::present(
            "dice.title",
            vec![
                css("a.card-title-link"),
                css("[data-cy='card-title-link']"),
                css("a[data-testid='job-search-job-detail-link']"),
            ],
        ),
        company_locators: LocatorSet::present(
            "dice.company",
            vec![
                css("[data-cy='search-result-company-name']"),
                css("a.company-name"),
                css("p.mb-0.line-clamp-2"),
            ],
        ),
        link_locators: LocatorSet::present(
            "dice.link",
            vec![
                css("a.card-title-link"),
                css("a[href*='/job-detail/']"),
            ],
        ),
        job_id_attributes: vec!["data-id".into(), "data-job-guid".into()],
        job_id_pattern: Some(r"/job-detail/([0-9a-fA-F-]+)".into()),
        easy_apply_indicator_locators: LocatorSet::present(
            "dice.easy_apply_badge",
            vec![
                css("[data-cy='card-easy-apply']"),
                css("span.ribbon-inner"),
            ],
        ),
        next_page_locators: LocatorSet::new(
            "dice.next_page",
            vec![
                css("li.pagination-next a"),
                css("span[aria-label='Next']"),
                css("[data-testid='pagination-next']"),
            ],
        ),
        apply_control_locators: LocatorSet::new(
            "dice.apply",
            vec![
                css("apply-button-wc"),
                css("button[data-testid='apply-button']"),
                text("button", "easy apply"),
            ],
        ),
        additional_questions_locators: LocatorSet::new(
            "dice.additional_questions",
            vec![
                css("div.screener-questions"),
                css("[data-testid='screener-questions']"),
                xpath_questions(),
            ],
        ),
        review_locators: LocatorSet::new(
            "dice.review",
            vec![text("button", "review")],
        ),
        next_locators: LocatorSet::new(
            "dice.next",
            vec![
                css("button.seds-button-primary.btn-next"),
                text("button", "next"),
            ],
        ),
        submit_locators: LocatorSet::new(
            "dice.submit",
            vec![
                css("button.seds-button-primary.btn-submit"),
                text("button", "submit"),
            ],
        ),
        done_locators: LocatorSet::new(
            "dice.done",
            vec![text("button", "done"), text("a", "back to search")],
        ),
        close_locators: LocatorSet::new(
            "dice.close",
            vec![css("button[aria-label='Close']"), css("button.close")],
        ),
        discard_locators: LocatorSet::new(
            "dice.discard",
            vec![text("button", "leave"), text("button", "discard")],
        ),
        already_applied_text_markers: vec![
            "application submitted".into(),
            "you've applied".into(),
            "applied on".into(),
        ],
    }
}
