//! 选择器解析服务 - 业务能力层
//!
//! 按优先级依次尝试回退链中的定位器，第一个满足匹配条件的元素胜出（不是"最佳匹配"）。
//! 找不到元素是正常返回值 `None`；底层驱动报错在这一层转换成"本轮未命中"。
//!
//! 每次命中都会记录是哪条定位器命中的，站点改版导致的定位器漂移是线上最常见的故障。

use crate::infrastructure::PageDriver;
use crate::models::locator::MatchPredicate;
use crate::models::{ElementRef, LocatorSet};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// 轮询间隔上限
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 单个定位器集合的命中统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorStats {
    /// 定位器下标 -> 命中次数
    pub hits: BTreeMap<usize, usize>,
    pub misses: usize,
}

impl LocatorStats {
    /// 是否有过非首选定位器命中
    pub fn used_fallback(&self) -> bool {
        self.hits.keys().any(|&i| i > 0)
    }
}

/// 选择器解析器
pub struct SelectorResolver {
    poll_interval: Duration,
    stats: Mutex<HashMap<String, LocatorStats>>,
}

impl SelectorResolver {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.min(MAX_POLL_INTERVAL),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// 在整个页面中解析
    pub async fn resolve(
        &self,
        driver: &dyn PageDriver,
        set: &LocatorSet,
        timeout: Duration,
    ) -> Option<ElementRef> {
        self.resolve_in(driver, None, set, timeout).await
    }

    /// 在 `scope` 子树中解析，超时前每隔 poll_interval 重试一轮
    pub async fn resolve_in(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementRef>,
        set: &LocatorSet,
        timeout: Duration,
    ) -> Option<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some((index, element)) = self.try_first(driver, scope, set).await {
                self.record_hit(set, index);
                return Some(element);
            }
            if !self.pause_until(deadline).await {
                self.record_miss(set);
                return None;
            }
        }
    }

    /// 组合概念的解析，如"Review 或 Next 按钮"
    ///
    /// 每一轮按 `sets` 顺序尝试，返回命中集合的下标和元素
    pub async fn resolve_any(
        &self,
        driver: &dyn PageDriver,
        sets: &[&LocatorSet],
        timeout: Duration,
    ) -> Option<(usize, ElementRef)> {
        let deadline = Instant::now() + timeout;
        loop {
            for (set_index, set) in sets.iter().enumerate() {
                if let Some((index, element)) = self.try_first(driver, None, set).await {
                    self.record_hit(set, index);
                    return Some((set_index, element));
                }
            }
            if !self.pause_until(deadline).await {
                for set in sets {
                    self.record_miss(set);
                }
                return None;
            }
        }
    }

    /// 返回第一条能匹配到元素的定位器所匹配的全部元素
    pub async fn resolve_all(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementRef>,
        set: &LocatorSet,
        timeout: Duration,
    ) -> Vec<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            for (index, locator) in set.locators.iter().enumerate() {
                let candidates = match driver.find_all(scope, locator).await {
                    Ok(found) => found,
                    Err(e) => {
                        debug!("定位器 {} 查询失败: {:#}", locator, e);
                        continue;
                    }
                };
                let mut matched = Vec::with_capacity(candidates.len());
                for element in candidates {
                    if self.satisfies(driver, set.predicate, element).await {
                        matched.push(element);
                    }
                }
                if !matched.is_empty() {
                    self.record_hit(set, index);
                    return matched;
                }
            }
            if !self.pause_until(deadline).await {
                self.record_miss(set);
                return Vec::new();
            }
        }
    }

    /// 单次探测，不等待
    pub async fn any_matches(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementRef>,
        set: &LocatorSet,
    ) -> bool {
        self.try_first(driver, scope, set).await.is_some()
    }

    /// 有界条件等待：条件成立返回 true，超时返回 false
    pub async fn wait_until<F, Fut>(&self, timeout: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if condition().await {
                return true;
            }
            if !self.pause_until(deadline).await {
                return false;
            }
        }
    }

    /// 当前统计快照，按集合名排序
    pub fn stats(&self) -> Vec<(String, LocatorStats)> {
        let guard = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut entries: Vec<_> = guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// 输出定位器漂移报告：只列出用到回退或完全未命中的集合
    pub fn log_drift_report(&self) {
        let drifted: Vec<_> = self
            .stats()
            .into_iter()
            .filter(|(_, s)| s.used_fallback() || (s.misses > 0 && s.hits.is_empty()))
            .collect();

        if drifted.is_empty() {
            return;
        }
        info!("🧭 定位器命中情况（可能存在页面改版）:");
        for (name, stats) in drifted {
            if stats.hits.is_empty() {
                warn!("  {} 全部未命中 ({} 次)", name, stats.misses);
            } else {
                info!("  {} 命中分布 {:?}，未命中 {} 次", name, stats.hits, stats.misses);
            }
        }
    }

    async fn try_first(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementRef>,
        set: &LocatorSet,
    ) -> Option<(usize, ElementRef)> {
        for (index, locator) in set.locators.iter().enumerate() {
            let candidates = match driver.find_all(scope, locator).await {
                Ok(found) => found,
                Err(e) => {
                    debug!("定位器 {} 查询失败: {:#}", locator, e);
                    continue;
                }
            };
            for element in candidates {
                if self.satisfies(driver, set.predicate, element).await {
                    return Some((index, element));
                }
            }
        }
        None
    }

    async fn satisfies(
        &self,
        driver: &dyn PageDriver,
        predicate: MatchPredicate,
        element: ElementRef,
    ) -> bool {
        match predicate {
            MatchPredicate::Present => true,
            MatchPredicate::Interactable => driver.is_interactable(element).await.unwrap_or(false),
        }
    }

    /// 距截止时间还有余量则休眠一个间隔并返回 true
    async fn pause_until(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(self.poll_interval.min(deadline - now)).await;
        true
    }

    fn record_hit(&self, set: &LocatorSet, index: usize) {
        debug!(
            target: "quick_apply::locator",
            set = %set.name,
            index,
            locator = %set.locators[index],
            fallback = index > 0,
            "定位器命中"
        );
        let mut guard = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard
            .entry(set.name.clone())
            .or_default()
            .hits
            .entry(index)
            .or_default() += 1;
    }

    fn record_miss(&self, set: &LocatorSet) {
        debug!(target: "quick_apply::locator", set = %set.name, "定位器全部未命中");
        let mut guard = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entry(set.name.clone()).or_default().misses += 1;
    }
}
