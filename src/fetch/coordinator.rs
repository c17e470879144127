// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Strategy chain orchestration
//!
//! Walks the strategies in priority order, each under its own timeout, and
//! returns the first success. Only one attempt is in flight at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::browser::{BrowserMode, BrowserStrategy};
use super::cache::ResultCache;
use super::config::{FetchConfig, StrategyKind};
use super::http::HttpStrategy;
use super::stealth::StealthHttpStrategy;
use super::strategy::{FetchStrategy, StrategyDescriptor};
use super::types::{FetchError, FetchResult, ScrapeError, StrategyFailure};
use super::user_agent::UserAgentSource;

/// Runs the strategy chain with caching and cancellation
pub struct RaceCoordinator {
    strategies: Vec<(StrategyDescriptor, Box<dyn FetchStrategy>)>,
    cache: Arc<ResultCache>,
}

impl RaceCoordinator {
    /// Create a coordinator with an empty chain
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self {
            strategies: Vec::new(),
            cache,
        }
    }

    /// Build the chain described by `config`
    ///
    /// Declaration order becomes priority; disabled entries are skipped.
    pub fn from_config(
        config: &FetchConfig,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Result<Self, FetchError> {
        let cache = Arc::new(ResultCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.max_cache_entries,
        ));
        let mut coordinator = Self::new(cache);

        for (priority, entry) in config.enabled_strategies().enumerate() {
            let strategy: Box<dyn FetchStrategy> = match entry.kind {
                StrategyKind::Http => Box::new(HttpStrategy::new(
                    config.retry.clone(),
                    Arc::clone(&user_agents),
                )?),
                StrategyKind::Stealth => Box::new(StealthHttpStrategy::new(
                    config.retry.clone(),
                    Arc::clone(&user_agents),
                )?),
                StrategyKind::Browser => Box::new(BrowserStrategy::new(
                    BrowserMode::Launch,
                    config.browser.clone(),
                    Arc::clone(&user_agents),
                )),
                StrategyKind::RemoteBrowser => {
                    let ws_url = config.browser.remote_url.clone().ok_or_else(|| {
                        FetchError::Browser(
                            "remote-browser strategy requires browser.remote_url".to_string(),
                        )
                    })?;
                    Box::new(BrowserStrategy::new(
                        BrowserMode::Remote(ws_url),
                        config.browser.clone(),
                        Arc::clone(&user_agents),
                    ))
                }
            };
            coordinator.add_strategy(strategy, priority as u32, entry.timeout_ms);
            debug!("{} strategy enabled ({}ms)", entry.kind, entry.timeout_ms);
        }

        Ok(coordinator)
    }

    /// Add a strategy to the chain
    ///
    /// The chain stays sorted by priority; equal priorities keep insertion
    /// order.
    pub fn add_strategy(
        &mut self,
        strategy: Box<dyn FetchStrategy>,
        priority: u32,
        timeout_ms: u64,
    ) {
        let descriptor = StrategyDescriptor::new(strategy.name(), priority, timeout_ms);
        self.strategies.push((descriptor, strategy));
        self.strategies.sort_by_key(|(d, _)| d.priority);
    }

    /// Builder form of [`add_strategy`](Self::add_strategy)
    pub fn with_strategy(
        mut self,
        strategy: Box<dyn FetchStrategy>,
        priority: u32,
        timeout_ms: u64,
    ) -> Self {
        self.add_strategy(strategy, priority, timeout_ms);
        self
    }

    /// Strategy descriptors in attempt order
    pub fn descriptors(&self) -> Vec<&StrategyDescriptor> {
        self.strategies.iter().map(|(d, _)| d).collect()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Fetch `url` through the cache and strategy chain
    pub async fn fetch_content(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        self.fetch_content_with_cancel(url, &CancellationToken::new())
            .await
    }

    /// Fetch `url`, aborting as soon as `cancel` fires
    ///
    /// On cancellation the running attempt is dropped (releasing its
    /// resources), no further strategies are tried and nothing is cached.
    pub async fn fetch_content_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, ScrapeError> {
        if cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        if let Some(cached) = self.cache.get(url) {
            debug!("Result cache hit for: {}", url);
            return Ok(cached);
        }

        let start = Instant::now();
        let mut failures = Vec::new();

        for (descriptor, strategy) in &self.strategies {
            debug!("Trying strategy {} for {}", descriptor.name, url);

            let attempt = tokio::time::timeout(
                Duration::from_millis(descriptor.timeout_ms),
                strategy.fetch(url),
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Fetch of {} cancelled during {}", url, descriptor.name);
                    return Err(ScrapeError::Cancelled);
                }
                outcome = attempt => outcome,
            };

            let error = match outcome {
                Ok(Ok(result)) => {
                    self.cache.put(url, result.clone());
                    info!(
                        "Fetched {} bytes from {} via {} in {}ms",
                        result.content.len(),
                        url,
                        descriptor.name,
                        start.elapsed().as_millis()
                    );
                    return Ok(result);
                }
                Ok(Err(e)) => e,
                Err(_) => FetchError::Timeout {
                    strategy: descriptor.name.clone(),
                    timeout_ms: descriptor.timeout_ms,
                },
            };

            warn!("Strategy {} failed: {}, trying next", descriptor.name, error);
            failures.push(StrategyFailure {
                strategy: descriptor.name.clone(),
                error,
            });
        }

        Err(ScrapeError::AllStrategiesFailed {
            url: url.to_string(),
            failures,
        })
    }
}
