// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for page acquisition
//!
//! Defines the strategy chain, retry policy, browser settings and caching.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Acquisition techniques that can appear in the strategy chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Plain GET with retry
    Http,
    /// GET with a full browser request fingerprint
    Stealth,
    /// Locally launched headless Chromium
    Browser,
    /// Already running Chromium reached over its DevTools endpoint
    RemoteBrowser,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stealth => "stealth",
            Self::Browser => "browser",
            Self::RemoteBrowser => "remote-browser",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stealth" => Ok(Self::Stealth),
            "browser" => Ok(Self::Browser),
            "remote-browser" | "remote" => Ok(Self::RemoteBrowser),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the strategy chain; declaration order is priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Time budget for one attempt in milliseconds
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind, timeout_ms: u64) -> Self {
        Self {
            kind,
            timeout_ms,
            enabled: true,
        }
    }

    /// Default time budget for a strategy kind
    pub fn default_timeout_ms(kind: StrategyKind) -> u64 {
        match kind {
            StrategyKind::Http => 15_000,
            StrategyKind::Stealth => 20_000,
            StrategyKind::Browser | StrategyKind::RemoteBrowser => 60_000,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Bounded retry with exponential backoff for HTTP strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    /// Status codes worth retrying; everything else fails immediately
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            exponential_base: 2.0,
            retry_statuses: vec![408, 425, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before retry number `retry` (0-based)
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let factor = self.exponential_base.powi(retry as i32);
        let delay = (self.initial_delay_ms as f64 * factor) as u64;
        delay.min(self.max_delay_ms)
    }

    pub fn should_retry(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

/// Settings shared by the browser strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,
    /// Keep the Chromium sandbox on (turn off inside containers running as root)
    pub sandbox: bool,
    /// Bound on waiting for navigation / DOM-ready
    pub navigation_timeout_ms: u64,
    /// Fixed wait when a challenge marker is present
    pub challenge_grace_ms: u64,
    /// DevTools websocket URL for the remote-browser strategy
    pub remote_url: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            navigation_timeout_ms: 30_000,
            challenge_grace_ms: 10_000,
            remote_url: None,
        }
    }
}

/// Configuration for page acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Fixed user-agent; the supplier and the built-in UA are used when unset
    pub user_agent: Option<String>,
    /// API key for the user-agent generator service
    /// (`URL_MARKDOWN_USER_AGENT_API_KEY`)
    #[serde(skip_serializing)]
    pub user_agent_api_key: Option<String>,
    /// Cache TTL in seconds (default: 3600)
    pub cache_ttl_secs: u64,
    /// Maximum cache entries (default: 256)
    pub max_cache_entries: usize,
    /// Strategy chain in priority order
    pub strategies: Vec<StrategyConfig>,
    pub retry: RetryPolicy,
    pub browser: BrowserSettings,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                StrategyConfig::new(StrategyKind::Http, 15_000),
                StrategyConfig::new(StrategyKind::Stealth, 20_000),
                StrategyConfig::new(StrategyKind::Browser, 60_000),
            ],
            retry: RetryPolicy::default(),
            browser: BrowserSettings::default(),
            user_agent: None,
            user_agent_api_key: None,
            cache_ttl_secs: 3600,
            max_cache_entries: 256,
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `URL_MARKDOWN_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(list) = env::var("URL_MARKDOWN_STRATEGIES") {
            let kinds: Vec<StrategyKind> = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            if !kinds.is_empty() {
                self.select_strategies(&kinds);
            }
        }

        for strategy in &mut self.strategies {
            let var = format!(
                "URL_MARKDOWN_{}_TIMEOUT_MS",
                strategy.kind.as_str().replace('-', "_").to_uppercase()
            );
            if let Some(ms) = env::var(&var).ok().and_then(|v| v.parse().ok()) {
                strategy.timeout_ms = ms;
            }
        }

        if let Some(attempts) = env::var("URL_MARKDOWN_RETRY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.retry.max_attempts = attempts;
        }
        if let Ok(path) = env::var("URL_MARKDOWN_CHROME") {
            self.browser.executable = Some(PathBuf::from(path));
        }
        if let Ok(v) = env::var("URL_MARKDOWN_BROWSER_SANDBOX") {
            self.browser.sandbox = v.to_lowercase() != "false";
        }
        if let Ok(url) = env::var("URL_MARKDOWN_REMOTE_BROWSER") {
            self.browser.remote_url = Some(url);
        }
        if let Ok(ua) = env::var("URL_MARKDOWN_USER_AGENT") {
            self.user_agent = Some(ua);
        }
        if let Ok(key) = env::var("URL_MARKDOWN_USER_AGENT_API_KEY") {
            self.user_agent_api_key = Some(key);
        }
        if let Some(ttl) = env::var("URL_MARKDOWN_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.cache_ttl_secs = ttl;
        }
        if let Some(max) = env::var("URL_MARKDOWN_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_cache_entries = max;
        }
    }

    /// Replace the chain with `kinds`, in that order
    ///
    /// Kinds already configured keep their timeout; new ones get the default.
    /// An empty list leaves the chain untouched.
    pub fn select_strategies(&mut self, kinds: &[StrategyKind]) {
        if kinds.is_empty() {
            return;
        }
        let mut selected: Vec<StrategyConfig> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if selected.iter().any(|s| s.kind == kind) {
                continue;
            }
            let timeout_ms = self
                .strategies
                .iter()
                .find(|s| s.kind == kind)
                .map(|s| s.timeout_ms)
                .unwrap_or_else(|| StrategyConfig::default_timeout_ms(kind));
            selected.push(StrategyConfig::new(kind, timeout_ms));
        }
        self.strategies = selected;
    }

    /// Enabled strategies in declaration order
    pub fn enabled_strategies(&self) -> impl Iterator<Item = &StrategyConfig> {
        self.strategies.iter().filter(|s| s.enabled)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled_strategies().next().is_none() {
            return Err("at least one strategy must be enabled".to_string());
        }
        if let Some(s) = self.strategies.iter().find(|s| s.timeout_ms == 0) {
            return Err(format!("{} timeout_ms must be at least 1", s.kind));
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.retry.exponential_base < 1.0 {
            return Err("retry.exponential_base must be >= 1.0".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("cache_ttl_secs must be greater than 0".to_string());
        }
        if self.max_cache_entries == 0 {
            return Err("max_cache_entries must be at least 1".to_string());
        }
        let wants_remote = self
            .enabled_strategies()
            .any(|s| s.kind == StrategyKind::RemoteBrowser);
        if wants_remote && self.browser.remote_url.is_none() {
            return Err("remote-browser strategy requires browser.remote_url".to_string());
        }
        Ok(())
    }
}
