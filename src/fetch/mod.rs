// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page acquisition
//!
//! Fetches the rendered markup and title of a URL, surviving bot checks,
//! JavaScript-built pages and flaky networks by trying several strategies
//! in order.
//!
//! ## Architecture
//!
//! ```text
//! URL → ResultCache ──hit──────────────────────────────→ FetchResult
//!          │ miss
//!          ↓
//!     RaceCoordinator: http → stealth → browser (each under its own timeout)
//!          │ first success
//!          ↓
//!     ResultCache (1h TTL, LRU) ───────────────────────→ FetchResult
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let config = FetchConfig::from_env();
//! let ua = user_agent_source(config.user_agent.as_deref(), None);
//! let coordinator = RaceCoordinator::from_config(&config, ua)?;
//! let page = coordinator.fetch_content("https://example.com").await?;
//! ```

pub mod browser;
pub mod cache;
pub mod challenge;
pub mod config;
pub mod coordinator;
pub mod http;
mod retry;
pub mod stealth;
pub mod strategy;
pub mod types;
pub mod user_agent;

pub use browser::{BrowserMode, BrowserStrategy};
pub use cache::{ResultCache, ResultCacheStats};
pub use config::{BrowserSettings, FetchConfig, RetryPolicy, StrategyConfig, StrategyKind};
pub use coordinator::RaceCoordinator;
pub use http::HttpStrategy;
pub use stealth::StealthHttpStrategy;
pub use strategy::{FetchStrategy, StrategyDescriptor};
pub use types::{FetchError, FetchResult, ScrapeError, StrategyFailure};
pub use user_agent::{
    user_agent_source, ApiLayerUserAgent, StaticUserAgent, UserAgentSource, DEFAULT_USER_AGENT,
};
