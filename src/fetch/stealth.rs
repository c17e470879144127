// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Challenge-bypass HTTP strategy
//!
//! Same contract as [`HttpStrategy`](super::http::HttpStrategy) but the
//! request carries the header set a desktop Chrome navigation sends, keeps
//! cookies across redirects and accepts compressed bodies. This gets past
//! simple header-based bot heuristics; it does not solve challenges.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::challenge::is_challenge_interstitial;
use super::config::RetryPolicy;
use super::retry::{extract_title, read_markup, send_with_retry};
use super::strategy::FetchStrategy;
use super::types::{FetchError, FetchResult};
use super::user_agent::{resolve_user_agent, UserAgentSource};

/// HTTP fetch with a browser-like request fingerprint
pub struct StealthHttpStrategy {
    client: Client,
    retry: RetryPolicy,
    user_agents: Arc<dyn UserAgentSource>,
}

impl StealthHttpStrategy {
    pub fn new(
        retry: RetryPolicy,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(browser_headers())
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            retry,
            user_agents,
        })
    }
}

/// Headers of a top-level Chrome navigation, minus the user-agent
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs: [(&'static str, &'static str); 12] = [
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        (
            "sec-ch-ua",
            "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
    ];
    for (name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

#[async_trait]
impl FetchStrategy for StealthHttpStrategy {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let ua = resolve_user_agent(self.user_agents.as_ref()).await;
        debug!("stealth: GET {}", url);

        let response = send_with_retry(&self.retry, url, || {
            self.client.get(url).header(USER_AGENT, ua.as_str())
        })
        .await?;

        let html = read_markup(response, url).await?;
        if is_challenge_interstitial(&html) {
            return Err(FetchError::ChallengePage {
                url: url.to_string(),
            });
        }

        let title = extract_title(&html);
        FetchResult::new(url, html, title)
    }

    fn name(&self) -> &str {
        "stealth"
    }
}
