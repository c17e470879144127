// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lightweight HTTP strategy
//!
//! A single GET with a supplied user-agent and bounded retry. Does not run
//! JavaScript, so it is the cheapest strategy and usually tried first.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
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

/// Plain HTTP fetch strategy
pub struct HttpStrategy {
    client: Client,
    retry: RetryPolicy,
    user_agents: Arc<dyn UserAgentSource>,
}

impl HttpStrategy {
    pub fn new(
        retry: RetryPolicy,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            retry,
            user_agents,
        })
    }
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let ua = resolve_user_agent(self.user_agents.as_ref()).await;
        debug!("http: GET {}", url);

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
        "http"
    }
}
