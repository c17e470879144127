// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! User-agent suppliers
//!
//! Strategies ask a [`UserAgentSource`] for a UA string per fetch and fall
//! back to [`DEFAULT_USER_AGENT`] when it returns nothing.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop Chrome UA used when no supplier value is available
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const APILAYER_UA_URL: &str = "https://api.apilayer.com/user_agent/generate";

/// Capability returning a user-agent string, or nothing
#[async_trait]
pub trait UserAgentSource: Send + Sync {
    async fn user_agent(&self) -> Option<String>;
}

/// Resolve a UA from `source`, falling back to the built-in one
pub async fn resolve_user_agent(source: &dyn UserAgentSource) -> String {
    source
        .user_agent()
        .await
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

/// Pick a supplier: a fixed UA wins, then the generator service, then the
/// built-in UA
pub fn user_agent_source(
    fixed: Option<&str>,
    api_key: Option<&str>,
) -> Arc<dyn UserAgentSource> {
    if let Some(ua) = fixed {
        return Arc::new(StaticUserAgent(ua.to_string()));
    }
    if let Some(key) = api_key {
        match ApiLayerUserAgent::new(key) {
            Ok(source) => return Arc::new(source),
            Err(e) => warn!("User agent service unavailable: {}", e),
        }
    }
    Arc::new(StaticUserAgent::default())
}

/// Always returns the same string
#[derive(Debug, Clone)]
pub struct StaticUserAgent(pub String);

impl Default for StaticUserAgent {
    fn default() -> Self {
        Self(DEFAULT_USER_AGENT.to_string())
    }
}

#[async_trait]
impl UserAgentSource for StaticUserAgent {
    async fn user_agent(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedUserAgent {
    ua: Option<String>,
}

/// Random desktop UA from the apilayer generator service
///
/// Any failure (transport, status, payload) yields `None`; there is no retry.
pub struct ApiLayerUserAgent {
    client: Client,
    api_key: String,
    url: String,
}

impl ApiLayerUserAgent {
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_url(api_key, APILAYER_UA_URL)
    }

    pub fn with_url(
        api_key: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: url.into(),
        })
    }
}

#[async_trait]
impl UserAgentSource for ApiLayerUserAgent {
    async fn user_agent(&self) -> Option<String> {
        debug!("Fetching user agent from {}", self.url);

        let response = match self
            .client
            .get(&self.url)
            .header("apikey", &self.api_key)
            .query(&[("windows", "true"), ("linux", "true"), ("mac", "true")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to fetch user agent: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("User agent service returned {}", response.status());
            return None;
        }

        match response.json::<GeneratedUserAgent>().await {
            Ok(body) => {
                debug!("Fetched user agent: {:?}", body.ua);
                body.ua
            }
            Err(e) => {
                warn!("Invalid user agent payload: {}", e);
                None
            }
        }
    }
}
