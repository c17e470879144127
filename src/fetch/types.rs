// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for page acquisition

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw markup and document title of a fetched page
///
/// Both fields are populated together; a strategy that cannot produce both
/// returns a [`FetchError`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// Rendered markup of the whole document
    pub content: String,
    /// Document title (falls back to the URL when the page has none)
    pub title: String,
}

impl FetchResult {
    /// Build a result from fetched markup, rejecting empty bodies
    ///
    /// A blank title is replaced by the URL so the pair is never partial.
    pub fn new(url: &str, content: String, title: Option<String>) -> Result<Self, FetchError> {
        if content.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());

        Ok(Self { content, title })
    }
}

/// Failure of a single strategy attempt
///
/// These are caught by the coordinator and never reach the caller on their
/// own.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Attempt exceeded its time budget
    #[error("{strategy} timed out after {timeout_ms}ms")]
    Timeout {
        /// Strategy that timed out
        strategy: String,
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} for: {url}")]
    Status {
        /// Status code returned
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response had no usable markup
    #[error("Empty body from: {url}")]
    EmptyBody {
        /// Requested URL
        url: String,
    },

    /// Response is not an HTML document (image, archive, binary payload)
    #[error("Not an HTML document ({content_type}) from: {url}")]
    NotHtml {
        /// Requested URL
        url: String,
        /// Declared media type, or `unknown` when the server sent none
        content_type: String,
    },

    /// Response is still an anti-bot interstitial
    #[error("Challenge page served for: {url}")]
    ChallengePage {
        /// Requested URL
        url: String,
    },

    /// Browser launch, navigation or DevTools failure
    #[error("Browser error: {0}")]
    Browser(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// A strategy failure recorded while walking the chain
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    /// Strategy name
    pub strategy: String,
    /// Why it failed
    pub error: FetchError,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

/// Terminal errors surfaced to the caller of the coordinator
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Every configured strategy failed or timed out
    #[error("All strategies failed for {url}: {}", summarize(failures))]
    AllStrategiesFailed {
        /// Requested URL
        url: String,
        /// One entry per attempted strategy, in attempt order
        failures: Vec<StrategyFailure>,
    },

    /// Caller cancelled the operation
    #[error("Fetch cancelled")]
    Cancelled,
}

fn summarize(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategies configured".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
