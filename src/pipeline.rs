// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! URL to Markdown conversion
//!
//! ```text
//! URL → RaceCoordinator → FetchResult → ContentExtractor → MarkdownRenderer → Conversion
//! ```

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::extract::ContentExtractor;
use crate::fetch::{user_agent_source, FetchError, RaceCoordinator, ScrapeError};
use crate::render::{HtmdRenderer, MarkdownRenderer};

/// A converted page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub markdown: String,
    pub title: String,
    /// No content rule matched and the whole body was rendered
    pub degraded: bool,
}

impl Conversion {
    /// File-name-safe form of the title
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }
}

/// Fetches, extracts and renders pages
pub struct Converter {
    coordinator: RaceCoordinator,
    extractor: ContentExtractor,
    renderer: Box<dyn MarkdownRenderer>,
    skip_extraction: bool,
}

impl Converter {
    pub fn new(
        coordinator: RaceCoordinator,
        extractor: ContentExtractor,
        renderer: Box<dyn MarkdownRenderer>,
    ) -> Self {
        Self {
            coordinator,
            extractor,
            renderer,
            skip_extraction: false,
        }
    }

    /// Wire the default pipeline from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let user_agents = user_agent_source(
            config.fetch.user_agent.as_deref(),
            config.fetch.user_agent_api_key.as_deref(),
        );
        let coordinator = RaceCoordinator::from_config(&config.fetch, user_agents)?;
        Ok(Self::new(
            coordinator,
            ContentExtractor::from_config(&config.extract),
            Box::new(HtmdRenderer::new()),
        ))
    }

    /// Render the whole fetched document instead of its main content
    pub fn skip_extraction(mut self, skip: bool) -> Self {
        self.skip_extraction = skip;
        self
    }

    pub fn coordinator(&self) -> &RaceCoordinator {
        &self.coordinator
    }

    pub async fn convert(&self, url: &str) -> Result<Conversion, ScrapeError> {
        self.convert_with_cancel(url, &CancellationToken::new())
            .await
    }

    /// Convert `url`, giving up as soon as `cancel` fires
    pub async fn convert_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Conversion, ScrapeError> {
        let page = self.coordinator.fetch_content_with_cancel(url, cancel).await?;

        let (fragment, degraded) = if self.skip_extraction {
            (page.content, false)
        } else {
            let extracted = self.extractor.extract_main_content(&page.content);
            if extracted.is_degraded() {
                warn!("No main content rule matched {}, rendering whole body", url);
            }
            let degraded = extracted.is_degraded();
            (extracted.html, degraded)
        };

        let markdown = self.renderer.render(&fragment);
        info!("Converted {} ({} chars of markdown)", url, markdown.len());

        Ok(Conversion {
            markdown,
            title: page.title,
            degraded,
        })
    }
}

/// Lowercase, drop punctuation, join words with dashes
///
/// An empty result becomes `"output"`.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let dashed = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let slug = dashed.trim_matches('-');

    if slug.is_empty() {
        "output".to_string()
    } else {
        slug.to_string()
    }
}
