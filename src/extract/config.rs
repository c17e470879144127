// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Selector and cleaning policy for content extraction

use serde::{Deserialize, Serialize};

/// A site-specific wrapper around article content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleContainer {
    /// CSS selector of the wrapper
    pub selector: String,
    /// CSS selector of the content body nested inside the wrapper
    #[serde(default)]
    pub body: Option<String>,
}

impl ArticleContainer {
    pub fn new(selector: &str, body: Option<&str>) -> Self {
        Self {
            selector: selector.to_string(),
            body: body.map(str::to_string),
        }
    }
}

/// Ordered candidates for the main content element
///
/// `ids` and `classes` match as case-insensitive substrings of the
/// attribute value, so `"content"` also picks `"Article__content--dark"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSelectors {
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    /// Checked before `ids` and `classes`
    pub containers: Vec<ArticleContainer>,
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            containers: vec![
                // ReadMe-hosted documentation
                ArticleContainer::new(".rm-Article", Some(".markdown-body")),
                ArticleContainer::new("main", None),
                ArticleContainer::new("article", Some("[itemprop~=\"articleBody\"]")),
            ],
            ids: strings(&["content", "main-content", "article-content"]),
            classes: strings(&["rm-Article", "content-body", "article", "post-content"]),
        }
    }
}

/// Boilerplate removal rules
///
/// Tags match by exact name. Classes and ids match as case-insensitive
/// substrings of the whole attribute value and deliberately over-match:
/// `"nav"` removes `class="navigator-widget"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub unwanted_tags: Vec<String>,
    pub unwanted_classes: Vec<String>,
    pub unwanted_ids: Vec<String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            unwanted_tags: strings(&[
                "nav", "footer", "header", "breadcrumb", "aside", "script", "style", "iframe",
                "button",
            ]),
            unwanted_classes: strings(&[
                "navigation",
                "nav",
                "footer",
                "menu",
                "sidebar",
                "breadcrumb",
                "author",
                "bio",
                "profile",
                "social",
                "share",
                "sharing",
                "twitter",
                "facebook",
                "linkedin",
                "related-posts",
                "post-block",
                "entry-meta",
                "single-more-articles",
                "rdmd-code-copy",
                "codetabs-toolbar",
                "heading-anchor-icon",
                "pagethumbs",
                "updatedat",
            ]),
            unwanted_ids: strings(&[
                "author",
                "social",
                "share",
                "profile",
                "bio",
                "tutorialmodal-root",
            ]),
        }
    }
}

impl CleaningRules {
    /// Rules that remove nothing
    pub fn empty() -> Self {
        Self {
            unwanted_tags: Vec::new(),
            unwanted_classes: Vec::new(),
            unwanted_ids: Vec::new(),
        }
    }
}

/// Extraction settings as loaded from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub selectors: ContentSelectors,
    pub cleaning: CleaningRules,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
