// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Main-content extraction
//!
//! ```text
//! raw HTML → clean (tags, classes, ids, author metadata)
//!          → containers → ids → classes → body
//! ```

pub mod config;
pub mod extractor;

pub use config::{ArticleContainer, CleaningRules, ContentSelectors, ExtractConfig};
pub use extractor::{extract_main_content, ContentExtractor, Extracted, MatchedBy};
