// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod version;

// Re-export main types
pub use config::{AppConfig, ConfigError};
pub use extract::{extract_main_content, ContentExtractor, Extracted, MatchedBy};
pub use fetch::{FetchError, FetchResult, FetchStrategy, RaceCoordinator, ScrapeError};
pub use logging::{init_logging, LogSink, SinkLayer};
pub use pipeline::{slugify, Conversion, Converter};
pub use render::{HtmdRenderer, MarkdownRenderer};
