// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application configuration
//!
//! Defaults, then a TOML file, then `URL_MARKDOWN_*` environment overrides.
//!
//! ```toml
//! [fetch]
//! cache_ttl_secs = 3600
//!
//! [[fetch.strategies]]
//! kind = "http"
//! timeout_ms = 15000
//!
//! [[fetch.strategies]]
//! kind = "browser"
//! timeout_ms = 60000
//!
//! [fetch.browser]
//! sandbox = false
//!
//! [extract.cleaning]
//! unwanted_tags = ["nav", "footer", "script"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extract::ExtractConfig;
use crate::fetch::FetchConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file; missing sections keep defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) {
        self.fetch.apply_env();
    }

    /// Resolve configuration for the binary: optional file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch.validate().map_err(ConfigError::Invalid)?;
        if self
            .extract
            .selectors
            .containers
            .iter()
            .any(|c| c.selector.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "extract.selectors.containers entries need a selector".to_string(),
            ));
        }
        Ok(())
    }
}
