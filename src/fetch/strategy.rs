// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fetch strategy trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{FetchError, FetchResult};

/// One self-contained technique for retrieving a page's markup and title
///
/// Implementations must either return both outputs or fail. Anything a
/// strategy acquires (connections, child processes, temp dirs) must be
/// released when the returned future completes *or is dropped*, because the
/// coordinator cancels attempts by dropping them.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetch the rendered markup and title of `url`
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;

    /// Strategy name for logging and error reports
    fn name(&self) -> &str;
}

/// Scheduling metadata for a strategy in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    /// Strategy name
    pub name: String,
    /// Lower is tried first; ties keep declaration order
    pub priority: u32,
    /// Time budget for a single attempt
    pub timeout_ms: u64,
}

impl StrategyDescriptor {
    pub fn new(name: impl Into<String>, priority: u32, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            priority,
            timeout_ms,
        }
    }
}
