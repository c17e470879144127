// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Browser-automation strategies
//!
//! Renders the page in headless Chromium so JavaScript-built content and
//! cookie-gated pages come through. Two variants:
//! - [`BrowserMode::Launch`]: spawns a private Chromium with a throwaway
//!   profile directory and kills it afterwards
//! - [`BrowserMode::Remote`]: attaches to an already running Chromium over
//!   its DevTools websocket and only owns the tab it opens
//!
//! Every exit path releases what was acquired. Explicit `close()` calls are
//! the normal route; the `Drop` impls cover attempts dropped by a timeout or
//! caller cancellation.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::challenge::has_challenge_marker;
use super::config::BrowserSettings;
use super::strategy::FetchStrategy;
use super::types::{FetchError, FetchResult};
use super::user_agent::{resolve_user_agent, UserAgentSource};

/// How the strategy obtains a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserMode {
    /// Launch a private headless instance per fetch
    Launch,
    /// Attach to a running instance at this DevTools websocket URL
    Remote(String),
}

/// Headless-browser fetch strategy
pub struct BrowserStrategy {
    mode: BrowserMode,
    settings: BrowserSettings,
    user_agents: Arc<dyn UserAgentSource>,
}

impl BrowserStrategy {
    pub fn new(
        mode: BrowserMode,
        settings: BrowserSettings,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Self {
        Self {
            mode,
            settings,
            user_agents,
        }
    }

    pub fn mode(&self) -> &BrowserMode {
        &self.mode
    }
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let ua = resolve_user_agent(self.user_agents.as_ref()).await;

        let mut session = match &self.mode {
            BrowserMode::Launch => BrowserSession::launch(&self.settings).await?,
            BrowserMode::Remote(ws_url) => BrowserSession::connect(ws_url).await?,
        };

        let result = render_page(&session.browser, url, &ua, &self.settings).await;
        session.close().await;
        result
    }

    fn name(&self) -> &str {
        match self.mode {
            BrowserMode::Launch => "browser",
            BrowserMode::Remote(_) => "remote-browser",
        }
    }
}

fn browser_err(e: CdpError) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// A connected browser plus everything needed to tear it down
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    /// Whether we spawned the process (and must shut it down)
    owns_process: bool,
    /// Throwaway profile; removed when dropped, after the browser
    _profile: Option<TempDir>,
}

impl BrowserSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self, FetchError> {
        let profile = tempfile::Builder::new()
            .prefix("url-markdown-profile-")
            .tempdir()
            .map_err(|e| FetchError::Browser(format!("profile dir: {}", e)))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(Duration::from_millis(settings.navigation_timeout_ms))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled");
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(exe) = &settings.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(FetchError::Browser)?;

        debug!("browser: launching headless instance");
        let (browser, handler) = Browser::launch(config).await.map_err(browser_err)?;

        Ok(Self {
            browser,
            handler_task: spawn_handler(handler),
            owns_process: true,
            _profile: Some(profile),
        })
    }

    async fn connect(ws_url: &str) -> Result<Self, FetchError> {
        debug!("browser: connecting to {}", ws_url);
        let (browser, handler) = Browser::connect(ws_url).await.map_err(browser_err)?;

        Ok(Self {
            browser,
            handler_task: spawn_handler(handler),
            owns_process: false,
            _profile: None,
        })
    }

    async fn close(&mut self) {
        if self.owns_process {
            if let Err(e) = self.browser.close().await {
                warn!("browser: close failed: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("browser: wait for exit failed: {}", e);
            }
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // A launched Browser kills its child process on drop; the handler
        // task would otherwise keep the connection alive.
        self.handler_task.abort();
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("browser: handler event error: {}", e);
            }
        }
    })
}

/// Closes the tab when dropped without an explicit close
struct PageGuard {
    page: Option<Page>,
}

impl PageGuard {
    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("browser: tab close failed: {}", e);
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = page.close().await;
                });
            }
        }
    }
}

async fn render_page(
    browser: &Browser,
    url: &str,
    user_agent: &str,
    settings: &BrowserSettings,
) -> Result<FetchResult, FetchError> {
    let page = browser.new_page("about:blank").await.map_err(browser_err)?;
    let guard = PageGuard { page: Some(page) };
    let page = guard
        .page()
        .ok_or_else(|| FetchError::Browser("tab closed".to_string()))?;

    page.set_user_agent(user_agent).await.map_err(browser_err)?;

    let navigation_timeout = Duration::from_millis(settings.navigation_timeout_ms);
    let navigation = async {
        page.goto(url).await?;
        let status = page
            .wait_for_navigation_response()
            .await?
            .and_then(|request| request.response.as_ref().map(|response| response.status));
        wait_for_network_idle(page, navigation_timeout).await;
        Ok::<_, CdpError>(status)
    };
    match tokio::time::timeout(navigation_timeout, navigation).await {
        Ok(Ok(status)) => check_document_status(url, status)?,
        Ok(Err(e)) => {
            return Err(FetchError::Browser(format!(
                "navigation to {} failed: {}",
                url, e
            )))
        }
        Err(_) => warn!(
            "browser: {} not settled after {}ms, reading current DOM",
            url, settings.navigation_timeout_ms
        ),
    }

    let mut html = page.content().await.map_err(browser_err)?;
    if has_challenge_marker(&html) {
        info!(
            "browser: challenge marker on {}, waiting {}ms",
            url, settings.challenge_grace_ms
        );
        tokio::time::sleep(Duration::from_millis(settings.challenge_grace_ms)).await;
        html = page.content().await.map_err(browser_err)?;
    }

    let title = page.get_title().await.map_err(browser_err)?;
    guard.close().await;

    FetchResult::new(url, html, title)
}

/// Fail on a non-2xx main document; an unknown status passes
fn check_document_status(url: &str, status: Option<i64>) -> Result<(), FetchError> {
    match status {
        Some(code) if !(200..300).contains(&code) => Err(FetchError::Status {
            status: u16::try_from(code).unwrap_or(0),
            url: url.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Wait until `document.readyState` is complete and the resource count has
/// been stable for half a second, or `limit` elapses inside the page
async fn wait_for_network_idle(page: &Page, limit: Duration) {
    let js = format!(
        r#"(async () => {{
            const limit = {limit_ms};
            const start = Date.now();
            let last = -1;
            let stable = 0;
            while (Date.now() - start < limit) {{
                await new Promise(r => setTimeout(r, 100));
                let count = 0;
                try {{ count = performance.getEntriesByType('resource').length; }} catch (_) {{}}
                if (document.readyState === 'complete' && count === last) {{
                    stable += 100;
                    if (stable >= 500) return true;
                }} else {{
                    stable = 0;
                }}
                last = count;
            }}
            return false;
        }})()"#,
        limit_ms = limit.as_millis()
    );

    match page.evaluate(js).await {
        Ok(value) => {
            let idle = value.into_value::<bool>().unwrap_or(false);
            debug!("browser: network idle = {}", idle);
        }
        Err(e) => debug!("browser: network-idle check failed: {}", e),
    }
}
