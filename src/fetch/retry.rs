// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request helpers shared by the HTTP strategies

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

use super::config::RetryPolicy;
use super::types::FetchError;

/// Send a request built by `build`, retrying transient statuses
///
/// Transport errors fail immediately; only statuses in
/// `policy.retry_statuses` are retried, up to `policy.max_attempts` total
/// attempts with exponential backoff between them.
pub(crate) async fn send_with_retry<F>(
    policy: &RetryPolicy,
    url: &str,
    mut build: F,
) -> Result<Response, FetchError>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let response = build().send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        if attempt >= policy.max_attempts || !policy.should_retry(code) {
            return Err(FetchError::Status {
                status: code,
                url: url.to_string(),
            });
        }

        let delay = policy.delay_ms(attempt - 1);
        debug!(
            "HTTP {} from {} (attempt {}/{}), retrying in {}ms",
            code, url, attempt, policy.max_attempts, delay
        );
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// Media types accepted as a page
const MARKUP_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Read a successful response body as markup
///
/// A declared media type other than HTML/XHTML fails with `NotHtml` before
/// the body is read. Without a declared type, a body that decodes to binary
/// noise fails the same way.
pub(crate) async fn read_markup(response: Response, url: &str) -> Result<String, FetchError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase());

    if let Some(declared) = &content_type {
        if !is_markup_type(declared) {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type: declared.clone(),
            });
        }
    }

    let body = response.text().await?;
    if looks_binary(&body) {
        return Err(FetchError::NotHtml {
            url: url.to_string(),
            content_type: content_type.unwrap_or_else(|| "unknown".to_string()),
        });
    }
    Ok(body)
}

fn is_markup_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    MARKUP_TYPES.contains(&essence)
}

/// NUL bytes, or more than one in ten characters lost to lossy decoding
fn looks_binary(body: &str) -> bool {
    if body.contains('\0') {
        return true;
    }
    let (total, replaced) = body.chars().fold((0usize, 0usize), |(total, replaced), c| {
        (total + 1, replaced + usize::from(c == char::REPLACEMENT_CHARACTER))
    });
    replaced * 10 > total
}

/// Extract the `<title>` text from a document
pub(crate) fn extract_title(html: &str) -> Option<String> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
