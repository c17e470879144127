// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML fragment to Markdown

use htmd::options::{CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use htmd::HtmlToMarkdown;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use tracing::warn;

/// Converts an HTML fragment into Markdown
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, fragment: &str) -> String;
}

/// Default renderer backed by `htmd`
///
/// ATX headings, fenced code, inline links. Runs of blank lines are
/// collapsed and the output is trimmed.
#[derive(Debug, Clone, Default)]
pub struct HtmdRenderer;

impl HtmdRenderer {
    pub fn new() -> Self {
        Self
    }

    fn converter() -> HtmlToMarkdown {
        let options = Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            link_style: LinkStyle::Inlined,
            ..Default::default()
        };
        HtmlToMarkdown::builder().options(options).build()
    }
}

impl MarkdownRenderer for HtmdRenderer {
    fn render(&self, fragment: &str) -> String {
        match Self::converter().convert(fragment) {
            Ok(markdown) => tidy(&markdown),
            Err(e) => {
                warn!("Markdown conversion failed, using plain text: {}", e);
                tidy(&plain_text(fragment))
            }
        }
    }
}

fn plain_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank-run regex"))
}

fn tidy(markdown: &str) -> String {
    let trimmed_lines: Vec<&str> = markdown.lines().map(str::trim_end).collect();
    let joined = trimmed_lines.join("\n");
    blank_runs().replace_all(&joined, "\n\n").trim().to_string()
}
