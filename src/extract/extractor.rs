// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML content extraction
//!
//! Strips boilerplate from a page and isolates its main content element.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use super::config::{CleaningRules, ContentSelectors, ExtractConfig};

/// Elements the class/id rules never remove
const PROTECTED_TAGS: [&str; 2] = ["html", "body"];

/// Which rule selected the main content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedBy {
    /// Site-specific container, by its selector
    Container(String),
    /// Id rule entry
    Id(String),
    /// Class rule entry
    Class(String),
    /// Whole-body fallback
    Body,
}

/// Main content fragment of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Outer HTML of the selected element
    pub html: String,
    pub matched: MatchedBy,
}

impl Extracted {
    /// Nothing specific matched and the whole body was used
    pub fn is_degraded(&self) -> bool {
        self.matched == MatchedBy::Body
    }
}

struct CompiledContainer {
    source: String,
    selector: Selector,
    body: Option<Selector>,
}

/// Selector-driven cleaner and main-content picker
pub struct ContentExtractor {
    containers: Vec<CompiledContainer>,
    ids: Vec<String>,
    classes: Vec<String>,
    rules: CleaningRules,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(&ContentSelectors::default(), CleaningRules::default())
    }
}

impl ContentExtractor {
    /// Build an extractor; containers with unparsable selectors are skipped
    pub fn new(selectors: &ContentSelectors, rules: CleaningRules) -> Self {
        let mut containers = Vec::with_capacity(selectors.containers.len());
        for container in &selectors.containers {
            let Ok(selector) = Selector::parse(&container.selector) else {
                warn!("Ignoring invalid container selector: {}", container.selector);
                continue;
            };
            let body = match container.body.as_deref().map(Selector::parse) {
                Some(Ok(body)) => Some(body),
                Some(Err(_)) => {
                    warn!(
                        "Ignoring invalid content body selector for {}",
                        container.selector
                    );
                    None
                }
                None => None,
            };
            containers.push(CompiledContainer {
                source: container.selector.clone(),
                selector,
                body,
            });
        }

        Self {
            containers,
            ids: lowercase(&selectors.ids),
            classes: lowercase(&selectors.classes),
            rules: CleaningRules {
                unwanted_tags: lowercase(&rules.unwanted_tags),
                unwanted_classes: lowercase(&rules.unwanted_classes),
                unwanted_ids: lowercase(&rules.unwanted_ids),
            },
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(&config.selectors, config.cleaning.clone())
    }

    /// Clean `raw` and return its main content fragment
    ///
    /// Never fails: the document body is the worst case. Running this on its
    /// own output yields the same fragment.
    pub fn extract_main_content(&self, raw: &str) -> Extracted {
        let mut document = Html::parse_document(raw);
        self.clean(&mut document);
        let extracted = self.select_main(&document);
        debug!(
            "Extracted {} bytes via {:?}",
            extracted.html.len(),
            extracted.matched
        );
        extracted
    }

    /// Remove boilerplate subtrees in place
    pub fn clean(&self, document: &mut Html) {
        remove_matching(document, |el| {
            let name = el.value().name();
            !PROTECTED_TAGS.contains(&name) && self.rules.unwanted_tags.iter().any(|t| t == name)
        });
        remove_matching(document, |el| {
            !is_protected(el)
                && attr_contains_any(el.value().attr("class"), &self.rules.unwanted_classes)
        });
        remove_matching(document, |el| {
            !is_protected(el) && attr_contains_any(el.value().id(), &self.rules.unwanted_ids)
        });
        remove_matching(document, |el| !is_protected(el) && is_author_metadata(el));
    }

    fn select_main(&self, document: &Html) -> Extracted {
        for container in &self.containers {
            if let Some(found) = document.select(&container.selector).next() {
                let narrowed = container
                    .body
                    .as_ref()
                    .and_then(|body| found.select(body).next());
                return Extracted {
                    html: narrowed.unwrap_or(found).html(),
                    matched: MatchedBy::Container(container.source.clone()),
                };
            }
            // A fragment narrowed on a previous pass no longer carries its
            // wrapper; it is then the only thing in the body.
            if let Some(found) = container
                .body
                .as_ref()
                .and_then(|body| document.select(body).next())
                .filter(|found| is_sole_content(document, found))
            {
                return Extracted {
                    html: found.html(),
                    matched: MatchedBy::Container(container.source.clone()),
                };
            }
        }

        for needle in &self.ids {
            let by_id = first_element(document, |el| attr_contains(el.value().id(), needle));
            if let Some(found) = by_id {
                return Extracted {
                    html: found.html(),
                    matched: MatchedBy::Id(needle.clone()),
                };
            }
        }

        for needle in &self.classes {
            if let Some(found) =
                first_element(document, |el| attr_contains(el.value().attr("class"), needle))
            {
                return Extracted {
                    html: found.html(),
                    matched: MatchedBy::Class(needle.clone()),
                };
            }
        }

        let body = first_element(document, |el| el.value().name() == "body")
            .unwrap_or_else(|| document.root_element());
        Extracted {
            html: body.html(),
            matched: MatchedBy::Body,
        }
    }
}

/// Extract with the default selectors and cleaning rules
pub fn extract_main_content(raw: &str) -> Extracted {
    ContentExtractor::default().extract_main_content(raw)
}

fn remove_matching<F>(document: &mut Html, doomed: F)
where
    F: Fn(&ElementRef) -> bool,
{
    // Descendants of a matched node go with it; collect first, detach after
    let ids: Vec<_> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| doomed(el))
        .map(|el| el.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn first_element<'a, F>(document: &'a Html, pred: F) -> Option<ElementRef<'a>>
where
    F: Fn(&ElementRef) -> bool,
{
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| pred(el))
}

/// `el` is the body's single child, with no text beside it
fn is_sole_content(document: &Html, el: &ElementRef) -> bool {
    let Some(body) = first_element(document, |e| e.value().name() == "body") else {
        return false;
    };
    let mut children = body.children().filter(|node| match node.value() {
        Node::Element(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    });
    matches!(
        (children.next(), children.next()),
        (Some(only), None) if only.id() == el.id()
    )
}

fn is_protected(el: &ElementRef) -> bool {
    PROTECTED_TAGS.contains(&el.value().name())
}

fn attr_contains(value: Option<&str>, needle: &str) -> bool {
    value
        .map(|v| v.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn attr_contains_any(value: Option<&str>, needles: &[String]) -> bool {
    match value {
        Some(v) => {
            let v = v.to_lowercase();
            needles.iter().any(|n| !n.is_empty() && v.contains(n.as_str()))
        }
        None => false,
    }
}

/// `itemprop` naming an author or creator, or a `rel="author"` link
fn is_author_metadata(el: &ElementRef) -> bool {
    let has_token = |attr: &str, tokens: &[&str]| {
        el.value()
            .attr(attr)
            .map(|v| {
                v.split_whitespace()
                    .any(|t| tokens.iter().any(|wanted| t.eq_ignore_ascii_case(wanted)))
            })
            .unwrap_or(false)
    };
    has_token("itemprop", &["author", "creator"]) || has_token("rel", &["author"])
}

fn lowercase(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
