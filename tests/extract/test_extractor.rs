// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cleaning and main-content selection on realistic documents

use url_markdown::extract::{
    extract_main_content, ArticleContainer, CleaningRules, ContentExtractor, ContentSelectors,
    MatchedBy,
};
use url_markdown::render::{HtmdRenderer, MarkdownRenderer};

const BLOG_POST: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Understanding Ownership</title>
  <style>body { color: red }</style>
  <script>window.analytics = {};</script>
</head>
<body class="single-post">
  <header class="site-header"><a href="/">My Blog</a></header>
  <nav class="main-navigation"><ul><li>Home</li><li>About</li></ul></nav>
  <div class="breadcrumbs">Home / Rust</div>
  <div id="primary">
    <article class="post type-post">
    <div class="entry-content">
      <h1>Understanding Ownership</h1>
      <div class="entry-meta">Posted on <span itemprop="author">Jane Doe</span></div>
      <p>Ownership is Rust's most <strong>unique</strong> feature.</p>
      <ul><li>Each value has an owner</li><li>One owner at a time</li></ul>
      <div class="share-buttons"><a href="https://twitter.com/share">Tweet</a></div>
      <p>See <a href="https://doc.rust-lang.org/book/">the book</a>.</p>
    </div>
    </article>
    <aside class="widget-area">Recent posts</aside>
  </div>
  <div class="author-bio-widget">Jane writes about systems.</div>
  <footer>© 2025</footer>
</body>
</html>"#;

fn rules(tags: &[&str], classes: &[&str], ids: &[&str]) -> CleaningRules {
    CleaningRules {
        unwanted_tags: tags.iter().map(|s| s.to_string()).collect(),
        unwanted_classes: classes.iter().map(|s| s.to_string()).collect(),
        unwanted_ids: ids.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_scenario_article_by_id_renders_markdown() {
    let selectors = ContentSelectors {
        containers: Vec::new(),
        ids: vec!["content".to_string()],
        classes: Vec::new(),
    };
    let extractor = ContentExtractor::new(&selectors, rules(&["nav"], &[], &[]));
    let raw = r#"<body><nav>skip</nav><article id="content"><h1>Title</h1><p>Hello</p></article></body>"#;

    let extracted = extractor.extract_main_content(raw);
    assert_eq!(
        extracted.html,
        r#"<article id="content"><h1>Title</h1><p>Hello</p></article>"#
    );
    assert_eq!(HtmdRenderer::new().render(&extracted.html), "# Title\n\nHello");
}

#[test]
fn test_default_rules_strip_blog_boilerplate() {
    let extracted = extract_main_content(BLOG_POST);
    let html = &extracted.html;

    assert_eq!(extracted.matched, MatchedBy::Container("article".to_string()));
    assert!(html.contains("Ownership is Rust"));
    assert!(html.contains("Each value has an owner"));
    for boilerplate in [
        "My Blog",
        "About",
        "Home / Rust",
        "Jane Doe",
        "Tweet",
        "Recent posts",
        "Jane writes",
        "© 2025",
        "analytics",
    ] {
        assert!(!html.contains(boilerplate), "kept boilerplate: {}", boilerplate);
    }
}

#[test]
fn test_blog_post_selected_by_class_rule() {
    let selectors = ContentSelectors {
        containers: Vec::new(),
        ids: vec!["content".to_string()],
        classes: vec!["entry-content".to_string()],
    };
    let extractor = ContentExtractor::new(&selectors, CleaningRules::default());

    let extracted = extractor.extract_main_content(BLOG_POST);
    assert_eq!(extracted.matched, MatchedBy::Class("entry-content".to_string()));
    assert!(extracted.html.starts_with(r#"<div class="entry-content">"#));
}

#[test]
fn test_unmatched_page_is_degraded_body() {
    let extractor = ContentExtractor::new(
        &ContentSelectors {
            containers: Vec::new(),
            ids: vec!["content".to_string()],
            classes: vec!["post-content".to_string()],
        },
        CleaningRules::empty(),
    );
    let extracted = extractor.extract_main_content("<div><p>Plain page</p></div>");

    assert!(extracted.is_degraded());
    assert!(extracted.html.starts_with("<body"));
    assert!(extracted.html.contains("Plain page"));
}

#[test]
fn test_substring_over_match_is_documented_behavior() {
    let extractor = ContentExtractor::new(&ContentSelectors::default(), rules(&[], &["nav"], &[]));
    let raw = r#"<body>
        <div class="nav">menu</div>
        <div class="navigator-widget">widget</div>
        <div class="unavailable-banner">offline</div>
        <div class="story">story</div>
    </body>"#;

    let html = extractor.extract_main_content(raw).html;
    assert!(!html.contains("menu"));
    assert!(!html.contains("widget"));
    // "unavailable" contains "nav" too
    assert!(!html.contains("offline"));
    assert!(html.contains("story"));
}

#[test]
fn test_class_and_id_matching_ignores_case() {
    let extractor = ContentExtractor::new(
        &ContentSelectors::default(),
        rules(&[], &["SOCIAL"], &["Profile"]),
    );
    let raw = r#"<body><div class="Social-Links">links</div><div id="USER-PROFILE">me</div><p>text</p></body>"#;

    let html = extractor.extract_main_content(raw).html;
    assert!(!html.contains("links"));
    assert!(!html.contains("me<"));
    assert!(html.contains("text"));
}

#[test]
fn test_readme_docs_container() {
    let raw = r#"<html><body>
        <div id="content">
          <article class="rm-Article">
            <header><h1>Quickstart</h1></header>
            <div class="markdown-body"><p>Install the CLI.</p></div>
            <div class="UpdatedAt">Updated 3 days ago</div>
          </article>
        </div>
    </body></html>"#;

    let extracted = extract_main_content(raw);
    assert_eq!(
        extracted.matched,
        MatchedBy::Container(".rm-Article".to_string())
    );
    assert!(extracted.html.starts_with(r#"<div class="markdown-body">"#));
    assert!(!extracted.html.contains("Updated"));
}

#[test]
fn test_extraction_is_idempotent() {
    let custom = ContentExtractor::new(
        &ContentSelectors {
            containers: vec![ArticleContainer::new(".docs", Some(".docs-body"))],
            ids: vec!["content".to_string()],
            classes: vec!["article".to_string()],
        },
        CleaningRules::default(),
    );
    let default = ContentExtractor::default();

    let documents = [
        BLOG_POST,
        r#"<body><div class="docs"><div class="docs-body"><article><p>Nested</p></article></div></div></body>"#,
        r#"<body><div id="content-area"><div class="article"><p>A</p></div></div></body>"#,
        "<p>bare fragment</p>",
    ];

    for extractor in [&custom, &default] {
        for raw in documents {
            let once = extractor.extract_main_content(raw);
            let twice = extractor.extract_main_content(&once.html);
            assert_eq!(once.html, twice.html, "not idempotent for {}", raw);
        }
    }
}
