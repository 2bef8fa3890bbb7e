use std::sync::Arc;

use sqltint::{
    ConfigureError, HighlighterOptions, configure_shared_highlighter, get_highlighter, render_sql,
};

/// Strip tags and decode the entities syntect emits.
fn text_content(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Every opening tag is closed in order.
fn assert_balanced(html: &str) {
    let mut stack: Vec<String> = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        let end = rest[start..].find('>').expect("tag is terminated") + start;
        let tag = &rest[start + 1..end];
        if let Some(name) = tag.strip_prefix('/') {
            assert_eq!(stack.pop().as_deref(), Some(name), "mismatched closing tag in {html}");
        } else {
            let name = tag.split_whitespace().next().unwrap_or_default();
            stack.push(name.to_string());
        }
        rest = &rest[end + 1..];
    }
    assert!(stack.is_empty(), "unclosed tags {stack:?} in {html}");
}

#[tokio::test]
async fn select_star_renders_well_formed_markup() {
    let highlighter = get_highlighter().await.expect("highlighter builds");
    let html = render_sql("SELECT * FROM users;", &highlighter).expect("render succeeds");

    assert_balanced(&html);
    assert!(html.starts_with("<pre class=\"sqltint "));
    assert_eq!(text_content(&html), "SELECT * FROM users;");
}

#[tokio::test]
async fn empty_input_renders_like_a_single_space() {
    let highlighter = get_highlighter().await.expect("highlighter builds");
    let empty = render_sql("", &highlighter).expect("empty input renders");
    let space = render_sql(" ", &highlighter).expect("space renders");

    assert_eq!(empty, space);
    assert_balanced(&empty);
}

#[tokio::test]
async fn rendering_is_deterministic() {
    let highlighter = get_highlighter().await.expect("highlighter builds");
    let sql = "WITH recent AS (SELECT * FROM orders WHERE placed_at > now() - interval '1 day')\nSELECT count(*) FROM recent;";

    let first = render_sql(sql, &highlighter).expect("render succeeds");
    let second = render_sql(sql, &highlighter).expect("render succeeds");

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[tokio::test]
async fn visible_characters_survive_escaping() {
    let highlighter = get_highlighter().await.expect("highlighter builds");
    let sql = "SELECT '<tag>' AS \"quoted\", 1 & 3 FROM t;";
    let html = render_sql(sql, &highlighter).expect("render succeeds");

    assert_balanced(&html);
    assert!(html.contains("&lt;tag&gt;"));
    assert_eq!(text_content(&html), sql);
}

#[tokio::test]
async fn multi_line_snippets_keep_their_lines() {
    let highlighter = get_highlighter().await.expect("highlighter builds");
    let sql = "SELECT id,\n       name\nFROM users\nWHERE active;";
    let html = render_sql(sql, &highlighter).expect("render succeeds");

    assert_eq!(html.matches("<span class=\"line\">").count(), 4);
    assert_eq!(text_content(&html), sql);
}

#[tokio::test]
async fn shared_highlighter_is_one_instance() {
    let first = get_highlighter().await.expect("highlighter builds");
    let second = get_highlighter().await.expect("highlighter builds");

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn shared_options_cannot_change_after_use() {
    get_highlighter().await.expect("highlighter builds");

    let err = configure_shared_highlighter(HighlighterOptions::default())
        .expect_err("shared provisioner already in use");
    assert!(matches!(err, ConfigureError::AlreadyConfigured));
}
