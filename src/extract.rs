//! Reference extraction per content dialect
//!
//! Each dialect has its own grammar for finding absolute URLs:
//!
//! | Dialect      | Grammar                                                        |
//! |--------------|----------------------------------------------------------------|
//! | `Stylesheet` | `url(...)` forms plus bare absolute URLs                       |
//! | `Script`     | absolute URLs enclosed in quotes or backticks                  |
//! | `Markup`     | bare absolute URLs; `<style>` blocks spawn stylesheet items    |
//! | `Generic`    | bare absolute URLs, split on literal and escaped line breaks   |
//!
//! All matches then go through the same filter: `http`/`https` with a host, and an
//! allow-listed extension (the stylesheet endpoint is admitted without one in
//! markup and stylesheet text). Rejected candidates are dropped silently.

use crate::types::{Dialect, QueueItem};
use crate::utils::{is_allowed_extension, is_stylesheet_endpoint, path_extension};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Bare absolute URL; stops at whitespace, quotes, angle brackets, parens and commas
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(r#"https?://[^\s'"`<>(),]+"#));

/// CSS `url(...)` with optional quotes
static CSS_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"url\(['"]?(https?://.*?)['"]?\)"#));

/// Absolute URL inside a JS string literal
static JS_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"['"`](https?://[^'"`\s]+)['"`]"#));

/// Inline stylesheet block
static STYLE_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<style[^>]*>([\s\S]*?)</style>"));

/// Line breaks, literal or backslash-escaped by serialization
static LINE_BREAK_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(r"[\n\r]+|\\[nr]"));

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        // Patterns are compile-time constants covered by the tests below
        Err(e) => panic!("invalid built-in pattern {pattern:?}: {e}"),
    }
}

/// Result of scanning one piece of text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Filtered candidate URLs, in sorted order
    pub candidates: BTreeSet<String>,
    /// Sub-items to scan separately (inline stylesheets of markup)
    pub spawned: Vec<QueueItem>,
}

/// Scan `text` with the grammar of `dialect`
pub fn extract(text: &str, dialect: Dialect) -> Extraction {
    let mut raw: Vec<&str> = Vec::new();
    let mut spawned = Vec::new();

    match dialect {
        Dialect::Stylesheet => {
            raw.extend(captures(&CSS_URL_PATTERN, text));
            raw.extend(URL_PATTERN.find_iter(text).map(|m| m.as_str()));
        }
        Dialect::Script => {
            raw.extend(captures(&JS_URL_PATTERN, text));
        }
        Dialect::Markup => {
            spawned.extend(
                captures(&STYLE_TAG_PATTERN, text)
                    .map(|css| QueueItem::new(css, Dialect::Stylesheet)),
            );
            raw.extend(URL_PATTERN.find_iter(text).map(|m| m.as_str()));
        }
        Dialect::Generic => {
            for blob in URL_PATTERN.find_iter(text) {
                raw.extend(LINE_BREAK_PATTERN.split(blob.as_str()));
            }
        }
    }

    let candidates = raw
        .into_iter()
        .filter_map(clean_candidate)
        .filter(|url| is_resource_url(url, dialect))
        .map(str::to_string)
        .collect();

    Extraction {
        candidates,
        spawned,
    }
}

fn captures<'t>(re: &'t Regex, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Trim whitespace and the dangling backslash left by escaped quotes
fn clean_candidate(raw: &str) -> Option<&str> {
    let cleaned = raw.trim().trim_end_matches('\\').trim();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Whether `url` is a fetchable, allow-listed resource in `dialect`
pub fn is_resource_url(url: &str, dialect: Dialect) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return false;
    }

    match path_extension(parsed.path()) {
        Some(ext) if is_allowed_extension(&ext) => true,
        _ => dialect.uses_hashed_layout() && is_stylesheet_endpoint(url),
    }
}
