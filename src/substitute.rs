//! Final rewrite of the document.
//!
//! Every string leaf of the document has every mapped URL replaced by its web path.
//! Keys, numbers, booleans, nulls and container shapes are preserved.
//!
//! Replacement is a single pass over each string using one alternation of all mapped
//! URLs, longest first. At any position the longest mapped URL wins, and replaced
//! text is never scanned again, so a URL that is a prefix of another
//! (`https://a.example/x.png` vs `https://a.example/x.png?v=2`) cannot corrupt it.

use std::borrow::Cow;

use regex::{Captures, Regex, RegexBuilder};
use serde_json::Value;

use crate::pipeline::SuccessMap;

/// Compiled-size ceiling for the URL alternation
const PATTERN_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Return a copy of `document` with every mapped URL replaced
pub fn substitute(document: &Value, replacements: &SuccessMap) -> Value {
    if replacements.is_empty() {
        return document.clone();
    }
    let replacer = UrlReplacer::new(replacements);
    rewrite(document, &replacer)
}

fn rewrite(value: &Value, replacer: &UrlReplacer<'_>) -> Value {
    match value {
        Value::String(s) => Value::String(replacer.replace(s).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite(v, replacer)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), rewrite(v, replacer)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Replaces mapped URLs inside a single string
struct UrlReplacer<'a> {
    map: &'a SuccessMap,
    /// Mapped URLs, longest first
    ordered: Vec<&'a str>,
    pattern: Option<Regex>,
}

impl<'a> UrlReplacer<'a> {
    fn new(map: &'a SuccessMap) -> Self {
        let mut ordered: Vec<&str> = map.iter().map(|(url, _)| url).collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = ordered
            .iter()
            .map(|url| regex::escape(url))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| {
                tracing::warn!(
                    urls = ordered.len(),
                    error = %e,
                    "URL alternation too large, replacing sequentially"
                );
            })
            .ok();

        Self {
            map,
            ordered,
            pattern,
        }
    }

    fn replace<'s>(&self, text: &'s str) -> Cow<'s, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, |caps: &Captures<'_>| {
                let matched = &caps[0];
                self.map.get(matched).unwrap_or(matched).to_string()
            }),
            None => {
                let mut out = text.to_string();
                for url in &self.ordered {
                    if let Some(web_path) = self.map.get(url) {
                        out = out.replace(url, web_path);
                    }
                }
                Cow::Owned(out)
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replaces_in_nested_strings_only() {
        let document = json!({
            "name": "https://img.example.com/a.png",
            "nested": {
                "list": ["x https://img.example.com/a.png y", 42, true, null],
                "https://img.example.com/a.png": 1.5
            }
        });
        let map: SuccessMap = [("https://img.example.com/a.png", "/niko/o/images/a.png")]
            .into_iter()
            .collect();

        let out = substitute(&document, &map);

        assert_eq!(
            out,
            json!({
                "name": "/niko/o/images/a.png",
                "nested": {
                    "list": ["x /niko/o/images/a.png y", 42, true, null],
                    "https://img.example.com/a.png": 1.5
                }
            })
        );
    }

    #[test]
    fn test_all_occurrences_replaced() {
        let document = json!("https://a.example/x.png and https://a.example/x.png");
        let map: SuccessMap = [("https://a.example/x.png", "/w/x.png")].into_iter().collect();

        assert_eq!(substitute(&document, &map), json!("/w/x.png and /w/x.png"));
    }

    #[test]
    fn test_prefix_urls_do_not_corrupt_each_other() {
        let document = json!(
            "a: https://a.example/x.png?v=2 b: https://a.example/x.png c: https://a.example/x.png?v=2x"
        );
        let map: SuccessMap = [
            ("https://a.example/x.png", "/w/short.png"),
            ("https://a.example/x.png?v=2", "/w/long.png"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            substitute(&document, &map),
            json!("a: /w/long.png b: /w/short.png c: /w/long.pngx")
        );
    }

    #[test]
    fn test_replacement_text_is_not_rescanned() {
        // The web path of the first URL contains the second URL
        let document = json!("https://a.example/one.png");
        let map: SuccessMap = [
            ("https://a.example/one.png", "https://b.example/two.png"),
            ("https://b.example/two.png", "/w/two.png"),
        ]
        .into_iter()
        .collect();

        assert_eq!(substitute(&document, &map), json!("https://b.example/two.png"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let document = json!("https://a.example/x.png?a=1&b=(2)+ https://aXexample/x.png?a=1&b=(2)+");
        let map: SuccessMap = [("https://a.example/x.png?a=1&b=(2)+", "/w/x.png")]
            .into_iter()
            .collect();

        assert_eq!(
            substitute(&document, &map),
            json!("/w/x.png https://aXexample/x.png?a=1&b=(2)+")
        );
    }

    #[test]
    fn test_empty_map_returns_identical_document() {
        let document = json!({"a": ["https://a.example/x.png"]});
        assert_eq!(substitute(&document, &SuccessMap::new()), document);
    }

    #[test]
    fn test_sequential_fallback_prefers_longest() {
        let map: SuccessMap = [
            ("https://a.example/x.png", "/w/short.png"),
            ("https://a.example/x.png?v=2", "/w/long.png"),
        ]
        .into_iter()
        .collect();
        let mut replacer = UrlReplacer::new(&map);
        replacer.pattern = None;

        assert_eq!(
            replacer.replace("https://a.example/x.png?v=2 https://a.example/x.png"),
            "/w/long.png /w/short.png"
        );
    }
}
