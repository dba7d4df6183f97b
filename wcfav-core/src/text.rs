//! Cleanup for text that arrives as rendered HTML.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Drop tags, decode entities, and collapse whitespace.
pub fn clean_html_text(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
