//! Party list splitting and value cleanup.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static PARTY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]|\s+and\s+").unwrap_or_else(|_| unreachable!()));

/// Decodes HTML entities, strips stray markup, and collapses whitespace.
#[must_use]
pub fn clean_value(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits captured party text on `,`, `;`, and ` and `.
///
/// Entries are trimmed and entries without a letter or digit dropped, so
/// `"A, B and C"` becomes `["A", "B", "C"]`.
#[must_use]
pub fn split_parties(text: &str) -> Vec<String> {
    PARTY_SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|p| p.chars().any(char::is_alphanumeric))
        .map(str::to_owned)
        .collect()
}
