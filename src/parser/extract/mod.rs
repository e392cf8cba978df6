pub mod ccn;
pub mod certificates;
pub mod classify;
pub mod courses;
pub mod degrees;
pub mod descriptions;
pub mod outcomes;
pub mod standalone;
pub mod units;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::CODE_PATTERN;

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"\b({CODE_PATTERN})\b")).unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpage\s+\d{1,4}(?:\s+of\s+\d{1,4})?\b").unwrap());
static COPYRIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:©|\(c\)|copyright)\s*\d{4}(?:[\w ,.]*?(?:university|inc\.?|llc|all rights reserved\.?))?").unwrap()
});

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WS_RE.replace_all(text.trim(), " ").into_owned()
}

/// Remove page markers and copyright notices that text extraction leaves inline.
pub fn strip_artifacts(text: &str) -> String {
    let text = PAGE_RE.replace_all(text, " ");
    let text = COPYRIGHT_RE.replace_all(&text, " ");
    normalize_whitespace(&text)
}

/// Course codes in order of first appearance, without repeats.
pub fn course_codes_in(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CODE_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// `"1,299.00"` → `1299.0`
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Push `code` unless already present, keeping order.
pub(crate) fn push_unique(codes: &mut Vec<String>, code: &str) {
    if !codes.iter().any(|c| c == code) {
        codes.push(code.to_string());
    }
}
