use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word pattern is valid"));

/// Canonical token string: punctuation becomes whitespace, letters are
/// lower-cased, runs of whitespace collapse to a single space.
pub fn normalize<T: Display + ?Sized>(value: &T) -> String {
    let text = value.to_string();
    let stripped = NON_WORD.replace_all(&text, " ");
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Absent input normalizes to an empty string.
pub fn normalize_opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| normalize(&v)).unwrap_or_default()
}
