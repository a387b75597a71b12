//! Whitespace cleanup and truncation for extracted text.

use regex::Regex;
use std::sync::LazyLock;

static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("NEWLINE_RUNS should compile"));
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUNS should compile"));

/// Collapses runs of newlines to a single newline.
#[must_use]
pub fn collapse_newlines(text: &str) -> String {
    NEWLINE_RUNS.replace_all(text, "\n").into_owned()
}

/// Collapses every whitespace run, newlines included, to a single space.
///
/// Leading and trailing runs become one space; nothing is trimmed.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let text = collapse_newlines(text);
    WHITESPACE_RUNS.replace_all(&text, " ").into_owned()
}

/// Keeps the first `max_chars` characters of `text`.
///
/// `None` and `Some(0)` leave the text whole.
#[must_use]
pub fn truncate_chars(mut text: String, max_chars: Option<usize>) -> String {
    if let Some(limit) = max_chars.filter(|&k| k > 0) {
        if let Some((byte_idx, _)) = text.char_indices().nth(limit) {
            text.truncate(byte_idx);
        }
    }
    text
}
