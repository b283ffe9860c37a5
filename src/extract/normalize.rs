use std::sync::LazyLock;

use regex::Regex;

static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+\n").expect("valid trailing-space pattern"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-run pattern"));

/// Canonical form for all extracted text. Idempotent.
pub fn normalize_text(input: &str) -> String {
    let text = input.replace('\u{a0}', " ").replace('\r', "");
    let text = TRAILING_SPACE.replace_all(&text, "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Single-line form used for titles, bylines and header fields.
pub fn collapse_whitespace(input: &str) -> String {
    input
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
