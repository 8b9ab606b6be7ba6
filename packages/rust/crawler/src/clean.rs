//! Removal of server-side artifacts that leak into rendered page text.

use std::sync::LazyLock;

use regex::Regex;

/// Applied in order; each match is removed.
static LEAK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // PHP print_r dumps: Array( [key] => value )
        r"(?im)Array\s*\(\s*\[.*?\]\s*=>\s*[^)]+\)",
        // Single dump lines: [KEY] => VALUE
        r"(?im)\[\w+\]\s*=>\s*[^\n\r]*",
        // Template placeholders: [TEXT], [LINK]
        r"(?im)\[\w+\]",
        r"(?im)\$[a-z_]\w*",
        r"(?im)->\s*\w+",
        r"(?im)&utm_[^&\s]+",
        "\u{a0}",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("leak pattern regex"))
    .collect()
});

/// Strip PHP dumps, template placeholders, variables, tracking parameters and
/// non-breaking spaces from extracted text.
pub fn clean_text(text: &str) -> String {
    let cleaned = LEAK_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
    cleaned.trim().to_string()
}
