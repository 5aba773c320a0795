//! Markdown to plain text for the `content` column.
//!
//! A sequence of regex substitutions, applied in order. Malformed markdown
//! comes out imperfect, which is fine for a listing excerpt.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").unwrap());
static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static NEWLINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\r?\n)+").unwrap());

/// Strip headings, emphasis and links, then fold line breaks into spaces.
pub fn to_plain_text(markdown: &str) -> String {
    let text = markdown.trim();
    let text = HEADING_REGEX.replace_all(text, "");
    let text = BOLD_REGEX.replace_all(&text, "$1");
    let text = ITALIC_REGEX.replace_all(&text, "$1");
    let text = LINK_REGEX.replace_all(&text, "$1");
    let text = NEWLINES_REGEX.replace_all(&text, " ");
    text.trim().to_string()
}
