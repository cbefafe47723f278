//! Text normalization for headlines, model output, and URL slugs.
//!
//! Everything in here is pure. The functions are used on both sides of the LLM call:
//! topic headlines are cleaned before they are put into the prompt, and the
//! title the model hands back is cleaned again before it becomes a post.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length (in characters) of a slug before any `-N` suffix.
pub const MAX_SLUG_CHARS: usize = 200;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Decode HTML entities, strip markup tags, and trim surrounding whitespace.
///
/// Entities are decoded first, so escaped markup such as `&lt;b&gt;` is
/// removed as well. Empty input yields an empty string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("<p>Rock &amp; Roll</p>"), "Rock & Roll");
/// assert_eq!(clean_text("   "), "");
/// ```
pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(raw);
    TAG_RE.replace_all(&decoded, "").trim().to_string()
}

/// Convert a title to a URL-safe slug.
///
/// The title is cleaned with [`clean_text`], lowercased, stripped of anything
/// that is not a word character, whitespace, or a hyphen, and then every run
/// of whitespace/hyphens becomes a single `-`. The result never starts or
/// ends with a hyphen and is at most [`MAX_SLUG_CHARS`] characters long.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("PM Modi Meets Victims"), "pm-modi-meets-victims");
/// assert_eq!(slugify("  India -- Wins! "), "india-wins");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = clean_text(title).to_lowercase();
    let kept = NON_SLUG_RE.replace_all(&lowered, "");
    let joined = SEPARATOR_RE.replace_all(&kept, "-");
    let truncated = truncate_chars(joined.trim_matches('-'), MAX_SLUG_CHARS);
    // truncation can expose a trailing separator
    truncated.trim_end_matches('-').to_string()
}

/// Slug for a category name: lowercased with spaces replaced by hyphens.
pub fn category_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Keep at most `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}
