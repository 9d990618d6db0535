use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Letters, numbers, `_` and `-` survive. Marks, joiners and connector
/// punctuation do not, even though `\w` would keep them.
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}_\-]+").expect("valid regex"));
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("valid regex"));
static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").expect("valid regex"));

/// Derives a filesystem- and URL-safe identifier from free text.
///
/// The result only contains word characters and hyphens and never starts or
/// ends with a hyphen. It is empty when nothing in `text` survives; callers
/// substitute [`timestamp_slug`] in that case.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase().replace(' ', "-");
    let replaced = NON_WORD.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Longest slug handed out for new posts, in bytes. Leaves room for a
/// `-N` suffix and the `.md` extension under a 255-byte file name limit.
pub const MAX_SLUG_BYTES: usize = 200;

/// Cuts `slug` to at most `max_bytes` on a character boundary, dropping any
/// hyphen left dangling at the end.
pub fn truncate_slug(slug: &str, max_bytes: usize) -> &str {
    if slug.len() <= max_bytes {
        return slug;
    }
    let mut end = max_bytes;
    while !slug.is_char_boundary(end) {
        end -= 1;
    }
    slug[..end].trim_end_matches('-')
}

/// Compact `YYYYMMDDHHMMSS` identifier used when a slug would be empty.
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Strips leading `#` markers and the whitespace after them.
pub fn strip_heading_marker(line: &str) -> &str {
    match HEADING_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}
