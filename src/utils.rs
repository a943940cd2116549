//! Small text and timestamp helpers shared by the scrapers and the
//! classification client.

use crate::error::FetchError;
use crate::models::Source;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// Timestamp layout used by both news sites when it is not plain RFC 3339.
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging, on a char boundary.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Reduce an HTML fragment (such as a feed summary) to its visible text.
pub fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment.trim());
    let text = html.root_element().text().collect::<String>();
    collapse_whitespace(&text)
}

/// Parse a source-reported timestamp into a timezone-aware value.
pub fn parse_timestamp(source: Source, raw: &str) -> Result<DateTime<FixedOffset>, FetchError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, SOURCE_DATE_FORMAT))
        .map_err(|_| FetchError::Timestamp {
            source_name: source,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let result = truncate_for_log("crash — I-805", 7);
        assert!(result.starts_with("crash "));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("  <p>A driver was <strong>injured</strong> on SR-52.</p> ");
        assert_eq!(text, "A driver was injured on SR-52.");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp(Source::Fox5, "2025-08-11T21:48:42-07:00").unwrap();
        let compact = parse_timestamp(Source::Nbc7, "2025-08-11T21:48:42-0700").unwrap();
        assert_eq!(rfc, compact);
        assert_eq!(rfc.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp(Source::Nbc7, "yesterday").unwrap_err();
        assert!(matches!(err, FetchError::Timestamp { .. }));
    }
}
