//! Utility functions and helpers.

pub mod fs;
pub mod http;
pub mod rate_limit;
pub mod retry;

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::error::Result;

/// Append a path segment to a base URL, keeping the base path.
pub fn join_path(base: &str, segment: &str) -> Result<Url> {
    let mut base = base.trim_end_matches('/').to_string();
    base.push('/');
    Ok(Url::parse(&base)?.join(segment.trim_start_matches('/'))?)
}

/// Length in user-perceived characters.
pub fn char_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Truncate to `max_len` characters, appending "..." when cut.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.graphemes(true).take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(
            join_path("https://example.com/json", "reviews").unwrap().as_str(),
            "https://example.com/json/reviews"
        );
        assert_eq!(
            join_path("https://example.com/json/", "/hotels").unwrap().as_str(),
            "https://example.com/json/hotels"
        );
    }

    #[test]
    fn test_char_len_counts_graphemes() {
        assert_eq!(char_len("朝食"), 2);
        assert_eq!(char_len("ab"), 2);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("部屋がとても綺麗でした", 6), "部屋が...");
    }
}
