// src/extract/strategy.rs

//! Ordered CSS selector strategies for locating review blocks.

use scraper::Selector;

use crate::error::{AppError, Result};

/// A named CSS selector that may locate review blocks on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorStrategy {
    pub name: String,
    pub selector: String,
}

impl SelectorStrategy {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }

    /// Review-card layouts, most specific first.
    pub fn cards() -> Vec<Self> {
        vec![
            Self::new(
                "provider-card",
                "div.providerReviewCard_reviewCardWrapper__zYd77",
            ),
            Self::new(
                "provider-card-partial",
                r#"div[class*="reviewCardWrapper"][class*="providerReviewCard"]"#,
            ),
            Self::new("review-card", r#"div[class*="reviewCard"]"#),
        ]
    }

    /// Loose fallbacks for older page layouts.
    pub fn generic() -> Vec<Self> {
        vec![
            Self::new("review-class", r#"div[class*="review"]"#),
            Self::new("voice-class", r#"div[class*="voice"]"#),
            Self::new("data-review", "div[data-review]"),
        ]
    }
}

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Parse a selector, logging and discarding it when invalid.
pub(crate) fn parse_or_skip(s: &str) -> Option<Selector> {
    match parse_selector(s) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Skipping selector: {}", e);
            None
        }
    }
}
