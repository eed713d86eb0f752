// src/error.rs

//! Unified error handling for the review pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credentials are required for a live upstream call but are missing or rejected
    #[error("Authentication failed for {source_name}: {message}")]
    Authentication {
        source_name: String,
        message: String,
    },

    /// Hotel search produced no candidate, or a hotel id did not resolve upstream
    #[error("Hotel not found on {source_name}: {query}")]
    HotelNotFound { source_name: String, query: String },

    /// Upstream call or scrape failed beyond recovery
    #[error("Review fetch failed for {source_name}: {message}")]
    ReviewFetch {
        source_name: String,
        message: String,
    },

    /// Upstream answered 429
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// Upstream answered with a server error
    #[error("Upstream {source_name} returned HTTP {status}")]
    Upstream { source_name: String, status: u16 },

    /// A per-source deadline elapsed
    #[error("Timed out after {secs}s waiting for {source_name}")]
    Timeout { source_name: String, secs: u64 },

    /// Sentiment scoring rejected its input
    #[error("Sentiment analysis error: {0}")]
    SentimentAnalysis(String),

    /// Keyword extraction rejected its input
    #[error("Keyword extraction error: {0}")]
    KeywordExtraction(String),

    /// Analysis requested with nothing to analyze
    #[error("No reviews available; fetch reviews first")]
    NoReviews,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an authentication error for a source.
    pub fn authentication(source: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Authentication {
            source_name: source.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a hotel-not-found error for a source.
    pub fn hotel_not_found(source: impl fmt::Display, query: impl Into<String>) -> Self {
        Self::HotelNotFound {
            source_name: source.to_string(),
            query: query.into(),
        }
    }

    /// Create a review fetch error for a source.
    pub fn review_fetch(source: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::ReviewFetch {
            source_name: source.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, 429 and 5xx responses are transient;
    /// everything else (bad credentials, unknown hotel, parse errors) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Upstream { .. } | Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
