//! Hotel search results and per-fetch options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::{Language, Review};

/// A hotel matched by a source's search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelCandidate {
    /// Source-specific hotel id
    pub id: String,
    pub name: String,
    pub url: String,
    /// Rating as the platform reports it
    pub rating: f64,
    pub review_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Options for a single `fetch_reviews` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Inclusive lower bound on `review_date`
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `review_date`
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum reviews returned, applied after date filtering
    pub limit: usize,
    /// Requested languages; `None` means the source's defaults
    pub languages: Option<Vec<Language>>,
    /// Display name to stamp on normalized reviews
    pub hotel_name: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            limit: 100,
            languages: None,
            hotel_name: None,
        }
    }
}

impl FetchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Whether a review falls inside the inclusive date window.
    pub fn in_range(&self, review: &Review) -> bool {
        self.start_date.is_none_or(|start| review.review_date >= start)
            && self.end_date.is_none_or(|end| review.review_date <= end)
    }
}
