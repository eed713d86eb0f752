//! Canonical review record and the enums it is built from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Travel platform a review was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Rakuten,
    Jalan,
    Booking,
    Expedia,
    Agoda,
}

impl Source {
    /// Every supported source in canonical order.
    pub fn all() -> [Source; 5] {
        [
            Source::Rakuten,
            Source::Jalan,
            Source::Booking,
            Source::Expedia,
            Source::Agoda,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Rakuten => "rakuten",
            Source::Jalan => "jalan",
            Source::Booking => "booking",
            Source::Expedia => "expedia",
            Source::Agoda => "agoda",
        }
    }

    /// Human-readable platform name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Rakuten => "Rakuten Travel",
            Source::Jalan => "Jalan.net",
            Source::Booking => "Booking.com",
            Source::Expedia => "Expedia",
            Source::Agoda => "Agoda",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rakuten" => Ok(Source::Rakuten),
            "jalan" => Ok(Source::Jalan),
            "booking" => Ok(Source::Booking),
            "expedia" => Ok(Source::Expedia),
            "agoda" => Ok(Source::Agoda),
            other => Err(AppError::validation(format!("unknown source '{other}'"))),
        }
    }
}

/// Review language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ja,
    En,
    Zh,
    Ko,
}

impl Language {
    pub fn all() -> [Language; 4] {
        [Language::Ja, Language::En, Language::Zh, Language::Ko]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
            Language::Zh => "zh",
            Language::Ko => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ja" | "japanese" => Ok(Language::Ja),
            "en" | "english" => Ok(Language::En),
            "zh" | "chinese" => Ok(Language::Zh),
            "ko" | "korean" => Ok(Language::Ko),
            other => Err(AppError::validation(format!("unknown language '{other}'"))),
        }
    }
}

/// Sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scale a platform reports ratings on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingScale {
    FivePoint,
    TenPoint,
}

impl RatingScale {
    /// Convert a raw value to the canonical 0-5 scale.
    pub fn normalize(&self, raw: f64) -> f64 {
        let value = match self {
            RatingScale::FivePoint => raw,
            RatingScale::TenPoint => raw / 2.0,
        };
        if value.is_finite() {
            value.clamp(0.0, 5.0)
        } else {
            0.0
        }
    }
}

/// Output of the sentiment engine for one review.
///
/// Label, score and confidence only ever exist together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: Sentiment,
    /// In [-1, 1]
    pub score: f64,
    /// In [0, 1]
    pub confidence: f64,
}

/// A review record as a source hands it over, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub id: String,
    pub title: Option<String>,
    pub comment: String,
    /// Rating on the source's own scale
    pub rating: f64,
    pub rating_details: Option<BTreeMap<String, f64>>,
    pub reviewer_name: Option<String>,
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub stay_date: Option<NaiveDate>,
    pub review_date: Option<DateTime<Utc>>,
    pub trip_type: Option<String>,
    pub room_type: Option<String>,
    pub helpful_count: Option<u32>,
    pub language: Option<Language>,
    pub url: Option<String>,
}

/// Normalized review shared by every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub source: Source,

    pub title: Option<String>,
    pub comment: String,

    /// Overall rating, 0-5
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_details: Option<BTreeMap<String, f64>>,

    pub reviewer_name: Option<String>,
    pub reviewer_age_group: Option<String>,
    pub reviewer_gender: Option<String>,

    pub stay_date: Option<NaiveDate>,
    /// Date the review was posted
    pub review_date: DateTime<Utc>,

    pub trip_type: Option<String>,
    pub room_type: Option<String>,

    #[serde(default)]
    pub helpful_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Populated by the sentiment engine
    #[serde(default)]
    pub sentiment: Option<SentimentScore>,
}

impl Review {
    /// Build a canonical review from a raw record.
    ///
    /// Ratings (overall and detailed) are converted from `scale` to 0-5.
    pub fn from_raw(
        raw: &RawReview,
        source: Source,
        scale: RatingScale,
        hotel_id: &str,
        hotel_name: &str,
    ) -> Self {
        let rating_details = raw.rating_details.as_ref().map(|details| {
            details
                .iter()
                .map(|(k, v)| (k.clone(), round_to(scale.normalize(*v), 2)))
                .collect()
        });

        Self {
            review_id: raw.id.clone(),
            hotel_id: hotel_id.to_string(),
            hotel_name: hotel_name.to_string(),
            source,
            title: raw.title.clone().filter(|t| !t.trim().is_empty()),
            comment: raw.comment.trim().to_string(),
            rating: scale.normalize(raw.rating),
            rating_details,
            reviewer_name: raw.reviewer_name.clone(),
            reviewer_age_group: raw.age_group.clone(),
            reviewer_gender: raw.gender.clone(),
            stay_date: raw.stay_date,
            review_date: raw.review_date.unwrap_or_else(Utc::now),
            trip_type: raw.trip_type.clone(),
            room_type: raw.room_type.clone(),
            helpful_count: raw.helpful_count.unwrap_or(0),
            language: raw.language,
            url: raw.url.clone(),
            sentiment: None,
        }
    }

    pub fn sentiment_label(&self) -> Option<Sentiment> {
        self.sentiment.map(|s| s.label)
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment.map(|s| s.score)
    }

    /// Histogram bucket ("1".."5") for the rating.
    pub fn rating_bucket(&self) -> u8 {
        (self.rating.floor() as i64).clamp(1, 5) as u8
    }
}

/// Round to a fixed number of decimals.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
