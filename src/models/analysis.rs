//! Derived statistics and analysis outputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::{Sentiment, Source};

/// Count of reviews per sentiment label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentDistribution {
    pub fn record(&mut self, label: Sentiment) {
        match label {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn get(&self, label: Sentiment) -> usize {
        match label {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Earliest and latest posted dates of a review set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Snapshot statistics over a list of reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub sentiment_distribution: SentimentDistribution,
    /// Keys "1" through "5"
    pub rating_distribution: BTreeMap<String, usize>,
    pub reviews_by_source: BTreeMap<Source, usize>,
    pub date_range: DateRange,
}

/// A ranked keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub keyword: String,
    pub frequency: usize,
    /// Frequency relative to the most frequent keyword, in (0, 1]
    pub score: f64,
    pub category: Option<Sentiment>,
}

/// Sentiment over time. Carried in results, not yet populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentTrend {
    pub date: DateTime<Utc>,
    pub average_sentiment: f64,
    pub review_count: usize,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
}

/// Monthly mention counts for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTrend {
    pub keyword: String,
    pub total_mentions: usize,
    /// Keyed by "YYYY-MM"
    pub mentions_by_month: BTreeMap<String, usize>,
}

/// Per-source roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtaAnalysis {
    pub source: Source,
    pub total_reviews: usize,
    pub average_rating: f64,
    pub average_sentiment: f64,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    pub rating_distribution: BTreeMap<String, usize>,
    pub top_keywords: Vec<KeywordResult>,
    #[serde(default)]
    pub sentiment_trend: Vec<SentimentTrend>,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub average_sentiment: f64,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    pub sentiment_distribution: SentimentDistribution,
    pub rating_distribution: BTreeMap<String, usize>,

    pub top_keywords: Vec<KeywordResult>,
    #[serde(default)]
    pub positive_keywords: Vec<KeywordResult>,
    #[serde(default)]
    pub negative_keywords: Vec<KeywordResult>,

    #[serde(default)]
    pub ota_analyses: Vec<OtaAnalysis>,
    #[serde(default)]
    pub sentiment_trend: Vec<SentimentTrend>,

    /// Seconds
    pub processing_time: f64,
    pub analyzed_at: DateTime<Utc>,
}
