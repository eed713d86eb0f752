// src/analysis/aggregate.rs

//! Statistical roll-ups over review sets.

use std::collections::BTreeMap;

use chrono::Utc;

use super::keywords::KeywordExtractor;
use super::sentiment::{average_sentiment, sentiment_distribution};
use crate::error::Result;
use crate::models::{
    AnalysisResult, DateRange, KeywordResult, OtaAnalysis, Review, ReviewStats, Source, round_to,
};

/// Keyword lists computed over the whole review set by the caller.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub top_keywords: Vec<KeywordResult>,
    pub positive_keywords: Vec<KeywordResult>,
    pub negative_keywords: Vec<KeywordResult>,
}

/// Histogram of ratings keyed "1" through "5"; every key is present.
pub fn rating_distribution(reviews: &[Review]) -> BTreeMap<String, usize> {
    let mut histogram: BTreeMap<String, usize> = (1..=5).map(|k| (k.to_string(), 0)).collect();
    for review in reviews {
        *histogram.entry(review.rating_bucket().to_string()).or_default() += 1;
    }
    histogram
}

/// Mean rating, 2 decimals; 0.0 for an empty set.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    round_to(
        reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64,
        2,
    )
}

pub fn date_range(reviews: &[Review]) -> DateRange {
    DateRange {
        earliest: reviews.iter().map(|r| r.review_date).min(),
        latest: reviews.iter().map(|r| r.review_date).max(),
    }
}

/// Snapshot statistics for a fetched review set.
pub fn review_stats(reviews: &[Review]) -> ReviewStats {
    let mut reviews_by_source: BTreeMap<Source, usize> = BTreeMap::new();
    for review in reviews {
        *reviews_by_source.entry(review.source).or_default() += 1;
    }

    ReviewStats {
        total_reviews: reviews.len(),
        average_rating: average_rating(reviews),
        sentiment_distribution: sentiment_distribution(reviews),
        rating_distribution: rating_distribution(reviews),
        reviews_by_source,
        date_range: date_range(reviews),
    }
}

/// Per-source roll-up for one group of reviews.
///
/// `keyword_limit` of `None` skips keyword extraction for the group.
pub fn ota_analysis(
    source: Source,
    reviews: &[Review],
    extractor: &KeywordExtractor,
    keyword_limit: Option<usize>,
) -> Result<OtaAnalysis> {
    let distribution = sentiment_distribution(reviews);
    let top_keywords = match keyword_limit {
        Some(limit) => extractor.extract(reviews, limit)?,
        None => Vec::new(),
    };
    Ok(OtaAnalysis {
        source,
        total_reviews: reviews.len(),
        average_rating: average_rating(reviews),
        average_sentiment: average_sentiment(reviews),
        positive_count: distribution.positive,
        neutral_count: distribution.neutral,
        negative_count: distribution.negative,
        rating_distribution: rating_distribution(reviews),
        top_keywords,
        sentiment_trend: Vec::new(),
    })
}

/// Assemble the complete analysis from scored reviews.
///
/// Sources appear in canonical order; sources without reviews are omitted.
/// `processing_time` is left at zero for the caller to fill in.
pub fn build_analysis(
    reviews: &[Review],
    inputs: AnalysisInputs,
    extractor: &KeywordExtractor,
    ota_keyword_limit: Option<usize>,
) -> Result<AnalysisResult> {
    let mut ota_analyses = Vec::new();
    for source in Source::all() {
        let group: Vec<Review> = reviews
            .iter()
            .filter(|r| r.source == source)
            .cloned()
            .collect();
        if group.is_empty() {
            continue;
        }
        ota_analyses.push(ota_analysis(source, &group, extractor, ota_keyword_limit)?);
    }

    let now = Utc::now();
    let range = date_range(reviews);

    Ok(AnalysisResult {
        total_reviews: reviews.len(),
        average_rating: average_rating(reviews),
        average_sentiment: average_sentiment(reviews),
        start_date: range.earliest.unwrap_or(now),
        end_date: range.latest.unwrap_or(now),
        sentiment_distribution: sentiment_distribution(reviews),
        rating_distribution: rating_distribution(reviews),
        top_keywords: inputs.top_keywords,
        positive_keywords: inputs.positive_keywords,
        negative_keywords: inputs.negative_keywords,
        ota_analyses,
        sentiment_trend: Vec::new(),
        processing_time: 0.0,
        analyzed_at: now,
    })
}
