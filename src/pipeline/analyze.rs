// src/pipeline/analyze.rs

//! Analysis entry point: sentiment, keywords, then aggregation.

use tokio::time::Instant;

use crate::analysis::{
    AnalysisInputs, KeywordConfig, KeywordExtractor, SentimentAnalyzer, build_analysis,
};
use crate::error::{AppError, Result};
use crate::models::{AnalysisConfig, AnalysisResult, Review, Sentiment};

/// Which analysis stages run, and how many keywords each list keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    pub include_sentiment: bool,
    pub include_keywords: bool,
    pub keyword_limit: usize,
    pub sentiment_keyword_limit: usize,
    pub ota_keyword_limit: usize,
    pub min_frequency: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl AnalyzeOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            include_sentiment: true,
            include_keywords: true,
            keyword_limit: config.keyword_limit,
            sentiment_keyword_limit: config.sentiment_keyword_limit,
            ota_keyword_limit: config.ota_keyword_limit,
            min_frequency: config.min_frequency,
        }
    }
}

/// Analyze `reviews`, scoring sentiment in place when requested.
///
/// Fails with [`AppError::NoReviews`] on an empty slice; any engine error
/// is returned as-is.
pub fn analyze(reviews: &mut [Review], options: &AnalyzeOptions) -> Result<AnalysisResult> {
    if reviews.is_empty() {
        return Err(AppError::NoReviews);
    }
    let start = Instant::now();
    log::info!("Analyzing {} reviews", reviews.len());

    if options.include_sentiment {
        SentimentAnalyzer::new().analyze_reviews(reviews)?;
    }

    let extractor = KeywordExtractor::with_config(KeywordConfig {
        min_frequency: options.min_frequency,
        ..KeywordConfig::default()
    });

    let inputs = if options.include_keywords {
        AnalysisInputs {
            top_keywords: extractor.extract(reviews, options.keyword_limit)?,
            positive_keywords: extractor.extract_by_sentiment(
                reviews,
                Sentiment::Positive,
                options.sentiment_keyword_limit,
            )?,
            negative_keywords: extractor.extract_by_sentiment(
                reviews,
                Sentiment::Negative,
                options.sentiment_keyword_limit,
            )?,
        }
    } else {
        AnalysisInputs::default()
    };

    let ota_limit = options.include_keywords.then_some(options.ota_keyword_limit);
    let mut result = build_analysis(reviews, inputs, &extractor, ota_limit)?;
    result.processing_time = start.elapsed().as_secs_f64();

    log::info!(
        "Analysis complete: avg rating {:.2}, avg sentiment {:.3} ({:.2}s)",
        result.average_rating,
        result.average_sentiment,
        result.processing_time
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatingScale, RawReview, Source};

    fn review(id: &str, source: Source, comment: &str, rating: f64) -> Review {
        let raw = RawReview {
            id: id.into(),
            comment: comment.into(),
            rating,
            ..RawReview::default()
        };
        Review::from_raw(&raw, source, RatingScale::FivePoint, "h", "Hotel")
    }

    fn sample() -> Vec<Review> {
        vec![
            review("1", Source::Booking, "Great breakfast and friendly staff", 5.0),
            review("2", Source::Booking, "Great location, friendly staff", 4.0),
            review("3", Source::Expedia, "Dirty room and noisy street", 2.0),
        ]
    }

    #[test]
    fn test_analyze_scores_in_place() {
        let mut reviews = sample();
        let result = analyze(&mut reviews, &AnalyzeOptions::default()).unwrap();

        assert!(reviews.iter().all(|r| r.sentiment.is_some()));
        assert_eq!(result.total_reviews, 3);
        assert_eq!(result.ota_analyses.len(), 2);
        assert_eq!(result.ota_analyses[0].source, Source::Booking);
        assert!(result.processing_time >= 0.0);
        assert!(result.top_keywords.iter().any(|k| k.keyword == "friendly"));
    }

    #[test]
    fn test_analyze_without_stages() {
        let mut reviews = sample();
        let options = AnalyzeOptions {
            include_sentiment: false,
            include_keywords: false,
            ..AnalyzeOptions::default()
        };
        let result = analyze(&mut reviews, &options).unwrap();

        assert!(reviews.iter().all(|r| r.sentiment.is_none()));
        assert!(result.top_keywords.is_empty());
        assert_eq!(result.average_sentiment, 0.0);
    }

    #[test]
    fn test_keyword_limits_ignored_when_keywords_off() {
        let mut reviews = sample();
        let options = AnalyzeOptions {
            include_keywords: false,
            ota_keyword_limit: 0,
            keyword_limit: 0,
            ..AnalyzeOptions::default()
        };
        let result = analyze(&mut reviews, &options).unwrap();
        assert!(result.ota_analyses.iter().all(|o| o.top_keywords.is_empty()));
    }

    #[test]
    fn test_analyze_empty_is_blocking() {
        let err = analyze(&mut [], &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::NoReviews));
    }

    #[test]
    fn test_failed_analysis_scores_nothing() {
        let mut reviews = sample();
        reviews.insert(1, review("4", Source::Agoda, "  ", 3.0));

        let err = analyze(&mut reviews, &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::SentimentAnalysis(_)));
        assert!(reviews.iter().all(|r| r.sentiment.is_none()));
    }

    #[test]
    fn test_zero_keyword_limit_fails() {
        let mut reviews = sample();
        let options = AnalyzeOptions {
            keyword_limit: 0,
            ..AnalyzeOptions::default()
        };
        assert!(matches!(
            analyze(&mut reviews, &options),
            Err(AppError::KeywordExtraction(_))
        ));
    }
}
