//! Review analysis: sentiment scoring, keyword extraction and roll-ups.

pub mod aggregate;
pub mod keywords;
pub mod sentiment;

pub use aggregate::{AnalysisInputs, build_analysis, review_stats};
pub use keywords::{KeywordConfig, KeywordExtractor, extract_keywords, keyword_trend};
pub use sentiment::{SentimentAnalyzer, average_sentiment, sentiment_distribution};
