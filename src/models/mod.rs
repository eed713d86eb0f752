// src/models/mod.rs

//! Domain models for the review pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod analysis;
mod config;
mod fetch;
mod review;

// Re-export all public types
pub use analysis::{
    AnalysisResult, DateRange, KeywordResult, KeywordTrend, OtaAnalysis, ReviewStats,
    SentimentDistribution, SentimentTrend,
};
pub use config::{
    AnalysisConfig, Config, Credentials, FetchConfig, HttpConfig, SourceSettings, SourcesConfig,
};
pub use fetch::{FetchOptions, HotelCandidate};
pub use review::{
    Language, RatingScale, RawReview, Review, Sentiment, SentimentScore, Source,
};

pub(crate) use review::round_to;
