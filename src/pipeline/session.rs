// src/pipeline/session.rs

//! Single-slot store for the current review snapshot and its analysis.

use tokio::sync::Mutex;

use super::analyze::{AnalyzeOptions, analyze};
use super::fetch::{FetchOutcome, FetchRequest, fetch_reviews};
use crate::error::{AppError, Result};
use crate::models::{AnalysisResult, Config, Review};

#[derive(Debug, Default)]
struct Slot {
    reviews: Vec<Review>,
    analysis: Option<AnalysisResult>,
}

/// Holds the latest fetched reviews and the analysis built from them.
///
/// Every operation takes the lock for its whole duration, so a fetch and an
/// analysis on the same session never interleave.
#[derive(Debug, Default)]
pub struct ReviewSession {
    slot: Mutex<Slot>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and replace the stored reviews. The previous analysis is dropped.
    pub async fn fetch(&self, config: &Config, request: &FetchRequest) -> Result<FetchOutcome> {
        let mut slot = self.slot.lock().await;
        let outcome = fetch_reviews(config, request).await?;
        slot.reviews = outcome.reviews.clone();
        slot.analysis = None;
        Ok(outcome)
    }

    /// Replace the stored reviews with caller-supplied ones.
    pub async fn replace(&self, reviews: Vec<Review>) {
        let mut slot = self.slot.lock().await;
        slot.reviews = reviews;
        slot.analysis = None;
    }

    /// Analyze the stored reviews, scoring them in place, and keep the result.
    pub async fn analyze(&self, options: &AnalyzeOptions) -> Result<AnalysisResult> {
        let mut slot = self.slot.lock().await;
        if slot.reviews.is_empty() {
            return Err(AppError::NoReviews);
        }
        let result = analyze(&mut slot.reviews, options)?;
        slot.analysis = Some(result.clone());
        Ok(result)
    }

    pub async fn reviews(&self) -> Vec<Review> {
        self.slot.lock().await.reviews.clone()
    }

    pub async fn analysis(&self) -> Option<AnalysisResult> {
        self.slot.lock().await.analysis.clone()
    }

    pub async fn clear(&self) {
        let mut slot = self.slot.lock().await;
        *slot = Slot::default();
        log::debug!("Review session cleared");
    }
}
