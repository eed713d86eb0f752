// src/pipeline/fetch.rs

//! Concurrent multi-source review fetching.
//!
//! One task per source, all awaited together. A failing source becomes a
//! zero-count report and never aborts its siblings.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;

use crate::analysis::review_stats;
use crate::error::{AppError, Result};
use crate::models::{Config, FetchOptions, Language, Review, ReviewStats, Source};
use crate::services::{OtaClient, build_client};

/// What to fetch, and from where.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub hotel_name: String,
    pub location: Option<String>,
    pub sources: Vec<Source>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit_per_source: usize,
    pub languages: Option<Vec<Language>>,
    /// Deadline for each source's task; `None` waits indefinitely
    pub per_source_timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(hotel_name: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            hotel_name: hotel_name.into(),
            location: None,
            sources,
            start_date: None,
            end_date: None,
            limit_per_source: FetchOptions::default().limit,
            languages: None,
            per_source_timeout: None,
        }
    }

    /// Limit and deadline taken from the `[fetch]` section.
    pub fn from_config(
        config: &Config,
        hotel_name: impl Into<String>,
        sources: Vec<Source>,
    ) -> Self {
        let timeout = config.fetch.per_source_timeout_secs;
        Self {
            limit_per_source: config.fetch.default_limit,
            per_source_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
            ..Self::new(hotel_name, sources)
        }
    }

    fn options_for(&self, hotel_name: &str) -> FetchOptions {
        FetchOptions {
            start_date: self.start_date,
            end_date: self.end_date,
            limit: self.limit_per_source,
            languages: self.languages.clone(),
            hotel_name: Some(hotel_name.to_string()),
        }
    }
}

/// Result of one source's task.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub count: usize,
    /// Hotel id the reviews were fetched for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Merged result of a multi-source fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    /// False only when every requested source failed
    pub success: bool,
    pub message: String,
    pub reviews: Vec<Review>,
    /// One entry per requested source, in request order
    pub per_source: Vec<SourceReport>,
    pub stats: ReviewStats,
    pub elapsed_secs: f64,
}

impl FetchOutcome {
    pub fn per_source_counts(&self) -> BTreeMap<Source, usize> {
        self.per_source.iter().map(|r| (r.source, r.count)).collect()
    }

    pub fn failed_sources(&self) -> Vec<Source> {
        self.per_source
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.source)
            .collect()
    }
}

/// Fetch reviews for `request.hotel_name` from every requested source.
///
/// Duplicate sources are fetched once. A client that cannot be constructed
/// counts as a failed source.
pub async fn fetch_reviews(config: &Config, request: &FetchRequest) -> Result<FetchOutcome> {
    let mut sources: Vec<Source> = Vec::with_capacity(request.sources.len());
    for source in &request.sources {
        if !sources.contains(source) {
            sources.push(*source);
        }
    }
    if sources.is_empty() {
        return Err(AppError::validation("at least one source is required"));
    }

    let start = Instant::now();
    let mut clients = Vec::new();
    let mut unavailable = Vec::new();
    for &source in &sources {
        match build_client(source, config) {
            Ok(client) => clients.push(client),
            Err(e) => {
                log::error!("Failed to initialize {} client: {}", source, e);
                unavailable.push(SourceReport {
                    source,
                    count: 0,
                    hotel_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let (reviews, gathered) = gather(&clients, request).await;

    // put construction failures back in request order
    let mut gathered = gathered.into_iter();
    let mut per_source = Vec::with_capacity(sources.len());
    for source in sources {
        match unavailable.iter().position(|r| r.source == source) {
            Some(pos) => per_source.push(unavailable.remove(pos)),
            None => per_source.extend(gathered.next()),
        }
    }
    Ok(finish(reviews, per_source, start))
}

/// Same as [`fetch_reviews`] over caller-supplied clients, in their order.
pub async fn fetch_from_clients(
    clients: &[Box<dyn OtaClient>],
    request: &FetchRequest,
) -> Result<FetchOutcome> {
    if clients.is_empty() {
        return Err(AppError::validation("at least one source is required"));
    }
    let start = Instant::now();
    let (reviews, per_source) = gather(clients, request).await;
    Ok(finish(reviews, per_source, start))
}

async fn gather(
    clients: &[Box<dyn OtaClient>],
    request: &FetchRequest,
) -> (Vec<Review>, Vec<SourceReport>) {
    log::info!(
        "Fetching reviews for '{}' from {} sources",
        request.hotel_name,
        clients.len()
    );

    let tasks = clients
        .iter()
        .map(|client| fetch_source(client.as_ref(), request));
    // join_all keeps request order
    let results = join_all(tasks).await;

    let mut reviews = Vec::new();
    let mut reports = Vec::with_capacity(results.len());
    for (client, result) in clients.iter().zip(results) {
        let source = client.source();
        match result {
            Ok((hotel_id, mut fetched)) => {
                log::info!("{}: {} reviews", source.display_name(), fetched.len());
                reports.push(SourceReport {
                    source,
                    count: fetched.len(),
                    hotel_id: Some(hotel_id),
                    error: None,
                });
                reviews.append(&mut fetched);
            }
            Err(e) => {
                log::warn!("{} fetch failed: {}", source.display_name(), e);
                reports.push(SourceReport {
                    source,
                    count: 0,
                    hotel_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    (reviews, reports)
}

/// Search, pick the first candidate, fetch its reviews.
async fn fetch_source(
    client: &dyn OtaClient,
    request: &FetchRequest,
) -> Result<(String, Vec<Review>)> {
    let source = client.source();
    let work = async {
        let hotel = client
            .search_hotels(&request.hotel_name, request.location.as_deref())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::hotel_not_found(source, &request.hotel_name))?;

        log::debug!("{}: using hotel {} ({})", source, hotel.name, hotel.id);
        let options = request.options_for(&hotel.name);
        let reviews = client.fetch_reviews(&hotel.id, &options).await?;
        Ok((hotel.id, reviews))
    };

    match request.per_source_timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Timeout {
                    source_name: source.to_string(),
                    secs: limit.as_secs(),
                })
            }),
        None => work.await,
    }
}

fn finish(reviews: Vec<Review>, per_source: Vec<SourceReport>, start: Instant) -> FetchOutcome {
    let succeeded = per_source.iter().filter(|r| r.succeeded()).count();
    let message = format!(
        "Fetched {} reviews from {} of {} sources",
        reviews.len(),
        succeeded,
        per_source.len()
    );
    log::info!("{}", message);

    FetchOutcome {
        success: succeeded > 0,
        message,
        stats: review_stats(&reviews),
        reviews,
        per_source,
        elapsed_secs: start.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{failing_endpoint, fast_config};

    #[tokio::test]
    async fn test_fetch_demo_sources() {
        let config = Config::default();
        let mut request = FetchRequest::from_config(
            &config,
            "Park Hotel Tokyo",
            vec![Source::Jalan, Source::Booking, Source::Jalan],
        );
        request.limit_per_source = 5;

        let outcome = fetch_reviews(&config, &request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.per_source.len(), 2);
        assert_eq!(outcome.per_source[0].source, Source::Jalan);
        assert_eq!(outcome.per_source_counts()[&Source::Booking], 5);
        assert_eq!(outcome.reviews.len(), 10);
        assert_eq!(outcome.stats.total_reviews, 10);
        assert!(outcome.reviews.iter().all(|r| r.hotel_name == "Park Hotel Tokyo"));
    }

    #[tokio::test]
    async fn test_unreachable_live_source_still_yields_demo_reviews() {
        let mut config = fast_config();
        let booking = &mut config.sources.booking;
        booking.enabled = true;
        booking.endpoint = Some(failing_endpoint().await);
        booking.credentials.username = Some("user".into());
        booking.credentials.password = Some("secret".into());

        let mut request =
            FetchRequest::from_config(&config, "Park Hotel Tokyo", vec![Source::Booking, Source::Jalan]);
        request.limit_per_source = 5;

        let outcome = fetch_reviews(&config, &request).await.unwrap();
        assert!(outcome.failed_sources().is_empty());
        assert_eq!(outcome.per_source_counts()[&Source::Booking], 5);
        assert_eq!(outcome.per_source_counts()[&Source::Jalan], 5);
    }

    #[tokio::test]
    async fn test_empty_source_list_is_rejected() {
        let request = FetchRequest::new("x", Vec::new());
        let err = fetch_reviews(&Config::default(), &request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_from_config_timeout() {
        let mut config = Config::default();
        config.fetch.per_source_timeout_secs = 0;
        let request = FetchRequest::from_config(&config, "x", vec![Source::Jalan]);
        assert_eq!(request.per_source_timeout, None);
        assert_eq!(request.limit_per_source, config.fetch.default_limit);
    }
}
