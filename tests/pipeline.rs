//! Orchestrator behavior with in-process clients.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use hotelscope::error::{AppError, Result};
use hotelscope::models::{
    FetchOptions, HotelCandidate, RatingScale, RawReview, Review, Sentiment, Source,
};
use hotelscope::pipeline::{
    AnalyzeOptions, FetchRequest, ReviewSession, analyze, fetch_from_clients,
};
use hotelscope::services::{OtaClient, finalize_reviews};

const COMMENTS: &[&str] = &[
    "朝食が最高で、スタッフも親切でした",
    "部屋が清潔で快適に過ごせました",
    "駅から近くて便利、また利用したいです",
];

enum Behavior {
    Ok(usize),
    FailFetch,
    Hang,
}

struct FakeClient {
    source: Source,
    scale: RatingScale,
    behavior: Behavior,
}

impl FakeClient {
    fn boxed(source: Source, scale: RatingScale, behavior: Behavior) -> Box<dyn OtaClient> {
        Box::new(Self {
            source,
            scale,
            behavior,
        })
    }
}

#[async_trait]
impl OtaClient for FakeClient {
    fn source(&self) -> Source {
        self.source
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        _location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        Ok(vec![HotelCandidate {
            id: format!("{}-1", self.source),
            name: hotel_name.to_string(),
            url: String::new(),
            rating: 4.0,
            review_count: 3,
            address: None,
        }])
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        let count = match self.behavior {
            Behavior::Ok(count) => count,
            Behavior::FailFetch => {
                return Err(AppError::review_fetch(self.source, "listing page changed"));
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                0
            }
        };

        let hotel_name = options.hotel_name.as_deref().unwrap_or(hotel_id);
        let reviews = (0..count)
            .map(|i| {
                let raw = RawReview {
                    id: format!("{}-{i}", self.source),
                    comment: COMMENTS[i % COMMENTS.len()].to_string(),
                    rating: match self.scale {
                        RatingScale::FivePoint => 4.5,
                        RatingScale::TenPoint => 9.0,
                    },
                    review_date: Utc.with_ymd_and_hms(2025, 5, 1 + i as u32, 9, 0, 0).single(),
                    ..RawReview::default()
                };
                self.normalize_review(&raw, hotel_id, hotel_name)
            })
            .collect();
        Ok(finalize_reviews(self.source, reviews, options))
    }

    fn normalize_review(&self, raw: &RawReview, hotel_id: &str, hotel_name: &str) -> Review {
        Review::from_raw(raw, self.source, self.scale, hotel_id, hotel_name)
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_other_sources() {
    let clients = vec![
        FakeClient::boxed(Source::Booking, RatingScale::TenPoint, Behavior::Ok(3)),
        FakeClient::boxed(Source::Rakuten, RatingScale::FivePoint, Behavior::FailFetch),
        FakeClient::boxed(Source::Expedia, RatingScale::FivePoint, Behavior::Ok(2)),
    ];
    let request = FetchRequest::new("ホテル椿山荘東京", Vec::new());

    let outcome = fetch_from_clients(&clients, &request).await.unwrap();

    assert!(outcome.success);
    let counts = outcome.per_source_counts();
    assert_eq!(counts[&Source::Booking], 3);
    assert_eq!(counts[&Source::Rakuten], 0);
    assert_eq!(counts[&Source::Expedia], 2);
    assert_eq!(outcome.failed_sources(), vec![Source::Rakuten]);
    assert_eq!(outcome.reviews.len(), 5);

    // attributed by request order, not completion order
    let order: Vec<Source> = outcome.per_source.iter().map(|r| r.source).collect();
    assert_eq!(order, vec![Source::Booking, Source::Rakuten, Source::Expedia]);
}

#[tokio::test]
async fn test_ten_point_ratings_are_halved() {
    let clients = vec![FakeClient::boxed(
        Source::Agoda,
        RatingScale::TenPoint,
        Behavior::Ok(2),
    )];
    let outcome = fetch_from_clients(&clients, &FetchRequest::new("h", Vec::new()))
        .await
        .unwrap();

    assert!(outcome.reviews.iter().all(|r| r.rating == 4.5));
    assert_eq!(outcome.stats.average_rating, 4.5);
}

#[tokio::test]
async fn test_all_sources_failing_is_unsuccessful() {
    let clients = vec![FakeClient::boxed(
        Source::Rakuten,
        RatingScale::FivePoint,
        Behavior::FailFetch,
    )];
    let outcome = fetch_from_clients(&clients, &FetchRequest::new("h", Vec::new()))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.reviews.is_empty());
    assert!(outcome.per_source[0].error.as_deref().unwrap().contains("listing page changed"));
}

#[tokio::test(start_paused = true)]
async fn test_per_source_deadline() {
    let clients = vec![
        FakeClient::boxed(Source::Jalan, RatingScale::FivePoint, Behavior::Hang),
        FakeClient::boxed(Source::Expedia, RatingScale::FivePoint, Behavior::Ok(1)),
    ];
    let mut request = FetchRequest::new("h", Vec::new());
    request.per_source_timeout = Some(Duration::from_secs(5));

    let outcome = fetch_from_clients(&clients, &request).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.per_source_counts()[&Source::Jalan], 0);
    assert!(outcome.per_source[0].error.as_deref().unwrap().contains("Timed out"));
    assert_eq!(outcome.per_source_counts()[&Source::Expedia], 1);
}

#[tokio::test]
async fn test_date_window_and_limit() {
    let clients = vec![FakeClient::boxed(
        Source::Booking,
        RatingScale::TenPoint,
        Behavior::Ok(10),
    )];
    let mut request = FetchRequest::new("h", Vec::new());
    request.start_date = Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).single();
    request.end_date = Utc.with_ymd_and_hms(2025, 5, 9, 23, 59, 59).single();
    request.limit_per_source = 4;

    let outcome = fetch_from_clients(&clients, &request).await.unwrap();
    let ids: Vec<&str> = outcome.reviews.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(ids, vec!["booking-2", "booking-3", "booking-4", "booking-5"]);
}

#[tokio::test]
async fn test_fetch_then_analyze() {
    let clients = vec![
        FakeClient::boxed(Source::Booking, RatingScale::TenPoint, Behavior::Ok(3)),
        FakeClient::boxed(Source::Expedia, RatingScale::FivePoint, Behavior::Ok(3)),
    ];
    let mut outcome = fetch_from_clients(&clients, &FetchRequest::new("h", Vec::new()))
        .await
        .unwrap();

    let result = analyze(&mut outcome.reviews, &AnalyzeOptions::default()).unwrap();
    assert_eq!(result.total_reviews, 6);
    assert_eq!(result.ota_analyses.len(), 2);
    assert!(outcome
        .reviews
        .iter()
        .all(|r| r.sentiment_label() == Some(Sentiment::Positive)));
    assert_eq!(result.sentiment_distribution.positive, 6);

    let session = ReviewSession::new();
    session.replace(outcome.reviews).await;
    let stored = session.analyze(&AnalyzeOptions::default()).await.unwrap();
    assert_eq!(stored.total_reviews, 6);
}
