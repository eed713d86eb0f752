// src/services/booking.rs

//! Booking.com client (10-point ratings, HTTP Basic credentials).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::OtaClient;
use super::base::ClientBase;
use super::demo::{DemoProfile, today_anchor};
use crate::error::{AppError, Result};
use crate::models::{
    Config, FetchOptions, HotelCandidate, Language, RatingScale, RawReview, Review, Source,
    SourceSettings,
};
use crate::utils::join_path;

const SCALE: RatingScale = RatingScale::TenPoint;

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    result: Vec<HotelPayload>,
}

#[derive(Debug, Deserialize)]
struct HotelPayload {
    hotel_id: String,
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    review_score: f64,
    #[serde(default)]
    review_nr: u32,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewsPayload {
    #[serde(default)]
    result: Vec<ReviewPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewPayload {
    review_id: String,
    title: Option<String>,
    pros: Option<String>,
    cons: Option<String>,
    average_score: f64,
    reviewer: Option<ReviewerPayload>,
    date: Option<DateTime<Utc>>,
    stay_date: Option<NaiveDate>,
    language: Option<String>,
    travel_purpose: Option<String>,
    room_type: Option<String>,
    helpful_vote_count: Option<u32>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewerPayload {
    name: Option<String>,
    age_group: Option<String>,
    gender: Option<String>,
}

impl ReviewPayload {
    fn into_raw(self) -> RawReview {
        let comment = [self.pros, self.cons]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let reviewer = self.reviewer.unwrap_or_default();

        RawReview {
            id: self.review_id,
            title: self.title,
            comment,
            rating: self.average_score,
            reviewer_name: reviewer.name,
            age_group: reviewer.age_group,
            gender: reviewer.gender,
            stay_date: self.stay_date,
            review_date: self.date,
            trip_type: self.travel_purpose,
            room_type: self.room_type,
            helpful_count: self.helpful_vote_count,
            language: self.language.and_then(|l| l.parse().ok()),
            url: self.url,
            ..RawReview::default()
        }
    }
}

/// Booking.com guest review client.
pub struct BookingClient {
    base: ClientBase,
    settings: SourceSettings,
    demo: DemoProfile,
}

impl BookingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.source_settings(Source::Booking).clone();
        if !settings.enabled {
            log::warn!("Booking.com API not enabled - using demo data");
        }
        Ok(Self {
            base: ClientBase::new(Source::Booking, &config.http)?,
            settings,
            demo: DemoProfile::for_source(Source::Booking),
        })
    }

    /// Credentials for a live call, or `None` in demo mode.
    fn credentials(&self) -> Result<Option<(String, String, String)>> {
        if !self.settings.enabled {
            return Ok(None);
        }
        let creds = &self.settings.credentials;
        match (&self.settings.endpoint, &creds.username, &creds.password) {
            (Some(endpoint), Some(user), Some(pass)) => {
                Ok(Some((endpoint.clone(), user.clone(), pass.clone())))
            }
            _ => Err(AppError::authentication(
                Source::Booking,
                "username, password and endpoint are required when enabled",
            )),
        }
    }

    async fn search_live(
        &self,
        (endpoint, user, pass): &(String, String, String),
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        let url = join_path(endpoint, "hotels")?;
        let mut query = vec![("name", hotel_name), ("rows", "10")];
        if let Some(location) = location {
            query.push(("city", location));
        }

        let payload: SearchPayload = self
            .base
            .get_json(|client| {
                client
                    .get(url.clone())
                    .basic_auth(user, Some(pass))
                    .query(&query)
            })
            .await?;

        Ok(payload
            .result
            .into_iter()
            .map(|h| HotelCandidate {
                id: h.hotel_id,
                name: h.name,
                url: h.url,
                rating: h.review_score,
                review_count: h.review_nr,
                address: h.address,
            })
            .collect())
    }

    async fn fetch_live(
        &self,
        (endpoint, user, pass): &(String, String, String),
        hotel_id: &str,
        options: &FetchOptions,
    ) -> Result<Vec<RawReview>> {
        let url = join_path(endpoint, "reviews")?;
        let rows = options.limit.to_string();
        let languages = options
            .languages
            .as_ref()
            .map(|langs| langs.iter().map(Language::as_str).collect::<Vec<_>>().join(","));

        let mut query = vec![("hotel_ids", hotel_id), ("rows", rows.as_str())];
        if let Some(languages) = languages.as_deref() {
            query.push(("languages", languages));
        }

        let payload: ReviewsPayload = self
            .base
            .get_json(|client| {
                client
                    .get(url.clone())
                    .basic_auth(user, Some(pass))
                    .query(&query)
            })
            .await?;

        Ok(payload.result.into_iter().map(ReviewPayload::into_raw).collect())
    }
}

#[async_trait]
impl OtaClient for BookingClient {
    fn source(&self) -> Source {
        Source::Booking
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        log::info!("Searching Booking.com for hotel: {}", hotel_name);

        let Some(creds) = self.credentials()? else {
            return Ok(vec![self.demo.search_match(hotel_name)]);
        };

        let hotels = match self.search_live(&creds, hotel_name, location).await {
            Ok(hotels) => hotels,
            Err(e) => {
                log::warn!("Booking.com search failed ({}), falling back to demo data", e);
                return Ok(vec![self.demo.search_match(hotel_name)]);
            }
        };
        if hotels.is_empty() {
            return Err(AppError::hotel_not_found(Source::Booking, hotel_name));
        }
        Ok(hotels)
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        log::info!("Fetching Booking.com reviews for hotel: {}", hotel_id);

        let raw = match self.credentials()? {
            None => self.demo.reviews(hotel_id, options, today_anchor()),
            Some(creds) => match self.fetch_live(&creds, hotel_id, options).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Booking.com API call failed ({}), falling back to demo data", e);
                    self.demo.reviews(hotel_id, options, today_anchor())
                }
            },
        };

        let hotel_name = options.hotel_name.as_deref().unwrap_or(hotel_id);
        let reviews = raw
            .iter()
            .filter(|r| !r.comment.trim().is_empty())
            .map(|r| self.normalize_review(r, hotel_id, hotel_name))
            .collect();

        Ok(self.base.finalize(reviews, options))
    }

    fn normalize_review(&self, raw: &RawReview, hotel_id: &str, hotel_name: &str) -> Review {
        Review::from_raw(raw, Source::Booking, SCALE, hotel_id, hotel_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{failing_endpoint, fast_config};

    fn demo_client() -> BookingClient {
        BookingClient::new(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_demo_search_returns_query() {
        let hotels = demo_client().search_hotels("Park Hotel Tokyo", None).await.unwrap();
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0].name, "Park Hotel Tokyo");
    }

    #[tokio::test]
    async fn test_demo_reviews_are_normalized() {
        let client = demo_client();
        let options = FetchOptions {
            hotel_name: Some("Park Hotel Tokyo".into()),
            ..FetchOptions::with_limit(15)
        };
        let reviews = client.fetch_reviews("booking_hotel_1", &options).await.unwrap();

        assert_eq!(reviews.len(), 15);
        for review in &reviews {
            assert_eq!(review.source, Source::Booking);
            assert_eq!(review.hotel_name, "Park Hotel Tokyo");
            assert!((0.0..=5.0).contains(&review.rating));
            for value in review.rating_details.as_ref().unwrap().values() {
                assert!((0.0..=5.0).contains(value));
            }
        }
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_demo() {
        let mut config = fast_config();
        let booking = &mut config.sources.booking;
        booking.enabled = true;
        booking.endpoint = Some(failing_endpoint().await);
        booking.credentials.username = Some("user".into());
        booking.credentials.password = Some("secret".into());
        let client = BookingClient::new(&config).unwrap();

        let hotels = client.search_hotels("Park Hotel Tokyo", None).await.unwrap();
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0].name, "Park Hotel Tokyo");

        let options = FetchOptions::with_limit(5);
        let reviews = client.fetch_reviews(&hotels[0].id, &options).await.unwrap();
        assert_eq!(reviews.len(), 5);
        assert!(reviews.iter().all(|r| r.source == Source::Booking));
    }

    #[tokio::test]
    async fn test_enabled_without_credentials_fails() {
        let mut config = Config::default();
        config.sources.booking.enabled = true;
        let client = BookingClient::new(&config).unwrap();

        let err = client
            .fetch_reviews("h", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication { .. }));
    }

    #[test]
    fn test_payload_decoding() {
        let json = r#"{"result": [{
            "review_id": "b-1",
            "pros": "Friendly staff",
            "cons": "Thin walls",
            "average_score": 9.0,
            "reviewer": {"name": "Anna"},
            "date": "2025-04-01T10:00:00Z",
            "language": "en"
        }]}"#;
        let payload: ReviewsPayload = serde_json::from_str(json).unwrap();
        let raw = payload.result.into_iter().next().unwrap().into_raw();
        assert_eq!(raw.comment, "Friendly staff\nThin walls");
        assert_eq!(raw.language, Some(Language::En));

        let review = demo_client().normalize_review(&raw, "h", "Hotel");
        assert_eq!(review.rating, 4.5);
        assert_eq!(review.reviewer_name.as_deref(), Some("Anna"));
    }
}
