// src/services/agoda.rs

//! Agoda client (10-point ratings, API key plus partner id).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::OtaClient;
use super::base::ClientBase;
use super::demo::{DemoProfile, today_anchor};
use crate::error::{AppError, Result};
use crate::models::{
    Config, FetchOptions, HotelCandidate, RatingScale, RawReview, Review, Source, SourceSettings,
};
use crate::utils::join_path;

const SCALE: RatingScale = RatingScale::TenPoint;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload {
    #[serde(default)]
    hotels: Vec<HotelPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelPayload {
    hotel_id: String,
    hotel_name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    review_count: u32,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsPayload {
    #[serde(default)]
    reviews: Vec<ReviewPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReviewPayload {
    review_id: String,
    review_title: Option<String>,
    review_comments: String,
    rating: f64,
    reviewer_info: Option<ReviewerPayload>,
    review_date: Option<DateTime<Utc>>,
    language_code: Option<String>,
    helpful_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReviewerPayload {
    display_name: Option<String>,
    traveller_type: Option<String>,
    room_type_name: Option<String>,
}

impl ReviewPayload {
    fn into_raw(self, url: &str) -> RawReview {
        let reviewer = self.reviewer_info.unwrap_or_default();
        RawReview {
            id: self.review_id,
            title: self.review_title,
            comment: self.review_comments,
            rating: self.rating,
            reviewer_name: reviewer.display_name,
            review_date: self.review_date,
            trip_type: reviewer.traveller_type,
            room_type: reviewer.room_type_name,
            helpful_count: self.helpful_count,
            // "en-us" style codes
            language: self
                .language_code
                .and_then(|code| code.split('-').next().and_then(|l| l.parse().ok())),
            url: Some(url.to_string()),
            ..RawReview::default()
        }
    }
}

struct LiveSettings {
    endpoint: String,
    authorization: String,
}

/// Agoda affiliate review client.
pub struct AgodaClient {
    base: ClientBase,
    settings: SourceSettings,
    demo: DemoProfile,
}

impl AgodaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.source_settings(Source::Agoda).clone();
        if !settings.enabled {
            log::warn!("Agoda API not enabled - using demo data");
        }
        Ok(Self {
            base: ClientBase::new(Source::Agoda, &config.http)?,
            settings,
            demo: DemoProfile::for_source(Source::Agoda),
        })
    }

    fn live_settings(&self) -> Result<Option<LiveSettings>> {
        if !self.settings.enabled {
            return Ok(None);
        }
        let creds = &self.settings.credentials;
        match (&self.settings.endpoint, &creds.partner_id, &creds.api_key) {
            (Some(endpoint), Some(partner_id), Some(api_key)) => Ok(Some(LiveSettings {
                endpoint: endpoint.clone(),
                authorization: format!("{partner_id}:{api_key}"),
            })),
            _ => Err(AppError::authentication(
                Source::Agoda,
                "api_key, partner_id and endpoint are required when enabled",
            )),
        }
    }

    async fn search_live(
        &self,
        live: &LiveSettings,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        let url = join_path(&live.endpoint, "hotels")?;
        let mut query = vec![("query", hotel_name)];
        if let Some(location) = location {
            query.push(("city", location));
        }

        let payload: SearchPayload = self
            .base
            .get_json(|client| {
                client
                    .get(url.clone())
                    .header(reqwest::header::AUTHORIZATION, &live.authorization)
                    .query(&query)
            })
            .await?;

        Ok(payload
            .hotels
            .into_iter()
            .map(|h| HotelCandidate {
                id: h.hotel_id,
                name: h.hotel_name,
                url: h.url,
                rating: h.rating,
                review_count: h.review_count,
                address: h.address,
            })
            .collect())
    }

    async fn fetch_live(
        &self,
        live: &LiveSettings,
        hotel_id: &str,
        options: &FetchOptions,
    ) -> Result<Vec<RawReview>> {
        let url = join_path(&live.endpoint, "reviews")?;
        let mut query = vec![
            ("hotelId", hotel_id.to_string()),
            ("pageSize", options.limit.to_string()),
        ];
        for language in options.languages.iter().flatten() {
            query.push(("languageCode", language.to_string()));
        }

        let payload: ReviewsPayload = self
            .base
            .get_json(|client| {
                client
                    .get(url.clone())
                    .header(reqwest::header::AUTHORIZATION, &live.authorization)
                    .query(&query)
            })
            .await?;

        let page_url = self.demo.hotel_url(hotel_id);
        Ok(payload
            .reviews
            .into_iter()
            .map(|r| r.into_raw(&page_url))
            .collect())
    }
}

#[async_trait]
impl OtaClient for AgodaClient {
    fn source(&self) -> Source {
        Source::Agoda
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        log::info!("Searching Agoda for hotel: {}", hotel_name);

        let Some(live) = self.live_settings()? else {
            return Ok(vec![self.demo.search_match(hotel_name)]);
        };

        let hotels = match self.search_live(&live, hotel_name, location).await {
            Ok(hotels) => hotels,
            Err(e) => {
                log::warn!("Agoda search failed ({}), falling back to demo data", e);
                return Ok(vec![self.demo.search_match(hotel_name)]);
            }
        };
        if hotels.is_empty() {
            return Err(AppError::hotel_not_found(Source::Agoda, hotel_name));
        }
        Ok(hotels)
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        log::info!("Fetching Agoda reviews for hotel: {}", hotel_id);

        let raw = match self.live_settings()? {
            None => self.demo.reviews(hotel_id, options, today_anchor()),
            Some(live) => match self.fetch_live(&live, hotel_id, options).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Agoda API call failed ({}), falling back to demo data", e);
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
        Review::from_raw(raw, Source::Agoda, SCALE, hotel_id, hotel_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{failing_endpoint, fast_config};
    use crate::models::Language;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_demo_date_window() {
        let client = AgodaClient::new(&Config::default()).unwrap();
        let end = Utc::now();
        let start = end - chrono::Duration::days(90);
        let options = FetchOptions {
            start_date: Some(start),
            end_date: Some(end),
            ..FetchOptions::with_limit(50)
        };

        let reviews = client.fetch_reviews("agoda_hotel_1", &options).await.unwrap();
        assert!(reviews.len() < 50);
        assert!(reviews.iter().all(|r| r.review_date >= start && r.review_date <= end));
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_demo() {
        let mut config = fast_config();
        let agoda = &mut config.sources.agoda;
        agoda.enabled = true;
        agoda.endpoint = Some(failing_endpoint().await);
        agoda.credentials.api_key = Some("key".into());
        agoda.credentials.partner_id = Some("1234".into());
        let client = AgodaClient::new(&config).unwrap();

        let hotels = client.search_hotels("Hilton Osaka", Some("Osaka")).await.unwrap();
        assert_eq!(hotels[0].name, "Hilton Osaka");

        let reviews = client
            .fetch_reviews(&hotels[0].id, &FetchOptions::with_limit(8))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 8);
        assert!(reviews.iter().all(|r| (0.0..=5.0).contains(&r.rating)));
    }

    #[tokio::test]
    async fn test_enabled_without_partner_id_fails() {
        let mut config = Config::default();
        config.sources.agoda.enabled = true;
        config.sources.agoda.credentials.api_key = Some("key".into());
        let client = AgodaClient::new(&config).unwrap();

        let err = client
            .fetch_reviews("h", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication { .. }));
    }

    #[test]
    fn test_payload_decoding() {
        let json = r#"{"reviews": [{
            "reviewId": "a-1",
            "reviewTitle": "Lovely view",
            "reviewComments": "Spacious room with a great view of the bay.",
            "rating": 8.8,
            "reviewerInfo": {"displayName": "Min", "travellerType": "Couple"},
            "reviewDate": "2025-07-03T00:00:00Z",
            "languageCode": "ko-kr"
        }]}"#;
        let payload: ReviewsPayload = serde_json::from_str(json).unwrap();
        let raw = payload.reviews.into_iter().next().unwrap().into_raw("https://example.com");
        assert_eq!(raw.language, Some(Language::Ko));
        assert_eq!(raw.trip_type.as_deref(), Some("Couple"));

        let client = AgodaClient::new(&Config::default()).unwrap();
        let review = client.normalize_review(&raw, "h", "Hotel");
        assert_eq!(review.rating, 4.4);
        assert_eq!(
            review.review_date,
            Utc.with_ymd_and_hms(2025, 7, 3, 0, 0, 0).unwrap()
        );
    }
}
