// src/services/expedia.rs

//! Expedia client (5-point ratings, OAuth2 client-credentials).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::OtaClient;
use super::base::ClientBase;
use super::demo::{DemoProfile, today_anchor};
use crate::error::{AppError, Result};
use crate::models::{
    Config, FetchOptions, HotelCandidate, RatingScale, RawReview, Review, Source, SourceSettings,
};
use crate::utils::join_path;

const SCALE: RatingScale = RatingScale::FivePoint;

/// Tokens are refreshed this long before they expire.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on the lifetime taken from a token response.
const MAX_TOKEN_LIFETIME_SECS: u64 = 86_400;

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    1800
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Expiry instant for a token issued now with the given `expires_in`.
fn token_expiry(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in.min(MAX_TOKEN_LIFETIME_SECS));
    now.checked_add(lifetime).unwrap_or(now)
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    properties: Vec<PropertyPayload>,
}

#[derive(Debug, Deserialize)]
struct PropertyPayload {
    id: String,
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    review_count: u32,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewsPayload {
    #[serde(default)]
    reviews: Vec<ReviewPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewPayload {
    id: String,
    title: Option<String>,
    text: String,
    rating: f64,
    category_ratings: Option<BTreeMap<String, f64>>,
    reviewer_name: Option<String>,
    age_range: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    stay_date: Option<NaiveDate>,
    trip_type: Option<String>,
    room_type: Option<String>,
    helpful_count: Option<u32>,
    language: Option<String>,
}

impl ReviewPayload {
    fn into_raw(self, url: &str) -> RawReview {
        RawReview {
            id: self.id,
            title: self.title,
            comment: self.text,
            rating: self.rating,
            rating_details: self.category_ratings,
            reviewer_name: self.reviewer_name,
            age_group: self.age_range,
            stay_date: self.stay_date,
            review_date: self.submitted_at,
            trip_type: self.trip_type,
            room_type: self.room_type,
            helpful_count: self.helpful_count,
            language: self.language.and_then(|l| l.parse().ok()),
            url: Some(url.to_string()),
            ..RawReview::default()
        }
    }
}

struct LiveSettings {
    endpoint: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

/// Expedia review client.
pub struct ExpediaClient {
    base: ClientBase,
    settings: SourceSettings,
    demo: DemoProfile,
    token: Mutex<Option<CachedToken>>,
}

impl ExpediaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.source_settings(Source::Expedia).clone();
        if !settings.enabled {
            log::warn!("Expedia API not enabled - using demo data");
        }
        Ok(Self {
            base: ClientBase::new(Source::Expedia, &config.http)?,
            settings,
            demo: DemoProfile::for_source(Source::Expedia),
            token: Mutex::new(None),
        })
    }

    fn live_settings(&self) -> Result<Option<LiveSettings>> {
        if !self.settings.enabled {
            return Ok(None);
        }
        let creds = &self.settings.credentials;
        match (
            &self.settings.endpoint,
            &creds.token_url,
            &creds.client_id,
            &creds.client_secret,
        ) {
            (Some(endpoint), Some(token_url), Some(id), Some(secret)) => Ok(Some(LiveSettings {
                endpoint: endpoint.clone(),
                token_url: token_url.clone(),
                client_id: id.clone(),
                client_secret: secret.clone(),
            })),
            _ => Err(AppError::authentication(
                Source::Expedia,
                "client_id, client_secret, token_url and endpoint are required when enabled",
            )),
        }
    }

    /// Current bearer token, exchanging credentials when none is cached
    /// or the cached one is about to expire.
    async fn access_token(&self, live: &LiveSettings) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        log::debug!("Requesting Expedia access token");
        let payload: TokenPayload = self
            .base
            .post_form_json(&[("grant_type", "client_credentials")], |client| {
                client
                    .post(&live.token_url)
                    .basic_auth(&live.client_id, Some(&live.client_secret))
            })
            .await
            .map_err(|e| match e {
                auth @ AppError::Authentication { .. } => auth,
                other => AppError::authentication(
                    Source::Expedia,
                    format!("token exchange failed: {other}"),
                ),
            })?;

        let value = payload.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: token_expiry(Instant::now(), payload.expires_in),
        });
        Ok(value)
    }

    async fn search_live(
        &self,
        live: &LiveSettings,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        let token = self.access_token(live).await?;
        let url = join_path(&live.endpoint, "properties")?;
        let mut query = vec![("query", hotel_name)];
        if let Some(location) = location {
            query.push(("location", location));
        }

        let payload: SearchPayload = self
            .base
            .get_json(|client| client.get(url.clone()).bearer_auth(&token).query(&query))
            .await?;

        Ok(payload
            .properties
            .into_iter()
            .map(|p| HotelCandidate {
                id: p.id,
                name: p.name,
                url: p.url,
                rating: p.rating,
                review_count: p.review_count,
                address: p.address,
            })
            .collect())
    }

    async fn fetch_live(
        &self,
        live: &LiveSettings,
        hotel_id: &str,
        options: &FetchOptions,
    ) -> Result<Vec<RawReview>> {
        let token = self.access_token(live).await?;
        let url = join_path(&live.endpoint, &format!("properties/{hotel_id}/reviews"))?;
        let mut query = vec![("limit", options.limit.to_string())];
        for language in options.languages.iter().flatten() {
            query.push(("language", language.to_string()));
        }

        let payload: ReviewsPayload = self
            .base
            .get_json(|client| client.get(url.clone()).bearer_auth(&token).query(&query))
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
impl OtaClient for ExpediaClient {
    fn source(&self) -> Source {
        Source::Expedia
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        log::info!("Searching Expedia for hotel: {}", hotel_name);

        let Some(live) = self.live_settings()? else {
            return Ok(vec![self.demo.search_match(hotel_name)]);
        };

        let hotels = match self.search_live(&live, hotel_name, location).await {
            Ok(hotels) => hotels,
            Err(e) => {
                log::warn!("Expedia search failed ({}), falling back to demo data", e);
                return Ok(vec![self.demo.search_match(hotel_name)]);
            }
        };
        if hotels.is_empty() {
            return Err(AppError::hotel_not_found(Source::Expedia, hotel_name));
        }
        Ok(hotels)
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        log::info!("Fetching Expedia reviews for hotel: {}", hotel_id);

        let raw = match self.live_settings()? {
            None => self.demo.reviews(hotel_id, options, today_anchor()),
            Some(live) => match self.fetch_live(&live, hotel_id, options).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Expedia API call failed ({}), falling back to demo data", e);
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
        Review::from_raw(raw, Source::Expedia, SCALE, hotel_id, hotel_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{failing_endpoint, fast_config, serve_fixed};
    use crate::models::Language;

    #[tokio::test]
    async fn test_demo_mode() {
        let client = ExpediaClient::new(&Config::default()).unwrap();

        let hotels = client.search_hotels("Hotel Okura", Some("Tokyo")).await.unwrap();
        assert_eq!(hotels[0].name, "Hotel Okura");

        let options = FetchOptions {
            languages: Some(vec![Language::En]),
            ..FetchOptions::with_limit(100)
        };
        let reviews = client.fetch_reviews(&hotels[0].id, &options).await.unwrap();
        assert_eq!(reviews.len(), 50);
        assert!(reviews.iter().all(|r| r.language == Some(Language::En)));
    }

    fn live_config(endpoint: String) -> Config {
        let mut config = fast_config();
        let expedia = &mut config.sources.expedia;
        expedia.enabled = true;
        expedia.credentials.token_url = Some(format!("{endpoint}/oauth/token"));
        expedia.endpoint = Some(endpoint);
        expedia.credentials.client_id = Some("id".into());
        expedia.credentials.client_secret = Some("secret".into());
        config
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_demo() {
        let config = live_config(failing_endpoint().await);
        let client = ExpediaClient::new(&config).unwrap();

        let hotels = client.search_hotels("Hotel Okura", None).await.unwrap();
        assert_eq!(hotels[0].name, "Hotel Okura");

        let reviews = client
            .fetch_reviews(&hotels[0].id, &FetchOptions::with_limit(6))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 6);
        assert!(reviews.iter().all(|r| r.source == Source::Expedia));
    }

    #[tokio::test]
    async fn test_oversized_token_lifetime_is_capped() {
        let endpoint = serve_fixed(
            "200 OK",
            r#"{"access_token":"t","expires_in":18446744073709551615}"#,
        )
        .await;
        let config = live_config(endpoint);
        let client = ExpediaClient::new(&config).unwrap();
        let live = client.live_settings().unwrap().unwrap();

        let before = Instant::now();
        assert_eq!(client.access_token(&live).await.unwrap(), "t");

        let cached = client.token.lock().await;
        let expires_at = cached.as_ref().unwrap().expires_at;
        assert!(expires_at <= Instant::now() + Duration::from_secs(MAX_TOKEN_LIFETIME_SECS));
        assert!(expires_at > before);
    }

    #[test]
    fn test_token_expiry_saturates() {
        let now = Instant::now();
        assert_eq!(token_expiry(now, 1800), now + Duration::from_secs(1800));
        assert_eq!(
            token_expiry(now, u64::MAX),
            now + Duration::from_secs(MAX_TOKEN_LIFETIME_SECS)
        );
    }

    #[tokio::test]
    async fn test_enabled_without_secret_fails() {
        let mut config = Config::default();
        config.sources.expedia.enabled = true;
        config.sources.expedia.credentials.client_id = Some("id".into());
        let client = ExpediaClient::new(&config).unwrap();

        let err = client.search_hotels("Hotel Okura", None).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication { .. }));
    }

    #[test]
    fn test_payload_keeps_five_point_scale() {
        let json = r#"{"reviews": [{
            "id": "e-1",
            "text": "Comfortable bed and quiet room.",
            "rating": 4.0,
            "category_ratings": {"cleanliness": 4.6},
            "submitted_at": "2025-02-10T08:30:00Z"
        }]}"#;
        let payload: ReviewsPayload = serde_json::from_str(json).unwrap();
        let raw = payload.reviews.into_iter().next().unwrap().into_raw("https://example.com");

        let client = ExpediaClient::new(&Config::default()).unwrap();
        let review = client.normalize_review(&raw, "h", "Hotel");
        assert_eq!(review.rating, 4.0);
        assert_eq!(review.rating_details.unwrap()["cleanliness"], 4.6);
    }
}
