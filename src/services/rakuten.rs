// src/services/rakuten.rs

//! Rakuten Travel client.
//!
//! Hotel search goes through the public keyword-search API. Reviews have no
//! API, so they are scraped from the hotel's review listing page; when no
//! review can be recovered the fetch fails rather than inventing data.

use async_trait::async_trait;
use serde::Deserialize;

use super::OtaClient;
use super::base::ClientBase;
use super::demo::DemoProfile;
use crate::error::{AppError, Result};
use crate::extract::{ExtractContext, ReviewExtractor};
use crate::models::{
    Config, FetchOptions, HotelCandidate, Language, RatingScale, RawReview, Review, Source,
    SourceSettings,
};

/// Review listing page; the hotel number is appended.
const REVIEW_PAGE_BASE: &str = "https://review.travel.rakuten.co.jp/hotel/voice";
const DEFAULT_HOTEL_NAME: &str = "楽天トラベルホテル";

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    hotels: Vec<HotelEntry>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotelEntry {
    #[serde(default)]
    hotel: Vec<HotelPart>,
}

#[derive(Debug, Deserialize)]
struct HotelPart {
    #[serde(rename = "hotelBasicInfo")]
    basic_info: Option<HotelBasicInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelBasicInfo {
    hotel_no: u64,
    #[serde(default)]
    hotel_name: String,
    #[serde(default)]
    hotel_information_url: String,
    review_average: Option<f64>,
    review_count: Option<u32>,
    address1: Option<String>,
    address2: Option<String>,
}

impl From<HotelBasicInfo> for HotelCandidate {
    fn from(info: HotelBasicInfo) -> Self {
        let address = match (info.address1, info.address2) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            (a, b) => a.or(b),
        };
        HotelCandidate {
            id: info.hotel_no.to_string(),
            name: info.hotel_name,
            url: info.hotel_information_url,
            rating: info.review_average.unwrap_or(0.0),
            review_count: info.review_count.unwrap_or(0),
            address,
        }
    }
}

/// Rakuten Travel client.
pub struct RakutenClient {
    base: ClientBase,
    settings: SourceSettings,
    demo: DemoProfile,
    cards: ReviewExtractor,
    generic: ReviewExtractor,
}

impl RakutenClient {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = config.source_settings(Source::Rakuten).clone();
        if settings.credentials.app_id.is_none() {
            log::warn!("Rakuten App ID not configured, hotel search uses the query as-is");
        }
        Ok(Self {
            base: ClientBase::new(Source::Rakuten, &config.http)?,
            settings,
            demo: DemoProfile::for_source(Source::Rakuten),
            cards: ReviewExtractor::cards()?,
            generic: ReviewExtractor::generic()?,
        })
    }

    /// Review listing URL for a hotel number.
    pub fn review_page_url(hotel_id: &str) -> String {
        format!("{REVIEW_PAGE_BASE}/{hotel_id}")
    }

    /// Parse a keyword-search response body.
    fn parse_search(&self, hotel_name: &str, body: &str) -> Result<Option<Vec<HotelCandidate>>> {
        let payload: SearchPayload = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Unreadable Rakuten search response: {}", e);
                return Ok(None);
            }
        };

        if let Some(error) = payload.error {
            let description = payload.error_description.unwrap_or_else(|| error.clone());
            if description.to_lowercase().contains("wrong applicationid") {
                return Err(AppError::authentication(
                    Source::Rakuten,
                    format!("invalid application id: {description}"),
                ));
            }
            if error == "not_found" {
                return Err(AppError::hotel_not_found(Source::Rakuten, hotel_name));
            }
            log::warn!("Rakuten search API error: {} ({})", error, description);
            return Ok(None);
        }

        let hotels: Vec<HotelCandidate> = payload
            .hotels
            .into_iter()
            .filter_map(|entry| entry.hotel.into_iter().find_map(|part| part.basic_info))
            .map(HotelCandidate::from)
            .collect();

        if hotels.is_empty() {
            return Err(AppError::hotel_not_found(Source::Rakuten, hotel_name));
        }
        log::info!("Found {} hotels on Rakuten Travel", hotels.len());
        Ok(Some(hotels))
    }

    /// Extract reviews from a downloaded listing page.
    ///
    /// Card layouts are tried first, then the loose fallbacks.
    pub fn reviews_from_markup(
        &self,
        markup: &str,
        hotel_id: &str,
        options: &FetchOptions,
    ) -> Result<Vec<Review>> {
        let ctx = ExtractContext {
            url: Some(Self::review_page_url(hotel_id)),
            language: Some(Language::Ja),
            limit: Some(options.limit),
            ..ExtractContext::new(Source::Rakuten, hotel_id)
        };

        let mut raw = self.cards.extract(markup, &ctx);
        if raw.is_empty() {
            log::warn!("Card layouts yielded no reviews, trying fallback selectors");
            raw = self.generic.extract(markup, &ctx);
        }
        if raw.is_empty() {
            log::error!("Could not extract any reviews for Rakuten hotel {}", hotel_id);
            return Err(AppError::review_fetch(
                Source::Rakuten,
                format!("no reviews could be extracted for hotel {hotel_id}"),
            ));
        }

        let hotel_name = options.hotel_name.as_deref().unwrap_or(DEFAULT_HOTEL_NAME);
        let reviews = raw
            .iter()
            .map(|r| self.normalize_review(r, hotel_id, hotel_name))
            .collect();
        Ok(self.base.finalize(reviews, options))
    }
}

#[async_trait]
impl OtaClient for RakutenClient {
    fn source(&self) -> Source {
        Source::Rakuten
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        let (Some(app_id), Some(endpoint)) =
            (&self.settings.credentials.app_id, &self.settings.endpoint)
        else {
            return Ok(vec![self.demo.search_match(hotel_name)]);
        };

        log::info!("Searching Rakuten Travel API for hotel: {}", hotel_name);
        let keyword = match location {
            Some(location) => format!("{hotel_name} {location}"),
            None => hotel_name.to_string(),
        };
        let query = [
            ("applicationId", app_id.as_str()),
            ("keyword", keyword.as_str()),
            ("hits", "10"),
            ("format", "json"),
        ];

        let outcome = self
            .base
            .send_unchecked(|client| client.get(endpoint).query(&query))
            .await;

        let parsed = match outcome {
            Ok((status, body)) => {
                log::debug!("Rakuten search answered {}", status);
                self.parse_search(hotel_name, &body)?
            }
            Err(e) => {
                log::error!("Failed to search Rakuten hotels: {}", e);
                None
            }
        };

        Ok(parsed.unwrap_or_else(|| {
            log::warn!("Falling back to the query as the Rakuten match");
            vec![self.demo.search_match(hotel_name)]
        }))
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        if !self.settings.enabled {
            return Err(AppError::review_fetch(Source::Rakuten, "source is disabled"));
        }

        let url = Self::review_page_url(hotel_id);
        log::info!("Fetching Rakuten reviews from {}", url);

        let markup = self
            .base
            .send(|client| {
                client
                    .get(&url)
                    .header(reqwest::header::ACCEPT_LANGUAGE, "ja,en-US;q=0.9,en;q=0.8")
            })
            .await
            .map_err(|e| match e {
                kept @ (AppError::HotelNotFound { .. } | AppError::Authentication { .. }) => kept,
                other => AppError::review_fetch(Source::Rakuten, other),
            })?
            .text()
            .await
            .map_err(|e| AppError::review_fetch(Source::Rakuten, e))?;

        self.reviews_from_markup(&markup, hotel_id, options)
    }

    fn normalize_review(&self, raw: &RawReview, hotel_id: &str, hotel_name: &str) -> Review {
        Review::from_raw(raw, Source::Rakuten, RatingScale::FivePoint, hotel_id, hotel_name)
    }
}
