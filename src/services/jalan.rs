// src/services/jalan.rs

//! Jalan client. There is no public review API, so every call is served
//! from demo records without touching the network.

use async_trait::async_trait;

use super::OtaClient;
use super::base::finalize_reviews;
use super::demo::{DemoProfile, today_anchor};
use crate::error::Result;
use crate::models::{Config, FetchOptions, HotelCandidate, RatingScale, RawReview, Review, Source};

pub struct JalanClient {
    demo: DemoProfile,
}

impl JalanClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.source_settings(Source::Jalan).enabled {
            log::warn!("Jalan has no public API - enabled flag ignored, using demo data");
        }
        Ok(Self {
            demo: DemoProfile::for_source(Source::Jalan),
        })
    }
}

#[async_trait]
impl OtaClient for JalanClient {
    fn source(&self) -> Source {
        Source::Jalan
    }

    async fn search_hotels(
        &self,
        hotel_name: &str,
        _location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>> {
        log::info!("Searching Jalan for hotel: {}", hotel_name);
        Ok(vec![self.demo.search_match(hotel_name)])
    }

    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>> {
        log::info!("Fetching Jalan reviews for hotel: {}", hotel_id);

        let hotel_name = options.hotel_name.as_deref().unwrap_or(hotel_id);
        let reviews = self
            .demo
            .reviews(hotel_id, options, today_anchor())
            .iter()
            .map(|r| self.normalize_review(r, hotel_id, hotel_name))
            .collect();

        Ok(finalize_reviews(Source::Jalan, reviews, options))
    }

    fn normalize_review(&self, raw: &RawReview, hotel_id: &str, hotel_name: &str) -> Review {
        Review::from_raw(raw, Source::Jalan, RatingScale::FivePoint, hotel_id, hotel_name)
    }
}
