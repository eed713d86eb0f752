// src/services/base.rs

//! Transport, resilience and post-processing shared by every source client.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{FetchOptions, HttpConfig, Review, Source};
use crate::utils::http::{check_status, create_async_client, status_error};
use crate::utils::rate_limit::RateLimiter;
use crate::utils::retry::{RetryPolicy, retry_with_backoff};

/// HTTP session plus retry and pacing policy for one source.
///
/// Composed into each client. Dropping it releases the session.
pub struct ClientBase {
    source: Source,
    client: Client,
    policy: RetryPolicy,
    limiter: RateLimiter,
}

impl ClientBase {
    pub fn new(source: Source, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            source,
            client: create_async_client(http)?,
            policy: http.retry_policy(),
            limiter: RateLimiter::from_millis(http.request_delay_ms),
        })
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Send a request built by `build`, with pacing and retries.
    ///
    /// Non-success statuses become errors (see [`status_error`]); only the
    /// transient ones are retried.
    pub async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        retry_with_backoff(&self.policy, AppError::is_retryable, || {
            let request = build(&self.client);
            self.limiter.run(async move {
                let response = request.send().await?;
                check_status(self.source, response)
            })
        })
        .await
    }

    /// Like [`send`](Self::send), but hands back client-error bodies
    /// instead of mapping them. 429 and 5xx are still retried.
    pub async fn send_unchecked<F>(&self, build: F) -> Result<(StatusCode, String)>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        retry_with_backoff(&self.policy, AppError::is_retryable, || {
            let request = build(&self.client);
            self.limiter.run(async move {
                let response = request.send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if let Some(error) = status_error(self.source, status) {
                        return Err(error);
                    }
                }
                Ok((status, response.text().await?))
            })
        })
        .await
    }

    pub async fn get_json<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post_form_json<T, F>(&self, form: &[(&str, &str)], build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(|client| build(client).form(form)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Apply the date window and then the limit.
    pub fn finalize(&self, reviews: Vec<Review>, options: &FetchOptions) -> Vec<Review> {
        finalize_reviews(self.source, reviews, options)
    }
}

impl Drop for ClientBase {
    fn drop(&mut self) {
        log::debug!("{} client closed", self.source);
    }
}

/// Inclusive date filter on `review_date`, then truncation to the limit.
pub fn finalize_reviews(source: Source, reviews: Vec<Review>, options: &FetchOptions) -> Vec<Review> {
    let before = reviews.len();
    let mut kept: Vec<Review> = reviews.into_iter().filter(|r| options.in_range(r)).collect();
    if kept.len() < before {
        log::debug!(
            "{}: date filter kept {} of {} reviews",
            source,
            kept.len(),
            before
        );
    }
    kept.truncate(options.limit);
    log::info!("Fetched {} reviews from {}", kept.len(), source.display_name());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RatingScale, RawReview};
    use chrono::{TimeZone, Utc};

    fn review(day: u32) -> Review {
        let raw = RawReview {
            id: format!("r{day}"),
            comment: "fine".into(),
            rating: 4.0,
            review_date: Some(Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()),
            ..RawReview::default()
        };
        Review::from_raw(&raw, Source::Expedia, RatingScale::FivePoint, "h", "H")
    }

    #[test]
    fn test_finalize_filters_then_limits() {
        let reviews: Vec<Review> = (1..=10).map(review).collect();
        let options = FetchOptions {
            start_date: Some(Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap()),
            limit: 4,
            ..FetchOptions::default()
        };

        let kept = finalize_reviews(Source::Expedia, reviews, &options);
        let ids: Vec<&str> = kept.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r4", "r5", "r6"]);
    }

    #[test]
    fn test_finalize_without_window() {
        let reviews: Vec<Review> = (1..=5).map(review).collect();
        let kept = finalize_reviews(Source::Expedia, reviews, &FetchOptions::with_limit(100));
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_client_base_builds() {
        let base = ClientBase::new(Source::Booking, &HttpConfig::default()).unwrap();
        assert_eq!(base.source(), Source::Booking);
    }
}
