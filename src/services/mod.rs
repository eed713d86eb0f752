//! Source clients for the supported travel platforms.
//!
//! This module contains one client per platform:
//! - Rakuten Travel (`RakutenClient`), scraping review pages
//! - Jalan (`JalanClient`), fixed demo records
//! - Booking.com (`BookingClient`), Expedia (`ExpediaClient`) and Agoda
//!   (`AgodaClient`), live APIs with demo fallback
//!
//! Shared transport lives in [`ClientBase`], composed into each client.

mod agoda;
mod base;
mod booking;
pub mod demo;
mod expedia;
mod jalan;
mod rakuten;

use async_trait::async_trait;

pub use agoda::AgodaClient;
pub use base::{ClientBase, finalize_reviews};
pub use booking::BookingClient;
pub use expedia::ExpediaClient;
pub use jalan::JalanClient;
pub use rakuten::RakutenClient;

use crate::error::Result;
use crate::models::{Config, FetchOptions, HotelCandidate, RawReview, Review, Source};

/// Capabilities every review source provides.
#[async_trait]
pub trait OtaClient: Send + Sync {
    fn source(&self) -> Source;

    /// Candidate hotels for a name, optionally narrowed by location.
    ///
    /// Whether an unknown name fails with `HotelNotFound` or comes back as a
    /// single synthetic match depends on the client.
    async fn search_hotels(
        &self,
        hotel_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<HotelCandidate>>;

    /// Reviews for a hotel id, date-filtered and truncated to the limit.
    async fn fetch_reviews(&self, hotel_id: &str, options: &FetchOptions) -> Result<Vec<Review>>;

    /// Map a raw record into the canonical review, converting the rating scale.
    fn normalize_review(&self, raw: &RawReview, hotel_id: &str, hotel_name: &str) -> Review;
}

/// Construct the client for a source.
pub fn build_client(source: Source, config: &Config) -> Result<Box<dyn OtaClient>> {
    let client: Box<dyn OtaClient> = match source {
        Source::Rakuten => Box::new(RakutenClient::new(config)?),
        Source::Jalan => Box::new(JalanClient::new(config)?),
        Source::Booking => Box::new(BookingClient::new(config)?),
        Source::Expedia => Box::new(ExpediaClient::new(config)?),
        Source::Agoda => Box::new(AgodaClient::new(config)?),
    };
    Ok(client)
}

#[cfg(test)]
pub(crate) mod test_support {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::models::Config;

    /// Local endpoint answering every request with `status` and `body`.
    pub async fn serve_fixed(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/api")
    }

    /// Endpoint whose every call fails with a 5xx.
    pub async fn failing_endpoint() -> String {
        serve_fixed("503 Service Unavailable", "").await
    }

    /// Config with no retries or pacing, so failures surface at once.
    pub fn fast_config() -> Config {
        let mut config = Config::default();
        config.http.max_retries = 0;
        config.http.request_delay_ms = 0;
        config
    }
}
