// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, Source};

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Map a non-success status to the error kind callers act on.
///
/// Returns `None` for 2xx.
pub fn status_error(source: Source, status: StatusCode) -> Option<AppError> {
    if status.is_success() {
        return None;
    }

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::authentication(source, format!("upstream rejected credentials ({status})"))
        }
        StatusCode::NOT_FOUND => AppError::hotel_not_found(source, "resource not found (404)"),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(source.to_string()),
        s if s.is_server_error() => AppError::Upstream {
            source_name: source.to_string(),
            status: s.as_u16(),
        },
        s => AppError::review_fetch(source, format!("unexpected HTTP status {s}")),
    };
    Some(error)
}

/// Pass a response through if its status is a success.
pub fn check_status(source: Source, response: reqwest::Response) -> Result<reqwest::Response> {
    match status_error(source, response.status()) {
        Some(error) => Err(error),
        None => Ok(response),
    }
}
