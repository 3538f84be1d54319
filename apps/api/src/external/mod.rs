//! Outbound HTTP client shared by the job scraper and the footprint scanners.
//!
//! Every third-party call (SerpAPI, GitHub, StackExchange) goes through
//! `ExternalClient::get_json`, which retries rate limits and 5xx responses.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

const USER_AGENT: &str = concat!("utopiahire-api/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ExternalApiError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Strips the request URL; its query string may hold an API key.
impl From<reqwest::Error> for ExternalApiError {
    fn from(err: reqwest::Error) -> Self {
        ExternalApiError::Http(err.without_url())
    }
}

impl From<ExternalApiError> for AppError {
    fn from(err: ExternalApiError) -> Self {
        match err {
            ExternalApiError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Thin wrapper around a pooled `reqwest::Client` with retry and backoff.
#[derive(Clone)]
pub struct ExternalClient {
    client: Client,
}

impl ExternalClient {
    pub fn new() -> Result<Self, ExternalApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` with the given query parameters and decodes the JSON body.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<T, ExternalApiError> {
        let mut last_error: Option<ExternalApiError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    url,
                    attempt,
                    "External call failed, retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .get(url)
                .query(query)
                .header("accept", "application/json");
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ExternalApiError::from(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Err(ExternalApiError::NotFound(url.to_string()));
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!(url, status = status.as_u16(), "External API returned {body}");
                last_error = Some(ExternalApiError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExternalApiError::Api {
                    status: status.as_u16(),
                    message: truncate(&body, 300),
                });
            }

            let body = response.text().await?;
            debug!(url, bytes = body.len(), "External call succeeded");
            return serde_json::from_str(&body).map_err(ExternalApiError::Parse);
        }

        Err(last_error.unwrap_or(ExternalApiError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as HttpStatus;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: AppError = ExternalApiError::NotFound("users/ghost".into()).into();
        assert_eq!(err.status_and_code().0, HttpStatus::NOT_FOUND);
    }

    #[test]
    fn test_api_error_maps_to_bad_gateway() {
        let err: AppError = ExternalApiError::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.status_and_code().0, HttpStatus::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_transport_error_omits_query_string() {
        let client = ExternalClient::new().unwrap();
        let err = client
            .get_json::<serde_json::Value>(
                "http://127.0.0.1:1/search.json",
                &[("api_key", "SECRET_KEY_123".to_string())],
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalApiError::Http(_)));
        assert!(!err.to_string().contains("SECRET_KEY_123"));

        let app_err: AppError = err.into();
        assert!(!app_err.to_string().contains("SECRET_KEY_123"));
    }

    #[test]
    fn test_truncate_long_body() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
