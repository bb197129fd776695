//! Outbound client for NASA's picture-of-the-day API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::app::ports::PictureProvider;
use crate::error::{AppError, FetchError, Result};

const DEFAULT_BASE_URL: &str = "https://api.nasa.gov";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NasaApodClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NasaApodClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl PictureProvider for NasaApodClient {
    async fn fetch_daily(&self) -> std::result::Result<Value, FetchError> {
        let mut request = self.client.get(format!("{}/planetary/apod", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let response = request.send().await.map_err(classify)?;
        let response = response.error_for_status().map_err(classify)?;
        response.json::<Value>().await.map_err(classify)
    }
}

/// Translate a transport failure into the typed result, logging the
/// underlying cause here so callers only see the user-facing variant.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        error!("Request to NASA API timed out: {err}");
        FetchError::Timeout
    } else if err.is_connect() {
        error!("Connection error occurred while requesting NASA API: {err}");
        FetchError::ConnectionFailed
    } else if let Some(status) = err.status() {
        error!("HTTP error occurred: {err}");
        FetchError::HttpStatus(status.as_u16())
    } else {
        error!("An error occurred while requesting NASA API: {err}");
        FetchError::Other(err.to_string())
    }
}
