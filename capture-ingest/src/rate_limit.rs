use crate::errors::IngestError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// External collaborator enforcing a per-key request quota.
///
/// The limiter owns its algorithm and its shared counters; this service only
/// asks whether one more request for `key` is allowed right now.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn limit(&self, key: &str) -> Result<bool, IngestError>;
}

#[derive(Serialize)]
struct LimitRequest<'a> {
    key: &'a str,
}

#[derive(Deserialize)]
struct LimitResponse {
    success: bool,
}

/// Rate limiter reached over HTTP: `POST <url>` with `{"key": ...}`,
/// answered by `{"success": <bool>}`.
pub struct HttpRateLimiter {
    client: reqwest::Client,
    url: Url,
}

impl HttpRateLimiter {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl RateLimiter for HttpRateLimiter {
    async fn limit(&self, key: &str) -> Result<bool, IngestError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&LimitRequest { key })
            .send()
            .await
            .map_err(|e| IngestError::RateLimiterUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::RateLimiterUnavailable(format!(
                "limiter returned status {}",
                response.status()
            )));
        }

        let limit = response
            .json::<LimitResponse>()
            .await
            .map_err(|e| IngestError::RateLimiterUnavailable(e.to_string()))?;

        Ok(limit.success)
    }
}
