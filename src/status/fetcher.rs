use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::FetchError;

/// Source of status payloads. Real implementation: `HttpStatusFetcher`.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch every record changed since `window_start` (now when absent).
    async fn fetch_status(&self, window_start: Option<i64>) -> Result<Value, FetchError>;
}

/// Single-request client for the review-status endpoint.
pub struct HttpStatusFetcher {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpStatusFetcher {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build status API client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusSource for HttpStatusFetcher {
    async fn fetch_status(&self, window_start: Option<i64>) -> Result<Value, FetchError> {
        let from_date = window_start.unwrap_or_else(|| chrono::Utc::now().timestamp());
        debug!(endpoint = %self.endpoint, from_date, "Requesting review statuses");

        let resp = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, "Status API request failed: {}", e);
                // The URL carries the window, which changes every cycle.
                FetchError::Transport(e.without_url())
            })?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            error!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Status API returned {}",
                status
            );
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        resp.json::<Value>().await.map_err(|e| {
            error!(endpoint = %self.endpoint, "Status API body could not be decoded: {}", e);
            FetchError::Decode(e.without_url())
        })
    }
}
