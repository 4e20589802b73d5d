use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::MessageSink;
use crate::errors::DeliveryError;

/// Body of `sendMessage`.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API response is wrapped in (subset of fields).
#[derive(Debug, Deserialize)]
pub struct BotApiResponse {
    pub ok: bool,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

/// Telegram Bot API delivery.
pub struct TelegramSink {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramSink {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram client")?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

/// Classify a Bot API reply. 400 means the request itself (usually the
/// recipient) was refused; anything else unsuccessful is a delivery failure.
pub fn classify_response(
    http_status: u16,
    body: Option<BotApiResponse>,
) -> Result<(), DeliveryError> {
    let (ok, code, description) = match body {
        Some(b) => (b.ok, b.error_code.unwrap_or(http_status), b.description),
        None => (false, http_status, None),
    };
    if ok && (200..300).contains(&http_status) {
        return Ok(());
    }
    let description = description.unwrap_or_else(|| format!("HTTP {}", code));
    if code == 400 {
        Err(DeliveryError::Rejected(description))
    } else {
        Err(DeliveryError::Failed(format!("HTTP {}: {}", code, description)))
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .post(self.send_message_url())
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        let status = resp.status().as_u16();
        let body = resp.json::<BotApiResponse>().await.ok();
        classify_response(status, body)
    }
}
