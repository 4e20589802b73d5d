//! Relaying verdicts to the recipient.
//!
//! `MessageSink` is the transport seam (Telegram in production, a recorder in
//! tests). `Notifier` binds a sink to the fixed recipient and never lets a
//! delivery failure escape.

pub mod telegram;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::DeliveryError;

pub use telegram::TelegramSink;

/// Abstraction over message delivery for testability.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Delivers messages to a single recipient, swallowing every failure.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    chat_id: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, chat_id: impl Into<String>) -> Self {
        Self {
            sink,
            chat_id: chat_id.into(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send `message`. Returns whether it was accepted; never fails.
    pub async fn notify(&self, message: &str) -> bool {
        match self.sink.send_message(&self.chat_id, message).await {
            Ok(()) => {
                info!(chat_id = %self.chat_id, "Message delivered");
                true
            }
            Err(DeliveryError::Rejected(reason)) => {
                error!(chat_id = %self.chat_id, "Recipient rejected message: {}", reason);
                false
            }
            Err(e) => {
                // Unexpected failures carry the full error chain.
                error!(
                    chat_id = %self.chat_id,
                    kind = "exception",
                    error = ?e,
                    "Could not deliver message: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every message and replays scripted failures in order.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<(String, String)>>,
        pub failures: Mutex<VecDeque<DeliveryError>>,
    }

    impl RecordingSink {
        pub fn failing_with(errors: Vec<DeliveryError>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failures: Mutex::new(errors.into()),
            }
        }

        pub fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}
