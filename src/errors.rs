//! Typed error hierarchy for the review watcher.
//!
//! One enum per pipeline stage, plus `CycleError` for the controller:
//! - `FetchError`: reaching the status API
//! - `ValidationError`: payload shape
//! - `ParseError`: interpreting a single record
//! - `DeliveryError`: relaying a message to the recipient

use thiserror::Error;

/// Errors from a single status API request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Status API unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Status API returned HTTP {0}")]
    BadStatus(u16),

    #[error("Status API body is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

impl FetchError {
    /// Transport-class failures: nothing usable came back from the endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Decode(_))
    }
}

/// The payload did not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unexpected payload shape: {0}")]
    ShapeMismatch(String),
}

/// A record could not be turned into a verdict message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Record is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown review status '{0}'")]
    UnknownStatus(String),
}

/// Errors from the messaging API.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Recipient rejected message: {0}")]
    Rejected(String),

    #[error("Message delivery failed: {0}")]
    Failed(String),

    #[error("Messaging API unreachable: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Anything that ends a poll cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Cycle panicked: {0}")]
    Panicked(String),
}
