//! Error type definitions.

use std::fmt;
use thiserror::Error;

/// A `Result` alias where the `Err` case is `campus_analytics::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for sinks and configuration.
///
/// None of these ever reach the caller of an [`Emitter`](crate::Emitter)
/// operation: the emitter logs sink failures and moves on.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Missing write key")]
    MissingWriteKey,
    #[error("Invalid write key (make sure there are no invalid characters)")]
    InvalidWriteKey,
    #[error("Invalid URL: {0}")]
    InvalidUrl(url::ParseError),
    #[cfg(feature = "tokio")]
    #[error("Failed to setup HTTP client: {0}")]
    HttpClientSetup(reqwest::Error),
    #[cfg(feature = "tokio")]
    #[error("Http error: {0}")]
    Http(reqwest::Error),
    #[cfg(feature = "blocking")]
    #[error("Transport error: {0}")]
    Transport(Box<ureq::Error>),
    #[error(transparent)]
    Api(ApiError),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to encode payload: {0}")]
    Encoding(std::io::Error),
    #[cfg(feature = "tokio")]
    #[error("Failed to join thread: {0}")]
    JoinError(tokio::task::JoinError),
    #[error("No tokio runtime is running")]
    MissingRuntime,
    #[error("Sink worker has stopped")]
    SinkClosed,
    #[error("Unknown onboarding step: {0}")]
    UnknownOnboardingStep(String),
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
    #[error("Unknown consent purpose: {0}")]
    UnknownPurpose(String),
    #[error("Unknown invoice status: {0}")]
    UnknownInvoiceStatus(String),
}

/// An error returned by the tracking API.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub path: String,
    pub message: Option<String>,
}

impl ApiError {
    pub(crate) fn new(status: u16, path: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            path: path.into(),
            message,
        }
    }
}

impl std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = self.message.as_ref() {
            write!(f, "Received {} on POST {}: {}", self.status, self.path, msg)
        } else {
            write!(f, "Received {} on POST {}", self.status, self.path)
        }
    }
}
