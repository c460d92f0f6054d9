//! Error types.
//!
//! Submission and transport failures are kept apart: a failed submission is
//! reported to the caller, a failed status fetch only becomes poll state.

use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// A request to the prediction service failed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        details: serde_json::Value,
    },

    /// The request never got a usable response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A status fetch failed. Carries the message surfaced as poll error.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApiError> for TransportError {
    fn from(err: ApiError) -> Self {
        Self::new(err.to_string())
    }
}

/// Starting a task failed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Raw form input could not be turned into a request payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("home/away must be home or away, got {0:?}")]
    HomeAway(String),
}
