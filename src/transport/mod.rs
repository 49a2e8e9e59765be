//! Channels that reach the question generator.
//!
//! A [`Transport`] performs exactly one attempt and hands back the raw
//! question list; validation and retry live in the callers
//! ([`crate::fetcher::BatchFetcher`] and the cache).

pub mod fallback;
pub mod gemini;
pub mod proxy;
pub mod router;

pub use fallback::FallbackTransport;
pub use gemini::GeminiTransport;
pub use proxy::ProxyTransport;
pub use router::TransportStrategy;

use crate::question::Batch;
use crate::validate::ValidationError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Count must be between 1 and 10, got {0}")]
    InvalidCount(usize),

    #[error("Transport failure: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Schema(String),

    #[error("Invalid batch: {0}")]
    Validation(#[from] ValidationError),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP status and its body to a transport failure.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = match status.as_u16() {
            401 => "Authentication failed - check your API key".to_string(),
            403 => "Access forbidden - insufficient permissions".to_string(),
            429 => "Rate limit exceeded - too many requests".to_string(),
            500..=599 => format!("Server error ({}): {}", status, body),
            _ => format!("HTTP error {}: {}", status, body),
        };
        FetchError::Transport {
            status: Some(status.as_u16()),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::transport("Request timeout - the API took too long to respond")
        } else if e.is_connect() {
            FetchError::transport("Connection error - unable to reach the API")
        } else if e.is_decode() {
            FetchError::Schema(e.to_string())
        } else {
            FetchError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: format!("Network error: {}", e),
            }
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// One attempt at producing `count` questions. `Ok(None)` means the
    /// source answered but carried no question list.
    async fn request(&self, count: usize) -> Result<Option<Batch>, FetchError>;
}

/// HTTP client shared by the concrete transports.
pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rock-trivia/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::transport(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests;
