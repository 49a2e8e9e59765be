//! Proxied channel: the server-side `/api/trivia` endpoint keeps the
//! generator credentials away from the client.

use super::{http_client, FetchError, Transport};
use crate::question::{Batch, TriviaRequest, TriviaResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct ProxyTransport {
    client: Client,
    endpoint: String,
}

impl ProxyTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ProxyTransport {
    fn name(&self) -> &'static str {
        "proxy"
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn request(&self, count: usize) -> Result<Option<Batch>, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TriviaRequest { count: Some(count) })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The endpoint reports failures as `{error, details?}`; fall back
            // to the raw body when it does not.
            let message = serde_json::from_str::<TriviaResponse>(&body)
                .ok()
                .and_then(|r| r.failure_message().map(str::to_string))
                .unwrap_or(body);
            return Err(FetchError::from_status(status, &message));
        }

        let parsed: TriviaResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Schema(format!("Failed to parse proxy response: {}", e)))?;

        if let Some(message) = parsed.failure_message() {
            return Err(FetchError::Transport {
                status: Some(status.as_u16()),
                message: message.to_string(),
            });
        }

        debug!(
            returned = parsed.questions.as_ref().map(Vec::len),
            "Proxy answered"
        );
        Ok(parsed.questions)
    }
}
