//! Primary/secondary pairing used when the proxied channel may be absent
//! (local development with a direct key).

use super::{FetchError, Transport};
use crate::question::Batch;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub struct FallbackTransport {
    primary: Arc<dyn Transport>,
    fallback: Arc<dyn Transport>,
}

impl FallbackTransport {
    pub fn new(primary: Arc<dyn Transport>, fallback: Arc<dyn Transport>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Transport for FallbackTransport {
    fn name(&self) -> &'static str {
        "fallback"
    }

    /// Tries the primary channel, then the fallback. When both fail the
    /// primary's error is the one reported.
    async fn request(&self, count: usize) -> Result<Option<Batch>, FetchError> {
        let primary_err = match self.primary.request(count).await {
            Ok(batch) => return Ok(batch),
            Err(e) => e,
        };

        warn!(
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            error = %primary_err,
            "Primary transport failed, falling back"
        );

        match self.fallback.request(count).await {
            Ok(batch) => {
                info!(transport = self.fallback.name(), "Fallback transport answered");
                Ok(batch)
            }
            Err(fallback_err) => {
                warn!(error = %fallback_err, "Fallback transport failed too");
                Err(primary_err)
            }
        }
    }
}
