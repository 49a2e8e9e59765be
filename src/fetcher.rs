//! Transport-agnostic batch fetch: one attempt, always validated.

use crate::question::{Batch, TriviaItem, MAX_BATCH, MIN_BATCH};
use crate::transport::{FetchError, Transport};
use crate::validate::{BatchValidator, ValidationError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct BatchFetcher {
    transport: Arc<dyn Transport>,
    validator: BatchValidator,
}

impl BatchFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_validator(transport, BatchValidator::default())
    }

    pub fn with_validator(transport: Arc<dyn Transport>, validator: BatchValidator) -> Self {
        Self {
            transport,
            validator,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Fetches exactly `count` validated questions. No retry happens here.
    #[instrument(skip(self), fields(transport = self.transport.name()))]
    pub async fn fetch_batch(&self, count: usize) -> Result<Batch, FetchError> {
        if !(MIN_BATCH..=MAX_BATCH).contains(&count) {
            return Err(FetchError::InvalidCount(count));
        }

        let start = Instant::now();
        let raw = self.transport.request(count).await.map_err(|e| {
            warn!(error = %e, "Fetch failed");
            e
        })?;

        let batch = self.validator.validate(count, raw).map_err(|e| {
            warn!(error = %e, "Fetched batch rejected");
            FetchError::from(e)
        })?;

        debug!(
            count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch fetched"
        );
        Ok(batch)
    }

    /// Single question, fetched as a batch of one.
    pub async fn fetch_one(&self) -> Result<TriviaItem, FetchError> {
        let mut batch = self.fetch_batch(1).await?;
        batch.pop().ok_or(FetchError::Validation(ValidationError::LengthMismatch {
            expected: 1,
            actual: 0,
        }))
    }
}
