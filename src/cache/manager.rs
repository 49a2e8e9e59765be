//! High-level cache logic: take, refill, low-water check.

use super::refill::{spawn_detached, RefillHandle, RefillOutcome};
use crate::config::CacheConfig;
use crate::fetcher::BatchFetcher;
use crate::question::{Batch, TriviaItem};
use crate::transport::FetchError;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error(
        "Only {available} of {requested} questions available after {attempts} failed refills: {last_error}"
    )]
    InsufficientQuestions {
        requested: usize,
        available: usize,
        attempts: u32,
        last_error: FetchError,
    },
}

/// Counters exposed for health endpoints and logs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub buffered: usize,
    pub refilling: bool,
    pub refills_started: u64,
    pub refills_succeeded: u64,
    pub refills_failed: u64,
    pub questions_served: u64,
    pub last_refill_at: Option<DateTime<Utc>>,
}

/// Public handle to the cache. Clones share one buffer.
#[derive(Clone)]
pub struct QuestionCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    fetcher: BatchFetcher,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    buffer: VecDeque<TriviaItem>,
    in_flight: Option<RefillHandle>,
    stats: CacheStats,
}

impl QuestionCache {
    pub fn new(fetcher: BatchFetcher, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                config,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Starts the first refill so the buffer is warm before anyone asks.
    /// A failure is only logged.
    pub fn init(&self) {
        info!(
            transport = self.inner.fetcher.transport_name(),
            batch_size = self.inner.config.batch_size,
            "Warming question cache"
        );
        let _ = self.refill();
    }

    /// Takes `count` questions in FIFO order, refilling as needed.
    ///
    /// Fails with [`CacheError::InsufficientQuestions`] once
    /// `max_refill_failures` refills in a row have failed; never returns a
    /// short batch.
    #[instrument(skip(self))]
    pub async fn get_questions(&self, count: usize) -> Result<Batch, CacheError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut failures = 0u32;
        loop {
            let pending = {
                let mut state = self.inner.lock_state();
                if state.buffer.len() >= count {
                    let batch: Batch = state.buffer.drain(..count).collect();
                    state.stats.questions_served += count as u64;

                    if state.buffer.len() < self.inner.config.low_water_mark
                        && state.in_flight.is_none()
                    {
                        debug!(
                            buffered = state.buffer.len(),
                            "Buffer below low-water mark, refilling in background"
                        );
                        let _ = self.start_refill(&mut state);
                    }
                    return Ok(batch);
                }

                debug!(
                    buffered = state.buffer.len(),
                    requested = count,
                    "Not enough questions buffered, waiting for refill"
                );
                self.start_refill(&mut state)
            };

            match pending.await {
                Ok(_) => failures = 0,
                Err(last_error) => {
                    failures += 1;
                    if failures >= self.inner.config.max_refill_failures {
                        let available = self.len();
                        warn!(
                            requested = count,
                            available,
                            attempts = failures,
                            "Giving up on refills"
                        );
                        return Err(CacheError::InsufficientQuestions {
                            requested: count,
                            available,
                            attempts: failures,
                            last_error,
                        });
                    }

                    let backoff = self.inner.config.retry_backoff() * failures;
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }

    /// Joins the in-flight refill or starts a new one.
    pub fn refill(&self) -> RefillHandle {
        let mut state = self.inner.lock_state();
        self.start_refill(&mut state)
    }

    /// The refill currently running, if any.
    pub fn in_flight(&self) -> Option<RefillHandle> {
        self.inner.lock_state().in_flight.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock_state().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_refilling(&self) -> bool {
        self.inner.lock_state().in_flight.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock_state();
        CacheStats {
            buffered: state.buffer.len(),
            refilling: state.in_flight.is_some(),
            ..state.stats.clone()
        }
    }

    fn start_refill(&self, state: &mut CacheState) -> RefillHandle {
        if let Some(handle) = &state.in_flight {
            debug!("Refill already in flight");
            return handle.clone();
        }

        let handle = Arc::clone(&self.inner)
            .run_refill(Uuid::new_v4())
            .boxed()
            .shared();
        state.in_flight = Some(handle.clone());
        state.stats.refills_started += 1;
        spawn_detached(handle.clone());
        handle
    }

    #[cfg(test)]
    pub(super) fn seed(&self, items: Batch) {
        self.inner.lock_state().buffer.extend(items);
    }
}

impl CacheInner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_refill(self: Arc<Self>, refill_id: Uuid) -> RefillOutcome {
        let result = self
            .fetcher
            .fetch_batch(self.config.batch_size)
            .instrument(info_span!("refill", %refill_id))
            .await;

        let mut state = self.lock_state();
        state.in_flight = None;
        match result {
            Ok(batch) => {
                let added = batch.len();
                state.buffer.extend(batch);
                state.stats.refills_succeeded += 1;
                state.stats.last_refill_at = Some(Utc::now());
                info!(%refill_id, added, buffered = state.buffer.len(), "Refill complete");
                Ok(added)
            }
            Err(e) => {
                state.stats.refills_failed += 1;
                warn!(
                    %refill_id,
                    error = %e,
                    buffered = state.buffer.len(),
                    "Failed to preload questions"
                );
                Err(e)
            }
        }
    }
}
