//! Scripted transport shared by the unit tests.

use crate::question::{Batch, TriviaItem};
use crate::transport::{FetchError, Transport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub(crate) fn sample_item(n: usize) -> TriviaItem {
    TriviaItem::new(
        format!("q{n}"),
        format!("answer {n}"),
        ["wrong a", "wrong b", "wrong c"],
    )
}

pub(crate) fn sample_batch(range: std::ops::Range<usize>) -> Batch {
    range.map(sample_item).collect()
}

/// Hands out sequentially numbered questions (`q0`, `q1`, ...) unless a
/// failure is scripted. A gate, when set, holds every call until a permit
/// is added.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    calls: AtomicUsize,
    next_id: AtomicUsize,
    scripted_failures: Mutex<VecDeque<FetchError>>,
    always_fail: Option<FetchError>,
    gate: Option<Arc<Semaphore>>,
    len_override: Option<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_always(mut self, err: FetchError) -> Self {
        self.always_fail = Some(err);
        self
    }

    pub fn fail_first(self, errs: Vec<FetchError>) -> Self {
        *self.scripted_failures.lock().unwrap() = errs.into();
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_len(mut self, len: usize) -> Self {
        self.len_override = Some(len);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn request(&self, count: usize) -> Result<Option<Batch>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if let Some(err) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        if let Some(err) = &self.always_fail {
            return Err(err.clone());
        }

        let len = self.len_override.unwrap_or(count);
        let start = self.next_id.fetch_add(len, Ordering::SeqCst);
        Ok(Some(sample_batch(start..start + len)))
    }
}
