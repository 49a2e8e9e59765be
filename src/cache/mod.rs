//! In-memory prefetch buffer for trivia questions.
//! Serves questions in FIFO order, refills in fixed-size batches and keeps
//! at most one refill in flight.

pub mod manager;
pub mod refill;

pub use manager::{CacheError, CacheStats, QuestionCache};
pub use refill::{RefillHandle, RefillOutcome};
