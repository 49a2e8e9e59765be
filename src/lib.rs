//! # Rock Trivia
//!
//! Question supply for a Rush trivia game. Questions come from an LLM
//! generator, either through the `/api/trivia` endpoint or directly, and
//! are kept in a prefetch buffer so a game can start without waiting on
//! the model.
//!
//! ## Architecture
//!
//! ```text
//! caller → QuestionCache → BatchFetcher → Transport (proxy | gemini | fallback) → validate
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod game;
pub mod question;
pub mod server;
pub mod telemetry;
pub mod transport;
pub mod validate;

#[cfg(test)]
mod testing;

// Re-export commonly used types for easier access
pub use cache::{CacheError, CacheStats, QuestionCache};
pub use config::{Config, ConfigError};
pub use error::{TriviaError, TriviaResult};
pub use fetcher::BatchFetcher;
pub use game::{GameSession, GameState, TOTAL_QUESTIONS};
pub use question::{Batch, TriviaItem};
pub use transport::{FetchError, Transport, TransportStrategy};
pub use validate::{validate_batch, BatchValidator, ValidationError};

/// Builds the cache described by `config`: strategy chosen once, then injected.
/// A strategy that needs the generator key fails with
/// [`ConfigError::MissingVariables`] when it is absent.
pub fn build_cache(config: &Config) -> TriviaResult<QuestionCache> {
    let strategy = TransportStrategy::select(config);
    config.validate_environment(strategy.needs_direct())?;

    let transport = strategy.build(config)?;
    let fetcher = BatchFetcher::with_validator(transport, config.transport.validator());
    Ok(QuestionCache::new(fetcher, config.cache.clone()))
}
