use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::transport::FetchError;
use crate::validate::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl From<ValidationError> for TriviaError {
    fn from(e: ValidationError) -> Self {
        TriviaError::Fetch(FetchError::Validation(e))
    }
}

pub type TriviaResult<T> = Result<T, TriviaError>;
