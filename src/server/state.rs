use crate::cache::QuestionCache;
use crate::config::Config;
use crate::fetcher::BatchFetcher;
use crate::transport::{self, FetchError, GeminiTransport};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState {
    pub config: Config,
    /// Direct generator behind `POST /api/trivia`; `None` without an API key.
    pub generator: Option<BatchFetcher>,
    pub cache: QuestionCache,
}

impl AppState {
    pub fn new(config: Config, generator: Option<BatchFetcher>, cache: QuestionCache) -> Arc<Self> {
        Arc::new(Self {
            config,
            generator,
            cache,
        })
    }

    /// Builds the generator from the Gemini settings. The server-side cache
    /// draws from the generator when there is one, otherwise from the
    /// configured transport.
    pub fn from_config(config: Config) -> Result<Arc<Self>, FetchError> {
        let validator = config.transport.validator();

        let generator = match GeminiTransport::new(&config.gemini, config.transport.timeout()) {
            Ok(gemini) => Some(BatchFetcher::with_validator(Arc::new(gemini), validator)),
            Err(e) => {
                warn!(error = %e, "Question generation disabled");
                None
            }
        };

        let fetcher = match &generator {
            Some(generator) => generator.clone(),
            None => BatchFetcher::with_validator(transport::router::from_config(&config)?, validator),
        };
        info!(transport = fetcher.transport_name(), "Server cache ready");

        let cache = QuestionCache::new(fetcher, config.cache.clone());
        Ok(Self::new(config, generator, cache))
    }
}
