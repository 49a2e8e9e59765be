//! Decides once, at startup, which channel reaches the generator.

use super::{FallbackTransport, FetchError, GeminiTransport, ProxyTransport, Transport};
use crate::config::{Config, StrategyKind};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStrategy {
    Proxied,
    Direct,
    ProxiedWithDirectFallback,
}

impl TransportStrategy {
    pub fn select(config: &Config) -> Self {
        match config.transport.strategy {
            StrategyKind::Proxied => TransportStrategy::Proxied,
            StrategyKind::Direct => TransportStrategy::Direct,
            StrategyKind::Auto => {
                if !config.is_production() && config.gemini.has_api_key() {
                    TransportStrategy::ProxiedWithDirectFallback
                } else {
                    TransportStrategy::Proxied
                }
            }
        }
    }

    /// Whether this strategy calls the generator directly and so needs a key.
    pub fn needs_direct(self) -> bool {
        matches!(
            self,
            TransportStrategy::Direct | TransportStrategy::ProxiedWithDirectFallback
        )
    }

    pub fn build(self, config: &Config) -> Result<Arc<dyn Transport>, FetchError> {
        let timeout = config.transport.timeout();
        let transport: Arc<dyn Transport> = match self {
            TransportStrategy::Proxied => {
                Arc::new(ProxyTransport::new(&config.transport.proxy_url, timeout)?)
            }
            TransportStrategy::Direct => Arc::new(GeminiTransport::new(&config.gemini, timeout)?),
            TransportStrategy::ProxiedWithDirectFallback => Arc::new(FallbackTransport::new(
                Arc::new(ProxyTransport::new(&config.transport.proxy_url, timeout)?),
                Arc::new(GeminiTransport::new(&config.gemini, timeout)?),
            )),
        };

        info!(strategy = ?self, transport = transport.name(), "Transport selected");
        Ok(transport)
    }
}

/// Selects and builds the transport described by `config`.
pub fn from_config(config: &Config) -> Result<Arc<dyn Transport>, FetchError> {
    TransportStrategy::select(config).build(config)
}
