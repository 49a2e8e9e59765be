//! Runtime configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional TOML file, a `.env` file and the process environment.
//!
//! | Variable           | Field                    |
//! |--------------------|--------------------------|
//! | `TRIVIA_CONFIG`    | path of the TOML file    |
//! | `TRIVIA_ENV`       | `environment`            |
//! | `TRIVIA_TRANSPORT` | `transport.strategy`     |
//! | `TRIVIA_PROXY_URL` | `transport.proxy_url`    |
//! | `GEMINI_API_KEY`   | `gemini.api_key`         |
//! | `GEMINI_MODEL`     | `gemini.model`           |
//! | `GEMINI_API_URL`   | `gemini.api_url`         |
//! | `PORT`             | `server.port`            |

use crate::question::{MAX_BATCH, MIN_BATCH};
use crate::validate::BatchValidator;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::Invalid(format!("unknown environment: {}", other))),
        }
    }
}

/// Which channel reaches the question generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Proxied, plus a direct fallback outside production when a key is set.
    #[default]
    Auto,
    Proxied,
    Direct,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StrategyKind::Auto),
            "proxied" | "proxy" => Ok(StrategyKind::Proxied),
            "direct" => Ok(StrategyKind::Direct),
            other => Err(ConfigError::Invalid(format!("unknown transport: {}", other))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    pub cache: CacheConfig,
    pub transport: TransportConfig,
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Questions requested per refill.
    pub batch_size: usize,
    /// A background refill starts once the buffer drops below this.
    pub low_water_mark: usize,
    /// Consecutive refill failures tolerated by one `get_questions` call.
    pub max_refill_failures: u32,
    pub retry_backoff_ms: u64,
    pub warm_on_start: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TransportConfig {
    pub strategy: StrategyKind,
    pub proxy_url: String,
    pub timeout_seconds: u64,
    pub require_distinct_answers: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            low_water_mark: 5,
            max_refill_failures: 3,
            retry_backoff_ms: 250,
            warm_on_start: true,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Auto,
            proxy_url: "http://127.0.0.1:8788/api/trivia".to_string(),
            timeout_seconds: 30,
            require_distinct_answers: true,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            temperature: 1.0,
            api_key: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8788,
        }
    }
}

impl CacheConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn validator(&self) -> BatchValidator {
        BatchValidator {
            require_distinct_answers: self.require_distinct_answers,
            ..BatchValidator::default()
        }
    }
}

impl GeminiConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Loads defaults, then `path` (or `TRIVIA_CONFIG`), then `.env` and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenv::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("TRIVIA_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), "Reading config file");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies overrides from `lookup`, normally the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("TRIVIA_ENV") {
            self.environment = env.parse()?;
        }
        if let Some(strategy) = lookup("TRIVIA_TRANSPORT") {
            self.transport.strategy = strategy.parse()?;
        }
        if let Some(url) = lookup("TRIVIA_PROXY_URL") {
            self.transport.proxy_url = url;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = lookup("GEMINI_API_URL") {
            self.gemini.api_url = url;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let batch = self.cache.batch_size;
        if !(MIN_BATCH..=MAX_BATCH).contains(&batch) {
            return Err(ConfigError::Invalid(format!(
                "cache.batch_size must be between {} and {}, got {}",
                MIN_BATCH, MAX_BATCH, batch
            )));
        }
        if self.cache.max_refill_failures == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_refill_failures must be at least 1".to_string(),
            ));
        }
        if self.transport.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "transport.timeout_seconds must be at least 1".to_string(),
            ));
        }
        check_url("transport.proxy_url", &self.transport.proxy_url)?;
        check_url("gemini.api_url", &self.gemini.api_url)?;

        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            warn!(
                temperature = self.gemini.temperature,
                "Temperature outside the usual 0.0-2.0 range"
            );
        }
        Ok(())
    }

    /// Reports the variables a component needs but the environment lacks.
    pub fn validate_environment(&self, needs_direct: bool) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if needs_direct && !self.gemini.has_api_key() {
            missing.push("GEMINI_API_KEY");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVariables(missing))
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{}={}: {}", key, value, e)))
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL ({}): {}", field, e, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.batch_size, 5);
        assert_eq!(config.cache.low_water_mark, 5);
        assert_eq!(config.transport.strategy, StrategyKind::Auto);
        assert!(!config.is_production());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            environment = "production"

            [cache]
            batch_size = 8

            [gemini]
            model = "gemini-2.5-flash"
            "#,
        )
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.cache.batch_size, 8);
        assert_eq!(config.cache.low_water_mark, 5);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.server.port, 8788);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\n\n[transport]\nstrategy = \"direct\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.transport.strategy, StrategyKind::Direct);

        let missing = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("TRIVIA_ENV", "prod"),
                ("TRIVIA_TRANSPORT", "proxy"),
                ("GEMINI_API_KEY", "secret"),
                ("PORT", "3000"),
            ]))
            .unwrap();

        assert!(config.is_production());
        assert_eq!(config.transport.strategy, StrategyKind::Proxied);
        assert!(config.gemini.has_api_key());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let mut config = Config::default();
        config.apply_env(env(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(!config.gemini.has_api_key());
        assert!(matches!(
            config.validate_environment(true),
            Err(ConfigError::MissingVariables(ref vars)) if vars == &vec!["GEMINI_API_KEY"]
        ));
        assert!(config.validate_environment(false).is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
        assert!(config.apply_env(env(&[("TRIVIA_TRANSPORT", "carrier-pigeon")])).is_err());

        config.cache.batch_size = 11;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.transport.proxy_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.gemini.api_key = Some("secret".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
