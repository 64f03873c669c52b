//! Configuration loading and validation.
//!
//! Provides the main [`Config`] struct aggregating every section. Configuration
//! is loaded from a TOML file; `EDGESTREAM_WS_URL` overrides the feed endpoint.
//!
//! # Example
//!
//! ```no_run
//! use edgestream::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

mod feed;
mod logging;
mod reconnection;
mod session;

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub use feed::{BookKind, FeedConfig};
pub use logging::LoggingConfig;
pub use reconnection::ReconnectionConfig;
pub use session::SessionConfig;

/// Environment variable that replaces `feed.ws_url`.
pub const WS_URL_ENV: &str = "EDGESTREAM_WS_URL";

/// Main configuration.
///
/// Every section is optional in the file and falls back to its defaults.
/// Load from a file with [`Config::load`] or parse with [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Connection timeouts, keepalive and message queueing.
    #[serde(default)]
    pub session: SessionConfig,

    /// WebSocket reconnection settings.
    ///
    /// Controls backoff delays and circuit breaker behavior.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    /// Reference feed endpoint and cache sizes.
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Config {
    /// Parse configuration from TOML content, apply environment overrides and
    /// validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(Arc::new(e)))?;

        if let Ok(url) = std::env::var(WS_URL_ENV) {
            if !url.is_empty() {
                config.feed.ws_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`Config::parse_toml`]
    /// fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile(Arc::new(e)))?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn validate(&self) -> Result<()> {
        if self.feed.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "ws_url" }.into());
        }
        let url = url::Url::parse(&self.feed.ws_url).map_err(|e| ConfigError::InvalidValue {
            field: "ws_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue {
                field: "ws_url",
                reason: format!("scheme must be ws or wss, got {}", url.scheme()),
            }
            .into());
        }

        if !(self.session.max_ping_pong_misses > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "max_ping_pong_misses",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.session.connection_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connection_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.session.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.reconnection.max_delay_ms < self.reconnection.initial_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_delay_ms",
                reason: "must be >= initial_delay_ms".to_string(),
            }
            .into());
        }
        if self.reconnection.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            }
            .into());
        }
        if self.reconnection.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_consecutive_failures",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse_toml("[feed]\nws_url = \"wss://example.test/ws\"\n").unwrap();
        assert_eq!(config.session.connection_timeout_ms, 10_000);
        assert_eq!(config.session.keep_alive_ms, 30_000);
        assert!(config.session.use_message_queue);
        assert_eq!(config.feed.trades_limit, 1000);
        assert_eq!(config.feed.book_kind, BookKind::Plain);
        assert_eq!(config.reconnection.max_consecutive_failures, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = Config::parse_toml("[feed]\nws_url = \"https://example.test\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "ws_url", .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_misses() {
        let toml = r#"
[feed]
ws_url = "ws://localhost:9000"

[session]
max_ping_pong_misses = 0.0
"#;
        let err = Config::parse_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "max_ping_pong_misses",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::parse_toml("[feed\nws_url = 1").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
