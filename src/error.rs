use std::sync::Arc;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] Arc<std::io::Error>),

    #[error("failed to parse config: {0}")]
    Parse(#[source] Arc<toml::de::Error>),
}

/// Crate error.
///
/// `Clone` so that one transport failure can reject every request waiting
/// on the same connection.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection dropped, closed by the remote side or delivered garbage.
    #[error("network error: {0}")]
    Network(String),

    /// Connect watchdog or keepalive pong deadline expired.
    #[error("request timeout: {0}")]
    Timeout(String),

    #[error("{0} is not supported by this transport")]
    NotSupported(&'static str),

    #[error("connection closed by user")]
    ClosedByUser,

    #[error("not connected")]
    NotConnected,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("order book for {symbol} is out of sync: {reason}")]
    Desync { symbol: String, reason: String },

    #[error("exchange error: {0}")]
    Exchange(String),

    #[error("WebSocket error: {0}")]
    WebSocket(Arc<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// True for failures that end the connection they happened on.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::WebSocket(_) | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(Error::Network("reset".into()).is_transport());
        assert!(Error::Timeout("pong".into()).is_transport());
        assert!(!Error::ClosedByUser.is_transport());
        assert!(!Error::NotSupported("send").is_transport());
    }

    #[test]
    fn test_config_error_wraps_transparently() {
        let err: Error = ConfigError::MissingField { field: "ws_url" }.into();
        assert_eq!(err.to_string(), "missing required field: ws_url");
    }
}
