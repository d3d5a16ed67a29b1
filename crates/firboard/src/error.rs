//! Error types for firboard.
//!
//! Board-level conditions (malformed times, unknown flight ids, viewer
//! disconnects) are never errors: they degrade or self-heal inside the
//! reconciler. The variants here cover the outer surface only: configuration,
//! I/O, the wire protocol and the feed adapters.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for firboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Transport Errors ===
    /// Failed to bind the viewer listener.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A peer sent something we could not understand.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The board service task is gone.
    #[error("board service has stopped")]
    ServiceStopped,

    // === Feed Errors ===
    /// A feed source could not be read or parsed.
    #[error("feed {path} unreadable: {message}")]
    Feed {
        /// Path of the feed file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for firboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a feed error for the given path.
    #[must_use]
    pub fn feed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Feed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the board service is no longer running.
    #[must_use]
    pub fn is_service_stopped(&self) -> bool {
        matches!(self, Self::ServiceStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::ServiceStopped.to_string(),
            "board service has stopped"
        );
        assert_eq!(
            Error::protocol("bad line").to_string(),
            "protocol error: bad line"
        );
    }

    #[test]
    fn test_is_service_stopped() {
        assert!(Error::ServiceStopped.is_service_stopped());
        assert!(!Error::protocol("x").is_service_stopped());
    }

    #[test]
    fn test_feed_error_display() {
        let err = Error::feed("/data/inbound.json", "expected an array");
        let msg = err.to_string();
        assert!(msg.contains("/data/inbound.json"));
        assert!(msg.contains("expected an array"));
    }

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "127.0.0.1:3001".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:3001"));
        assert!(msg.contains("in use"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "clock_tick_secs must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("clock_tick_secs"));
    }
}
