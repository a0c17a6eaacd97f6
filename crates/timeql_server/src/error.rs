//! Server errors.

use std::fmt;
use thiserror::Error;
use timeql_runtime::BindError;

/// Typed error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The schema failed to bind.
    SchemaError,
    /// The listener could not be opened.
    BindFailed,
    /// Accepting or serving a connection failed.
    ConnectionError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaError => "SCHEMA_ERROR",
            Self::BindFailed => "BIND_FAILED",
            Self::ConnectionError => "CONNECTION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal server error.
#[derive(Error, Debug)]
#[error("[{code}] {message}")]
pub struct ServerError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ServerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The listener could not be bound to `address`.
    pub fn bind(address: &str, source: std::io::Error) -> Self {
        Self::new(
            ErrorCode::BindFailed,
            format!("failed to bind {address}: {source}"),
        )
        .with_source(source)
    }

    pub fn connection(source: std::io::Error) -> Self {
        Self::new(ErrorCode::ConnectionError, source.to_string()).with_source(source)
    }
}

impl From<BindError> for ServerError {
    fn from(error: BindError) -> Self {
        Self::new(ErrorCode::SchemaError, error.to_string()).with_source(error)
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = ServerError::bind(
            "0.0.0.0:8080",
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(error.code, ErrorCode::BindFailed);
        assert_eq!(
            error.to_string(),
            "[BIND_FAILED] failed to bind 0.0.0.0:8080: address in use"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
