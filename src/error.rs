//! Error types shared by every core operation.
//!
//! Callers distinguish failures by [`ErrorKind`] rather than by message text.

use std::fmt;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed failure returned by the walker, store, service and exporters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown project, node or endpoint id.
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O or traversal failure. The originating cause is kept as `source`.
    #[error("system error: {message}")]
    System {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    System,
}

impl ErrorKind {
    /// Convert to the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::System => "system",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// System error without an underlying cause.
    pub fn system(message: impl Into<String>) -> Self {
        Error::System {
            message: message.into(),
            source: None,
        }
    }

    /// System error wrapping the cause that produced it.
    pub fn system_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::System {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::System { .. } => ErrorKind::System,
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::System => 500,
        }
    }

    /// Diagnostic detail of the underlying cause, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            Error::System {
                source: Some(cause),
                ..
            } => Some(cause.to_string()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::system_with("i/o failure", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kinds_map_to_status_codes() {
        assert_eq!(Error::validation("bad").status_code(), 400);
        assert_eq!(Error::not_found("gone").status_code(), 404);
        assert_eq!(Error::system("boom").status_code(), 500);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
    }

    #[test]
    fn test_system_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::system_with("walk failed", io);
        assert_eq!(err.kind(), ErrorKind::System);
        assert!(err.source().is_some());
        assert_eq!(err.detail().as_deref(), Some("denied"));
        assert_eq!(err.to_string(), "system error: walk failed");
    }
}
