//! Unified application error types for GameRent.
//!
//! Each subsystem reports failures through its own small taxonomy
//! ([`AuthError`], [`StoreError`], [`ProtocolError`], [`TransportError`]) so
//! callers can tell failure modes apart. All of them map into [`AppError`]
//! for propagation through the `?` operator at the application boundary.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource does not exist.
    NotFound,
    /// A conditional edit or delete matched no document (or changed nothing).
    NoMatch,
    /// Authentication failed (bad credentials, invalid or revoked token).
    Authentication,
    /// Input validation failed.
    Validation,
    /// A uniqueness constraint rejected the write.
    Conflict,
    /// A real-time protocol rule was violated.
    Protocol,
    /// An internal server error occurred.
    Internal,
    /// The document store could not be reached or failed.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::NoMatch => write!(f, "NO_MATCH"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified application error used throughout GameRent.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

/// Why a bearer token was rejected.
///
/// Callers usually collapse every variant into "unauthorized"; the variants
/// stay distinct for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was supplied.
    #[error("token is missing")]
    Missing,
    /// The token could not be parsed.
    #[error("token is malformed")]
    Malformed,
    /// The token signature does not verify against the server secret.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,
    /// The token was revoked by an explicit logout.
    #[error("token has been revoked")]
    Revoked,
}

/// Failure of a document store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document matched the filter, or a replace changed nothing.
    #[error("no document matched in '{collection}'")]
    NotFound {
        /// Collection the operation ran against.
        collection: String,
    },
    /// A document matching the uniqueness filter already exists.
    #[error("document already exists in '{collection}'")]
    Conflict {
        /// Collection the operation ran against.
        collection: String,
    },
    /// The backing store is unreachable, timed out, or rejected the query.
    #[error("store transport failure: {0}")]
    Transport(String),
}

impl StoreError {
    /// Transport-style status classification for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 400,
            Self::Conflict { .. } => 409,
            Self::Transport(_) => 500,
        }
    }

    /// Shorthand for a not-found error in `collection`.
    pub fn not_found(collection: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
        }
    }

    /// Shorthand for a conflict error in `collection`.
    pub fn conflict(collection: &str) -> Self {
        Self::Conflict {
            collection: collection.to_string(),
        }
    }
}

/// Violation of the real-time message protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame was not a decodable message envelope.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    /// The first message on a connection was not an authorization message.
    #[error("expected an authorization message, got '{0}'")]
    UnexpectedFirstMessage(String),
    /// No message arrived before the handshake deadline.
    #[error("handshake timed out")]
    HandshakeTimeout,
}

/// Failure of a real-time transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer is gone or the connection was retired.
    #[error("connection is closed")]
    Disconnected,
    /// The outbound write could not be accepted.
    #[error("write to connection failed")]
    WriteFailed,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::with_source(ErrorKind::Authentication, "Invalid token", err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::NotFound { .. } => ErrorKind::NoMatch,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Transport(_) => ErrorKind::Database,
        };
        Self::with_source(kind, err.to_string(), err)
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        Self::with_source(ErrorKind::Protocol, err.to_string(), err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
