//! Error types for the library client core.
//!
//! # Design
//! Remote failures are split the way callers react to them: `Unauthorized`
//! forces a logout, `NotFound` usually means a stale list, and the remaining
//! 4xx/5xx statuses carry the server's own message for display. Local
//! rejections (form validation, login throttling, loan gates) share the same
//! enum so every facade operation returns a single error type, but they never
//! involve a network round-trip.

use thiserror::Error;

use crate::auth::throttle::LoginBlock;
use crate::validation::FieldErrors;

/// Coarse classification used for logging and for choosing how to surface
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Network,
    /// The server answered with a 4xx status.
    Client,
    /// The server answered with a 5xx status, or with a body we cannot read.
    Server,
    /// Rejected locally before any request was sent.
    Local,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach the server: {0}")]
    Network(String),

    #[error("session expired: {0}")]
    Unauthorized(String),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other 4xx, typically a server-side validation failure.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A status outside 2xx/4xx/5xx, e.g. an unfollowed redirect.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    LoginBlocked(LoginBlock),

    #[error("this book has no copies available for loan")]
    BookUnavailable,

    #[error("this loan can no longer be renewed")]
    NotRenewable,

    #[error("this loan has already been returned")]
    NotReturnable,

    #[error("an authentication check is already in progress")]
    AuthCheckInProgress,

    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unauthorized(_)
            | ApiError::Forbidden(_)
            | ApiError::NotFound(_)
            | ApiError::Rejected { .. } => ErrorKind::Client,
            ApiError::Server { .. }
            | ApiError::UnexpectedStatus { .. }
            | ApiError::Deserialization(_) => ErrorKind::Server,
            ApiError::Serialization(_)
            | ApiError::Validation(_)
            | ApiError::LoginBlocked(_)
            | ApiError::BookUnavailable
            | ApiError::NotRenewable
            | ApiError::NotReturnable
            | ApiError::AuthCheckInProgress
            | ApiError::NotAuthenticated => ErrorKind::Local,
        }
    }

    /// The HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Rejected { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
