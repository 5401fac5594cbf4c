//! Session Error Types

// Layer 1: Standard library imports
// (None required for current thiserror implementation)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::error::McpError;

/// Session lifecycle failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The user does not exist or is deactivated
    #[error("user {0} is not active")]
    UserNotActive(String),

    /// No session matches the token
    #[error("session not found")]
    NotFound,

    /// The session is expired or revoked
    #[error("session is not valid: {reason}")]
    Invalid {
        /// Why validation failed
        reason: String,
    },

    /// The refresh window has passed or the session is revoked
    #[error("session cannot be refreshed: {reason}")]
    NotRefreshable {
        /// Why refresh failed
        reason: String,
    },

    /// The token failed integrity verification
    #[error("token integrity check failed")]
    BadToken,
}

/// Convenient result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for McpError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::UserNotActive(user) => {
                McpError::unauthorized(format!("user {user} is not active"))
            }
            SessionError::NotFound | SessionError::BadToken => McpError::AuthenticationRequired,
            SessionError::Invalid { reason } | SessionError::NotRefreshable { reason } => {
                McpError::unauthorized(reason)
            }
        }
    }
}
