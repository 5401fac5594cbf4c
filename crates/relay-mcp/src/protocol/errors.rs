//! Frame-Level Protocol Errors
//!
//! Errors raised while decoding raw frames into JSON-RPC messages, before
//! any method dispatch takes place. Anything that survives decoding is
//! handled by the routing layer's error taxonomy instead.

// Layer 1: Standard library imports
// (None required for current thiserror implementation)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use super::message::RequestId;

/// Decode failure for a single inbound frame
///
/// Distinguishes frames that are not JSON at all (`Parse`) from frames that
/// are JSON but not a valid JSON-RPC 2.0 message (`InvalidRequest`). When the
/// offending frame carried an extractable id it is preserved so the error
/// response can echo it; parse failures never have one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The frame is not valid JSON
    #[error("parse error: {message}")]
    Parse {
        /// Description of the JSON syntax failure
        message: String,
    },

    /// The frame is JSON but violates JSON-RPC 2.0 structure
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the structural violation
        message: String,
        /// Request id when one could be extracted from the frame
        id: Option<RequestId>,
    },
}

impl FrameError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid-request error without an id
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            id: None,
        }
    }

    /// Create an invalid-request error that echoes the frame's id
    pub fn invalid_with_id(message: impl Into<String>, id: Option<RequestId>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            id,
        }
    }

    /// The id to echo in the error response, if any
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Parse { .. } => None,
            Self::InvalidRequest { id, .. } => id.as_ref(),
        }
    }
}

/// Validation failure for protocol domain newtypes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// Invalid protocol version string
    #[error("invalid protocol version: {0}")]
    InvalidProtocolVersion(String),

    /// Invalid URI format
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid MIME type format
    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// Invalid log level name
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Convenient result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
