//! Sampling Error Types

// Layer 1: Standard library imports
// (None required for current thiserror implementation)

// Layer 2: Third-party crate imports
use chrono::TimeDelta;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::error::McpError;
use crate::protocol::RequestId;

/// Failure modes of a server-initiated sampling call
#[derive(Debug, Clone, Error)]
pub enum SamplingError {
    /// The client's declared capabilities omit `sampling`
    #[error("client did not declare the sampling capability")]
    CapabilityNotSupported,

    /// No response arrived within the deadline
    #[error("sampling request {id} timed out after {}s", timeout.num_seconds())]
    Timeout {
        /// Outbound request id
        id: RequestId,
        /// The deadline that elapsed
        timeout: TimeDelta,
    },

    /// The caller's operation was cancelled while waiting
    #[error("sampling request {id} was cancelled")]
    Cancelled {
        /// Outbound request id
        id: RequestId,
    },

    /// The connection is closing or gone
    #[error("connection closed before sampling response")]
    ConnectionClosed,

    /// The client answered with a JSON-RPC error
    #[error("client rejected sampling request: {message} ({code})")]
    ClientError {
        /// Client-reported error code
        code: i64,
        /// Client-reported message
        message: String,
    },

    /// The correlation table is at capacity
    #[error("too many sampling requests in flight")]
    CapacityExceeded,
}

/// Convenient result type for sampling operations
pub type SamplingResult<T> = Result<T, SamplingError>;

impl From<SamplingError> for McpError {
    fn from(error: SamplingError) -> Self {
        match error {
            SamplingError::CapabilityNotSupported => {
                McpError::capability_not_supported("sampling")
            }
            SamplingError::Timeout { timeout, .. } => McpError::Timeout { timeout },
            SamplingError::Cancelled { .. } => McpError::Cancelled,
            SamplingError::ConnectionClosed => {
                McpError::invalid_request("connection closed during sampling")
            }
            SamplingError::ClientError { code, message } => {
                McpError::internal(format!("sampling client error {code}: {message}"))
            }
            SamplingError::CapacityExceeded => {
                McpError::internal("sampling correlation table at capacity")
            }
        }
    }
}
