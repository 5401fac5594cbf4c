//! Per-Request Context

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::connection::Connection;
use crate::protocol::RequestId;

/// State scoped to one in-flight request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The connection the request arrived on
    pub connection: Arc<Connection>,

    /// The request id, echoed byte-exact in the response
    pub request_id: RequestId,

    /// Progress token from `params._meta.progressToken`, if supplied
    pub progress_token: Option<String>,

    /// Cancellation handle from the in-flight table
    pub cancellation: CancellationToken,
}
