//! Cancellation Manager and In-Flight Table
//!
//! Mirrors every in-flight request keyed by (connection id, request id).
//! Registration doubles as duplicate-id protection; `cancel` triggers the
//! request's cancellation token and the handler is expected to return
//! promptly with a Cancelled error. Double-cancel is a no-op, unknown ids
//! are silently ignored, and connection teardown cancels that connection's
//! whole set with reason "connection closed".

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::RequestId;

/// Key of the in-flight table: duplicate-id protection is per connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    /// Owning connection
    pub connection_id: String,
    /// Request id as received (compared verbatim)
    pub request_id: RequestId,
}

/// One tracked request
#[derive(Debug)]
pub struct InFlightRequest {
    /// Cancellation handle handed to the handler
    pub token: CancellationToken,
    /// Identity charged for the request, when known
    pub principal: Option<String>,
    /// When routing registered the request
    pub started_at: DateTime<Utc>,
}

/// Reason attached when a closing connection cancels its in-flight set
pub const CONNECTION_CLOSED_REASON: &str = "connection closed";

/// In-flight request registry and cancellation fan-in
#[derive(Debug, Default)]
pub struct CancellationManager {
    in_flight: DashMap<InFlightKey, InFlightRequest>,
}

impl CancellationManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request, returning its cancellation token
    ///
    /// # Errors
    ///
    /// Returns `McpError::InvalidRequest` when the same id is already in
    /// flight on the connection.
    pub fn register(
        &self,
        connection_id: &str,
        request_id: &RequestId,
        principal: Option<String>,
    ) -> McpResult<CancellationToken> {
        let key = InFlightKey {
            connection_id: connection_id.to_string(),
            request_id: request_id.clone(),
        };

        let token = CancellationToken::new();
        let entry = InFlightRequest {
            token: token.clone(),
            principal,
            started_at: Utc::now(),
        };

        match self.in_flight.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(McpError::invalid_request(
                format!("request id {request_id} is already in flight"),
            )),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(token)
            }
        }
    }

    /// Remove a request on completion, cancellation or timeout
    pub fn complete(&self, connection_id: &str, request_id: &RequestId) {
        self.in_flight.remove(&InFlightKey {
            connection_id: connection_id.to_string(),
            request_id: request_id.clone(),
        });
    }

    /// Cancel a request by verbatim id
    ///
    /// Returns whether a live request was cancelled. Unknown ids (already
    /// completed, never registered, or an id of the wrong type) are
    /// silently ignored; cancelling twice is a no-op because the first
    /// cancel leaves the token cancelled and completion removes the entry.
    pub fn cancel(&self, connection_id: &str, request_id: &RequestId) -> bool {
        let key = InFlightKey {
            connection_id: connection_id.to_string(),
            request_id: request_id.clone(),
        };
        match self.in_flight.get(&key) {
            Some(entry) => {
                debug!(connection = %connection_id, request = %request_id, "cancelling request");
                entry.value().token.cancel();
                true
            }
            None => {
                trace!(connection = %connection_id, request = %request_id, "cancel for unknown id ignored");
                false
            }
        }
    }

    /// Cancel every in-flight request of a connection
    ///
    /// Returns how many were cancelled.
    pub fn cancel_all_for_connection(&self, connection_id: &str) -> usize {
        let keys: Vec<InFlightKey> = self
            .in_flight
            .iter()
            .filter(|entry| entry.key().connection_id == connection_id)
            .map(|entry| entry.key().clone())
            .collect();

        let cancelled = keys.len();
        for key in keys {
            if let Some(entry) = self.in_flight.get(&key) {
                entry.value().token.cancel();
            }
        }
        if cancelled > 0 {
            debug!(
                connection = %connection_id,
                cancelled,
                reason = CONNECTION_CLOSED_REASON,
                "cancelled in-flight requests"
            );
        }
        cancelled
    }

    /// Number of requests currently in flight
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Whether a specific request is in flight
    pub fn is_in_flight(&self, connection_id: &str, request_id: &RequestId) -> bool {
        self.in_flight.contains_key(&InFlightKey {
            connection_id: connection_id.to_string(),
            request_id: request_id.clone(),
        })
    }
}
