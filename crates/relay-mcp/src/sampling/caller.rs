//! Sampling Caller
//!
//! Server-initiated `sampling/createMessage` requests. The caller checks
//! the connection's declared client capabilities, allocates a fresh
//! outbound id, sends the request on the target connection and awaits the
//! matching response for up to five minutes. Cancellation of the calling
//! operation releases the waiter and drops the id.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::TimeDelta;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Layer 3: Internal module imports
use super::correlation::CorrelationTable;
use super::error::{SamplingError, SamplingResult};
use crate::connection::Connection;
use crate::protocol::constants::{defaults, methods, notifications};
use crate::protocol::{
    CancelledParams, CreateMessageParams, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};

/// Sampling caller configuration
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// How long to await the client's response
    pub timeout: TimeDelta,
    /// Cap on concurrent waiters (0 = unlimited)
    pub max_pending: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            timeout: TimeDelta::seconds(defaults::SAMPLING_TIMEOUT_SECS),
            max_pending: 256,
        }
    }
}

/// Issues server -> client requests and awaits their responses
#[derive(Debug)]
pub struct SamplingCaller {
    table: Arc<CorrelationTable>,
    config: SamplingConfig,
}

impl SamplingCaller {
    /// Create a caller
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            table: Arc::new(CorrelationTable::new(config.max_pending)),
            config,
        }
    }

    /// The correlation table, shared with the router's response dispatcher
    pub fn table(&self) -> Arc<CorrelationTable> {
        Arc::clone(&self.table)
    }

    /// Ask the connection's client to sample a message
    ///
    /// Fails with `CapabilityNotSupported` without sending anything when
    /// the client's declared capabilities omit `sampling`. The `cancel`
    /// token propagates the calling operation's cancellation: when it
    /// fires, the waiter is released with `Cancelled` and the id dropped,
    /// so a late response is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError`] on capability mismatch, timeout,
    /// cancellation, connection loss or a client-side error response.
    pub async fn create_message(
        &self,
        connection: &Arc<Connection>,
        params: CreateMessageParams,
        cancel: &CancellationToken,
    ) -> SamplingResult<Value> {
        let supports = connection
            .client_capabilities()
            .map(|caps| caps.supports_sampling())
            .unwrap_or(false);
        if !supports {
            return Err(SamplingError::CapabilityNotSupported);
        }

        let params =
            serde_json::to_value(&params).map_err(|_| SamplingError::ConnectionClosed)?;
        let (id, receiver) = self.table.register(self.config.timeout)?;
        debug!(connection = %connection.id(), request = %id, "sending sampling request");

        let request = JsonRpcRequest::new(
            methods::SAMPLING_CREATE_MESSAGE,
            Some(params),
            id.clone(),
        );
        if connection
            .send(JsonRpcMessage::Request(request))
            .await
            .is_err()
        {
            self.table.cancel(&id);
            return Err(SamplingError::ConnectionClosed);
        }

        let timeout = self.config.timeout.to_std().unwrap_or_default();
        tokio::select! {
            outcome = receiver => match outcome {
                Ok(result) => result,
                Err(_) => Err(SamplingError::ConnectionClosed),
            },
            _ = cancel.cancelled() => {
                self.table.cancel(&id);
                Self::notify_cancelled(connection, &id, "caller cancelled").await;
                Err(SamplingError::Cancelled { id })
            }
            _ = tokio::time::sleep(timeout) => {
                self.table.cancel(&id);
                Self::notify_cancelled(connection, &id, "timeout").await;
                Err(SamplingError::Timeout { id, timeout: self.config.timeout })
            }
        }
    }

    /// Tell the client to stop work on an abandoned outbound request
    async fn notify_cancelled(connection: &Arc<Connection>, id: &RequestId, reason: &str) {
        let params = CancelledParams {
            request_id: match id {
                RequestId::String(s) => Value::String(s.clone()),
                RequestId::Number(n) => Value::from(*n),
            },
            reason: Some(reason.to_string()),
        };
        if let Ok(params) = serde_json::to_value(&params) {
            let _ = connection
                .send(JsonRpcMessage::Notification(JsonRpcNotification::new(
                    notifications::CANCELLED,
                    Some(params),
                )))
                .await;
        }
    }

    /// Feed an inbound response frame to the correlation table
    ///
    /// Called by the router for every `Response` frame a connection
    /// produces. Unknown ids are ignored.
    pub fn accept_response(&self, response: JsonRpcResponse) -> bool {
        self.table.correlate(response)
    }

    /// Release every waiter (server shutdown)
    pub fn drain(&self) {
        self.table.drain();
    }

    /// Number of outstanding sampling calls
    pub fn pending_count(&self) -> usize {
        self.table.pending_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, ConnectionManager};
    use crate::protocol::{
        ClientCapabilities, ClientInfo, Content, ProtocolVersion, SamplingCapability,
        SamplingMessage,
    };
    use serde_json::json;

    fn sampling_params() -> CreateMessageParams {
        CreateMessageParams {
            messages: vec![SamplingMessage {
                role: "user".to_string(),
                content: Content::text("hello"),
            }],
            max_tokens: 64,
            system_prompt: None,
            temperature: None,
        }
    }

    fn connection_with_sampling(
        supports: bool,
    ) -> (
        Arc<Connection>,
        tokio::sync::mpsc::Receiver<JsonRpcMessage>,
    ) {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        let (conn, rx) = manager.open().unwrap();
        let capabilities = ClientCapabilities {
            sampling: supports.then(SamplingCapability::default),
            ..Default::default()
        };
        conn.record_initialization(
            ClientInfo {
                name: "test".to_string(),
                version: "1".to_string(),
            },
            capabilities,
            ProtocolVersion::new(1, 0, 0),
        );
        (conn, rx)
    }

    #[tokio::test]
    async fn round_trip_success() {
        let caller = SamplingCaller::new(SamplingConfig::default());
        let (conn, mut rx) = connection_with_sampling(true);

        let conn_for_call = Arc::clone(&conn);
        let caller = Arc::new(caller);
        let caller_for_task = Arc::clone(&caller);
        let cancel = CancellationToken::new();

        let call = tokio::spawn(async move {
            caller_for_task
                .create_message(&conn_for_call, sampling_params(), &cancel)
                .await
        });

        // Act as the client: read the outbound request, answer it.
        let request = match rx.recv().await.unwrap() {
            JsonRpcMessage::Request(req) => req,
            other => panic!("expected request, got {other:?}"),
        };
        assert_eq!(request.method, "sampling/createMessage");
        caller.accept_response(JsonRpcResponse::success(
            json!({"role": "assistant", "content": {"type": "text", "text": "hi"}}),
            request.id,
        ));

        let result = call.await.unwrap().unwrap();
        assert_eq!(result["role"], "assistant");
        assert_eq!(caller.pending_count(), 0);
    }

    #[tokio::test]
    async fn missing_capability_fails_without_sending() {
        let caller = SamplingCaller::new(SamplingConfig::default());
        let (conn, mut rx) = connection_with_sampling(false);

        let cancel = CancellationToken::new();
        let err = caller
            .create_message(&conn, sampling_params(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SamplingError::CapabilityNotSupported));
        assert!(rx.try_recv().is_err());
        assert_eq!(caller.pending_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_releases_waiter() {
        let caller = Arc::new(SamplingCaller::new(SamplingConfig::default()));
        let (conn, mut rx) = connection_with_sampling(true);

        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let conn_for_call = Arc::clone(&conn);
        let caller_for_task = Arc::clone(&caller);

        let call = tokio::spawn(async move {
            caller_for_task
                .create_message(&conn_for_call, sampling_params(), &cancel_for_task)
                .await
        });

        // Wait until the request is on the wire, then cancel the caller.
        let request = match rx.recv().await.unwrap() {
            JsonRpcMessage::Request(req) => req,
            other => panic!("expected request, got {other:?}"),
        };
        cancel.cancel();

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, SamplingError::Cancelled { .. }));
        assert_eq!(caller.pending_count(), 0);

        // A late response for the dropped id is ignored.
        assert!(!caller.accept_response(JsonRpcResponse::success(json!({}), request.id)));
    }

    #[tokio::test]
    async fn timeout_releases_waiter() {
        let caller = SamplingCaller::new(SamplingConfig {
            timeout: TimeDelta::milliseconds(20),
            max_pending: 16,
        });
        let (conn, _rx) = connection_with_sampling(true);

        let cancel = CancellationToken::new();
        let err = caller
            .create_message(&conn, sampling_params(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SamplingError::Timeout { .. }));
        assert_eq!(caller.pending_count(), 0);
    }
}
