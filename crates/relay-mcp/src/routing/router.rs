//! Message Router
//!
//! The per-frame dispatch pipeline: decode, state gate, admission, method
//! lookup, in-flight registration, spawned handler execution, response
//! emission. Requests run on spawned tasks, so response order is not
//! required to match request order; every response echoes its request id
//! byte-exact.
//!
//! Inbound `Response` frames (answers to server-initiated sampling calls)
//! are demultiplexed into the sampling correlation table.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde_json::Value;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::context::RequestContext;
use super::handlers::{handler_table, MethodHandler};
use crate::connection::{Connection, ConnectionState};
use crate::error::McpError;
use crate::protocol::constants::methods;
use crate::protocol::{
    parse_frame, CancelParams, FrameError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use crate::server::ServerContext;

/// Methods legal before the connection reaches `Initialized`
const PRE_INIT_METHODS: [&str; 3] = [
    methods::INITIALIZE,
    methods::PING,
    methods::CANCEL_REQUEST,
];

/// Per-frame dispatcher over the startup-built handler table
pub struct MessageRouter {
    server: Arc<ServerContext>,
    handlers: HashMap<&'static str, Arc<dyn MethodHandler>>,
}

impl MessageRouter {
    /// Build the router and its method table
    pub fn new(server: Arc<ServerContext>) -> Self {
        Self {
            server,
            handlers: handler_table(),
        }
    }

    /// The shared server context
    pub fn server(&self) -> &Arc<ServerContext> {
        &self.server
    }

    /// Process one raw inbound frame from a connection
    pub async fn dispatch_frame(&self, connection: &Arc<Connection>, raw: &str) {
        connection.touch();

        match parse_frame(raw) {
            Ok(JsonRpcMessage::Request(request)) => {
                self.handle_request(connection, request).await;
            }
            Ok(JsonRpcMessage::Notification(notification)) => {
                self.handle_notification(connection, notification).await;
            }
            Ok(JsonRpcMessage::Response(response)) => {
                // Answers to server-initiated calls; unknown ids ignored.
                self.server.sampling.accept_response(response);
            }
            Err(FrameError::Parse { message }) => {
                debug!(connection = %connection.id(), %message, "unparsable frame");
                self.respond_error(connection, None, &McpError::Parse { message })
                    .await;
            }
            Err(FrameError::InvalidRequest { message, id }) => {
                debug!(connection = %connection.id(), %message, "invalid frame");
                self.respond_error(connection, id, &McpError::invalid_request(message))
                    .await;
            }
        }
    }

    /// Admission checks, in-flight registration and handler spawn
    async fn handle_request(&self, connection: &Arc<Connection>, request: JsonRpcRequest) {
        let state = connection.state();
        if state.is_terminal() {
            return;
        }

        let method = request.method.as_str();
        let id = request.id.clone();

        if method == methods::INITIALIZE && state.is_initialized() {
            self.respond_error(connection, Some(id), &McpError::AlreadyInitialized)
                .await;
            return;
        }
        if !state.is_initialized() && !PRE_INIT_METHODS.contains(&method) {
            self.respond_error(connection, Some(id), &McpError::NotInitialized)
                .await;
            return;
        }

        let Some(handler) = self.handlers.get(method).map(Arc::clone) else {
            self.respond_error(
                connection,
                Some(id),
                &McpError::method_not_found(method),
            )
            .await;
            return;
        };

        if let Some(limiter) = &self.server.rate_limiter {
            let identity = connection.rate_limit_identity();
            let decision = limiter.check(&identity, method);
            if !decision.allowed {
                self.respond_error(
                    connection,
                    Some(id),
                    &McpError::RateLimited {
                        resource: method.to_string(),
                        retry_after: decision
                            .retry_after
                            .unwrap_or_else(chrono::TimeDelta::zero),
                    },
                )
                .await;
                return;
            }
        }

        let principal = connection.principal().map(|p| p.subject);
        let cancellation =
            match self
                .server
                .cancellations
                .register(connection.id(), &request.id, principal)
            {
                Ok(token) => token,
                Err(error) => {
                    self.respond_error(connection, Some(id), &error).await;
                    return;
                }
            };

        // Handlers run on their own task: a slow provider must not stall
        // the ingress loop, and responses may complete out of order.
        let server = Arc::clone(&self.server);
        let connection = Arc::clone(connection);
        let debug_errors = server.config.debug_errors;
        tokio::spawn(async move {
            let request_ctx = RequestContext {
                connection: Arc::clone(&connection),
                request_id: request.id.clone(),
                progress_token: request.progress_token(),
                cancellation: cancellation.clone(),
            };

            let outcome = tokio::select! {
                result = handler.handle(&server, request_ctx, request.params) => result,
                _ = cancellation.cancelled() => Err(McpError::Cancelled),
            };

            server
                .cancellations
                .complete(connection.id(), &request.id);

            let response = match outcome {
                Ok(result) => JsonRpcResponse::success(result, request.id),
                Err(error) => {
                    JsonRpcResponse::error(error.to_error_value(debug_errors), Some(request.id))
                }
            };
            if let Err(error) = connection.send(JsonRpcMessage::Response(response)).await {
                debug!(connection = %connection.id(), %error, "response dropped");
            }
        });
    }

    /// Notifications never produce a response; failures are logged
    async fn handle_notification(
        &self,
        connection: &Arc<Connection>,
        notification: JsonRpcNotification,
    ) {
        match notification.method.as_str() {
            methods::INITIALIZED => {
                if connection.state() == ConnectionState::Initialized {
                    if connection.transition_to(ConnectionState::Ready).is_ok() {
                        debug!(connection = %connection.id(), "connection ready");
                    }
                } else {
                    // A stray `initialized` is a notification: ignore it.
                    debug!(
                        connection = %connection.id(),
                        state = %connection.state(),
                        "initialized notification ignored"
                    );
                }
            }
            methods::CANCEL_REQUEST => {
                self.handle_cancel(connection, notification.params);
            }
            other => {
                debug!(connection = %connection.id(), method = %other, "unknown notification dropped");
            }
        }
    }

    /// `$/cancelRequest`: cancel by verbatim id; absent ids are ignored
    fn handle_cancel(&self, connection: &Arc<Connection>, params: Option<Value>) {
        let params: CancelParams = match serde_json::from_value(
            params.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        ) {
            Ok(params) => params,
            Err(error) => {
                warn!(connection = %connection.id(), %error, "malformed cancel notification");
                return;
            }
        };

        let request_id = match &params.id {
            Value::String(s) => RequestId::new_string(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(v) => RequestId::new_number(v),
                None => {
                    warn!(connection = %connection.id(), "non-integer cancel id ignored");
                    return;
                }
            },
            _ => {
                warn!(connection = %connection.id(), "cancel id must be a string or number");
                return;
            }
        };

        self.server
            .cancellations
            .cancel(connection.id(), &request_id);
    }

    /// Emit one error response for a failed request
    async fn respond_error(
        &self,
        connection: &Arc<Connection>,
        id: Option<RequestId>,
        error: &McpError,
    ) {
        let response =
            JsonRpcResponse::error(error.to_error_value(self.server.config.debug_errors), id);
        if let Err(send_error) = connection.send(JsonRpcMessage::Response(response)).await {
            debug!(connection = %connection.id(), error = %send_error, "error response dropped");
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("methods", &self.handlers.len())
            .finish()
    }
}
