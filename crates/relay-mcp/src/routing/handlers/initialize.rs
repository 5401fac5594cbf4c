//! `initialize` Handler
//!
//! Negotiates the protocol version, records the client's identity and
//! capabilities on the connection, and returns server info plus the
//! advertised capabilities. The router rejects duplicate initialization
//! before this handler runs; nothing here mutates after first success.

// Layer 1: Standard library imports
use std::str::FromStr;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

// Layer 3: Internal module imports
use super::{decode_params, encode_result, MethodHandler};
use crate::connection::ConnectionState;
use crate::error::{McpError, McpResult};
use crate::protocol::constants::methods;
use crate::protocol::{InitializeParams, InitializeResult, ProtocolVersion};
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

/// Handles `initialize`
pub struct InitializeHandler;

#[async_trait]
impl MethodHandler for InitializeHandler {
    fn method(&self) -> &'static str {
        methods::INITIALIZE
    }

    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let params: InitializeParams = decode_params(params)?;

        let requested = ProtocolVersion::from_str(&params.protocol_version)
            .map_err(|_| {
                McpError::invalid_params(format!(
                    "malformed protocolVersion '{}'",
                    params.protocol_version
                ))
            })?;
        let negotiated = server.negotiator.negotiate(requested)?;

        debug!(
            client = %params.client_info.name,
            requested = %requested,
            negotiated = %negotiated,
            "protocol version negotiated"
        );

        request.connection.record_initialization(
            params.client_info.clone(),
            params.capabilities,
            negotiated,
        );
        request
            .connection
            .transition_to(ConnectionState::Initialized)
            .map_err(|_| McpError::AlreadyInitialized)?;

        info!(
            connection = %request.connection.id(),
            client = %params.client_info.name,
            version = %params.client_info.version,
            "connection initialized"
        );

        encode_result(&InitializeResult {
            protocol_version: negotiated.to_string(),
            capabilities: server.capabilities.clone(),
            server_info: server.config.server_info.clone(),
            instructions: server.config.instructions.clone(),
        })
    }
}
