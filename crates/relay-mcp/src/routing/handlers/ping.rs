//! `ping` Handler

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::MethodHandler;
use crate::error::McpResult;
use crate::protocol::constants::methods;
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

/// Handles `ping`: empty result, activity stamp
///
/// The router touches `lastActivity` for every inbound frame; ping exists
/// so quiet clients can keep a connection warm explicitly.
pub struct PingHandler;

#[async_trait]
impl MethodHandler for PingHandler {
    fn method(&self) -> &'static str {
        methods::PING
    }

    async fn handle(
        &self,
        _server: &ServerContext,
        request: RequestContext,
        _params: Option<Value>,
    ) -> McpResult<Value> {
        request.connection.touch();
        Ok(Value::Object(serde_json::Map::new()))
    }
}
