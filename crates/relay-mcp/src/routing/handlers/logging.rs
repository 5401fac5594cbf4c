//! `logging/setLevel` Handler

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

// Layer 3: Internal module imports
use super::{decode_params, MethodHandler};
use crate::error::{McpError, McpResult};
use crate::protocol::constants::methods;
use crate::protocol::{LogLevel, SetLevelParams};
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

/// Handles `logging/setLevel`: updates the server-wide minimum
///
/// Subsequent `notifications/message` emissions below the new minimum are
/// suppressed.
pub struct SetLevelHandler;

#[async_trait]
impl MethodHandler for SetLevelHandler {
    fn method(&self) -> &'static str {
        methods::LOGGING_SET_LEVEL
    }

    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        if server.capabilities.logging.is_none() {
            return Err(McpError::capability_not_supported("logging"));
        }
        let params: SetLevelParams = decode_params(params)?;

        let level = LogLevel::parse(&params.level)
            .map_err(|_| McpError::invalid_params(format!("unknown level '{}'", params.level)))?;
        server.bus.set_min_level(level);
        debug!(
            connection = %request.connection.id(),
            level = %level,
            "minimum log level updated"
        );
        Ok(Value::Object(serde_json::Map::new()))
    }
}
