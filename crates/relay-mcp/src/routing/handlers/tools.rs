//! `tools/list` and `tools/call` Handlers
//!
//! `tools/call` validates arguments against the tool's object schema
//! before execution, hands the tool a cancellation handle, and supports
//! the progress-token piggyback: when the request carried
//! `_meta.progressToken`, a progress operation is registered and a
//! reporting handle flows into the tool.

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

// Layer 3: Internal module imports
use super::{decode_params, encode_result, MethodHandler};
use crate::error::{McpError, McpResult};
use crate::protocol::constants::methods;
use crate::protocol::{CallToolParams, ListToolsResult};
use crate::providers::ToolContext;
use crate::routing::context::RequestContext;
use crate::schema::validate_arguments;
use crate::server::ServerContext;

/// Handles `tools/list`
pub struct ListToolsHandler;

#[async_trait]
impl MethodHandler for ListToolsHandler {
    fn method(&self) -> &'static str {
        methods::TOOLS_LIST
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        _params: Option<Value>,
    ) -> McpResult<Value> {
        if server.capabilities.tools.is_none() {
            return Err(McpError::capability_not_supported("tools"));
        }
        encode_result(&ListToolsResult {
            tools: server.tools.descriptors(),
            next_cursor: None,
        })
    }
}

/// Handles `tools/call`
pub struct CallToolHandler;

#[async_trait]
impl MethodHandler for CallToolHandler {
    fn method(&self) -> &'static str {
        methods::TOOLS_CALL
    }

    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        if server.capabilities.tools.is_none() {
            return Err(McpError::capability_not_supported("tools"));
        }

        let params: CallToolParams = decode_params(params)?;
        let tool = server
            .tools
            .get(&params.name)
            .ok_or_else(|| McpError::tool_not_found(&params.name))?;

        let descriptor = tool.descriptor();
        let violations = validate_arguments(&descriptor.input_schema, &params.arguments);
        if !violations.is_empty() {
            return Err(McpError::schema_violations(violations));
        }

        let mut tool_ctx = ToolContext::new(request.cancellation.clone());
        if let Some(token) = &request.progress_token {
            server.progress.begin(token, request.connection.id());
            tool_ctx = tool_ctx.with_progress(server.progress.handle(token));
        }

        debug!(tool = %params.name, connection = %request.connection.id(), "invoking tool");

        // The select gives a bounded quiescence interval even when a tool
        // is blocked on provider I/O and cannot poll its token.
        let outcome = tokio::select! {
            result = tool.execute(params.arguments, tool_ctx) => result,
            _ = request.cancellation.cancelled() => Err(McpError::Cancelled),
        };

        if let Some(token) = &request.progress_token {
            match &outcome {
                Ok(_) => server.progress.complete(token, None).await,
                Err(error) => server.progress.fail(token, error.to_string()).await,
            }
        }

        encode_result(&outcome?)
    }
}
