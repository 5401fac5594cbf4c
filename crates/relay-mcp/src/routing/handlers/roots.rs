//! `roots/list` Handler

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::{encode_result, MethodHandler};
use crate::error::McpResult;
use crate::protocol::constants::methods;
use crate::protocol::ListRootsResult;
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

/// Handles `roots/list`: a snapshot of the configured roots
pub struct ListRootsHandler;

#[async_trait]
impl MethodHandler for ListRootsHandler {
    fn method(&self) -> &'static str {
        methods::ROOTS_LIST
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        _params: Option<Value>,
    ) -> McpResult<Value> {
        encode_result(&ListRootsResult {
            roots: server.roots.list(),
        })
    }
}
