//! Prompt Method Handlers

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::{decode_params, encode_result, MethodHandler};
use crate::error::{McpError, McpResult};
use crate::protocol::constants::methods;
use crate::protocol::{GetPromptParams, GetPromptResult, ListPromptsResult};
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

fn require_prompts(server: &ServerContext) -> McpResult<()> {
    if server.capabilities.prompts.is_none() {
        return Err(McpError::capability_not_supported("prompts"));
    }
    Ok(())
}

/// Handles `prompts/list`
pub struct ListPromptsHandler;

#[async_trait]
impl MethodHandler for ListPromptsHandler {
    fn method(&self) -> &'static str {
        methods::PROMPTS_LIST
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        _params: Option<Value>,
    ) -> McpResult<Value> {
        require_prompts(server)?;
        encode_result(&ListPromptsResult {
            prompts: server.prompts.list_all().await,
            next_cursor: None,
        })
    }
}

/// Handles `prompts/get`
pub struct GetPromptHandler;

#[async_trait]
impl MethodHandler for GetPromptHandler {
    fn method(&self) -> &'static str {
        methods::PROMPTS_GET
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        require_prompts(server)?;
        let params: GetPromptParams = decode_params(params)?;

        let (description, messages) = server.prompts.get(&params.name, params.arguments).await?;
        encode_result(&GetPromptResult {
            description,
            messages,
        })
    }
}
