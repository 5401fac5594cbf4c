//! Resource Method Handlers
//!
//! `resources/list`, `resources/read` (root-boundary enforced),
//! `resources/subscribe` and `resources/unsubscribe`. Subscription
//! bookkeeping lives on the connection record; providers only get a
//! chance to start or stop change detection.

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
use crate::protocol::{
    ListResourcesResult, ReadResourceParams, ReadResourceResult, ResourceSubscriptionParams,
};
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

fn require_resources(server: &ServerContext) -> McpResult<()> {
    if server.capabilities.resources.is_none() {
        return Err(McpError::capability_not_supported("resources"));
    }
    Ok(())
}

/// Handles `resources/list`
pub struct ListResourcesHandler;

#[async_trait]
impl MethodHandler for ListResourcesHandler {
    fn method(&self) -> &'static str {
        methods::RESOURCES_LIST
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        _params: Option<Value>,
    ) -> McpResult<Value> {
        require_resources(server)?;
        encode_result(&ListResourcesResult {
            resources: server.resources.list_all().await,
            next_cursor: None,
        })
    }
}

/// Handles `resources/read`
pub struct ReadResourceHandler;

#[async_trait]
impl MethodHandler for ReadResourceHandler {
    fn method(&self) -> &'static str {
        methods::RESOURCES_READ
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        require_resources(server)?;
        let params: ReadResourceParams = decode_params(params)?;

        // Root boundary first: a denied URI must not probe providers.
        server.roots.validate(&params.uri)?;

        let contents = server.resources.read(&params.uri).await?;
        encode_result(&ReadResourceResult { contents })
    }
}

/// Handles `resources/subscribe`
pub struct SubscribeResourceHandler;

#[async_trait]
impl MethodHandler for SubscribeResourceHandler {
    fn method(&self) -> &'static str {
        methods::RESOURCES_SUBSCRIBE
    }

    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        require_resources(server)?;
        let params: ResourceSubscriptionParams = decode_params(params)?;

        server.roots.validate(&params.uri)?;
        request.connection.subscribe(params.uri.as_str());
        server.resources.subscribe(&params.uri).await;
        debug!(
            connection = %request.connection.id(),
            uri = %params.uri,
            "resource subscription added"
        );
        Ok(Value::Object(serde_json::Map::new()))
    }
}

/// Handles `resources/unsubscribe`
pub struct UnsubscribeResourceHandler;

#[async_trait]
impl MethodHandler for UnsubscribeResourceHandler {
    fn method(&self) -> &'static str {
        methods::RESOURCES_UNSUBSCRIBE
    }

    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        require_resources(server)?;
        let params: ResourceSubscriptionParams = decode_params(params)?;

        request.connection.unsubscribe(params.uri.as_str());
        server.resources.unsubscribe(&params.uri).await;
        debug!(
            connection = %request.connection.id(),
            uri = %params.uri,
            "resource subscription removed"
        );
        Ok(Value::Object(serde_json::Map::new()))
    }
}
