//! Method Handlers
//!
//! One handler per protocol method, indexed by method string in an
//! explicit table built at startup. Each handler advertises its method
//! name; the router resolves by string equality and never reflects.

pub mod completion;
pub mod initialize;
pub mod logging;
pub mod ping;
pub mod prompts;
pub mod resources;
pub mod roots;
pub mod tools;

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

// Layer 3: Internal module imports
use super::context::RequestContext;
use crate::error::{McpError, McpResult};
use crate::server::ServerContext;

/// A request handler bound to one method name
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// The method string this handler serves
    fn method(&self) -> &'static str;

    /// Handle a request; the returned value becomes `result`
    ///
    /// # Errors
    ///
    /// Returns [`McpError`]; the router maps it onto the designated
    /// JSON-RPC error code.
    async fn handle(
        &self,
        server: &ServerContext,
        request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value>;
}

/// Decode optional params into a typed structure
///
/// Absent params decode as an empty object so methods with all-optional
/// parameters accept bare requests.
pub(crate) fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let value = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| McpError::invalid_params(e.to_string()))
}

/// Encode a result structure into the response value
pub(crate) fn encode_result<T: serde::Serialize>(result: &T) -> McpResult<Value> {
    serde_json::to_value(result)
        .map_err(|e| McpError::internal(format!("failed to serialize response: {e}")))
}

/// Build the method-name -> handler table
pub fn handler_table() -> HashMap<&'static str, Arc<dyn MethodHandler>> {
    let handlers: Vec<Arc<dyn MethodHandler>> = vec![
        Arc::new(initialize::InitializeHandler),
        Arc::new(ping::PingHandler),
        Arc::new(tools::ListToolsHandler),
        Arc::new(tools::CallToolHandler),
        Arc::new(resources::ListResourcesHandler),
        Arc::new(resources::ReadResourceHandler),
        Arc::new(resources::SubscribeResourceHandler),
        Arc::new(resources::UnsubscribeResourceHandler),
        Arc::new(prompts::ListPromptsHandler),
        Arc::new(prompts::GetPromptHandler),
        Arc::new(logging::SetLevelHandler),
        Arc::new(roots::ListRootsHandler),
        Arc::new(completion::CompleteHandler),
    ];

    handlers
        .into_iter()
        .map(|handler| (handler.method(), handler))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::methods;

    #[test]
    fn table_covers_every_request_method() {
        let table = handler_table();
        for method in [
            methods::INITIALIZE,
            methods::PING,
            methods::TOOLS_LIST,
            methods::TOOLS_CALL,
            methods::RESOURCES_LIST,
            methods::RESOURCES_READ,
            methods::RESOURCES_SUBSCRIBE,
            methods::RESOURCES_UNSUBSCRIBE,
            methods::PROMPTS_LIST,
            methods::PROMPTS_GET,
            methods::LOGGING_SET_LEVEL,
            methods::ROOTS_LIST,
            methods::COMPLETION_COMPLETE,
        ] {
            assert!(table.contains_key(method), "missing handler for {method}");
        }
    }

    #[test]
    fn decode_params_accepts_absent_params() {
        #[derive(serde::Deserialize)]
        struct AllOptional {
            #[serde(default)]
            flag: bool,
        }
        let decoded: AllOptional = decode_params(None).unwrap();
        assert!(!decoded.flag);
    }

    #[test]
    fn decode_params_reports_invalid_params() {
        #[derive(Debug, serde::Deserialize)]
        struct Strict {
            #[allow(dead_code)]
            name: String,
        }
        let err = decode_params::<Strict>(Some(serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }
}
