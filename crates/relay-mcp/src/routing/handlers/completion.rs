//! `completion/complete` Handler
//!
//! Produces completion candidates for a reference:
//!
//! - `ref/prompt`: the referenced prompt's argument names, prefix-filtered
//!   case-insensitively by the partial value (an empty value lists all)
//! - `ref/resource`: resource URIs across providers matching the partial
//!   value as a case-insensitive substring

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::{decode_params, encode_result, MethodHandler};
use crate::error::{McpError, McpResult};
use crate::protocol::constants::methods;
use crate::protocol::{
    CompleteParams, CompleteResult, Completion, CompletionReference,
};
use crate::routing::context::RequestContext;
use crate::server::ServerContext;

/// Cap on values returned in one completion response
const MAX_COMPLETION_VALUES: usize = 100;

/// Handles `completion/complete`
pub struct CompleteHandler;

#[async_trait]
impl MethodHandler for CompleteHandler {
    fn method(&self) -> &'static str {
        methods::COMPLETION_COMPLETE
    }

    async fn handle(
        &self,
        server: &ServerContext,
        _request: RequestContext,
        params: Option<Value>,
    ) -> McpResult<Value> {
        let params: CompleteParams = decode_params(params)?;

        let matches: Vec<String> = match &params.reference {
            CompletionReference::Prompt { name } => {
                let prompt = server
                    .prompts
                    .find(name)
                    .await
                    .ok_or_else(|| McpError::prompt_not_found(name))?;

                let needle = params.argument.value.to_lowercase();
                prompt
                    .arguments
                    .into_iter()
                    .map(|argument| argument.name)
                    .filter(|candidate| {
                        needle.is_empty() || candidate.to_lowercase().starts_with(&needle)
                    })
                    .collect()
            }
            CompletionReference::Resource { .. } => {
                let needle = params.argument.value.to_lowercase();
                server
                    .resources
                    .list_all()
                    .await
                    .into_iter()
                    .map(|resource| resource.uri.as_str().to_string())
                    .filter(|uri| needle.is_empty() || uri.to_lowercase().contains(&needle))
                    .collect()
            }
        };

        let total = matches.len() as u64;
        let has_more = matches.len() > MAX_COMPLETION_VALUES;
        let values: Vec<String> = matches.into_iter().take(MAX_COMPLETION_VALUES).collect();

        encode_result(&CompleteResult {
            completion: Completion {
                values,
                total: Some(total),
                has_more: Some(has_more),
            },
        })
    }
}
