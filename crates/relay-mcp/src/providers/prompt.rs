//! Prompt Provider Contract

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::error::McpResult;
use crate::protocol::{PromptDescriptor, PromptMessage};

/// Provider of prompt templates
///
/// Lists prompt descriptors and renders a prompt for given argument values.
#[async_trait]
pub trait PromptProvider: Send + Sync {
    /// List the prompts this provider exposes
    ///
    /// # Errors
    ///
    /// Returns an error when enumeration fails.
    async fn list(&self) -> McpResult<Vec<PromptDescriptor>>;

    /// Render a prompt
    ///
    /// # Errors
    ///
    /// Returns `McpError::PromptNotFound` for names this provider does not
    /// own; the registry uses that to continue probing other providers.
    /// Missing required arguments are `McpError::InvalidParams`.
    async fn get(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> McpResult<(Option<String>, Vec<PromptMessage>)>;
}
