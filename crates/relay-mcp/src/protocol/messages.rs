//! Typed Method Parameters and Results
//!
//! Request parameter and result structures for every method the router
//! dispatches, plus the payloads of server-emitted notifications. Field
//! names follow the wire protocol's camelCase via serde renames.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use super::types::{
    ClientCapabilities, ClientInfo, Content, PromptDescriptor, PromptMessage,
    ResourceDescriptor, Root, ServerCapabilities, ServerInfo, ToolDescriptor, Uri,
};

/// `initialize` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeParams {
    /// Protocol version requested by the client (semver string)
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Client capabilities
    #[serde(default)]
    pub capabilities: ClientCapabilities,

    /// Client information
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

/// `initialize` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeResult {
    /// Negotiated protocol version
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Server capabilities
    pub capabilities: ServerCapabilities,

    /// Server information
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,

    /// Optional instructions for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// `tools/list` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListToolsResult {
    /// Registered tools
    pub tools: Vec<ToolDescriptor>,

    /// Pagination cursor (always absent in core)
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `tools/call` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolParams {
    /// Name of the tool to invoke
    pub name: String,

    /// Argument object validated against the tool's schema
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

/// Omitted arguments decode as an empty object, not null
fn empty_arguments() -> Value {
    Value::Object(serde_json::Map::new())
}

/// `tools/call` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResult {
    /// Content items produced by the tool
    pub content: Vec<Content>,

    /// Whether the tool reported a domain-level failure
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Successful result with content
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    /// Domain-level error surfaced as tool output rather than a protocol error
    pub fn error_text(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }
}

/// `resources/list` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourcesResult {
    /// Resources across all registered providers
    pub resources: Vec<ResourceDescriptor>,

    /// Pagination cursor (always absent in core)
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `resources/read` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceParams {
    /// URI of the resource to read
    pub uri: Uri,
}

/// `resources/read` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceResult {
    /// Resource contents
    pub contents: Vec<Content>,
}

/// `resources/subscribe` and `resources/unsubscribe` parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSubscriptionParams {
    /// URI whose change notifications are requested
    pub uri: Uri,
}

/// `prompts/list` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPromptsResult {
    /// Prompts across all registered providers
    pub prompts: Vec<PromptDescriptor>,

    /// Pagination cursor (always absent in core)
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `prompts/get` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptParams {
    /// Name of the prompt to render
    pub name: String,

    /// Argument values keyed by argument name
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// `prompts/get` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptResult {
    /// Optional description of the rendered prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rendered messages
    pub messages: Vec<PromptMessage>,
}

/// `logging/setLevel` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetLevelParams {
    /// Minimum level name; emissions below it are suppressed
    pub level: String,
}

/// `roots/list` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListRootsResult {
    /// Snapshot of the configured roots
    pub roots: Vec<Root>,
}

/// `completion/complete` request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteParams {
    /// Reference to the prompt or resource being completed
    #[serde(rename = "ref")]
    pub reference: CompletionReference,

    /// The argument under completion
    pub argument: CompletionArgument,
}

/// Reference discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CompletionReference {
    /// A prompt, identified by name
    #[serde(rename = "ref/prompt")]
    Prompt {
        /// Prompt name
        name: String,
    },
    /// A resource, identified by URI template or name
    #[serde(rename = "ref/resource")]
    Resource {
        /// Resource name or URI fragment
        name: String,
    },
}

/// Name/value pair under completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionArgument {
    /// Argument name
    pub name: String,
    /// Partial value typed so far
    pub value: String,
}

/// `completion/complete` result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteResult {
    /// Completion values
    pub completion: Completion,
}

/// Completion match set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    /// Matching values
    pub values: Vec<String>,

    /// Total number of matches available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// Whether more matches exist beyond `values`
    #[serde(rename = "hasMore", skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

/// `$/cancelRequest` notification parameters
///
/// The id is compared verbatim against in-flight request ids: a string id
/// only cancels a request registered with the same string id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelParams {
    /// Id of the request to cancel
    pub id: Value,

    /// Optional human-readable reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `notifications/progress` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressParams {
    /// Token correlating this update with the originating request
    #[serde(rename = "progressToken")]
    pub progress_token: String,

    /// Progress in [0, 100]
    pub progress: f64,

    /// Optional total units of work
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,

    /// Optional status message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `notifications/resources/updated` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceUpdatedParams {
    /// URI of the changed resource
    pub uri: Uri,
}

/// `notifications/message` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingMessageParams {
    /// Severity of the message
    pub level: String,

    /// Originating logger name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,

    /// Sanitized payload
    pub data: Value,
}

/// `notifications/cancelled` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelledParams {
    /// Id of the cancelled request
    #[serde(rename = "requestId")]
    pub request_id: Value,

    /// Reason the request was cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `sampling/createMessage` parameters (server -> client)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMessageParams {
    /// Conversation messages for the client-side model
    pub messages: Vec<SamplingMessage>,

    /// Maximum tokens the client should sample
    #[serde(rename = "maxTokens")]
    pub max_tokens: u64,

    /// Optional system prompt
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Optional sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A single message in a sampling conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingMessage {
    /// Role of the message sender
    pub role: String,
    /// Content of the message
    pub content: Content,
}
