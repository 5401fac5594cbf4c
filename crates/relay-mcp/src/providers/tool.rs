//! Tool Contract
//!
//! A tool is a named, schema-validated operation the server exposes through
//! `tools/list` and `tools/call`. Execution is cooperative: the handler
//! passes a cancellation token the tool must observe, and an optional
//! progress handle when the client supplied a progress token.

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
use crate::error::McpResult;
use crate::progress::ProgressHandle;
use crate::protocol::{CallToolResult, ToolDescriptor};

/// Execution context handed to a tool invocation
///
/// The cancellation token is triggered by `$/cancelRequest` or connection
/// close; a tool observing it must stop work and return promptly. The
/// progress handle is present when the request piggybacked a progress token
/// and lets the tool emit correlated `notifications/progress` updates.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Cooperative cancellation handle for this invocation
    pub cancellation: CancellationToken,

    /// Progress reporter, present when the client supplied a progress token
    pub progress: Option<ProgressHandle>,
}

impl ToolContext {
    /// Context with no progress reporting
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            progress: None,
        }
    }

    /// Attach a progress handle
    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// A tool registered with the server
///
/// Tool names are unique per server; registering a duplicate name is an
/// error. The descriptor's `input_schema` is the object schema the router
/// validates call arguments against before `execute` runs, so a tool may
/// assume its declared required properties are present and well-typed.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor surfaced by `tools/list`
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with validated arguments
    ///
    /// Domain-level failures should be reported via
    /// [`CallToolResult::error_text`] rather than an `Err`, which is
    /// reserved for protocol-level faults.
    ///
    /// # Errors
    ///
    /// Returns an error for protocol-level faults; `McpError::Cancelled`
    /// when the context's cancellation token fired mid-execution.
    async fn execute(&self, arguments: Value, ctx: ToolContext) -> McpResult<CallToolResult>;
}
