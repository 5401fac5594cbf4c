//! Protocol Layer
//!
//! JSON-RPC 2.0 message envelopes, frame decoding, domain newtypes,
//! capability structures, typed method parameters/results and protocol
//! version negotiation. This layer is pure data: it performs no I/O and
//! holds no server state.

pub mod constants;
pub mod errors;
pub mod message;
pub mod messages;
pub mod types;
pub mod version;

// Re-export the protocol surface at the module root
pub use constants::JSONRPC_VERSION;
pub use errors::{FrameError, ProtocolError, ProtocolResult};
pub use message::{
    parse_frame, JsonRpcMessage, JsonRpcMessageTrait, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
pub use messages::{
    CallToolParams, CallToolResult, CancelParams, CancelledParams, CompleteParams,
    CompleteResult, Completion, CompletionArgument, CompletionReference, CreateMessageParams,
    GetPromptParams, GetPromptResult, InitializeParams, InitializeResult, ListPromptsResult,
    ListResourcesResult, ListRootsResult, ListToolsResult, LoggingMessageParams, ProgressParams,
    ReadResourceParams, ReadResourceResult, ResourceSubscriptionParams, ResourceUpdatedParams,
    SamplingMessage, SetLevelParams,
};
pub use types::{
    ClientCapabilities, ClientInfo, CompletionsCapability, Content, LogLevel, LoggingCapability,
    Metadata, MimeType, PromptArgument, PromptDescriptor, PromptMessage, PromptsCapability,
    ResourceDescriptor, ResourcesCapability, Root, RootsCapability, SamplingCapability,
    ServerCapabilities, ServerInfo, ToolDescriptor, ToolsCapability, Uri,
};
pub use version::{ProtocolVersion, VersionError, VersionNegotiator};
