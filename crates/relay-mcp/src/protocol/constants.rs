//! Protocol Constants
//!
//! Method names, notification names, JSON-RPC error codes and default
//! configuration values used across the server core. Centralizing these
//! ensures consistency and reduces typos.

/// MCP protocol method names
pub mod methods {
    /// Initialization method
    pub const INITIALIZE: &str = "initialize";
    /// Initialized notification
    pub const INITIALIZED: &str = "initialized";

    /// Liveness probe
    pub const PING: &str = "ping";
    /// Cancellation notification
    pub const CANCEL_REQUEST: &str = "$/cancelRequest";

    /// Tool-related methods
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    /// Resource-related methods
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const RESOURCES_SUBSCRIBE: &str = "resources/subscribe";
    pub const RESOURCES_UNSUBSCRIBE: &str = "resources/unsubscribe";

    /// Prompt-related methods
    pub const PROMPTS_LIST: &str = "prompts/list";
    pub const PROMPTS_GET: &str = "prompts/get";

    /// Logging-related methods
    pub const LOGGING_SET_LEVEL: &str = "logging/setLevel";

    /// Root-related methods
    pub const ROOTS_LIST: &str = "roots/list";

    /// Completion methods
    pub const COMPLETION_COMPLETE: &str = "completion/complete";

    /// Server-initiated sampling request (server -> client)
    pub const SAMPLING_CREATE_MESSAGE: &str = "sampling/createMessage";
}

/// Notification names emitted by the server
pub mod notifications {
    /// Tool registry changed
    pub const TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
    /// Resource registry changed
    pub const RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
    /// A subscribed resource changed (carries `uri`)
    pub const RESOURCES_UPDATED: &str = "notifications/resources/updated";
    /// Prompt registry changed
    pub const PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
    /// Root registry changed
    pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
    /// Log message emission
    pub const MESSAGE: &str = "notifications/message";
    /// Progress update correlated with a progress token
    pub const PROGRESS: &str = "notifications/progress";
    /// An in-flight request was cancelled
    pub const CANCELLED: &str = "notifications/cancelled";
}

/// JSON-RPC error codes
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;

    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;

    /// Method not found - The method does not exist / is not available
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid params - Invalid method parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Extension codes. The -32000..-32099 band is reserved for
    // implementation-defined server errors; -32800 follows the LSP
    // convention for request cancellation.

    /// Principal is not authorized for the resource/action
    pub const UNAUTHORIZED: i32 = -32001;

    /// Resource does not exist in any registered provider
    pub const RESOURCE_NOT_FOUND: i32 = -32002;

    /// Operation exceeded its deadline
    pub const TIMEOUT: i32 = -32003;

    /// Method family is not enabled by the negotiated capabilities
    pub const CAPABILITY_NOT_SUPPORTED: i32 = -32004;

    /// Identity exceeded a rate-limit window
    pub const RATE_LIMITED: i32 = -32005;

    /// No mutually supported protocol version
    pub const PROTOCOL_VERSION_UNSUPPORTED: i32 = -32006;

    /// Server is at its connection limit
    pub const CONNECTION_LIMIT: i32 = -32007;

    /// Authentication is required before the request can proceed
    pub const AUTHENTICATION_REQUIRED: i32 = -32008;

    /// Request was cancelled cooperatively
    pub const CANCELLED: i32 = -32800;
}

/// Default configuration values
pub mod defaults {
    /// Default server name
    pub const SERVER_NAME: &str = "relay-mcp-server";

    /// Default maximum concurrent connections
    pub const MAX_CONNECTIONS: usize = 1024;

    /// Default idle reaper timeout in seconds (30 minutes)
    pub const IDLE_TIMEOUT_SECS: i64 = 30 * 60;

    /// Default sampling round-trip timeout in seconds (5 minutes)
    pub const SAMPLING_TIMEOUT_SECS: i64 = 5 * 60;

    /// Default per-connection outbound queue depth
    pub const SEND_QUEUE_CAPACITY: usize = 256;

    /// Sweep interval for rate-limit windows and progress tokens (5 minutes)
    pub const SWEEP_INTERVAL_SECS: u64 = 5 * 60;

    /// Windows and progress tokens idle longer than this are reaped (1 hour)
    pub const IDLE_ENTRY_EXPIRY_SECS: i64 = 60 * 60;

    /// Default per-logger emission cap (messages per second)
    pub const LOG_MESSAGES_PER_SECOND: u32 = 10;

    /// Deadline for draining outbound queues during shutdown (seconds)
    pub const DRAIN_DEADLINE_SECS: u64 = 5;
}

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";
