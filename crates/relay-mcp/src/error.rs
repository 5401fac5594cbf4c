//! Request-Level Error Taxonomy
//!
//! The error type handlers and providers return, and its mapping onto
//! JSON-RPC error objects. Every variant has a designated code; unexpected
//! faults collapse into `Internal`. In debug mode the serialized error
//! carries a truncated detail string in `data`; in production only the
//! message and a stable `type` tag survive.

// Layer 1: Standard library imports
// (None required for current thiserror implementation)

// Layer 2: Third-party crate imports
use chrono::TimeDelta;
use serde_json::{json, Value};
use thiserror::Error;

// Layer 3: Internal module imports
use crate::protocol::constants::error_codes;
use crate::protocol::version::VersionError;
use crate::schema::SchemaViolation;

/// Maximum length of the detail string attached in debug mode
const DEBUG_DETAIL_LIMIT: usize = 512;

/// Errors surfaced to clients as JSON-RPC error responses
///
/// The taxonomy mirrors the protocol's failure modes: structural, protocol
/// state, authorization, limits/timing, resource lookup, and the internal
/// bucket for everything unexpected.
#[derive(Debug, Clone, Error)]
pub enum McpError {
    /// The frame was not valid JSON
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The message violated JSON-RPC structure or arrived in the wrong state
    #[error("{message}")]
    InvalidRequest { message: String },

    /// No handler is registered for the method
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// Parameters failed decoding or schema validation
    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        /// Structured violations attached as `data.errors`
        violations: Vec<SchemaViolation>,
    },

    /// Connection has not completed the initialize handshake
    #[error("Connection must be initialized before calling other methods")]
    NotInitialized,

    /// A second initialize arrived on an initialized connection
    #[error("Connection is already initialized")]
    AlreadyInitialized,

    /// The negotiated capabilities do not enable this method family
    #[error("Capability not supported: {capability}")]
    CapabilityNotSupported { capability: String },

    /// No mutually supported protocol version
    #[error("{0}")]
    ProtocolVersion(#[from] VersionError),

    /// The request requires an authenticated principal
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The principal is not authorized for the resource/action
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The identity exceeded a rate-limit window
    #[error("Rate limit exceeded for {resource}")]
    RateLimited {
        resource: String,
        /// Time until the window frees capacity
        retry_after: TimeDelta,
    },

    /// The operation exceeded its deadline
    #[error("Operation timed out after {}s", timeout.num_seconds())]
    Timeout { timeout: TimeDelta },

    /// The operation was cancelled cooperatively
    #[error("Operation was cancelled")]
    Cancelled,

    /// No registered provider knows the URI
    #[error("Resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// The URI falls outside the configured roots
    #[error("Access to {uri} is outside the configured roots")]
    ResourceAccessDenied { uri: String },

    /// No tool is registered under the name
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// No provider renders a prompt under the name
    #[error("Prompt not found: {name}")]
    PromptNotFound { name: String },

    /// The server is at its connection limit
    #[error("Connection limit reached")]
    ConnectionLimit,

    /// Bucket for unexpected faults
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenient result type for handler and provider operations
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// Create an invalid-request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a method-not-found error
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Create an invalid-params error without structured violations
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Create an invalid-params error carrying schema violations
    pub fn schema_violations(violations: Vec<SchemaViolation>) -> Self {
        let message = violations
            .first()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "invalid arguments".to_string());
        Self::InvalidParams {
            message,
            violations,
        }
    }

    /// Create an unsupported-capability error
    pub fn capability_not_supported(capability: impl Into<String>) -> Self {
        Self::CapabilityNotSupported {
            capability: capability.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a resource-not-found error
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a prompt-not-found error
    pub fn prompt_not_found(name: impl Into<String>) -> Self {
        Self::PromptNotFound { name: name.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The JSON-RPC error code designated for this variant
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse { .. } => error_codes::PARSE_ERROR,
            Self::InvalidRequest { .. } | Self::NotInitialized | Self::AlreadyInitialized => {
                error_codes::INVALID_REQUEST
            }
            Self::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => error_codes::INVALID_PARAMS,
            Self::CapabilityNotSupported { .. } => error_codes::CAPABILITY_NOT_SUPPORTED,
            Self::ProtocolVersion(_) => error_codes::PROTOCOL_VERSION_UNSUPPORTED,
            Self::AuthenticationRequired => error_codes::AUTHENTICATION_REQUIRED,
            Self::Unauthorized { .. } | Self::ResourceAccessDenied { .. } => {
                error_codes::UNAUTHORIZED
            }
            Self::RateLimited { .. } => error_codes::RATE_LIMITED,
            Self::Timeout { .. } => error_codes::TIMEOUT,
            Self::Cancelled => error_codes::CANCELLED,
            Self::ResourceNotFound { .. } => error_codes::RESOURCE_NOT_FOUND,
            Self::ToolNotFound { .. } | Self::PromptNotFound { .. } => {
                error_codes::INVALID_PARAMS
            }
            Self::ConnectionLimit => error_codes::CONNECTION_LIMIT,
            Self::Internal { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Stable type tag included in `error.data.type`
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::MethodNotFound { .. } => "method_not_found",
            Self::InvalidParams { .. } => "invalid_params",
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::CapabilityNotSupported { .. } => "capability_not_supported",
            Self::ProtocolVersion(_) => "protocol_version_unsupported",
            Self::AuthenticationRequired => "authentication_required",
            Self::Unauthorized { .. } => "unauthorized",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::ResourceNotFound { .. } => "resource_not_found",
            Self::ResourceAccessDenied { .. } => "resource_access_denied",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::PromptNotFound { .. } => "prompt_not_found",
            Self::ConnectionLimit => "connection_limit",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Structured `data` payload for the error object, if any
    fn data(&self, debug: bool) -> Option<Value> {
        let mut data = serde_json::Map::new();
        data.insert("type".to_string(), json!(self.type_tag()));

        match self {
            Self::InvalidParams { violations, .. } if !violations.is_empty() => {
                data.insert("errors".to_string(), json!(violations));
            }
            Self::RateLimited { retry_after, .. } => {
                let millis = retry_after.num_milliseconds().max(1);
                data.insert(
                    "retryAfter".to_string(),
                    json!((millis as f64 / 1000.0).ceil() as i64),
                );
            }
            Self::ProtocolVersion(err) => {
                data.insert(
                    "supported".to_string(),
                    json!(err
                        .supported
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()),
                );
            }
            _ => {}
        }

        if debug {
            let mut detail = format!("{self:?}");
            detail.truncate(DEBUG_DETAIL_LIMIT);
            data.insert("detail".to_string(), json!(detail));
        }

        Some(Value::Object(data))
    }

    /// Serialize this error as a JSON-RPC error object
    ///
    /// `debug` controls whether the truncated debug detail is attached.
    pub fn to_error_value(&self, debug: bool) -> Value {
        let mut error = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Some(data) = self.data(debug) {
            error["data"] = data;
        }
        error
    }
}
