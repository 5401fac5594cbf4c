//! JSON-RPC 2.0 Message Implementation
//!
//! Complete JSON-RPC 2.0 message types with shared serialization behavior
//! through a trait, plus the frame decoder that turns raw transport text
//! into typed messages.
//!
//! # Architecture
//!
//! - Core message types (`JsonRpcRequest`, `JsonRpcResponse`,
//!   `JsonRpcNotification`) unified under the untagged `JsonRpcMessage` enum
//! - `JsonRpcMessageTrait` for consistent serialization across all types
//! - `parse_frame` performing structural validation: `jsonrpc` must be
//!   exactly "2.0", requests carry a string or integer id, responses carry
//!   exactly one of `result`/`error`
//!
//! Request ids are preserved byte-exact when echoed: a string id stays a
//! string, a numeric id stays a number.
//!
//! # Examples
//!
//! ```rust
//! use relay_mcp::protocol::{parse_frame, JsonRpcMessage};
//!
//! let frame = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
//! match parse_frame(frame).unwrap() {
//!     JsonRpcMessage::Request(req) => assert_eq!(req.method, "ping"),
//!     _ => unreachable!(),
//! }
//! ```

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use super::constants::JSONRPC_VERSION;
use super::errors::FrameError;

/// JSON-RPC message types supporting requests, responses, and notifications
///
/// This enum unifies all JSON-RPC 2.0 message types into a single type
/// for transport and handling. Each variant preserves the specific structure
/// of its message type while providing unified serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// JSON-RPC request message
    Request(JsonRpcRequest),
    /// JSON-RPC notification message
    ///
    /// Ordered before Response: every Response field except `jsonrpc` is
    /// optional, so the untagged match must try the method-carrying
    /// variants first.
    Notification(JsonRpcNotification),
    /// JSON-RPC response message
    Response(JsonRpcResponse),
}

/// Trait for JSON-RPC message serialization and deserialization
///
/// Provides common functionality for all message types, eliminating code
/// duplication and ensuring consistent serialization behavior. Any type that
/// implements `Serialize + Deserialize` gets the default implementations.
pub trait JsonRpcMessageTrait: Serialize + for<'de> Deserialize<'de> {
    /// Serialize this message to a JSON string
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails, which should be
    /// rare given the controlled structure of JSON-RPC messages.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize this message to pretty-printed JSON, useful for debugging
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the input is not valid JSON for this
    /// message type.
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize directly into a buffer, avoiding the intermediate String
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    fn serialize_to_buffer(&self, buffer: &mut BytesMut) -> Result<(), serde_json::Error> {
        serde_json::to_writer(buffer.writer(), self)
    }

    /// Serialize this message to bytes
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let mut buffer = BytesMut::with_capacity(256);
        self.serialize_to_buffer(&mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Deserialize a message from JSON bytes
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the bytes are not valid JSON for this
    /// message type.
    fn from_json_bytes(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }
}

/// Request ID supporting both string and numeric formats
///
/// The JSON-RPC 2.0 specification allows request IDs to be strings, numbers,
/// or null. This enum supports string and numeric variants; null ids are
/// represented by `Option<RequestId>`. Serialization preserves the original
/// format so ids round-trip byte-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String-based request identifier
    String(String),
    /// Numeric request identifier
    Number(i64),
}

impl RequestId {
    /// Create a new string-based request ID
    pub fn new_string(id: impl Into<String>) -> Self {
        RequestId::String(id.into())
    }

    /// Create a new numeric request ID
    pub fn new_number(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// JSON-RPC 2.0 Request Message
///
/// Represents a request to invoke a method on the remote peer.
///
/// # JSON-RPC 2.0 Specification Compliance
///
/// - `jsonrpc`: MUST be exactly "2.0"
/// - `method`: MUST be a String containing the name of the method to invoke
/// - `params`: MAY be omitted; if present MUST be an Object or Array
/// - `id`: MUST be a String or Number (notifications carry no id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Name of the method to invoke
    pub method: String,

    /// Parameters for the method (object or array)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Unique identifier for this request
    pub id: RequestId,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Extract the client-supplied progress token from `params._meta`
    ///
    /// Progress tokens ride piggyback on requests under
    /// `params._meta.progressToken` and correlate subsequent
    /// `notifications/progress` emissions with this request.
    pub fn progress_token(&self) -> Option<String> {
        self.params
            .as_ref()
            .and_then(|p| p.get("_meta"))
            .and_then(|m| m.get("progressToken"))
            .and_then(|t| match t {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

impl JsonRpcMessageTrait for JsonRpcRequest {}

/// JSON-RPC 2.0 Response Message
///
/// Contains either a successful result or error information, never both
/// (mutual exclusion enforced by the JSON-RPC spec). The id echoes the
/// request that triggered the response, or is null for parse errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Result of successful method invocation (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error information for failed invocation (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    /// Request identifier from the original request (null for parse errors)
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    /// Create a successful JSON-RPC 2.0 response
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Create an error JSON-RPC 2.0 response
    ///
    /// `id` is `None` for frames whose id could not be recovered, which
    /// serializes as `"id": null` per the specification.
    pub fn error(error: Value, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Whether this response reports success
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }
}

impl JsonRpcMessageTrait for JsonRpcResponse {}

/// JSON-RPC 2.0 Notification Message
///
/// A request that does not expect a response. The absence of an `id` field
/// is what distinguishes notifications from requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    /// Protocol version - always "2.0"
    pub jsonrpc: String,

    /// Name of the notification method
    pub method: String,

    /// Parameters for the notification (object or array)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC 2.0 notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcMessageTrait for JsonRpcNotification {}

impl JsonRpcMessageTrait for JsonRpcMessage {}

impl JsonRpcMessage {
    /// Create a request message
    pub fn request(method: &str, params: Option<Value>, id: RequestId) -> Self {
        JsonRpcMessage::Request(JsonRpcRequest::new(method, params, id))
    }

    /// Create a notification message
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        JsonRpcMessage::Notification(JsonRpcNotification::new(method, params))
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(request: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(request)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(response)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(notification: JsonRpcNotification) -> Self {
        JsonRpcMessage::Notification(notification)
    }
}

/// Decode an id value from a frame, accepting strings and integers only
fn decode_id(value: &Value) -> Result<RequestId, String> {
    match value {
        Value::String(s) => Ok(RequestId::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(RequestId::Number)
            .ok_or_else(|| "request id must be an integer or string".to_string()),
        _ => Err("request id must be an integer or string".to_string()),
    }
}

/// Parse a raw text frame into a typed JSON-RPC message
///
/// Performs the structural validation required before routing:
///
/// - invalid JSON fails with [`FrameError::Parse`]
/// - a non-object frame, a missing or mismatched `jsonrpc` field, a missing
///   `method`, a malformed id, or a response carrying both or neither of
///   `result`/`error` fails with [`FrameError::InvalidRequest`]
/// - a frame with `method` and an id is a Request; with `method` and no id a
///   Notification; with `result` or `error` a Response
///
/// # Errors
///
/// Returns [`FrameError`] describing the first violation found. Where the
/// offending frame carried a recoverable id, the error preserves it so the
/// caller can echo it in the error response.
pub fn parse_frame(raw: &str) -> Result<JsonRpcMessage, FrameError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| FrameError::parse(e.to_string()))?;

    let object = match &value {
        Value::Object(map) => map,
        _ => return Err(FrameError::invalid("frame must be a JSON object")),
    };

    // The id is extracted up front so structural errors can echo it.
    let id = match object.get("id") {
        None | Some(Value::Null) => None,
        Some(raw_id) => match decode_id(raw_id) {
            Ok(id) => Some(id),
            Err(message) => return Err(FrameError::invalid(message)),
        },
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => {
            return Err(FrameError::invalid_with_id(
                "jsonrpc field must be exactly \"2.0\"",
                id,
            ))
        }
        None => return Err(FrameError::invalid_with_id("missing jsonrpc field", id)),
    }

    let params = object.get("params").cloned();
    if let Some(p) = &params {
        if !p.is_object() && !p.is_array() {
            return Err(FrameError::invalid_with_id(
                "params must be an object or array",
                id,
            ));
        }
    }

    if let Some(method) = object.get("method") {
        let method = match method {
            Value::String(m) if !m.is_empty() => m.clone(),
            _ => {
                return Err(FrameError::invalid_with_id(
                    "method must be a non-empty string",
                    id,
                ))
            }
        };

        return Ok(match id {
            Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params,
                id,
            }),
            None => JsonRpcMessage::Notification(JsonRpcNotification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params,
            }),
        });
    }

    let has_result = object.contains_key("result");
    let has_error = object.contains_key("error");
    match (has_result, has_error) {
        (true, true) => Err(FrameError::invalid_with_id(
            "response must not carry both result and error",
            id,
        )),
        (false, false) => Err(FrameError::invalid_with_id(
            "frame carries neither method, result nor error",
            id,
        )),
        _ => Ok(JsonRpcMessage::Response(JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: object.get("result").cloned(),
            error: object.get("error").cloned(),
            id,
        })),
    }
}
