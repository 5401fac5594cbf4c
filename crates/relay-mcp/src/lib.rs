//! relay-mcp - Model Context Protocol Server Core
//!
//! A transport-agnostic, multi-connection JSON-RPC 2.0 request and
//! notification engine that brokers between MCP clients and pluggable
//! capability providers (tools, resources, prompts, completions,
//! sampling).
//!
//! # Architecture
//!
//! The crate is organized as composable planes:
//!
//! - **Protocol** (`protocol`): JSON-RPC 2.0 envelopes, frame decoding,
//!   typed method parameters/results, version negotiation
//! - **Routing** (`routing`): the method-name -> handler table, state
//!   gating, admission and error mapping
//! - **Connections** (`connection`): per-connection state machines, the
//!   connection manager, broadcast and the idle reaper
//! - **Registries** (`registry`): tools, resource providers, prompt
//!   providers and roots, with observable registration
//! - **Notifications** (`notification`): direct/broadcast fan-out,
//!   subscription-scoped resource updates, sanitized log emission
//! - **Progress & cancellation** (`progress`): token-keyed progress and
//!   the in-flight request table
//! - **Sampling** (`sampling`): server-initiated `sampling/createMessage`
//!   with response correlation
//! - **Rate limiting** (`ratelimit`): sliding/fixed windows with a
//!   two-level global/resource check
//! - **Sessions** (`session`): HMAC-signed session tokens and
//!   claims-based principals
//! - **Providers** (`providers`): the trait seams concrete capability
//!   implementations plug into
//! - **Transport** (`transport`): the frame stream/sink seam concrete
//!   transports implement
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use relay_mcp::server::McpServerBuilder;
//! use relay_mcp::transport::ChannelTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = McpServerBuilder::new()
//!     .server_info("example-server", "1.0.0")
//!     .build()?;
//!
//! let (transport, client) = ChannelTransport::pair();
//! let _connection = server.accept(transport).await?;
//!
//! // Drive `client` with JSON-RPC frames; shut down when done.
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod notification;
pub mod progress;
pub mod protocol;
pub mod providers;
pub mod ratelimit;
pub mod registry;
pub mod routing;
pub mod sampling;
pub mod schema;
pub mod server;
pub mod session;
pub mod transport;

// Re-export the surface most hosts touch
pub use error::{McpError, McpResult};
pub use protocol::{
    parse_frame, JsonRpcMessage, JsonRpcMessageTrait, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ProtocolVersion, RequestId,
};
pub use server::{McpServer, McpServerBuilder, ServerConfig};
pub use transport::{ChannelTransport, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the crate version as a string
pub fn version() -> &'static str {
    VERSION
}
