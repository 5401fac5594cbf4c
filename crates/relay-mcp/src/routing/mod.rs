//! Message Routing
//!
//! Frame decoding feeds an explicit method-name -> handler table; the
//! router enforces the connection state gate, rate-limit admission and
//! duplicate-id protection before a handler runs, and maps handler errors
//! onto their designated JSON-RPC codes.

pub mod context;
pub mod handlers;
pub mod router;

pub use context::RequestContext;
pub use handlers::MethodHandler;
pub use router::MessageRouter;
