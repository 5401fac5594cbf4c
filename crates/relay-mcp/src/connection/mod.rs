//! Connection Plane
//!
//! Per-connection state machines and the manager that owns them. Each live
//! connection runs exactly one ingress task (reads frames, dispatches) and
//! one egress task (drains the bounded send channel into the transport);
//! both are spawned by the server when a transport is accepted.

pub mod connection;
pub mod manager;
pub mod state;

pub use connection::{Connection, ConnectionError};
pub use manager::{ConnectionConfig, ConnectionManager};
pub use state::ConnectionState;
