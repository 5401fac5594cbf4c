//! Connection State Machine
//!
//! `Accepted -> Connected -> Initialized -> Ready -> Closing -> Closed`.
//! Closing and Closed are reachable from every state; Closed is terminal.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (None)

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Accepted by the manager, transport not yet readable
    Accepted,
    /// Transport reported readiness to read
    Connected,
    /// `initialize` completed successfully
    Initialized,
    /// The client sent the `initialized` notification
    Ready,
    /// Teardown in progress
    Closing,
    /// Terminal
    Closed,
}

impl ConnectionState {
    /// Whether the machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            // Closing/Closed are reachable from anywhere but Closed itself.
            (Closed, _) => false,
            (_, Closing) => true,
            (Closing, Closed) => true,
            (_, Closed) => true,

            (Accepted, Connected) => true,
            (Connected, Initialized) => true,
            (Initialized, Ready) => true,
            _ => false,
        }
    }

    /// Whether the handshake completed (`Initialized` or later, not closing)
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized | Self::Ready)
    }

    /// Whether the connection receives broadcasts
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether the connection is shutting down or gone
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accepted => "accepted",
            Self::Connected => "connected",
            Self::Initialized => "initialized",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
