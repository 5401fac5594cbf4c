//! Connection Record
//!
//! Per-connection state: the lifecycle state machine, negotiated protocol
//! data, the resource subscription set and the bounded outbound channel.
//! A connection is owned exclusively by the `ConnectionManager`; every
//! other component refers to it by id.
//!
//! Mutation discipline (enforced by call sites, per the concurrency model):
//! the subscription set is written only by the connection's ingress task;
//! the notification bus reads snapshots under the per-connection read lock.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// Layer 3: Internal module imports
use super::state::ConnectionState;
use crate::protocol::{ClientCapabilities, ClientInfo, JsonRpcMessage, ProtocolVersion};
use crate::session::Principal;

/// Connection-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The manager is at `MaxConnections`
    #[error("connection limit reached")]
    LimitExceeded,

    /// The state machine forbids the transition
    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The outbound channel is closed; the connection is going away
    #[error("connection {0} send channel closed")]
    SendChannelClosed(String),

    /// No connection with the id
    #[error("unknown connection {0}")]
    NotFound(String),
}

/// One client connection
#[derive(Debug)]
pub struct Connection {
    id: String,
    state: RwLock<ConnectionState>,
    /// Unix milliseconds of the last inbound activity
    last_activity: AtomicI64,
    client_info: RwLock<Option<ClientInfo>>,
    client_capabilities: RwLock<Option<ClientCapabilities>>,
    negotiated_version: RwLock<Option<ProtocolVersion>>,
    subscriptions: RwLock<HashSet<String>>,
    principal: RwLock<Option<Principal>>,
    outbound: mpsc::Sender<JsonRpcMessage>,
    closed: CancellationToken,
    close_reason: RwLock<Option<String>>,
}

impl Connection {
    /// Create a connection and the receiver its egress task drains
    pub fn new(send_queue_capacity: usize) -> (Self, mpsc::Receiver<JsonRpcMessage>) {
        let (outbound, receiver) = mpsc::channel(send_queue_capacity);
        let connection = Self {
            id: Uuid::new_v4().to_string(),
            state: RwLock::new(ConnectionState::Accepted),
            last_activity: AtomicI64::new(Utc::now().timestamp_millis()),
            client_info: RwLock::new(None),
            client_capabilities: RwLock::new(None),
            negotiated_version: RwLock::new(None),
            subscriptions: RwLock::new(HashSet::new()),
            principal: RwLock::new(None),
            outbound,
            closed: CancellationToken::new(),
            close_reason: RwLock::new(None),
        };
        (connection, receiver)
    }

    /// The connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Transition the state machine
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::InvalidTransition` for moves the machine
    /// forbids.
    pub fn transition_to(&self, next: ConnectionState) -> Result<(), ConnectionError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| ConnectionError::InvalidTransition {
                from: ConnectionState::Closed,
                to: next,
            })?;
        if !state.can_transition_to(next) {
            return Err(ConnectionError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    /// Record inbound activity now
    pub fn touch(&self) {
        self.last_activity
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Timestamp of the last inbound activity
    pub fn last_activity(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.last_activity.load(Ordering::Relaxed))
            .unwrap_or_else(Utc::now)
    }

    /// How long the connection has been idle at `now`
    pub fn idle_for(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.last_activity())
    }

    /// Store the handshake results
    pub fn record_initialization(
        &self,
        info: ClientInfo,
        capabilities: ClientCapabilities,
        version: ProtocolVersion,
    ) {
        if let Ok(mut slot) = self.client_info.write() {
            *slot = Some(info);
        }
        if let Ok(mut slot) = self.client_capabilities.write() {
            *slot = Some(capabilities);
        }
        if let Ok(mut slot) = self.negotiated_version.write() {
            *slot = Some(version);
        }
    }

    /// Client info captured during initialize
    pub fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().ok().and_then(|i| i.clone())
    }

    /// Client capabilities captured during initialize
    pub fn client_capabilities(&self) -> Option<ClientCapabilities> {
        self.client_capabilities.read().ok().and_then(|c| c.clone())
    }

    /// The protocol version negotiated for this connection
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.negotiated_version.read().ok().and_then(|v| *v)
    }

    /// Add a URI to the subscription set, returning whether it was new
    pub fn subscribe(&self, uri: &str) -> bool {
        self.subscriptions
            .write()
            .map(|mut subs| subs.insert(uri.to_string()))
            .unwrap_or(false)
    }

    /// Remove a URI from the subscription set, returning whether it existed
    pub fn unsubscribe(&self, uri: &str) -> bool {
        self.subscriptions
            .write()
            .map(|mut subs| subs.remove(uri))
            .unwrap_or(false)
    }

    /// Whether the connection subscribed to the URI
    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.subscriptions
            .read()
            .map(|subs| subs.contains(uri))
            .unwrap_or(false)
    }

    /// Snapshot of the subscription set
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions
            .read()
            .map(|subs| subs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Attach the authenticated principal (set by the host's authenticator)
    pub fn set_principal(&self, principal: Principal) {
        if let Ok(mut slot) = self.principal.write() {
            *slot = Some(principal);
        }
    }

    /// The authenticated principal, if the transport authenticated one
    pub fn principal(&self) -> Option<Principal> {
        self.principal.read().ok().and_then(|p| p.clone())
    }

    /// Identity used for rate limiting: the principal subject when
    /// authenticated, otherwise the connection id
    pub fn rate_limit_identity(&self) -> String {
        self.principal()
            .map(|p| p.subject)
            .unwrap_or_else(|| self.id.clone())
    }

    /// Enqueue an outbound message
    ///
    /// Awaits when the bounded send channel is full (writer-slow policy:
    /// backpressure propagates to the caller rather than dropping frames).
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::SendChannelClosed` when the egress task is
    /// gone.
    pub async fn send(&self, message: JsonRpcMessage) -> Result<(), ConnectionError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| ConnectionError::SendChannelClosed(self.id.clone()))
    }

    /// Begin teardown: move to Closing and wake the connection's tasks
    ///
    /// Idempotent; the first reason wins.
    pub fn begin_close(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.close_reason.write() {
            if slot.is_none() {
                *slot = Some(reason.into());
            }
        }
        let state = self.state();
        if !state.is_terminal() {
            let _ = self.transition_to(ConnectionState::Closing);
        }
        self.closed.cancel();
    }

    /// The recorded close reason, if teardown started
    pub fn close_reason(&self) -> Option<String> {
        self.close_reason.read().ok().and_then(|r| r.clone())
    }

    /// Token cancelled when teardown begins
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}
