//! Transport Abstractions
//!
//! The seam between the core and concrete transports. The core never frames
//! bytes itself: a transport produces a sequence of inbound text frames,
//! accepts outbound frames, and signals disconnect by ending the inbound
//! sequence. Concrete transports (line-delimited stdio, SSE over HTTP,
//! WebSocket) live outside the core and only implement these traits.
//!
//! A [`Transport`] splits into a receiving half and a sending half so the
//! connection runtime can dedicate exactly one ingress task to reads and one
//! egress task to writes.
//!
//! The in-memory [`ChannelTransport`] backs the integration tests and any
//! in-process host embedding.

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// Layer 3: Internal module imports
// (None)

/// Transport error types
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer is gone; no further frames can be sent
    #[error("transport closed")]
    Closed,

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Generic transport errors
    #[error("transport error: {message}")]
    Other { message: String },
}

/// Convenient result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Inbound half of a transport
///
/// `recv` yields the next raw text frame. `None` signals disconnect (EOF);
/// an `Err` item is a transport-level fault that also terminates the
/// connection.
#[async_trait]
pub trait FrameReceiver: Send + 'static {
    /// Receive the next inbound frame
    async fn recv(&mut self) -> Option<TransportResult<String>>;
}

/// Outbound half of a transport
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Send one outbound frame
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the peer is gone.
    async fn send(&mut self, frame: String) -> TransportResult<()>;

    /// Close the outbound direction
    ///
    /// # Errors
    ///
    /// Returns a transport error when the close handshake fails.
    async fn close(&mut self) -> TransportResult<()>;
}

/// A bidirectional transport that splits into its two halves
pub trait Transport: Send + 'static {
    /// Receiving half type
    type Receiver: FrameReceiver;
    /// Sending half type
    type Sink: FrameSink;

    /// Split into (receiver, sink), consumed by the connection runtime
    fn split(self) -> (Self::Receiver, Self::Sink);
}

/// In-memory duplex transport over tokio channels
///
/// `ChannelTransport::pair()` returns the server-side transport and a
/// [`ClientHandle`] representing the remote peer. Frames the client pushes
/// appear on the server's receiver; frames the server sends appear on the
/// client's outbound stream. Dropping the client handle signals disconnect.
pub struct ChannelTransport {
    inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<String>,
}

/// The peer side of a [`ChannelTransport`]
pub struct ClientHandle {
    to_server: mpsc::Sender<String>,
    from_server: mpsc::Receiver<String>,
}

impl ChannelTransport {
    /// Default channel depth for test transports
    const CHANNEL_CAPACITY: usize = 64;

    /// Create a connected (transport, client) pair
    pub fn pair() -> (Self, ClientHandle) {
        Self::pair_with_capacity(Self::CHANNEL_CAPACITY)
    }

    /// Create a pair with an explicit channel depth
    pub fn pair_with_capacity(capacity: usize) -> (Self, ClientHandle) {
        let (to_server, inbound) = mpsc::channel(capacity);
        let (outbound, from_server) = mpsc::channel(capacity);
        (
            Self { inbound, outbound },
            ClientHandle {
                to_server,
                from_server,
            },
        )
    }
}

impl ClientHandle {
    /// Push a frame toward the server
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the server side is gone.
    pub async fn send(&self, frame: impl Into<String>) -> TransportResult<()> {
        self.to_server
            .send(frame.into())
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Receive the next frame the server emitted, `None` on close
    pub async fn recv(&mut self) -> Option<String> {
        self.from_server.recv().await
    }

    /// Receive with a deadline; `None` on close or timeout
    pub async fn recv_timeout(&mut self, timeout: std::time::Duration) -> Option<String> {
        tokio::time::timeout(timeout, self.from_server.recv())
            .await
            .ok()
            .flatten()
    }
}

/// Receiving half of [`ChannelTransport`]
pub struct ChannelReceiver {
    inbound: mpsc::Receiver<String>,
}

/// Sending half of [`ChannelTransport`]
pub struct ChannelSink {
    outbound: Option<mpsc::Sender<String>>,
}

impl Transport for ChannelTransport {
    type Receiver = ChannelReceiver;
    type Sink = ChannelSink;

    fn split(self) -> (Self::Receiver, Self::Sink) {
        (
            ChannelReceiver {
                inbound: self.inbound,
            },
            ChannelSink {
                outbound: Some(self.outbound),
            },
        )
    }
}

#[async_trait]
impl FrameReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Option<TransportResult<String>> {
        self.inbound.recv().await.map(Ok)
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> TransportResult<()> {
        match &self.outbound {
            Some(sender) => sender
                .send(frame)
                .await
                .map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.outbound = None;
        Ok(())
    }
}
