//! Resource Provider Contract
//!
//! A resource provider lists resources and reads their content by URI.
//! Providers that can observe changes publish affected URIs through the
//! [`ResourceChangePublisher`] handed to them at registration; the server
//! fans those events out to subscribed connections only.

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;

// Layer 3: Internal module imports
use crate::error::{McpError, McpResult};
use crate::protocol::{Content, ResourceDescriptor, Uri};

/// Handle through which a provider announces resource changes
///
/// Cloneable and cheap; sends never block. Events published before the
/// server's fan-out pump starts, or after shutdown, are dropped silently.
#[derive(Debug, Clone)]
pub struct ResourceChangePublisher {
    sender: mpsc::UnboundedSender<Uri>,
}

impl ResourceChangePublisher {
    /// Create a publisher and the stream the server consumes
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Uri>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Announce that the resource at `uri` changed
    pub fn resource_changed(&self, uri: Uri) {
        if self.sender.send(uri).is_err() {
            trace!("resource change dropped: server fan-out pump is gone");
        }
    }
}

/// Provider of readable (and optionally observable) resources
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// List the resources this provider exposes
    ///
    /// # Errors
    ///
    /// Returns an error when enumeration fails (e.g. backing store I/O).
    async fn list(&self) -> McpResult<Vec<ResourceDescriptor>>;

    /// Read the content of a resource
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceNotFound` for URIs this provider does not
    /// own; the registry uses that to continue probing other providers.
    async fn read(&self, uri: &Uri) -> McpResult<Vec<Content>>;

    /// Receive the publisher for change events
    ///
    /// Called once at registration. The default implementation discards it;
    /// providers without change detection need not override.
    fn attach_change_publisher(&self, _publisher: ResourceChangePublisher) {}

    /// Begin watching a URI for changes (optional)
    ///
    /// # Errors
    ///
    /// The default implementation rejects with `CapabilityNotSupported`.
    async fn subscribe(&self, _uri: &Uri) -> McpResult<()> {
        Err(McpError::capability_not_supported("resource subscriptions"))
    }

    /// Stop watching a URI (optional)
    ///
    /// # Errors
    ///
    /// The default implementation rejects with `CapabilityNotSupported`.
    async fn unsubscribe(&self, _uri: &Uri) -> McpResult<()> {
        Err(McpError::capability_not_supported("resource subscriptions"))
    }
}
