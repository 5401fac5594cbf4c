//! Resource Registry
//!
//! Holds the registered resource providers and owns the change-event
//! channel providers publish into. Listing concatenates all providers;
//! reading probes providers in registration order until one claims the URI.

// Layer 1: Standard library imports
use std::sync::{Arc, RwLock};

// Layer 2: Third-party crate imports
use tokio::sync::mpsc;
use tracing::warn;

// Layer 3: Internal module imports
use super::events::{ObserverSet, RegistryEvent, RegistryObserver};
use crate::error::{McpError, McpResult};
use crate::protocol::{Content, ResourceDescriptor, Uri};
use crate::providers::{ResourceChangePublisher, ResourceProvider};

/// Thread-safe resource provider collection
pub struct ResourceRegistry {
    providers: RwLock<Vec<Arc<dyn ResourceProvider>>>,
    publisher: ResourceChangePublisher,
    change_stream: std::sync::Mutex<Option<mpsc::UnboundedReceiver<Uri>>>,
    observers: ObserverSet,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let (publisher, change_stream) = ResourceChangePublisher::channel();
        Self {
            providers: RwLock::new(Vec::new()),
            publisher,
            change_stream: std::sync::Mutex::new(Some(change_stream)),
            observers: ObserverSet::new(),
        }
    }

    /// Register a provider, handing it the change publisher
    pub fn register(&self, provider: Arc<dyn ResourceProvider>) {
        provider.attach_change_publisher(self.publisher.clone());
        if let Ok(mut providers) = self.providers.write() {
            providers.push(provider);
        }
        self.observers.notify(&RegistryEvent::ResourceProviderAdded);
    }

    /// Take the change stream for the server's fan-out pump
    ///
    /// Yields `Some` exactly once; the registry keeps publishing into the
    /// same channel for its whole lifetime.
    pub fn take_change_stream(&self) -> Option<mpsc::UnboundedReceiver<Uri>> {
        self.change_stream.lock().ok().and_then(|mut slot| slot.take())
    }

    /// The publisher handle, for hosts that emit changes on behalf of
    /// providers
    pub fn change_publisher(&self) -> ResourceChangePublisher {
        self.publisher.clone()
    }

    /// Snapshot of the registered providers
    fn snapshot(&self) -> Vec<Arc<dyn ResourceProvider>> {
        self.providers
            .read()
            .map(|providers| providers.clone())
            .unwrap_or_default()
    }

    /// Number of registered providers
    pub fn provider_count(&self) -> usize {
        self.providers.read().map(|p| p.len()).unwrap_or(0)
    }

    /// List resources across all providers
    ///
    /// A failing provider is skipped with a warning so one broken backend
    /// does not hide the others' resources.
    pub async fn list_all(&self) -> Vec<ResourceDescriptor> {
        let mut resources = Vec::new();
        for provider in self.snapshot() {
            match provider.list().await {
                Ok(mut listed) => resources.append(&mut listed),
                Err(error) => warn!(%error, "resource provider failed to list"),
            }
        }
        resources
    }

    /// Read a resource, probing providers in registration order
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceNotFound` when every provider disclaims
    /// the URI; any other provider error propagates immediately.
    pub async fn read(&self, uri: &Uri) -> McpResult<Vec<Content>> {
        for provider in self.snapshot() {
            match provider.read(uri).await {
                Ok(contents) => return Ok(contents),
                Err(McpError::ResourceNotFound { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(McpError::resource_not_found(uri.as_str()))
    }

    /// Forward a subscribe request to providers that support it
    ///
    /// Subscription bookkeeping lives on the connection; this call only
    /// gives providers a chance to start change detection for the URI.
    /// Providers without subscription support are ignored.
    pub async fn subscribe(&self, uri: &Uri) {
        for provider in self.snapshot() {
            match provider.subscribe(uri).await {
                Ok(()) | Err(McpError::CapabilityNotSupported { .. }) => {}
                Err(error) => warn!(%error, uri = %uri, "provider subscribe failed"),
            }
        }
    }

    /// Forward an unsubscribe request to providers that support it
    pub async fn unsubscribe(&self, uri: &Uri) {
        for provider in self.snapshot() {
            match provider.unsubscribe(uri).await {
                Ok(()) | Err(McpError::CapabilityNotSupported { .. }) => {}
                Err(error) => warn!(%error, uri = %uri, "provider unsubscribe failed"),
            }
        }
    }

    /// Subscribe to registration events
    pub fn subscribe_events(&self, observer: RegistryObserver) {
        self.observers.subscribe(observer);
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("providers", &self.provider_count())
            .finish()
    }
}
