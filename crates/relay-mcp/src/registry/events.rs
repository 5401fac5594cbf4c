//! Registry Observer Relation
//!
//! Registries expose a small synchronous observer set: callers subscribe a
//! callback that is invoked after a mutation has committed, so an observer
//! that immediately re-queries the registry sees the new state. The
//! notification bus is the only core subscriber; hosts may add their own.

// Layer 1: Standard library imports
use std::sync::{Arc, RwLock};

// Layer 2: Third-party crate imports
// (None)

// Layer 3: Internal module imports
// (None)

/// A change committed by a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A tool was registered
    ToolAdded(String),
    /// A tool was removed
    ToolRemoved(String),
    /// A resource provider was registered
    ResourceProviderAdded,
    /// A prompt provider was registered
    PromptProviderAdded,
    /// The root set was replaced or extended
    RootsChanged,
}

/// Observer callback invoked synchronously after a mutation commits
pub type RegistryObserver = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// A set of observers shared by one registry
#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<RegistryObserver>>,
}

impl ObserverSet {
    /// Create an empty observer set
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a callback
    pub fn subscribe(&self, observer: RegistryObserver) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }

    /// Notify all observers of a committed event
    pub fn notify(&self, event: &RegistryEvent) {
        let snapshot: Vec<RegistryObserver> = match self.observers.read() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };
        for observer in snapshot {
            observer(event);
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.observers.read().map(|o| o.len()).unwrap_or(0);
        f.debug_struct("ObserverSet").field("count", &count).finish()
    }
}
