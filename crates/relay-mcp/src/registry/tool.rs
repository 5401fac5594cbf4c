//! Tool Registry
//!
//! Indexed collection of registered tools keyed by unique name. Mutations
//! fire registry events after they commit.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

// Layer 3: Internal module imports
use super::events::{ObserverSet, RegistryEvent, RegistryObserver};
use crate::protocol::ToolDescriptor;
use crate::providers::Tool;

/// Registration failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// Thread-safe tool collection with observable registration
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
    observers: ObserverSet,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] when the name is taken.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.descriptor().name;
        // DashMap entry keeps check-and-insert atomic under the shard lock.
        let entry = self.tools.entry(name.clone());
        match entry {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateTool(name));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(tool);
            }
        }
        debug!(tool = %name, "tool registered");
        self.observers.notify(&RegistryEvent::ToolAdded(name));
        Ok(())
    }

    /// Remove a tool by name, returning whether it existed
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.tools.remove(name).is_some();
        if removed {
            debug!(tool = %name, "tool unregistered");
            self.observers
                .notify(&RegistryEvent::ToolRemoved(name.to_string()));
        }
        removed
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Descriptors of all registered tools, sorted by name
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .iter()
            .map(|entry| entry.value().descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Subscribe to registration events
    pub fn subscribe(&self, observer: RegistryObserver) {
        self.observers.subscribe(observer);
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpResult;
    use crate::protocol::CallToolResult;
    use crate::providers::ToolContext;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: self.0.to_string(),
                description: None,
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, _arguments: Value, _ctx: ToolContext) -> McpResult<CallToolResult> {
            Ok(CallToolResult::success(vec![]))
        }
    }

    #[test]
    fn register_and_lookup() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("echo"))).unwrap();

        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_is_error() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("echo"))).unwrap();

        let err = registry.register(Arc::new(NamedTool("echo"))).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("echo".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn descriptors_sorted_by_name() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("zeta"))).unwrap();
        registry.register(Arc::new(NamedTool("alpha"))).unwrap();

        let names: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn events_fire_after_mutation_commits() {
        let registry = Arc::new(ToolRegistry::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let registry_in_observer = Arc::clone(&registry);
        let seen_in_observer = Arc::clone(&seen);
        registry.subscribe(Arc::new(move |event| {
            if let RegistryEvent::ToolAdded(name) = event {
                // The mutation must be visible to queries from the observer.
                assert!(registry_in_observer.get(name).is_some());
                seen_in_observer.fetch_add(1, Ordering::SeqCst);
            }
        }));

        registry.register(Arc::new(NamedTool("echo"))).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_fires_removed_event() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("echo"))).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_observer = Arc::clone(&seen);
        registry.subscribe(Arc::new(move |event| {
            if matches!(event, RegistryEvent::ToolRemoved(_)) {
                seen_in_observer.fetch_add(1, Ordering::SeqCst);
            }
        }));

        assert!(registry.unregister("echo"));
        assert!(!registry.unregister("echo"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
