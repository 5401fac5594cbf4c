//! Prompt Registry

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// Layer 2: Third-party crate imports
use tracing::warn;

// Layer 3: Internal module imports
use super::events::{ObserverSet, RegistryEvent, RegistryObserver};
use crate::error::{McpError, McpResult};
use crate::protocol::{PromptDescriptor, PromptMessage};
use crate::providers::PromptProvider;

/// Thread-safe prompt provider collection
#[derive(Default)]
pub struct PromptRegistry {
    providers: RwLock<Vec<Arc<dyn PromptProvider>>>,
    observers: ObserverSet,
}

impl PromptRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    pub fn register(&self, provider: Arc<dyn PromptProvider>) {
        if let Ok(mut providers) = self.providers.write() {
            providers.push(provider);
        }
        self.observers.notify(&RegistryEvent::PromptProviderAdded);
    }

    fn snapshot(&self) -> Vec<Arc<dyn PromptProvider>> {
        self.providers
            .read()
            .map(|providers| providers.clone())
            .unwrap_or_default()
    }

    /// Number of registered providers
    pub fn provider_count(&self) -> usize {
        self.providers.read().map(|p| p.len()).unwrap_or(0)
    }

    /// List prompts across all providers
    pub async fn list_all(&self) -> Vec<PromptDescriptor> {
        let mut prompts = Vec::new();
        for provider in self.snapshot() {
            match provider.list().await {
                Ok(mut listed) => prompts.append(&mut listed),
                Err(error) => warn!(%error, "prompt provider failed to list"),
            }
        }
        prompts
    }

    /// Find a prompt descriptor by name
    pub async fn find(&self, name: &str) -> Option<PromptDescriptor> {
        self.list_all().await.into_iter().find(|p| p.name == name)
    }

    /// Render a prompt, probing providers in registration order
    ///
    /// # Errors
    ///
    /// Returns `McpError::PromptNotFound` when every provider disclaims the
    /// name; any other provider error propagates immediately.
    pub async fn get(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> McpResult<(Option<String>, Vec<PromptMessage>)> {
        for provider in self.snapshot() {
            match provider.get(name, arguments.clone()).await {
                Ok(rendered) => return Ok(rendered),
                Err(McpError::PromptNotFound { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(McpError::prompt_not_found(name))
    }

    /// Subscribe to registration events
    pub fn subscribe_events(&self, observer: RegistryObserver) {
        self.observers.subscribe(observer);
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("providers", &self.provider_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Content, PromptArgument};
    use async_trait::async_trait;

    struct Greeter;

    #[async_trait]
    impl PromptProvider for Greeter {
        async fn list(&self) -> McpResult<Vec<PromptDescriptor>> {
            Ok(vec![PromptDescriptor {
                name: "greeting".to_string(),
                description: Some("Greets someone".to_string()),
                arguments: vec![PromptArgument::required("person", Some("Who to greet"))],
            }])
        }

        async fn get(
            &self,
            name: &str,
            arguments: HashMap<String, String>,
        ) -> McpResult<(Option<String>, Vec<PromptMessage>)> {
            if name != "greeting" {
                return Err(McpError::prompt_not_found(name));
            }
            let person = arguments
                .get("person")
                .ok_or_else(|| McpError::invalid_params("missing argument 'person'"))?;
            Ok((
                None,
                vec![PromptMessage::user(Content::text(format!("Hello {person}")))],
            ))
        }
    }

    #[tokio::test]
    async fn render_known_prompt() {
        let registry = PromptRegistry::new();
        registry.register(Arc::new(Greeter));

        let mut arguments = HashMap::new();
        arguments.insert("person".to_string(), "Ada".to_string());

        let (_, messages) = registry.get("greeting", arguments).await.unwrap();
        assert_eq!(messages[0].content.as_text(), Some("Hello Ada"));
    }

    #[tokio::test]
    async fn unknown_prompt_not_found() {
        let registry = PromptRegistry::new();
        registry.register(Arc::new(Greeter));

        let err = registry.get("missing", HashMap::new()).await.unwrap_err();
        assert!(matches!(err, McpError::PromptNotFound { .. }));
    }

    #[tokio::test]
    async fn find_returns_descriptor() {
        let registry = PromptRegistry::new();
        registry.register(Arc::new(Greeter));

        let descriptor = registry.find("greeting").await.unwrap();
        assert_eq!(descriptor.arguments.len(), 1);
        assert!(registry.find("missing").await.is_none());
    }
}
