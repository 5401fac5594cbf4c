//! Server Builder
//!
//! Assembles the registries, managers and configuration into a running
//! `McpServer`. Capabilities are auto-detected from what was registered:
//! a server with tools advertises the tools capability (with list-changed
//! broadcasts), one with resource providers advertises resources with
//! subscription support, and so on. Logging is always available.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (None)

// Layer 3: Internal module imports
use super::config::ServerConfig;
use super::context::ServerContext;
use super::core::McpServer;
use crate::connection::ConnectionManager;
use crate::error::McpResult;
use crate::notification::NotificationBus;
use crate::progress::{CancellationManager, ProgressTracker};
use crate::protocol::{
    CompletionsCapability, LoggingCapability, PromptsCapability, ProtocolVersion,
    ResourcesCapability, Root, ServerCapabilities, ToolsCapability, VersionNegotiator,
};
use crate::providers::{PromptProvider, ResourceProvider, Tool};
use crate::ratelimit::{RateLimiter, RateLimiterConfig};
use crate::registry::{PromptRegistry, ResourceRegistry, RootRegistry, ToolRegistry};
use crate::sampling::SamplingCaller;
use crate::session::SessionManager;

/// Builder for [`McpServer`]
pub struct McpServerBuilder {
    config: ServerConfig,
    tools: Arc<ToolRegistry>,
    resources: Arc<ResourceRegistry>,
    prompts: Arc<PromptRegistry>,
    roots: Arc<RootRegistry>,
    sessions: Option<Arc<SessionManager>>,
    capabilities_override: Option<ServerCapabilities>,
    pending_tool_error: Option<crate::registry::RegistryError>,
}

impl McpServerBuilder {
    /// Start a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            tools: Arc::new(ToolRegistry::new()),
            resources: Arc::new(ResourceRegistry::new()),
            prompts: Arc::new(PromptRegistry::new()),
            roots: Arc::new(RootRegistry::new()),
            sessions: None,
            capabilities_override: None,
            pending_tool_error: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the server identity
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.server_info.name = name.into();
        self.config.server_info.version = version.into();
        self
    }

    /// Set the instructions returned from initialize
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = Some(instructions.into());
        self
    }

    /// Override the supported protocol versions
    pub fn supported_versions(mut self, versions: Vec<ProtocolVersion>) -> Self {
        self.config.supported_versions = versions;
        self
    }

    /// Toggle backward-compatible version negotiation
    pub fn backward_compatible(mut self, enabled: bool) -> Self {
        self.config.backward_compatible = enabled;
        self
    }

    /// Include truncated error detail in `error.data`
    pub fn debug_errors(mut self, enabled: bool) -> Self {
        self.config.debug_errors = enabled;
        self
    }

    /// Enable rate limiting
    pub fn with_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Register a tool
    ///
    /// Duplicate names surface as an error from [`Self::build`].
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        if let Err(error) = self.tools.register(Arc::new(tool)) {
            self.pending_tool_error.get_or_insert(error);
        }
        self
    }

    /// Register a resource provider
    pub fn with_resource_provider<P: ResourceProvider + 'static>(self, provider: P) -> Self {
        self.resources.register(Arc::new(provider));
        self
    }

    /// Register a prompt provider
    pub fn with_prompt_provider<P: PromptProvider + 'static>(self, provider: P) -> Self {
        self.prompts.register(Arc::new(provider));
        self
    }

    /// Add a root boundary
    pub fn with_root(self, root: Root) -> Self {
        self.roots.add(root);
        self
    }

    /// Attach a session manager
    pub fn with_session_manager(mut self, sessions: Arc<SessionManager>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Override the auto-detected capabilities
    pub fn capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities_override = Some(capabilities);
        self
    }

    /// Capabilities derived from what was registered
    fn detect_capabilities(&self) -> ServerCapabilities {
        let has_resources = self.resources.provider_count() > 0;
        let has_prompts = self.prompts.provider_count() > 0;
        ServerCapabilities {
            experimental: None,
            logging: Some(LoggingCapability::default()),
            tools: (!self.tools.is_empty()).then(|| ToolsCapability {
                list_changed: Some(true),
            }),
            resources: has_resources.then(|| ResourcesCapability {
                subscribe: Some(true),
                list_changed: Some(true),
            }),
            prompts: has_prompts.then(|| PromptsCapability {
                list_changed: Some(true),
            }),
            completions: (has_resources || has_prompts)
                .then(CompletionsCapability::default),
        }
    }

    /// Assemble and start the server
    ///
    /// Spawns the background sweepers and fan-out pumps; must be called
    /// inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the first tool registration error (duplicate name).
    pub fn build(self) -> McpResult<McpServer> {
        if let Some(error) = self.pending_tool_error {
            return Err(crate::error::McpError::invalid_request(error.to_string()));
        }

        let capabilities = self
            .capabilities_override
            .clone()
            .unwrap_or_else(|| self.detect_capabilities());

        let connections = Arc::new(ConnectionManager::new(self.config.connection.clone()));
        let bus = Arc::new(
            NotificationBus::new(Arc::clone(&connections), capabilities.clone())
                .with_log_rate(self.config.log_rate_per_second),
        );
        let progress = Arc::new(ProgressTracker::new(Arc::clone(&bus)));
        let cancellations = Arc::new(CancellationManager::new());
        let sampling = Arc::new(SamplingCaller::new(self.config.sampling.clone()));
        let rate_limiter = self
            .config
            .rate_limit
            .clone()
            .map(|config| Arc::new(RateLimiter::new(config)));
        let negotiator = VersionNegotiator::new(
            self.config.supported_versions.clone(),
            self.config.backward_compatible,
        );

        let context = Arc::new(ServerContext {
            config: self.config,
            capabilities,
            negotiator,
            tools: self.tools,
            resources: self.resources,
            prompts: self.prompts,
            roots: self.roots,
            connections,
            bus,
            progress,
            cancellations,
            sampling,
            rate_limiter,
            sessions: self.sessions,
        });

        Ok(McpServer::start(context))
    }
}

impl Default for McpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
