//! Shared Server Context
//!
//! The bundle of registries, managers and configuration every handler
//! consults. Built once by the builder and shared as an `Arc` by the
//! router, the connection runtime and the background pumps.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (None)

// Layer 3: Internal module imports
use super::config::ServerConfig;
use crate::connection::ConnectionManager;
use crate::notification::NotificationBus;
use crate::progress::{CancellationManager, ProgressTracker};
use crate::protocol::{ServerCapabilities, VersionNegotiator};
use crate::ratelimit::RateLimiter;
use crate::registry::{PromptRegistry, ResourceRegistry, RootRegistry, ToolRegistry};
use crate::sampling::SamplingCaller;
use crate::session::SessionManager;

/// Everything a request handler can reach
pub struct ServerContext {
    /// Static configuration
    pub config: ServerConfig,

    /// Capabilities advertised in the initialize result
    pub capabilities: ServerCapabilities,

    /// Version negotiation over the configured supported set
    pub negotiator: VersionNegotiator,

    /// Tool registry
    pub tools: Arc<ToolRegistry>,

    /// Resource provider registry
    pub resources: Arc<ResourceRegistry>,

    /// Prompt provider registry
    pub prompts: Arc<PromptRegistry>,

    /// Root boundary registry
    pub roots: Arc<RootRegistry>,

    /// Live connections
    pub connections: Arc<ConnectionManager>,

    /// Notification fan-out
    pub bus: Arc<NotificationBus>,

    /// Progress token tracking
    pub progress: Arc<ProgressTracker>,

    /// In-flight table and cancellation fan-in
    pub cancellations: Arc<CancellationManager>,

    /// Server-initiated sampling calls
    pub sampling: Arc<SamplingCaller>,

    /// Admission rate limiting; `None` disables
    pub rate_limiter: Option<Arc<RateLimiter>>,

    /// Session lifecycle, when the host wired a user directory
    pub sessions: Option<Arc<SessionManager>>,
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("server", &self.config.server_info.name)
            .field("tools", &self.tools.len())
            .field("connections", &self.connections.count())
            .finish()
    }
}
