//! Server Configuration

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (None)

// Layer 3: Internal module imports
use crate::connection::ConnectionConfig;
use crate::protocol::constants::defaults;
use crate::protocol::{ProtocolVersion, ServerInfo};
use crate::ratelimit::RateLimiterConfig;
use crate::sampling::SamplingConfig;

/// Protocol revisions this build speaks, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: [ProtocolVersion; 3] = [
    ProtocolVersion::new(1, 0, 0),
    ProtocolVersion::new(0, 2, 0),
    ProtocolVersion::new(0, 1, 0),
];

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server identity sent in the initialize result
    pub server_info: ServerInfo,

    /// Optional instructions for the client
    pub instructions: Option<String>,

    /// Protocol versions offered during negotiation
    pub supported_versions: Vec<ProtocolVersion>,

    /// Whether negotiation may fall back across patch/minor versions
    pub backward_compatible: bool,

    /// Include truncated error detail in `error.data` (never in production)
    pub debug_errors: bool,

    /// Connection plane settings
    pub connection: ConnectionConfig,

    /// Sampling caller settings
    pub sampling: SamplingConfig,

    /// Rate limiting; `None` disables admission checks
    pub rate_limit: Option<RateLimiterConfig>,

    /// Deadline for draining outbound queues during shutdown
    pub drain_deadline: Duration,

    /// Per-logger cap for `notifications/message` emission
    pub log_rate_per_second: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_info: ServerInfo {
                name: defaults::SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
            supported_versions: SUPPORTED_PROTOCOL_VERSIONS.to_vec(),
            backward_compatible: true,
            debug_errors: false,
            connection: ConnectionConfig::default(),
            sampling: SamplingConfig::default(),
            rate_limit: None,
            drain_deadline: Duration::from_secs(defaults::DRAIN_DEADLINE_SECS),
            log_rate_per_second: defaults::LOG_MESSAGES_PER_SECOND,
        }
    }
}
