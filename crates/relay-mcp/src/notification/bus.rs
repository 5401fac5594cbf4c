//! Notification Bus
//!
//! All server-initiated notifications flow through here: direct sends to a
//! connection, capability-gated `*/list_changed` broadcasts, subscription-
//! scoped resource updates, progress updates and log emission. The bus
//! holds the connection manager and turns (connection id, payload) into a
//! send enqueue; it owns no connection state of its own.
//!
//! Log emission is filtered by a lifecycle-scoped atomic minimum level and
//! rate-limited per logger so a runaway provider cannot starve traffic.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{trace, warn};

// Layer 3: Internal module imports
use super::sanitize::sanitize_value;
use crate::connection::{ConnectionError, ConnectionManager};
use crate::protocol::constants::{defaults, notifications};
use crate::protocol::{
    JsonRpcMessage, JsonRpcNotification, LogLevel, LoggingMessageParams, ProgressParams,
    ResourceUpdatedParams, ServerCapabilities, Uri,
};

/// Anonymous logger bucket for emissions without a logger name
const DEFAULT_LOGGER: &str = "<default>";

/// Per-logger emission window (timestamps within the last second)
#[derive(Debug, Default)]
struct EmissionWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl EmissionWindow {
    /// Record an emission at `now` if the per-second budget allows it
    fn try_emit(&mut self, now: DateTime<Utc>, per_second: u32) -> bool {
        let cutoff = now - TimeDelta::seconds(1);
        while self
            .timestamps
            .front()
            .map(|t| *t <= cutoff)
            .unwrap_or(false)
        {
            self.timestamps.pop_front();
        }
        if self.timestamps.len() >= per_second as usize {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }
}

/// Server-side notification fan-out
#[derive(Debug)]
pub struct NotificationBus {
    connections: Arc<ConnectionManager>,
    capabilities: ServerCapabilities,
    min_level: AtomicU8,
    log_rate_per_second: u32,
    logger_windows: DashMap<String, Mutex<EmissionWindow>>,
}

impl NotificationBus {
    /// Create a bus over the given connection set
    pub fn new(connections: Arc<ConnectionManager>, capabilities: ServerCapabilities) -> Self {
        Self {
            connections,
            capabilities,
            min_level: AtomicU8::new(LogLevel::Info.index()),
            log_rate_per_second: defaults::LOG_MESSAGES_PER_SECOND,
            logger_windows: DashMap::new(),
        }
    }

    /// Override the per-logger emission cap
    pub fn with_log_rate(mut self, per_second: u32) -> Self {
        self.log_rate_per_second = per_second;
        self
    }

    /// The capabilities the bus gates broadcasts on
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Send a notification to one connection
    ///
    /// # Errors
    ///
    /// Returns a connection error for unknown or closing connections.
    pub async fn notify(
        &self,
        connection_id: &str,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), ConnectionError> {
        self.connections
            .send_to(
                connection_id,
                JsonRpcMessage::Notification(JsonRpcNotification::new(method, params)),
            )
            .await
    }

    /// Broadcast a notification to every Ready connection
    pub async fn broadcast(
        &self,
        method: &str,
        params: Option<Value>,
        exclude: Option<&str>,
    ) -> usize {
        self.connections
            .broadcast(JsonRpcNotification::new(method, params), exclude)
            .await
    }

    /// Broadcast `notifications/tools/list_changed` if the capability
    /// declares it
    pub async fn tools_list_changed(&self) {
        if self.capabilities.tools_list_changed() {
            self.broadcast(notifications::TOOLS_LIST_CHANGED, None, None)
                .await;
        }
    }

    /// Broadcast `notifications/resources/list_changed` if declared
    pub async fn resources_list_changed(&self) {
        if self.capabilities.resources_list_changed() {
            self.broadcast(notifications::RESOURCES_LIST_CHANGED, None, None)
                .await;
        }
    }

    /// Broadcast `notifications/prompts/list_changed` if declared
    pub async fn prompts_list_changed(&self) {
        if self.capabilities.prompts_list_changed() {
            self.broadcast(notifications::PROMPTS_LIST_CHANGED, None, None)
                .await;
        }
    }

    /// Broadcast `notifications/roots/list_changed`
    pub async fn roots_list_changed(&self) {
        self.broadcast(notifications::ROOTS_LIST_CHANGED, None, None)
            .await;
    }

    /// Fan `notifications/resources/updated` out to subscribed connections
    pub async fn resource_updated(&self, uri: &Uri) -> usize {
        let params = ResourceUpdatedParams { uri: uri.clone() };
        let params = match serde_json::to_value(&params) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "failed to encode resource update");
                return 0;
            }
        };
        self.connections
            .fan_out_to_subscribers(
                uri.as_str(),
                JsonRpcNotification::new(notifications::RESOURCES_UPDATED, Some(params)),
            )
            .await
    }

    /// Send a progress update to the connection that supplied the token
    pub async fn progress(&self, connection_id: &str, params: ProgressParams) {
        let params = match serde_json::to_value(&params) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "failed to encode progress update");
                return;
            }
        };
        if let Err(error) = self
            .notify(connection_id, notifications::PROGRESS, Some(params))
            .await
        {
            trace!(connection = %connection_id, %error, "progress notification dropped");
        }
    }

    /// The current minimum emission level
    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_index(self.min_level.load(Ordering::Relaxed))
    }

    /// Update the minimum emission level (`logging/setLevel`)
    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.index(), Ordering::Relaxed);
    }

    /// Emit a log message to every Ready connection
    ///
    /// The message is dropped when the logging capability is absent, when
    /// `level` is below the configured minimum, or when the logger exceeded
    /// its per-second budget. Payloads are sanitized before leaving the
    /// process. Returns whether the message was emitted.
    pub async fn log(&self, level: LogLevel, logger: Option<&str>, data: Value) -> bool {
        if self.capabilities.logging.is_none() {
            return false;
        }
        if level < self.min_level() {
            return false;
        }

        let bucket = logger.unwrap_or(DEFAULT_LOGGER).to_string();
        let now = Utc::now();
        let within_budget = {
            let window = self
                .logger_windows
                .entry(bucket.clone())
                .or_insert_with(|| Mutex::new(EmissionWindow::default()));
            window
                .lock()
                .map(|mut w| w.try_emit(now, self.log_rate_per_second))
                .unwrap_or(false)
        };
        if !within_budget {
            trace!(logger = %bucket, "log emission suppressed by rate cap");
            return false;
        }

        let params = LoggingMessageParams {
            level: level.as_str().to_string(),
            logger: logger.map(str::to_string),
            data: sanitize_value(&data),
        };
        let params = match serde_json::to_value(&params) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "failed to encode log message");
                return false;
            }
        };

        self.broadcast(notifications::MESSAGE, Some(params), None)
            .await;
        true
    }
}
