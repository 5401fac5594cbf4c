//! Progress Tracking
//!
//! Token-keyed tracking of long-running operations. A token is registered
//! when an operation begins; updates clamp progress to [0, 100] and emit
//! `notifications/progress` to the connection that supplied the token;
//! `complete`/`fail` emit a final update and drop the token. A sweeper
//! closes tokens idle beyond one hour.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Layer 3: Internal module imports
use crate::notification::NotificationBus;
use crate::protocol::constants::defaults;
use crate::protocol::ProgressParams;

/// A tracked long-running operation
#[derive(Debug, Clone)]
pub struct ProgressOperation {
    /// Opaque client-supplied token
    pub token: String,
    /// Connection that receives this operation's updates
    pub connection_id: String,
    /// Progress in [0, 100]
    pub progress: f64,
    /// Optional total units of work
    pub total: Option<f64>,
    /// Latest status message
    pub message: Option<String>,
    /// When the operation began
    pub started_at: DateTime<Utc>,
    /// Last update time (drives the idle sweep)
    pub last_update_at: DateTime<Utc>,
}

/// Token-keyed progress registry
#[derive(Debug)]
pub struct ProgressTracker {
    operations: DashMap<String, ProgressOperation>,
    bus: Arc<NotificationBus>,
    idle_expiry: TimeDelta,
}

impl ProgressTracker {
    /// Create a tracker emitting through the given bus
    pub fn new(bus: Arc<NotificationBus>) -> Self {
        Self {
            operations: DashMap::new(),
            bus,
            idle_expiry: TimeDelta::seconds(defaults::IDLE_ENTRY_EXPIRY_SECS),
        }
    }

    /// Register a token for an operation on `connection_id`
    ///
    /// Re-registering an existing token resets it.
    pub fn begin(&self, token: impl Into<String>, connection_id: impl Into<String>) {
        let token = token.into();
        let now = Utc::now();
        self.operations.insert(
            token.clone(),
            ProgressOperation {
                token,
                connection_id: connection_id.into(),
                progress: 0.0,
                total: None,
                message: None,
                started_at: now,
                last_update_at: now,
            },
        );
    }

    /// Whether a token is live
    pub fn is_tracked(&self, token: &str) -> bool {
        self.operations.contains_key(token)
    }

    /// Number of live tokens
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no tokens are live
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Update an operation and emit `notifications/progress`
    ///
    /// Progress is clamped to [0, 100]. Updates for unknown tokens are
    /// ignored (the operation may have completed or been swept).
    pub async fn update(
        &self,
        token: &str,
        progress: f64,
        total: Option<f64>,
        message: Option<String>,
    ) {
        let clamped = progress.clamp(0.0, 100.0);
        let Some(params) = self.stamp(token, clamped, total, message) else {
            return;
        };
        let connection_id = match self.operations.get(token) {
            Some(op) => op.connection_id.clone(),
            None => return,
        };
        self.bus.progress(&connection_id, params).await;
    }

    /// Emit a final 100% update and drop the token
    pub async fn complete(&self, token: &str, message: Option<String>) {
        let Some((_, operation)) = self.operations.remove(token) else {
            return;
        };
        self.bus
            .progress(
                &operation.connection_id,
                ProgressParams {
                    progress_token: operation.token,
                    progress: 100.0,
                    total: operation.total,
                    message,
                },
            )
            .await;
    }

    /// Emit a final failure update and drop the token
    pub async fn fail(&self, token: &str, message: impl Into<String>) {
        let Some((_, operation)) = self.operations.remove(token) else {
            return;
        };
        self.bus
            .progress(
                &operation.connection_id,
                ProgressParams {
                    progress_token: operation.token,
                    progress: operation.progress,
                    total: operation.total,
                    message: Some(message.into()),
                },
            )
            .await;
    }

    /// Drop every token bound to a connection (used at teardown)
    pub fn drop_for_connection(&self, connection_id: &str) {
        let stale: Vec<String> = self
            .operations
            .iter()
            .filter(|entry| entry.value().connection_id == connection_id)
            .map(|entry| entry.key().clone())
            .collect();
        for token in stale {
            self.operations.remove(&token);
        }
    }

    /// Record the update in the table; `None` when the token is unknown
    fn stamp(
        &self,
        token: &str,
        progress: f64,
        total: Option<f64>,
        message: Option<String>,
    ) -> Option<ProgressParams> {
        let mut entry = self.operations.get_mut(token)?;
        entry.progress = progress;
        if total.is_some() {
            entry.total = total;
        }
        if message.is_some() {
            entry.message = message.clone();
        }
        entry.last_update_at = Utc::now();
        Some(ProgressParams {
            progress_token: entry.token.clone(),
            progress,
            total: entry.total,
            message,
        })
    }

    /// Drop tokens idle beyond the expiry; returns how many were dropped
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let stale: Vec<String> = self
            .operations
            .iter()
            .filter(|entry| {
                now.signed_duration_since(entry.value().last_update_at) > self.idle_expiry
            })
            .map(|entry| entry.key().clone())
            .collect();

        let swept = stale.len();
        for token in stale {
            self.operations.remove(&token);
        }
        if swept > 0 {
            debug!(swept, "swept expired progress tokens");
        }
        swept
    }

    /// Start the periodic sweep task; runs until `shutdown` is cancelled
    pub fn start_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(defaults::SWEEP_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracker.sweep_expired(Utc::now());
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("progress sweeper shut down");
        })
    }

    /// Handle scoped to one token, handed to tool executions
    pub fn handle(self: &Arc<Self>, token: impl Into<String>) -> ProgressHandle {
        ProgressHandle {
            tracker: Arc::clone(self),
            token: token.into(),
        }
    }
}

/// Cheap per-operation reporter handed to tools
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tracker: Arc<ProgressTracker>,
    token: String,
}

impl ProgressHandle {
    /// The token this handle reports under
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Report progress (clamped to [0, 100])
    pub async fn report(&self, progress: f64, message: Option<String>) {
        self.tracker
            .update(&self.token, progress, None, message)
            .await;
    }

    /// Report progress against a known total
    pub async fn report_with_total(&self, progress: f64, total: f64) {
        self.tracker
            .update(&self.token, progress, Some(total), None)
            .await;
    }
}
