//! Rate Limiter
//!
//! Two-level, cost-aware rate limiting over per-(identity, resource)
//! windows. A global per-identity window (when configured) is charged
//! first; if the resource-specific check then denies, the global charge is
//! rolled back so accounting stays exact. Allowlisted identities bypass
//! every check. A periodic sweep drops windows untouched for more than an
//! hour.
//!
//! The window map is a lock-free `DashMap`; each window's entry/count pair
//! is guarded by its own `std::sync::Mutex`, held only for the few
//! instructions of a charge.

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

// Layer 3: Internal module imports
use super::window::{RateLimitMode, WindowState};
use crate::protocol::constants::defaults;

/// Pseudo-resource name for the per-identity global window
const GLOBAL_RESOURCE: &str = "*";

/// A (limit, duration) budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitQuota {
    /// Maximum accumulated cost within the window
    pub limit: u64,
    /// Window duration
    pub window: TimeDelta,
}

impl RateLimitQuota {
    /// Create a quota
    pub fn new(limit: u64, window: TimeDelta) -> Self {
        Self { limit, window }
    }

    /// `limit` requests per minute
    pub fn per_minute(limit: u64) -> Self {
        Self::new(limit, TimeDelta::seconds(60))
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Window accounting model
    pub mode: RateLimitMode,

    /// Budget applied to any resource without a specific quota
    pub default_quota: RateLimitQuota,

    /// Per-resource quota overrides (keyed by method name)
    pub resource_quotas: HashMap<String, RateLimitQuota>,

    /// Per-identity budget across all resources, charged before the
    /// resource check; `None` disables the global level
    pub global_quota: Option<RateLimitQuota>,

    /// Per-operation cost overrides (default cost is 1)
    pub operation_costs: HashMap<String, u64>,

    /// Identities that bypass all checks
    pub allowlist: HashSet<String>,

    /// How often the sweep task runs
    pub sweep_interval: Duration,

    /// Windows untouched longer than this are dropped by the sweep
    pub idle_expiry: TimeDelta,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            mode: RateLimitMode::Sliding,
            default_quota: RateLimitQuota::per_minute(100),
            resource_quotas: HashMap::new(),
            global_quota: None,
            operation_costs: HashMap::new(),
            allowlist: HashSet::new(),
            sweep_interval: Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
            idle_expiry: TimeDelta::seconds(defaults::IDLE_ENTRY_EXPIRY_SECS),
        }
    }
}

impl RateLimiterConfig {
    /// Set a quota for a specific resource
    pub fn with_resource_quota(mut self, resource: impl Into<String>, quota: RateLimitQuota) -> Self {
        self.resource_quotas.insert(resource.into(), quota);
        self
    }

    /// Set the per-identity global quota
    pub fn with_global_quota(mut self, quota: RateLimitQuota) -> Self {
        self.global_quota = Some(quota);
        self
    }

    /// Set a cost override for an operation
    pub fn with_operation_cost(mut self, resource: impl Into<String>, cost: u64) -> Self {
        self.operation_costs.insert(resource.into(), cost);
        self
    }

    /// Add an identity to the allowlist
    pub fn with_allowlisted(mut self, identity: impl Into<String>) -> Self {
        self.allowlist.insert(identity.into());
        self
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Capacity left in the deciding window; `u64::MAX` for allowlisted
    /// identities (unlimited)
    pub remaining: u64,
    /// Limit of the deciding window
    pub limit: u64,
    /// When the deciding window frees capacity
    pub resets_at: DateTime<Utc>,
    /// Time to wait before retrying; set on denial
    pub retry_after: Option<TimeDelta>,
    /// Which level denied ("global" or the resource name); set on denial
    pub reason: Option<String>,
}

/// One window slot: per-window lock inside the lock-free map
#[derive(Debug)]
struct WindowSlot {
    state: Mutex<WindowState>,
    last_touched: Mutex<DateTime<Utc>>,
}

/// Two-level, cost-aware rate limiter
///
/// `check(identity, resource)` charges the identity's global window (when
/// configured) and the (identity, resource) window, rolling the global
/// charge back on resource-level denial.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<(String, String), Arc<WindowSlot>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a limiter with the given configuration
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// The effective cost of an operation
    fn cost_of(&self, resource: &str) -> u64 {
        self.config
            .operation_costs
            .get(resource)
            .copied()
            .unwrap_or(1)
    }

    /// The effective quota for a resource
    fn quota_of(&self, resource: &str) -> RateLimitQuota {
        self.config
            .resource_quotas
            .get(resource)
            .copied()
            .unwrap_or(self.config.default_quota)
    }

    fn slot(&self, identity: &str, resource: &str, now: DateTime<Utc>) -> Arc<WindowSlot> {
        let key = (identity.to_string(), resource.to_string());
        let slot = self.windows.entry(key).or_insert_with(|| {
            Arc::new(WindowSlot {
                state: Mutex::new(WindowState::new(self.config.mode, now)),
                last_touched: Mutex::new(now),
            })
        });
        Arc::clone(slot.value())
    }

    fn charge(
        &self,
        identity: &str,
        resource: &str,
        quota: RateLimitQuota,
        cost: u64,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let slot = self.slot(identity, resource, now);
        if let Ok(mut touched) = slot.last_touched.lock() {
            *touched = now;
        }

        let outcome = match slot.state.lock() {
            Ok(mut state) => state.charge(quota.limit, quota.window, cost, now),
            // A poisoned window fails open rather than wedging the identity.
            Err(_) => {
                return RateLimitDecision {
                    allowed: true,
                    remaining: quota.limit,
                    limit: quota.limit,
                    resets_at: now + quota.window,
                    retry_after: None,
                    reason: None,
                }
            }
        };

        RateLimitDecision {
            allowed: outcome.allowed,
            remaining: outcome.remaining,
            limit: quota.limit,
            resets_at: outcome.resets_at,
            retry_after: (!outcome.allowed).then(|| (outcome.resets_at - now).max(TimeDelta::zero())),
            reason: (!outcome.allowed).then(|| resource.to_string()),
        }
    }

    fn uncharge(&self, identity: &str, resource: &str, cost: u64) {
        let key = (identity.to_string(), resource.to_string());
        if let Some(slot) = self.windows.get(&key) {
            if let Ok(mut state) = slot.state.lock() {
                state.uncharge(cost);
            }
        }
    }

    /// Check whether `identity` may perform `resource` now
    pub fn check(&self, identity: &str, resource: &str) -> RateLimitDecision {
        self.check_at(identity, resource, Utc::now())
    }

    /// Check at an explicit timestamp (deterministic variant of [`check`])
    ///
    /// [`check`]: RateLimiter::check
    pub fn check_at(
        &self,
        identity: &str,
        resource: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        if self.config.allowlist.contains(identity) {
            trace!(identity, resource, "allowlisted identity bypasses rate limit");
            return RateLimitDecision {
                allowed: true,
                remaining: u64::MAX,
                limit: u64::MAX,
                resets_at: now,
                retry_after: None,
                reason: None,
            };
        }

        let cost = self.cost_of(resource);

        // Level one: the identity's global window.
        let global_charged = if let Some(global_quota) = self.config.global_quota {
            let decision = self.charge(identity, GLOBAL_RESOURCE, global_quota, cost, now);
            if !decision.allowed {
                debug!(identity, resource, "denied by global rate window");
                return RateLimitDecision {
                    reason: Some("global".to_string()),
                    ..decision
                };
            }
            true
        } else {
            false
        };

        // Level two: the resource window. On denial the global charge is
        // rolled back so the identity is not billed for a rejected call.
        let decision = self.charge(identity, resource, self.quota_of(resource), cost, now);
        if !decision.allowed && global_charged {
            self.uncharge(identity, GLOBAL_RESOURCE, cost);
        }
        if !decision.allowed {
            debug!(identity, resource, "denied by resource rate window");
        }
        decision
    }

    /// Number of live windows (for tests and introspection)
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows untouched for longer than the idle expiry
    ///
    /// Returns the number of windows removed. Called periodically by the
    /// sweep task; callable directly for deterministic tests.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let expiry = self.config.idle_expiry;
        let stale: Vec<(String, String)> = self
            .windows
            .iter()
            .filter_map(|entry| {
                let touched = entry.value().last_touched.lock().ok()?;
                (now.signed_duration_since(*touched) > expiry).then(|| entry.key().clone())
            })
            .collect();

        let removed = stale.len();
        for key in stale {
            self.windows.remove(&key);
        }
        if removed > 0 {
            debug!(removed, "swept idle rate-limit windows");
        }
        removed
    }

    /// Start the periodic sweep task
    ///
    /// Runs until `shutdown` is cancelled.
    pub fn start_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let sweep_interval = limiter.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        limiter.sweep_idle(Utc::now());
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("rate-limit sweeper shut down");
        })
    }
}
