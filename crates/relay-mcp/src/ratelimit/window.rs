//! Rate-Limit Window State
//!
//! The per-(identity, resource) accounting structure. Sliding windows keep
//! a time-ordered sequence of (timestamp, cost) entries; fixed windows keep
//! a single (window_start, used) pair. Each window is guarded by its own
//! mutex while the surrounding map stays lock-free.

// Layer 1: Standard library imports
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};

// Layer 3: Internal module imports
// (None)

/// Window accounting model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitMode {
    /// Retain per-request timestamps over a recent duration (default)
    #[default]
    Sliding,
    /// Bucket time into fixed windows with a single counter
    Fixed,
}

/// Outcome of charging a window
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChargeOutcome {
    /// Whether the charge was within the limit (and therefore recorded)
    pub allowed: bool,
    /// Capacity left after the charge (0 when denied)
    pub remaining: u64,
    /// When the window frees capacity again
    pub resets_at: DateTime<Utc>,
}

/// Mutable state of one window
#[derive(Debug)]
pub(crate) enum WindowState {
    Sliding {
        /// Time-ordered (timestamp, cost) entries within the duration
        entries: VecDeque<(DateTime<Utc>, u64)>,
    },
    Fixed {
        window_start: DateTime<Utc>,
        used: u64,
    },
}

impl WindowState {
    pub(crate) fn new(mode: RateLimitMode, now: DateTime<Utc>) -> Self {
        match mode {
            RateLimitMode::Sliding => Self::Sliding {
                entries: VecDeque::new(),
            },
            RateLimitMode::Fixed => Self::Fixed {
                window_start: now,
                used: 0,
            },
        }
    }

    /// Attempt to charge `cost` against the window at time `now`
    ///
    /// Sliding windows first drop entries with `t <= now - duration` (the
    /// exact boundary entry is excluded), then test
    /// `used + cost > limit`. Fixed windows reset once
    /// `now >= window_start + duration`.
    pub(crate) fn charge(
        &mut self,
        limit: u64,
        duration: TimeDelta,
        cost: u64,
        now: DateTime<Utc>,
    ) -> ChargeOutcome {
        match self {
            Self::Sliding { entries } => {
                let cutoff = now - duration;
                while entries.front().map(|(t, _)| *t <= cutoff).unwrap_or(false) {
                    entries.pop_front();
                }

                let used: u64 = entries.iter().map(|(_, c)| *c).sum();
                let resets_at = entries
                    .front()
                    .map(|(t, _)| *t + duration)
                    .unwrap_or_else(|| now + duration);

                if used + cost > limit {
                    ChargeOutcome {
                        allowed: false,
                        remaining: limit.saturating_sub(used),
                        resets_at,
                    }
                } else {
                    entries.push_back((now, cost));
                    ChargeOutcome {
                        allowed: true,
                        remaining: limit - (used + cost),
                        resets_at: entries
                            .front()
                            .map(|(t, _)| *t + duration)
                            .unwrap_or_else(|| now + duration),
                    }
                }
            }
            Self::Fixed { window_start, used } => {
                if now >= *window_start + duration {
                    *window_start = now;
                    *used = 0;
                }

                let resets_at = *window_start + duration;
                if *used + cost > limit {
                    ChargeOutcome {
                        allowed: false,
                        remaining: limit.saturating_sub(*used),
                        resets_at,
                    }
                } else {
                    *used += cost;
                    ChargeOutcome {
                        allowed: true,
                        remaining: limit - *used,
                        resets_at,
                    }
                }
            }
        }
    }

    /// Reverse a prior charge of `cost`
    ///
    /// Used by the two-level check to roll back the global increment when
    /// the resource-level check denies. Sliding windows drop the most
    /// recent entry with a matching cost; fixed windows decrement.
    pub(crate) fn uncharge(&mut self, cost: u64) {
        match self {
            Self::Sliding { entries } => {
                if let Some(position) = entries.iter().rposition(|(_, c)| *c == cost) {
                    let _ = entries.remove(position);
                }
            }
            Self::Fixed { used, .. } => {
                *used = used.saturating_sub(cost);
            }
        }
    }
}
