//! Rate Limiting
//!
//! Per-(identity, resource) request budgeting with two window models and a
//! two-level global/resource check. See [`RateLimiter`] for the contract.

pub mod limiter;
pub mod window;

pub use limiter::{RateLimitDecision, RateLimiter, RateLimiterConfig, RateLimitQuota};
pub use window::RateLimitMode;
