//! Notification Plane
//!
//! Direct and broadcast notification delivery, subscription-scoped resource
//! update fan-out, capability-gated list-changed events, and sanitized,
//! rate-capped log emission.

pub mod bus;
pub mod sanitize;

pub use bus::NotificationBus;
pub use sanitize::{sanitize_text, sanitize_value, REDACTED};
