//! Progress & Cancellation
//!
//! Token-keyed progress tracking for long-running operations and the
//! in-flight request table that powers cooperative cancellation.

pub mod cancellation;
pub mod tracker;

pub use cancellation::{CancellationManager, InFlightKey, InFlightRequest, CONNECTION_CLOSED_REASON};
pub use tracker::{ProgressHandle, ProgressOperation, ProgressTracker};
