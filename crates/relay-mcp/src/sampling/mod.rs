//! Sampling (Server-Initiated Calls)
//!
//! The reverse direction of the protocol: the server asks the client's LLM
//! to produce a message via `sampling/createMessage` and awaits the
//! response through an id -> waiter correlation table.

pub mod caller;
pub mod correlation;
pub mod error;

pub use caller::{SamplingCaller, SamplingConfig};
pub use correlation::CorrelationTable;
pub use error::{SamplingError, SamplingResult};
