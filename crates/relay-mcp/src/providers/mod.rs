//! Capability Provider Contracts
//!
//! The trait seams the core invokes. Concrete tools, resource providers,
//! prompt providers and authenticators live outside the core and plug in
//! through these interfaces; the core only ever sees `Arc<dyn ...>` handles
//! held by the registries.

pub mod auth;
pub mod prompt;
pub mod resource;
pub mod tool;

pub use auth::Authenticator;
pub use prompt::PromptProvider;
pub use resource::{ResourceChangePublisher, ResourceProvider};
pub use tool::{Tool, ToolContext};
