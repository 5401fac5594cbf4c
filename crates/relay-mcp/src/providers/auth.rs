//! Authenticator Contract
//!
//! The core consumes an authenticator that turns transport-supplied
//! credentials into a [`Principal`] or a failure. Concrete schemes (API
//! key, JWT, OAuth) are host collaborators.

// Layer 1: Standard library imports
// (None)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::error::McpResult;
use crate::session::Principal;

/// Pluggable credential verification
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate credentials presented under a scheme
    ///
    /// `scheme` names the mechanism (e.g. `"bearer"`, `"apikey"`);
    /// `credentials` is the opaque material the transport extracted.
    ///
    /// # Errors
    ///
    /// Returns `McpError::AuthenticationRequired` or
    /// `McpError::Unauthorized` on failure.
    async fn authenticate(&self, scheme: &str, credentials: &str) -> McpResult<Principal>;
}
