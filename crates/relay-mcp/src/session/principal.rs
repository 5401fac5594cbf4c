//! Principals and Claims-Based Authorization
//!
//! A principal is the authenticated identity behind a connection or
//! session. Authorization for a (resource, action) pair is claim-driven:
//! the `admin` role, an exact `resource:action` permission claim, or a
//! wildcard claim (`resource:*`, `*:action`, `*:*`) grants access.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (None)

/// Claim key carrying permission grants
pub const PERMISSION_CLAIM: &str = "permission";

/// Role granting unconditional access
pub const ADMIN_ROLE: &str = "admin";

/// An authenticated identity with roles and claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier (user id, service account, key id)
    pub subject: String,

    /// Assigned roles
    #[serde(default)]
    pub roles: Vec<String>,

    /// Claims; permission grants live under [`PERMISSION_CLAIM`] as
    /// `resource:action` strings (multiple grants are comma-separated)
    #[serde(default)]
    pub claims: HashMap<String, String>,

    /// Authentication method that produced this principal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
}

impl Principal {
    /// Create a principal with just a subject
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            roles: Vec::new(),
            claims: HashMap::new(),
            auth_method: None,
        }
    }

    /// Add a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a permission grant (`resource:action`, wildcards allowed)
    pub fn with_permission(mut self, grant: impl Into<String>) -> Self {
        let grant = grant.into();
        self.claims
            .entry(PERMISSION_CLAIM.to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&grant);
            })
            .or_insert(grant);
        self
    }

    /// Whether the principal carries the admin role
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }

    /// All permission grants on the principal
    fn grants(&self) -> impl Iterator<Item = &str> {
        self.claims
            .get(PERMISSION_CLAIM)
            .map(String::as_str)
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|grant| !grant.is_empty())
    }

    /// Whether the principal is authorized for (resource, action)
    ///
    /// Grants match by exact pair or wildcard on either side:
    /// `resource:*`, `*:action`, `*:*`.
    pub fn is_authorized(&self, resource: &str, action: &str) -> bool {
        if self.is_admin() {
            return true;
        }
        self.grants().any(|grant| {
            let Some((granted_resource, granted_action)) = grant.split_once(':') else {
                return false;
            };
            (granted_resource == resource || granted_resource == "*")
                && (granted_action == action || granted_action == "*")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_grants_everything() {
        let principal = Principal::new("root").with_role("admin");
        assert!(principal.is_authorized("tools", "call"));
        assert!(principal.is_authorized("anything", "whatever"));
    }

    #[test]
    fn exact_permission_claim() {
        let principal = Principal::new("u1").with_permission("tools:call");
        assert!(principal.is_authorized("tools", "call"));
        assert!(!principal.is_authorized("tools", "list"));
        assert!(!principal.is_authorized("resources", "call"));
    }

    #[test]
    fn resource_wildcard() {
        let principal = Principal::new("u1").with_permission("tools:*");
        assert!(principal.is_authorized("tools", "call"));
        assert!(principal.is_authorized("tools", "list"));
        assert!(!principal.is_authorized("resources", "read"));
    }

    #[test]
    fn action_wildcard() {
        let principal = Principal::new("u1").with_permission("*:read");
        assert!(principal.is_authorized("resources", "read"));
        assert!(principal.is_authorized("prompts", "read"));
        assert!(!principal.is_authorized("resources", "write"));
    }

    #[test]
    fn full_wildcard() {
        let principal = Principal::new("u1").with_permission("*:*");
        assert!(principal.is_authorized("a", "b"));
    }

    #[test]
    fn multiple_grants_accumulate() {
        let principal = Principal::new("u1")
            .with_permission("tools:call")
            .with_permission("resources:read");
        assert!(principal.is_authorized("tools", "call"));
        assert!(principal.is_authorized("resources", "read"));
        assert!(!principal.is_authorized("prompts", "get"));
    }

    #[test]
    fn no_claims_no_access() {
        let principal = Principal::new("u1");
        assert!(!principal.is_authorized("tools", "call"));
    }

    #[test]
    fn malformed_grant_ignored() {
        let principal = Principal::new("u1").with_permission("no-colon-here");
        assert!(!principal.is_authorized("no-colon-here", ""));
        assert!(!principal.is_authorized("tools", "call"));
    }
}
