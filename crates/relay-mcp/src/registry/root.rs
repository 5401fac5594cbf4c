//! Root Registry and URI Boundary Enforcement
//!
//! Roots scope what resources the server may read. A target URI is within a
//! root iff, after normalization, the root's path is a segment-wise prefix
//! of the target's path under the same scheme and authority. With zero
//! roots configured every URI is permitted (backward-compatible open
//! policy).
//!
//! Normalization rules:
//!
//! - the scheme is case-folded (the URL parser already does this)
//! - file URIs normalize `\` separators, resolve `.`/`..` segments, and
//!   compare case-insensitively on Windows hosts, case-sensitively elsewhere
//! - http(s) URIs match a root iff scheme, host and path-prefix match, with
//!   a trailing slash carrying directory semantics
//!
//! Segment-wise comparison makes `/foo/ba` a non-match for `/foo/bar`
//! even though it is a string prefix.

// Layer 1: Standard library imports
use std::sync::RwLock;

// Layer 2: Third-party crate imports
use tracing::debug;
use url::Url;

// Layer 3: Internal module imports
use super::events::{ObserverSet, RegistryEvent, RegistryObserver};
use crate::error::{McpError, McpResult};
use crate::protocol::{Root, Uri};

/// A URI reduced to its comparable parts
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedUri {
    scheme: String,
    host: Option<String>,
    segments: Vec<String>,
}

impl NormalizedUri {
    /// Normalize a URI string; `None` when it does not parse
    fn parse(uri: &str) -> Option<Self> {
        // File URIs from Windows hosts may carry backslash separators.
        let cleaned: String = if uri.starts_with("file:") {
            uri.replace('\\', "/")
        } else {
            uri.to_string()
        };

        let url = Url::parse(&cleaned).ok()?;
        let scheme = url.scheme().to_ascii_lowercase();
        let host = url.host_str().map(|h| h.to_ascii_lowercase());

        // The WHATWG parser resolves `.`/`..` for special schemes; strip
        // empty segments so `/a/` and `/a` compare equal and a trailing
        // slash only signals directory semantics.
        let case_insensitive = scheme == "file" && cfg!(windows);
        let segments: Vec<String> = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if case_insensitive {
                    s.to_ascii_lowercase()
                } else {
                    s.to_string()
                }
            })
            .collect();

        Some(Self {
            scheme,
            host,
            segments,
        })
    }

    /// Whether `target` is at or below this boundary
    fn contains(&self, target: &NormalizedUri) -> bool {
        self.scheme == target.scheme
            && self.host == target.host
            && self.segments.len() <= target.segments.len()
            && self
                .segments
                .iter()
                .zip(target.segments.iter())
                .all(|(a, b)| a == b)
    }
}

/// Ordered collection of roots answering boundary queries
#[derive(Default)]
pub struct RootRegistry {
    roots: RwLock<Vec<Root>>,
    observers: ObserverSet,
}

impl RootRegistry {
    /// Create an empty registry (open policy until roots are added)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with roots
    pub fn with_roots(roots: Vec<Root>) -> Self {
        Self {
            roots: RwLock::new(roots),
            observers: ObserverSet::new(),
        }
    }

    /// Append a root
    pub fn add(&self, root: Root) {
        if let Ok(mut roots) = self.roots.write() {
            roots.push(root);
        }
        self.observers.notify(&RegistryEvent::RootsChanged);
    }

    /// Replace the entire root set
    pub fn replace(&self, new_roots: Vec<Root>) {
        if let Ok(mut roots) = self.roots.write() {
            *roots = new_roots;
        }
        self.observers.notify(&RegistryEvent::RootsChanged);
    }

    /// Snapshot of the configured roots, in order
    pub fn list(&self) -> Vec<Root> {
        self.roots.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of configured roots
    pub fn len(&self) -> usize {
        self.roots.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether no roots are configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the URI falls within any configured root
    ///
    /// With zero roots configured all URIs are permitted. A URI that fails
    /// to normalize is never within a boundary.
    pub fn is_within(&self, uri: &Uri) -> bool {
        let roots = self.list();
        if roots.is_empty() {
            return true;
        }

        let Some(target) = NormalizedUri::parse(uri.as_str()) else {
            return false;
        };

        roots.iter().any(|root| {
            NormalizedUri::parse(root.uri.as_str())
                .map(|boundary| boundary.contains(&target))
                .unwrap_or(false)
        })
    }

    /// Enforce the boundary
    ///
    /// # Errors
    ///
    /// Returns `McpError::ResourceAccessDenied` when the URI is outside
    /// every configured root.
    pub fn validate(&self, uri: &Uri) -> McpResult<()> {
        if self.is_within(uri) {
            Ok(())
        } else {
            debug!(uri = %uri, "uri rejected by root boundary");
            Err(McpError::ResourceAccessDenied {
                uri: uri.as_str().to_string(),
            })
        }
    }

    /// Subscribe to root-set changes
    pub fn subscribe_events(&self, observer: RegistryObserver) {
        self.observers.subscribe(observer);
    }
}

impl std::fmt::Debug for RootRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRegistry")
            .field("roots", &self.len())
            .finish()
    }
}
