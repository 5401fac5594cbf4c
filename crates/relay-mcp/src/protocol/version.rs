//! Protocol Version Negotiation
//!
//! Semver-style protocol versions and the negotiation cascade applied during
//! `initialize`. The server holds a descending-sorted set of supported
//! versions; given the client's requested version the negotiator picks the
//! closest compatible one or fails with the supported list.

// Layer 1: Standard library imports
use std::fmt;
use std::str::FromStr;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Layer 3: Internal module imports
use super::errors::ProtocolError;

/// A protocol version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Major version; incompatible across majors
    pub major: u16,
    /// Minor version; higher minors are supersets within a major
    pub minor: u16,
    /// Patch version; compatible within a minor
    pub patch: u16,
}

impl ProtocolVersion {
    /// Create a version from its components
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let parse_part = |part: Option<&str>| -> Option<u16> {
            let part = part?;
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        };

        let major = parse_part(parts.next());
        let minor = parse_part(parts.next());
        let patch = parse_part(parts.next());

        match (major, minor, patch, parts.next()) {
            (Some(major), Some(minor), Some(patch), None) => Ok(Self {
                major,
                minor,
                patch,
            }),
            _ => Err(ProtocolError::InvalidProtocolVersion(s.to_string())),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Negotiation failure carrying the supported set for the error response
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unsupported protocol version {requested}; supported: {}", supported_list(.supported))]
pub struct VersionError {
    /// The version the client asked for
    pub requested: ProtocolVersion,
    /// Versions the server supports, descending
    pub supported: Vec<ProtocolVersion>,
}

fn supported_list(supported: &[ProtocolVersion]) -> String {
    supported
        .iter()
        .map(ProtocolVersion::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Negotiates a protocol version against a supported set
///
/// The cascade, applied within the client's major version:
///
/// 1. An exact match wins.
/// 2. A same-minor entry with `patch >= client.patch` (lowest such patch).
/// 3. The highest same-minor entry with a lower patch (backward
///    compatibility).
/// 4. The lowest higher-minor entry.
/// 5. The highest minor available within the major.
///
/// With backward compatibility disabled only rule 1 applies. No entry in the
/// client's major fails negotiation outright.
#[derive(Debug, Clone)]
pub struct VersionNegotiator {
    /// Supported versions sorted descending
    supported: Vec<ProtocolVersion>,
    /// Whether rules 2-5 apply
    backward_compatible: bool,
}

impl VersionNegotiator {
    /// Create a negotiator over the given supported set
    ///
    /// The set is sorted descending internally; duplicates are removed.
    pub fn new(mut supported: Vec<ProtocolVersion>, backward_compatible: bool) -> Self {
        supported.sort_unstable_by(|a, b| b.cmp(a));
        supported.dedup();
        Self {
            supported,
            backward_compatible,
        }
    }

    /// The supported versions, descending
    pub fn supported(&self) -> &[ProtocolVersion] {
        &self.supported
    }

    /// Negotiate against the client's requested version
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] with the supported list when no compatible
    /// version exists.
    pub fn negotiate(&self, client: ProtocolVersion) -> Result<ProtocolVersion, VersionError> {
        if self.supported.contains(&client) {
            return Ok(client);
        }

        if self.backward_compatible {
            if let Some(version) = self.negotiate_within_major(client) {
                return Ok(version);
            }
        }

        Err(VersionError {
            requested: client,
            supported: self.supported.clone(),
        })
    }

    fn negotiate_within_major(&self, client: ProtocolVersion) -> Option<ProtocolVersion> {
        let same_major: Vec<ProtocolVersion> = self
            .supported
            .iter()
            .copied()
            .filter(|v| v.major == client.major)
            .collect();
        if same_major.is_empty() {
            return None;
        }

        // Rule 2: same minor, patch >= requested, lowest such patch.
        if let Some(version) = same_major
            .iter()
            .copied()
            .filter(|v| v.minor == client.minor && v.patch >= client.patch)
            .min()
        {
            return Some(version);
        }

        // Rule 3: same minor with a lower patch, highest such entry.
        if let Some(version) = same_major
            .iter()
            .copied()
            .filter(|v| v.minor == client.minor && v.patch < client.patch)
            .max()
        {
            return Some(version);
        }

        // Rule 4: lowest higher minor.
        if let Some(version) = same_major
            .iter()
            .copied()
            .filter(|v| v.minor > client.minor)
            .min()
        {
            return Some(version);
        }

        // Rule 5: highest minor within the major.
        same_major.into_iter().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> ProtocolVersion {
        s.parse().unwrap()
    }

    fn negotiator(versions: &[&str], backward: bool) -> VersionNegotiator {
        VersionNegotiator::new(versions.iter().map(|v| version(v)).collect(), backward)
    }

    #[test]
    fn parse_and_display() {
        let v = version("1.2.3");
        assert_eq!(v, ProtocolVersion::new(1, 2, 3));
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("1.2".parse::<ProtocolVersion>().is_err());
        assert!("1.2.3.4".parse::<ProtocolVersion>().is_err());
        assert!("a.b.c".parse::<ProtocolVersion>().is_err());
        assert!("1..3".parse::<ProtocolVersion>().is_err());
        assert!("-1.0.0".parse::<ProtocolVersion>().is_err());
    }

    #[test]
    fn exact_match_wins() {
        let n = negotiator(&["0.1.0", "0.2.0", "1.0.0", "1.1.0"], true);
        assert_eq!(n.negotiate(version("1.1.0")).unwrap(), version("1.1.0"));
    }

    #[test]
    fn same_minor_lower_patch_falls_back() {
        // Client 1.0.5 against {0.1.0, 0.2.0, 1.0.0, 1.1.0} negotiates 1.0.0.
        let n = negotiator(&["0.1.0", "0.2.0", "1.0.0", "1.1.0"], true);
        assert_eq!(n.negotiate(version("1.0.5")).unwrap(), version("1.0.0"));
    }

    #[test]
    fn same_minor_higher_patch_picks_lowest_at_or_above() {
        let n = negotiator(&["1.0.2", "1.0.7"], true);
        assert_eq!(n.negotiate(version("1.0.1")).unwrap(), version("1.0.2"));
    }

    #[test]
    fn higher_minor_picks_lowest() {
        let n = negotiator(&["1.2.0", "1.5.0"], true);
        assert_eq!(n.negotiate(version("1.1.0")).unwrap(), version("1.2.0"));
    }

    #[test]
    fn lower_minor_falls_back_to_highest() {
        let n = negotiator(&["1.1.0", "1.3.0"], true);
        assert_eq!(n.negotiate(version("1.9.0")).unwrap(), version("1.3.0"));
    }

    #[test]
    fn unknown_major_fails_with_supported_list() {
        let n = negotiator(&["0.1.0", "0.2.0", "1.0.0", "1.1.0"], true);
        let err = n.negotiate(version("2.0.0")).unwrap_err();
        assert_eq!(err.requested, version("2.0.0"));
        assert_eq!(err.supported.len(), 4);
        assert_eq!(err.supported[0], version("1.1.0"));
    }

    #[test]
    fn strict_mode_only_exact() {
        let n = negotiator(&["1.0.0", "1.1.0"], false);
        assert!(n.negotiate(version("1.0.0")).is_ok());
        assert!(n.negotiate(version("1.0.5")).is_err());
    }

    #[test]
    fn any_same_major_succeeds_with_backward_compat() {
        // Any client sharing a supported major negotiates successfully
        // when backward compatibility is on.
        let n = negotiator(&["1.0.0", "1.4.2"], true);
        for (minor, patch) in [(0u16, 0u16), (0, 9), (2, 3), (4, 2), (9, 9)] {
            assert!(n.negotiate(ProtocolVersion::new(1, minor, patch)).is_ok());
        }
    }
}
