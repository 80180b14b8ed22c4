//! Canon schema versioning.
//!
//! The fact store carries a single monotonically-increasing semantic
//! version: patch is bumped on fact addition, minor on fact update. The
//! version is serialized as a plain `major.minor.patch` string and parsed
//! loudly at load time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Semantic version of the canon document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonVersion {
    /// Major component. Reserved for schema-shape changes.
    pub major: u32,
    /// Minor component. Bumped on every fact update.
    pub minor: u32,
    /// Patch component. Bumped on every fact addition.
    pub patch: u32,
}

impl CanonVersion {
    /// The version a fresh canon document starts at.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            major: 1,
            minor: 0,
            patch: 0,
        }
    }

    /// Returns the version after a patch bump (fact added).
    #[must_use]
    pub const fn bump_patch(self) -> Self {
        Self {
            patch: self.patch + 1,
            ..self
        }
    }

    /// Returns the version after a minor bump (fact updated). Patch resets.
    #[must_use]
    pub const fn bump_minor(self) -> Self {
        Self {
            minor: self.minor + 1,
            patch: 0,
            ..self
        }
    }

    /// Returns the version after a major bump. Minor and patch reset.
    #[must_use]
    pub const fn bump_major(self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
            patch: 0,
        }
    }
}

impl Default for CanonVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for CanonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for CanonVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidVersion {
            value: s.to_string(),
        };

        let mut parts = s.trim().split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let patch = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl TryFrom<String> for CanonVersion {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonVersion> for String {
    fn from(v: CanonVersion) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_follow_semver_reset_rules() {
        let v = CanonVersion::initial();
        assert_eq!(v.to_string(), "1.0.0");

        let v = v.bump_patch().bump_patch();
        assert_eq!(v.to_string(), "1.0.2");

        let v = v.bump_minor();
        assert_eq!(v.to_string(), "1.1.0");

        let v = v.bump_major();
        assert_eq!(v.to_string(), "2.0.0");
    }

    #[test]
    fn parse_round_trip() {
        let v: CanonVersion = "3.12.7".parse().unwrap();
        assert_eq!(v.major, 3);
        assert_eq!(v.minor, 12);
        assert_eq!(v.patch, 7);
        assert_eq!(v.to_string(), "3.12.7");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("1.2".parse::<CanonVersion>().is_err());
        assert!("1.2.3.4".parse::<CanonVersion>().is_err());
        assert!("one.two.three".parse::<CanonVersion>().is_err());
        assert!("".parse::<CanonVersion>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let v: CanonVersion = "1.4.2".parse().unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1.4.2\"");

        let back: CanonVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let bad: Result<CanonVersion, _> = serde_json::from_str("\"not-a-version\"");
        assert!(bad.is_err());
    }
}
