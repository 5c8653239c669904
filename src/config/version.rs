//! Pulp version strings and the version families they belong to

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Accepted version strings: a `2` or `3` major release, optional dotted
/// components and an optional pre/post-release suffix such as `rc1`
pub const VERSION_PATTERN: &str = r"^([23])((\.[0-9]+)*)((a|b|rc|\.dev|\.post)[0-9]+)?$";

static VERSION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(VERSION_PATTERN).ok());

/// Major version lines with distinct topology requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum VersionFamily {
    Pulp2,
    Pulp3,
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Pulp2 => f.write_str("2.x"),
            Self::Pulp3 => f.write_str("3.x"),
        }
    }
}

/// Version of the Pulp application under test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PulpVersion {
    raw: String,
    release: Vec<u64>,
    family: VersionFamily,
}

impl PulpVersion {
    /// The version exactly as written in the settings document
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Dotted release components, e.g. `[2, 12, 2]` for `2.12.2`
    #[must_use]
    #[inline]
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    #[must_use]
    #[inline]
    pub const fn family(&self) -> VersionFamily {
        self.family
    }
}

/// Rejected version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported Pulp version '{0}': expected a 2.y or 3.y release such as '2.12.2' or '3'")]
pub struct VersionError(pub String);

impl FromStr for PulpVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = VERSION_RE
            .as_ref()
            .and_then(|re| re.captures(s))
            .ok_or_else(|| VersionError(s.to_owned()))?;

        let family = match captures.get(1).map(|m| m.as_str()) {
            Some("2") => VersionFamily::Pulp2,
            Some("3") => VersionFamily::Pulp3,
            _ => return Err(VersionError(s.to_owned())),
        };

        let mut release = Vec::new();
        let major = captures.get(1).map_or("", |m| m.as_str());
        let minors = captures.get(2).map_or("", |m| m.as_str());
        for component in std::iter::once(major).chain(minors.split('.').skip(1)) {
            let number = component
                .parse::<u64>()
                .map_err(|_| VersionError(s.to_owned()))?;
            release.push(number);
        }

        Ok(Self {
            raw: s.to_owned(),
            release,
            family,
        })
    }
}

impl TryFrom<String> for PulpVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PulpVersion> for String {
    fn from(version: PulpVersion) -> Self {
        version.raw
    }
}

impl fmt::Display for PulpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major_only() {
        let version: PulpVersion = "3".parse().unwrap();
        assert_eq!(version.family(), VersionFamily::Pulp3);
        assert_eq!(version.release(), &[3]);
    }

    #[test]
    fn test_parse_full_release() {
        let version: PulpVersion = "2.12.2".parse().unwrap();
        assert_eq!(version.family(), VersionFamily::Pulp2);
        assert_eq!(version.release(), &[2, 12, 2]);
        assert_eq!(version.to_string(), "2.12.2");
    }

    #[test]
    fn test_parse_pre_release() {
        let version: PulpVersion = "3.0.0rc1".parse().unwrap();
        assert_eq!(version.family(), VersionFamily::Pulp3);
        assert_eq!(version.release(), &[3, 0, 0]);
    }

    #[test]
    fn test_reject_unsupported() {
        assert!("4.0".parse::<PulpVersion>().is_err());
        assert!("1.9".parse::<PulpVersion>().is_err());
        assert!("".parse::<PulpVersion>().is_err());
        assert!("3.x".parse::<PulpVersion>().is_err());
        assert!("23".parse::<PulpVersion>().is_err());
    }

    #[test]
    fn test_pattern_compiles() {
        assert!(VERSION_RE.is_some());
    }
}
