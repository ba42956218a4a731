//! Version identifiers accepted by tfsw.
//!
//! A version is `MAJOR.MINOR.PATCH` with an optional `-alpha`, `-beta`, `-oci`
//! or `-rc` suffix followed by an optional numeric counter (`1.5.7-rc1`).
//! Versions are only ever compared as strings: equality to decide identity,
//! lexicographic order for display. `1.10.0` therefore sorts before `1.9.0`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::TfswError;

static VERSION_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+\.){2}[0-9]+(-(alpha|beta|oci|rc)[0-9]*)?$")
        .expect("version grammar is a valid regex")
});

/// Returns whether `s` matches the version grammar.
#[must_use]
pub fn is_valid(s: &str) -> bool {
    VERSION_GRAMMAR.is_match(s)
}

/// A validated Terraform version string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(String);

impl Version {
    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Version {
    type Err = TfswError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(TfswError::invalid_version(s))
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_release_and_prerelease_versions() {
        for s in [
            "1.5.7",
            "0.0.0",
            "10.20.30",
            "1.5.7-rc1",
            "1.5.7-rc",
            "1.6.0-alpha20230816",
            "1.6.0-beta2",
            "1.5.7-oci",
        ] {
            assert!(is_valid(s), "{s} should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_versions() {
        for s in [
            "1.5",
            "v1.5.7",
            "1.5.7-foo",
            "1.5.7-rc-1",
            "1.5.7.1",
            "01.2.3x",
            "",
            " 1.5.7",
            "1.5.7 ",
            "latest",
        ] {
            assert!(!is_valid(s), "{s} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_with_invalid_version_error() {
        let err = "1.5".parse::<Version>().unwrap_err();
        assert!(matches!(err, TfswError::InvalidVersion { ref version } if version == "1.5"));
        assert_eq!(err.to_string(), "1.5 is not a valid version");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut versions: Vec<Version> = ["1.9.0", "1.10.0", "0.15.5"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(Version::as_str).collect();
        assert_eq!(sorted, ["0.15.5", "1.10.0", "1.9.0"]);
    }

    #[test]
    fn display_round_trips_input() {
        let version: Version = "1.5.7-rc1".parse().unwrap();
        assert_eq!(version.to_string(), "1.5.7-rc1");
        assert_eq!(format!("{version:<12}|"), "1.5.7-rc1   |");
    }
}
