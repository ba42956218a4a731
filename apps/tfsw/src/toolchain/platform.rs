//! Platform detection for release downloads.
//!
//! Release archives are named after the operating system and CPU architecture
//! they were built for, using the Go toolchain's naming (`darwin`, `amd64`,
//! ...). This module translates Rust's `std::env::consts` values into those
//! names.

use anyhow::{Result, bail};
use std::fmt;

/// An operating system / architecture pair in release naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// Detects the platform the binary was compiled for.
    ///
    /// # Errors
    ///
    /// Returns an error if no release archives are published for the current
    /// OS/architecture combination.
    pub fn detect() -> Result<Self> {
        Self::from_consts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust target names to release names.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown OS or architecture.
    pub fn from_consts(os: &str, arch: &str) -> Result<Self> {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            "freebsd" => "freebsd",
            "openbsd" => "openbsd",
            "solaris" => "solaris",
            other => bail!("Unsupported operating system: {other}"),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "arm" => "arm",
            other => bail!("Unsupported architecture: {other}"),
        };
        Ok(Self { os, arch })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}
