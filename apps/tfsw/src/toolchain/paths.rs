//! Path configuration for tfsw.
//!
//! All locations are resolved once at startup into a [`SwitchPaths`] value and
//! passed to every component that needs them.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/bin/                          # bin dir (TFSW_BIN_DIR)
//!   terraform -> ~/.config/tfsw/1.5.7/terraform
//! ~/.config/tfsw/                 # install root (TFSW_CONFIG_DIR)
//!   .tfsw.lock                    # advisory lock for mutating commands
//!   1.5.7/
//!     terraform
//!     .metadata.json              # install date
//!   1.6.0-rc1/
//!     ...
//! ~/.cache/tfsw/                  # cache root (TFSW_CACHE_DIR)
//!   tmp/                          # per-install scratch directories
//! ```
//!
//! The releases server defaults to `https://releases.hashicorp.com` and can be
//! pointed at a mirror with `TFSW_RELEASES_URL`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Version;

/// Name of the managed tool; also the name of the active link.
pub const TOOL_NAME: &str = "terraform";

/// Name of this program's directories under the user config and cache dirs.
pub const APP_NAME: &str = "tfsw";

/// Environment variable overriding the bin directory.
pub const BIN_DIR_ENV: &str = "TFSW_BIN_DIR";

/// Environment variable overriding the install root.
pub const CONFIG_DIR_ENV: &str = "TFSW_CONFIG_DIR";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "TFSW_CACHE_DIR";

/// Environment variable overriding the releases server.
pub const RELEASES_URL_ENV: &str = "TFSW_RELEASES_URL";

/// Default releases server.
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";

const METADATA_FILE: &str = ".metadata.json";
const LOCK_FILE: &str = ".tfsw.lock";

/// Installation metadata stored as `.metadata.json` in each version directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallMetadata {
    /// Local date of installation, `YYYY-MM-DD`.
    pub installed_at: NaiveDate,
}

impl InstallMetadata {
    /// Metadata stamped with today's date.
    #[must_use]
    pub fn now() -> Self {
        Self {
            installed_at: Local::now().date_naive(),
        }
    }

    /// Human-readable age relative to today ("today", "3 days ago", ...).
    #[must_use]
    pub fn installed_ago(&self) -> String {
        relative_age(self.installed_at, Local::now().date_naive())
    }
}

fn relative_age(then: NaiveDate, today: NaiveDate) -> String {
    let days = (today - then).num_days().max(0);
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=13 => "1 week ago".to_string(),
        14..=29 => format!("{} weeks ago", days / 7),
        30..=59 => "1 month ago".to_string(),
        60..=364 => format!("{} months ago", days / 30),
        365..=729 => "1 year ago".to_string(),
        _ => format!("{} years ago", days / 365),
    }
}

/// Locations used by tfsw, resolved once per process.
#[derive(Debug, Clone)]
pub struct SwitchPaths {
    /// Directory holding the active link (`~/bin`).
    pub bin: PathBuf,
    /// Permanent directory holding one subdirectory per installed version.
    pub install_root: PathBuf,
    /// Parent of per-install scratch directories (`<cache>/tmp`).
    pub scratch_root: PathBuf,
    /// Base URL of the releases server, without trailing slash.
    pub releases_url: String,
}

impl SwitchPaths {
    /// Resolves paths from the environment and the OS-standard user directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a user directory cannot be determined and no
    /// override is set.
    pub fn new() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolves paths using `lookup` for environment variables.
    ///
    /// Empty or whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a user directory cannot be determined and no
    /// override is set.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bin = match var(BIN_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .with_context(|| {
                    format!("Cannot determine home directory. Set {BIN_DIR_ENV}.")
                })?
                .join("bin"),
        };

        let install_root = match var(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .with_context(|| {
                    format!("Cannot determine user config directory. Set {CONFIG_DIR_ENV}.")
                })?
                .join(APP_NAME),
        };

        let cache = match var(CACHE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .with_context(|| {
                    format!("Cannot determine user cache directory. Set {CACHE_DIR_ENV}.")
                })?
                .join(APP_NAME),
        };

        let releases_url = var(RELEASES_URL_ENV)
            .unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        Ok(Self::with_dirs(bin, install_root, cache, releases_url))
    }

    /// Builds paths from explicit directories.
    #[must_use]
    pub fn with_dirs(
        bin: PathBuf,
        install_root: PathBuf,
        cache: PathBuf,
        releases_url: impl Into<String>,
    ) -> Self {
        Self {
            bin,
            install_root,
            scratch_root: cache.join("tmp"),
            releases_url: releases_url.into(),
        }
    }

    /// File name of the managed binary on this host.
    #[must_use]
    pub fn tool_file_name() -> String {
        format!("{TOOL_NAME}{}", std::env::consts::EXE_SUFFIX)
    }

    /// `installRoot/<version>`.
    #[must_use]
    pub fn version_dir(&self, version: &Version) -> PathBuf {
        self.install_root.join(version.as_str())
    }

    /// `installRoot/<version>/terraform`.
    #[must_use]
    pub fn binary_path(&self, version: &Version) -> PathBuf {
        self.version_dir(version).join(Self::tool_file_name())
    }

    /// `binDir/terraform`, the single link other programs see.
    #[must_use]
    pub fn active_link(&self) -> PathBuf {
        self.bin.join(Self::tool_file_name())
    }

    /// Lock file guarding mutating commands.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.install_root.join(LOCK_FILE)
    }

    /// Metadata file inside a version directory.
    #[must_use]
    pub fn metadata_path(&self, version: &Version) -> PathBuf {
        self.version_dir(version).join(METADATA_FILE)
    }

    /// Writes installation metadata for `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata file cannot be written.
    pub fn write_metadata(&self, version: &Version, metadata: &InstallMetadata) -> Result<()> {
        let path = self.metadata_path(version);
        let content =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write metadata to {}", path.display()))?;
        Ok(())
    }

    /// Reads installation metadata; `None` if missing or unreadable.
    #[must_use]
    pub fn read_metadata(&self, version: &Version) -> Option<InstallMetadata> {
        let content = std::fs::read_to_string(self.metadata_path(version)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Returns whether `dir` is listed in `path_var` (a `$PATH`-style value).
    #[must_use]
    pub fn is_on_path(dir: &Path, path_var: &std::ffi::OsStr) -> bool {
        std::env::split_paths(path_var).any(|p| p == dir)
    }
}
