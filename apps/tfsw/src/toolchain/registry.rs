//! Installed-version discovery.
//!
//! The filesystem is the only record of state: a version is installed when
//! the install root has a directory named after it, and it is active when the
//! active link resolves into that directory.

use std::io::ErrorKind;

use super::paths::SwitchPaths;
use super::Version;
use crate::errors::TfswError;

/// Installed versions and the active one, as read at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Installed versions, sorted ascending.
    pub installed: Vec<Version>,
    /// The active version, always a member of `installed`.
    pub active: Option<Version>,
}

impl Snapshot {
    /// Reads the installed set and active version from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the install root or the active link cannot be read.
    pub fn load(paths: &SwitchPaths) -> Result<Self, TfswError> {
        let installed = discover_installed(paths)?;
        let active = resolve_active(paths, &installed)?;
        tracing::debug!(installed = installed.len(), active = ?active, "registry loaded");
        Ok(Self { installed, active })
    }

    /// Returns whether `version` is the active version.
    #[must_use]
    pub fn is_active(&self, version: &Version) -> bool {
        self.active.as_ref() == Some(version)
    }

    pub(crate) fn insert(&mut self, version: &Version) {
        if let Err(pos) = self.installed.binary_search(version) {
            self.installed.insert(pos, version.clone());
        }
    }

    pub(crate) fn remove(&mut self, version: &Version) {
        if let Ok(pos) = self.installed.binary_search(version) {
            self.installed.remove(pos);
        }
    }
}

/// Lists validly named version directories under the install root, sorted.
///
/// A missing install root yields an empty list.
///
/// # Errors
///
/// Returns an error if the install root exists but cannot be read.
pub fn discover_installed(paths: &SwitchPaths) -> Result<Vec<Version>, TfswError> {
    let entries = match std::fs::read_dir(&paths.install_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(TfswError::io_error(
                format!("failed to read {}", paths.install_root.display()),
                e,
            ));
        }
    };

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            TfswError::io_error(
                format!("failed to read {}", paths.install_root.display()),
                e,
            )
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Ok(version) = name.parse::<Version>() {
            versions.push(version);
        }
    }

    versions.sort();
    Ok(versions)
}

/// Resolves the active version by following the active link.
///
/// Returns `None` when nothing is installed or the link is absent, dangling
/// or otherwise unresolvable (a symlink loop, a target under a non-directory).
///
/// # Errors
///
/// Returns an error if the bin directory cannot be read while versions are
/// installed.
pub fn resolve_active(
    paths: &SwitchPaths,
    installed: &[Version],
) -> Result<Option<Version>, TfswError> {
    if installed.is_empty() {
        return Ok(None);
    }

    let link = paths.active_link();
    let target = match link.canonicalize() {
        Ok(target) => target,
        Err(resolve_err) => {
            return match std::fs::symlink_metadata(&link) {
                Ok(_) => {
                    tracing::debug!(
                        link = %link.display(),
                        error = %resolve_err,
                        "active link does not resolve"
                    );
                    Ok(None)
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(link = %link.display(), "no active link");
                    Ok(None)
                }
                Err(e) => Err(TfswError::io_error(
                    format!("failed to read {}", link.display()),
                    e,
                )),
            };
        }
    };

    let root = paths.install_root.canonicalize().map_err(|e| {
        TfswError::io_error(
            format!("failed to resolve {}", paths.install_root.display()),
            e,
        )
    })?;

    Ok(installed
        .iter()
        .find(|v| target.starts_with(root.join(v.as_str())))
        .cloned())
}
