//! PATH shadow detection.
//!
//! After a version is activated, the managed link only takes effect if the
//! bin directory is on `$PATH` and no other `terraform` appears before it.
//! This module checks both and formats the warnings shown by `select`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::paths::SwitchPaths;

/// Another `terraform` on `$PATH` resolves before the managed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    /// Path that `$PATH` lookup resolves to.
    pub found: PathBuf,
    /// The managed link.
    pub expected: PathBuf,
}

/// Result of checking the managed link against a `$PATH` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReport {
    /// Whether the bin directory is listed in `$PATH`.
    pub bin_on_path: bool,
    /// A shadowing binary, if any.
    pub conflict: Option<PathConflict>,
}

/// Checks the managed link against the current process `$PATH`.
#[must_use]
pub fn check_path(paths: &SwitchPaths) -> PathReport {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    check_path_in(paths, &path_var)
}

/// Checks the managed link against `path_var`.
#[must_use]
pub fn check_path_in(paths: &SwitchPaths, path_var: &OsStr) -> PathReport {
    let expected = paths.active_link();
    let bin_on_path = SwitchPaths::is_on_path(&paths.bin, path_var);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let conflict = which::which_in(SwitchPaths::tool_file_name(), Some(path_var), cwd)
        .ok()
        .filter(|found| !same_file(found, &expected))
        .map(|found| PathConflict {
            found,
            expected: expected.clone(),
        });

    PathReport {
        bin_on_path,
        conflict,
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.parent().map(Path::canonicalize), b.parent().map(Path::canonicalize)) {
        (Some(Ok(pa)), Some(Ok(pb))) => pa == pb && a.file_name() == b.file_name(),
        _ => false,
    }
}

/// Formats warnings for a report; empty when there is nothing to say.
#[must_use]
pub fn format_report(report: &PathReport, bin_dir: &Path) -> String {
    let mut lines = Vec::new();

    if let Some(conflict) = &report.conflict {
        lines.push("Warning: PATH conflict detected".to_string());
        lines.push(format!(
            "  'terraform' found at: {}",
            conflict.found.display()
        ));
        lines.push(format!(
            "  Expected:             {}",
            conflict.expected.display()
        ));
        if let Some(parent) = conflict.found.parent() {
            lines.push(format!(
                "  Remove {} from your PATH, or put {} before it.",
                parent.display(),
                bin_dir.display()
            ));
        }
    }

    if !report.bin_on_path {
        lines.push(format!(
            "Hint: {} is not on your PATH. Add it to use the active version.",
            bin_dir.display()
        ));
    }

    lines.join("\n")
}
