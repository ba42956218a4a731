//! Error types for the tfsw CLI.
//!
//! Every lifecycle operation returns a [`TfswError`] on anything other than
//! plain success. Some variants are expected outcomes rather than failures
//! ("already installed", "already active"); the command layer separates them
//! with [`TfswError::is_informational`] and reports them without failing the
//! invocation.

use std::path::PathBuf;
use thiserror::Error;

use crate::toolchain::Version;

/// Consolidated error type for tfsw operations.
#[derive(Debug, Error)]
pub enum TfswError {
    /// A version argument does not match the version grammar.
    #[error("{version} is not a valid version")]
    InvalidVersion {
        /// The rejected input.
        version: String,
    },

    /// The version's binary is already present in the install root.
    #[error("Terraform {version} already exists")]
    AlreadyInstalled {
        /// The requested version.
        version: String,
    },

    /// The version's directory does not exist.
    #[error("Terraform {version} has already been removed")]
    AlreadyRemoved {
        /// The requested version.
        version: String,
    },

    /// The requested version is already the active one.
    #[error("Terraform {version} already active!")]
    SameVersion {
        /// The requested version.
        version: String,
    },

    /// Nothing has been installed yet.
    #[error("no versions of Terraform have been installed")]
    NoneInstalled,

    /// The releases server answered `403 Forbidden`, which is how it reports
    /// a version/platform combination that does not exist.
    #[error("the file requested doesn't exist on {host}: {url}")]
    NotFoundUpstream {
        /// Host name of the releases server.
        host: String,
        /// The URL that was requested.
        url: String,
    },

    /// Any other network or HTTP failure.
    #[error("download error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The archive digest does not match the manifest.
    #[error(
        "checksum mismatch for {archive}, the download may be corrupted or tampered with"
    )]
    ChecksumMismatch {
        /// Base name of the archive.
        archive: String,
    },

    /// A manifest line does not have exactly two fields.
    #[error("{} format invalid, line {line} does not have two elements", manifest.display())]
    ManifestFormat {
        /// Path of the manifest file.
        manifest: PathBuf,
        /// One-based line number.
        line: usize,
    },

    /// The manifest has no entry for the archive.
    #[error("{archive} is not in {}", manifest.display())]
    ManifestEntryNotFound {
        /// Base name of the archive.
        archive: String,
        /// Path of the manifest file.
        manifest: PathBuf,
    },

    /// Refusal to delete the active version.
    #[error("Terraform {version} is active, please switch to another version before removing")]
    CannotRemoveActive {
        /// The active version.
        version: String,
    },

    /// Unexpected filesystem failure.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be unpacked into the version directory.
    #[error("extraction failed: {message}")]
    Extract {
        /// Description of the failure, including its cause chain.
        message: String,
    },

    /// Summary for a bulk command in which some items failed.
    #[error("{failed} of {total} operations failed")]
    BatchFailed {
        /// Number of failed items.
        failed: usize,
        /// Number of items processed.
        total: usize,
    },
}

impl TfswError {
    /// Returns `true` for expected outcomes that are reported to the user
    /// but do not make the command fail.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::AlreadyInstalled { .. }
            | Self::AlreadyRemoved { .. }
            | Self::SameVersion { .. }
            | Self::NoneInstalled => true,
            Self::InvalidVersion { .. }
            | Self::NotFoundUpstream { .. }
            | Self::Transport { .. }
            | Self::ChecksumMismatch { .. }
            | Self::ManifestFormat { .. }
            | Self::ManifestEntryNotFound { .. }
            | Self::CannotRemoveActive { .. }
            | Self::Io { .. }
            | Self::Extract { .. }
            | Self::BatchFailed { .. } => false,
        }
    }

    /// Creates a new `InvalidVersion` error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Creates a new `AlreadyInstalled` error.
    #[must_use]
    pub fn already_installed(version: &Version) -> Self {
        Self::AlreadyInstalled {
            version: version.to_string(),
        }
    }

    /// Creates a new `AlreadyRemoved` error.
    #[must_use]
    pub fn already_removed(version: &Version) -> Self {
        Self::AlreadyRemoved {
            version: version.to_string(),
        }
    }

    /// Creates a new `SameVersion` error.
    #[must_use]
    pub fn same_version(version: &Version) -> Self {
        Self::SameVersion {
            version: version.to_string(),
        }
    }

    /// Creates a new `CannotRemoveActive` error.
    #[must_use]
    pub fn cannot_remove_active(version: &Version) -> Self {
        Self::CannotRemoveActive {
            version: version.to_string(),
        }
    }

    /// Creates a new `NotFoundUpstream` error.
    #[must_use]
    pub fn not_found_upstream(host: impl Into<String>, url: impl Into<String>) -> Self {
        Self::NotFoundUpstream {
            host: host.into(),
            url: url.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Transport` error with a source error.
    #[must_use]
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(archive: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            archive: archive.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `Extract` error.
    #[must_use]
    pub fn extract_error(message: impl Into<String>) -> Self {
        Self::Extract {
            message: message.into(),
        }
    }
}
