//! Terraform version management for the tfsw CLI.
//!
//! Versions are installed side by side under the install root and one of them
//! is exposed through a symlink in the bin directory.
//!
//! ## Module Structure
//!
//! - [`version`] - Version grammar and the validated [`Version`] type
//! - [`platform`] - OS and architecture naming for release archives
//! - [`paths`] - Directory configuration and install metadata
//! - [`registry`] - Installed-version discovery and active-link resolution
//! - [`download`] - Release file transport
//! - [`verify`] - SHA-256 manifest verification
//! - [`archive`] - ZIP extraction
//! - [`lock`] - Install root lock
//! - [`manager`] - Install, activate and remove
//! - [`conflict`] - PATH shadow detection

pub mod archive;
pub mod conflict;
pub mod download;
pub mod lock;
pub mod manager;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod verify;
pub mod version;

pub use download::{HttpFetcher, Offline};
pub use lock::InstallLock;
pub use manager::Switcher;
pub use paths::{SwitchPaths, TOOL_NAME};
pub use platform::Platform;
pub use version::Version;
