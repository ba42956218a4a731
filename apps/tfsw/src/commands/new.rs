//! New command for the tfsw CLI.
//!
//! Downloads, verifies and installs one or more Terraform versions without
//! changing the active one.
//!
//! ## Usage
//!
//! ```bash
//! tfsw new 1.5.7              # Install one version
//! tfsw new 1.5.7 1.6.0-rc1    # Install several, in order
//! ```

use anyhow::Result;
use clap::Args;

use super::Batch;
use crate::toolchain::{HttpFetcher, InstallLock, Platform, SwitchPaths, Switcher, Version};

/// Arguments for the new command.
#[derive(Args)]
pub struct NewArgs {
    /// Versions to install (e.g., "1.5.7" or "1.6.0-rc1").
    #[clap(required = true, value_name = "VERSION")]
    pub versions: Vec<Version>,
}

/// Executes the new command.
///
/// Each version is installed in turn; a failure is reported and the
/// remaining versions are still processed.
///
/// # Errors
///
/// Returns an error if the configuration, lock or registry cannot be set up,
/// or if any version failed to install.
pub async fn execute(args: &NewArgs) -> Result<()> {
    let paths = SwitchPaths::new()?;
    let platform = Platform::detect()?;
    let _lock = InstallLock::acquire(&paths.lock_path())?;
    let mut switcher = Switcher::open(paths, platform, HttpFetcher::new()?)?;

    let mut batch = Batch::default();
    for version in &args.versions {
        let outcome = switcher.install(version).await;
        batch.record(outcome, || format!("Terraform {version} has been added"));
    }

    Ok(batch.finish()?)
}
