//! Delete command for the tfsw CLI.
//!
//! Removes installed versions. The active version is never removed; switch
//! to another version first.
//!
//! ## Usage
//!
//! ```bash
//! tfsw delete 1.5.7 1.6.0    # Remove specific versions
//! tfsw rm --clean            # Remove every version except the active one
//! ```

use anyhow::Result;
use clap::Args;

use super::Batch;
use crate::toolchain::{InstallLock, Offline, Platform, SwitchPaths, Switcher, Version};

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Versions to remove.
    #[clap(
        value_name = "VERSION",
        required_unless_present = "clean",
        conflicts_with = "clean"
    )]
    pub versions: Vec<Version>,

    /// Remove every installed version except the active one.
    #[clap(short = 'c', long = "clean", action = clap::ArgAction::SetTrue)]
    pub clean: bool,
}

/// Executes the delete command.
///
/// # Errors
///
/// Returns an error if the configuration, lock or registry cannot be set up,
/// or if any version could not be removed.
pub fn execute(args: &DeleteArgs) -> Result<()> {
    let paths = SwitchPaths::new()?;
    let platform = Platform::detect()?;
    let _lock = InstallLock::acquire(&paths.lock_path())?;
    let mut switcher = Switcher::open(paths, platform, Offline)?;

    let targets = if args.clean {
        switcher.clean_targets()
    } else {
        args.versions.clone()
    };

    let mut batch = Batch::default();
    for version in &targets {
        let outcome = switcher.remove(version);
        batch.record(outcome, || format!("Terraform {version} has been removed"));
    }

    Ok(batch.finish()?)
}
