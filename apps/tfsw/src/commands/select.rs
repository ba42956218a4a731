//! Select command for the tfsw CLI.
//!
//! Makes a version the active one, installing it first if needed.
//!
//! ## Usage
//!
//! ```bash
//! tfsw select 1.5.7
//! ```

use anyhow::Result;
use clap::Args;

use crate::errors::TfswError;
use crate::toolchain::conflict::{check_path, format_report};
use crate::toolchain::{HttpFetcher, InstallLock, Platform, SwitchPaths, Switcher, Version};

/// Arguments for the select command.
#[derive(Args)]
pub struct SelectArgs {
    /// Version to activate (e.g., "1.5.7").
    #[clap(value_name = "VERSION")]
    pub version: Version,
}

/// Executes the select command.
///
/// After the link is switched, warns if another `terraform` on `$PATH`
/// shadows it or if the bin directory is not on `$PATH`.
///
/// # Errors
///
/// Returns an error if the version cannot be installed or the active link
/// cannot be replaced.
pub async fn execute(args: &SelectArgs) -> Result<()> {
    let paths = SwitchPaths::new()?;
    let platform = Platform::detect()?;
    let _lock = InstallLock::acquire(&paths.lock_path())?;
    let mut switcher = Switcher::open(paths.clone(), platform, HttpFetcher::new()?)?;
    let version = &args.version;

    match switcher.activate(version).await {
        Ok(()) => println!("Terraform {version} is now active"),
        Err(e @ TfswError::SameVersion { .. }) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let warning = format_report(&check_path(&paths), &paths.bin);
    if !warning.is_empty() {
        eprintln!();
        eprintln!("{warning}");
    }

    Ok(())
}
