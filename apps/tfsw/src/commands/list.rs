//! List command for the tfsw CLI.
//!
//! ## Output Format
//!
//! ```text
//!   1.10.0    (installed 3 weeks ago)
//! * 1.5.7     (installed today)
//!   1.9.0
//! ```
//!
//! Versions sort as strings, so `1.10.0` comes before `1.9.0`.

use anyhow::Result;

use crate::errors::TfswError;
use crate::toolchain::{Offline, Platform, SwitchPaths, Switcher};

/// Executes the list command.
///
/// Marks the active version with an asterisk and shows the installation age
/// where it was recorded.
///
/// # Errors
///
/// Returns an error if the install root or the active link cannot be read.
pub fn execute() -> Result<()> {
    let paths = SwitchPaths::new()?;
    let switcher = Switcher::open(paths.clone(), Platform::detect()?, Offline)?;

    let (installed, active) = match switcher.list() {
        Ok(listing) => listing,
        Err(TfswError::NoneInstalled) => {
            println!("No versions of Terraform have been installed with tfsw");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let width = installed.iter().map(|v| v.as_str().len()).max().unwrap_or(0);
    for version in installed {
        let marker = if active == Some(version) { "*" } else { " " };
        match paths.read_metadata(version) {
            Some(meta) => println!(
                "{marker} {version:<width$}    (installed {})",
                meta.installed_ago()
            ),
            None => println!("{marker} {version}"),
        }
    }

    Ok(())
}
