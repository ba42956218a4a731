//! Version command for the tfsw CLI.
//!
//! Displays version information for tfsw. In verbose mode, also shows the
//! git commit it was built from and the release platform it downloads for.

use anyhow::Result;
use clap::Args;

use crate::toolchain::Platform;

/// Arguments for the version command.
#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information including commit and platform.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Executes the version command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &VersionArgs) -> Result<()> {
    println!("tfsw {}", env!("CARGO_PKG_VERSION"));
    if args.verbose {
        println!();
        println!("Build Information:");
        println!("  Version:  {}", env!("CARGO_PKG_VERSION"));
        println!("  Commit:   {}", git_commit());
        println!("  Platform: {}", platform_string());
    }
    Ok(())
}

/// Returns the git commit hash from the build environment or a fallback.
fn git_commit() -> &'static str {
    option_env!("TFSW_GIT_COMMIT").unwrap_or("unknown")
}

/// Release platform name, or the raw target if releases are not published
/// for it.
fn platform_string() -> String {
    Platform::detect().map_or_else(
        |_| format!("{}_{} (unsupported)", std::env::consts::OS, std::env::consts::ARCH),
        |p| p.to_string(),
    )
}
