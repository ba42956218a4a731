#![warn(clippy::pedantic)]

//! # Terraform Switch (tfsw)
//!
//! `tfsw` keeps several Terraform versions side by side and exposes one of
//! them as `~/bin/terraform`.
//!
//! ## Subcommands
//!
//! - `new` - Install one or more versions
//! - `select` - Make a version active, installing it if needed
//! - `list` (`ls`) - List installed versions
//! - `delete` (`rm`) - Remove versions, or all but the active one with `--clean`
//! - `version` - Display version information
//! - `completions` - Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! tfsw select 1.5.7
//! tfsw new 1.6.0-rc1 1.4.6
//! tfsw ls
//! tfsw rm --clean
//! ```

mod commands;
mod errors;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{completions, delete, list, new, select, version};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TFSW_LOG";

/// Terraform version switcher.
#[derive(Parser)]
#[command(
    name = "tfsw",
    author,
    version,
    about = "Install and switch between Terraform versions",
    after_help = "\
ENVIRONMENT VARIABLES:
    TFSW_BIN_DIR        Directory holding the terraform link (default: ~/bin)
    TFSW_CONFIG_DIR     Install root (default: <user config dir>/tfsw)
    TFSW_CACHE_DIR      Download cache (default: <user cache dir>/tfsw)
    TFSW_RELEASES_URL   Releases server (default: https://releases.hashicorp.com)
    TFSW_LOG            Log filter, e.g. 'debug' (default: warn)"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the tfsw CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install Terraform versions.
    ///
    /// Downloads each version, verifies it against the published SHA256SUMS
    /// and unpacks it. The active version is not changed.
    New(new::NewArgs),

    /// Make a Terraform version active.
    ///
    /// Installs the version first if needed, then points the terraform link
    /// in the bin directory at it.
    Select(select::SelectArgs),

    /// List installed Terraform versions.
    ///
    /// The active version is marked with an asterisk.
    #[command(visible_alias = "ls")]
    List,

    /// Remove Terraform versions.
    ///
    /// The active version is never removed.
    #[command(visible_alias = "rm")]
    Delete(delete::DeleteArgs),

    /// Display version information.
    Version(version::VersionArgs),

    /// Generate shell completion scripts.
    Completions(completions::CompletionsArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Installs a stderr subscriber filtered by `TFSW_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints an error with its cause chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:#}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::New(args) => new::execute(&args).await,
        Commands::Select(args) => select::execute(&args).await,
        Commands::List => list::execute(),
        Commands::Delete(args) => delete::execute(&args),
        Commands::Version(args) => version::execute(&args),
        Commands::Completions(args) => completions::execute(&args),
    }
}
