//! Completions command for the tfsw CLI.
//!
//! Prints a completion script for the requested shell to stdout.
//!
//! ## Usage
//!
//! ```bash
//! tfsw completions bash > ~/.local/share/bash-completion/completions/tfsw
//! tfsw completions zsh > ~/.zfunc/_tfsw
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::Cli;

/// Arguments for the completions command.
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Executes the completions command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
