//! Command modules for the tfsw CLI.
//!
//! ## Lifecycle Commands
//!
//! - [`new`] - Install versions
//! - [`select`] - Activate a version
//! - [`list`] - List installed versions
//! - [`delete`] - Remove versions
//!
//! ## Other Commands
//!
//! - [`version`] - Display version information
//! - [`completions`] - Generate shell completion scripts
//!
//! Bulk commands process their items in order and keep going after a failed
//! item. Expected outcomes such as "already exists" are printed to stdout and
//! do not fail the command; failures are printed to stderr and counted.

pub mod completions;
pub mod delete;
pub mod list;
pub mod new;
pub mod select;
pub mod version;

use crate::errors::TfswError;

/// Tally of per-item outcomes for a bulk command.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    total: usize,
    failed: usize,
}

impl Batch {
    /// Reports one item: `success` on `Ok`, the message of an informational
    /// error on stdout, anything else on stderr.
    pub(crate) fn record(&mut self, outcome: Result<(), TfswError>, success: impl FnOnce() -> String) {
        self.total += 1;
        match outcome {
            Ok(()) => println!("{}", success()),
            Err(e) if e.is_informational() => println!("{e}"),
            Err(e) => {
                self.failed += 1;
                eprintln!("Error: {:#}", anyhow::Error::new(e));
            }
        }
    }

    /// Converts the tally into the command result.
    pub(crate) fn finish(self) -> Result<(), TfswError> {
        if self.failed == 0 {
            Ok(())
        } else {
            Err(TfswError::BatchFailed {
                failed: self.failed,
                total: self.total,
            })
        }
    }
}
