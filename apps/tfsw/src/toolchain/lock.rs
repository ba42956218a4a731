//! Cross-process lock on the install root.
//!
//! Commands that change the install root or the active link hold an
//! exclusive advisory lock on `<installRoot>/.tfsw.lock` for their whole run,
//! so two concurrent invocations cannot interleave their steps. The lock is
//! released when the guard is dropped.

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;

/// Held exclusive lock on the install root.
#[derive(Debug)]
pub struct InstallLock {
    _file: File,
}

impl InstallLock {
    /// Blocks until the lock at `path` is acquired, creating the file and
    /// its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or locked.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "waiting for install lock");
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", path.display()))?;
        tracing::debug!(path = %path.display(), "install lock acquired");

        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_lock_file_and_parent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fresh").join(".tfsw.lock");

        let _lock = InstallLock::acquire(&path).unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn lock_can_be_reacquired_after_drop() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".tfsw.lock");

        drop(InstallLock::acquire(&path).unwrap());
        let _again = InstallLock::acquire(&path).unwrap();
    }

    #[test]
    fn held_lock_excludes_other_handles() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".tfsw.lock");
        let other = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .unwrap();

        let lock = InstallLock::acquire(&path).unwrap();
        assert!(!other.try_lock_exclusive().unwrap());

        drop(lock);
        assert!(other.try_lock_exclusive().unwrap());
    }
}
