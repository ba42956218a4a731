//! Release archive extraction.
//!
//! Terraform releases are flat ZIP archives holding the binary and, for some
//! versions, a license file. Entries are written into the version directory
//! with their stored unix mode so the binary stays executable.

use std::path::{Component, Path};

use anyhow::{Context, Result, bail};

use crate::errors::TfswError;

/// Extracts a ZIP archive into `dest_dir`, creating it if needed.
///
/// Entries with absolute paths or `..` components are refused. On failure the
/// destination may hold a partial extraction.
///
/// # Errors
///
/// Returns [`TfswError::Extract`] if:
/// - The archive cannot be opened or is not a valid ZIP file
/// - An entry has an unsafe path
/// - Directory or file creation fails
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), TfswError> {
    unpack(archive_path, dest_dir).map_err(|e| TfswError::extract_error(format!("{e:#}")))
}

fn unpack(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        let Some(entry_path) = entry.enclosed_name() else {
            bail!("Refusing to extract unsafe path: {}", entry.name());
        };

        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            bail!("Refusing to extract unsafe path: {}", entry_path.display());
        }

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }

        tracing::debug!(path = %output_path.display(), "extracted");
    }

    Ok(())
}
