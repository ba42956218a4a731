//! Checksum verification for downloaded release archives.
//!
//! Each release publishes a `SHA256SUMS` manifest with one `digest filename`
//! pair per line. The archive's digest is computed locally and compared with
//! the manifest entry for its base name.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::TfswError;

const CHUNK_SIZE: usize = 32 * 1024;

/// Verifies `archive_path` against the matching entry in `manifest_path`.
///
/// Returns `Ok(true)` when the digests match and `Ok(false)` when they do
/// not. The comparison is an exact string comparison against the lowercase
/// hex digest, so an uppercase manifest digest never matches.
///
/// # Errors
///
/// Returns an error if:
/// - Either file cannot be read
/// - A manifest line preceding the match does not have exactly two fields
/// - The manifest has no entry for the archive's base name
pub fn verify(manifest_path: &Path, archive_path: &Path) -> Result<bool, TfswError> {
    let archive_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let expected = expected_digest(manifest_path, &archive_name)?;
    let computed = compute_sha256(archive_path)?;

    tracing::debug!(
        archive = %archive_name,
        expected = %expected,
        computed = %computed,
        "checksum computed"
    );

    Ok(computed == expected)
}

fn expected_digest(manifest_path: &Path, archive_name: &str) -> Result<String, TfswError> {
    let manifest = std::fs::read_to_string(manifest_path).map_err(|e| {
        TfswError::io_error(
            format!("failed to read manifest {}", manifest_path.display()),
            e,
        )
    })?;

    for (index, line) in manifest.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [digest, name] = fields.as_slice() else {
            return Err(TfswError::ManifestFormat {
                manifest: manifest_path.to_path_buf(),
                line: index + 1,
            });
        };
        let name = name.strip_prefix('*').unwrap_or(name);
        if name == archive_name {
            return Ok((*digest).to_string());
        }
    }

    Err(TfswError::ManifestEntryNotFound {
        archive: archive_name.to_string(),
        manifest: manifest_path.to_path_buf(),
    })
}

/// Computes the SHA-256 of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> Result<String, TfswError> {
    let mut file = std::fs::File::open(file_path).map_err(|e| {
        TfswError::io_error(
            format!("failed to open {} for checksum", file_path.display()),
            e,
        )
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            TfswError::io_error(
                format!("failed to read {} for checksum", file_path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
