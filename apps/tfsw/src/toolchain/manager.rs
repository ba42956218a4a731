//! Version lifecycle: install, activate, remove.
//!
//! A [`Switcher`] is created once per invocation from a registry [`Snapshot`]
//! and keeps that snapshot current as it mutates the install root, so later
//! items of a bulk command see the effects of earlier ones.
//!
//! Per-version states:
//!
//! ```text
//! Absent --install--> Installed --activate--> Active
//!    ^                    |  ^                   |
//!    +------remove--------+  +--activate other---+
//! ```

use std::path::Path;

use super::archive::extract_zip;
use super::download::{Fetch, archive_name, manifest_name, release_url};
use super::paths::{InstallMetadata, SwitchPaths};
use super::registry::Snapshot;
use super::verify::verify;
use super::{Platform, Version};
use crate::errors::TfswError;

/// Lifecycle manager over one install root.
pub struct Switcher<F> {
    paths: SwitchPaths,
    platform: Platform,
    fetcher: F,
    snapshot: Snapshot,
}

impl<F: Fetch> Switcher<F> {
    /// Loads the registry snapshot and creates a manager over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub fn open(paths: SwitchPaths, platform: Platform, fetcher: F) -> Result<Self, TfswError> {
        let snapshot = Snapshot::load(&paths)?;
        Ok(Self {
            paths,
            platform,
            fetcher,
            snapshot,
        })
    }

    /// Returns the installed versions and the active one.
    ///
    /// # Errors
    ///
    /// Returns [`TfswError::NoneInstalled`] if nothing is installed.
    pub fn list(&self) -> Result<(&[Version], Option<&Version>), TfswError> {
        if self.snapshot.installed.is_empty() {
            return Err(TfswError::NoneInstalled);
        }
        Ok((&self.snapshot.installed, self.snapshot.active.as_ref()))
    }

    /// Downloads, verifies and extracts `version` into the install root.
    ///
    /// Nothing permanent is written until the archive has been verified. The
    /// scratch directory holding the downloads is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`TfswError::AlreadyInstalled`] if the binary is already
    /// present, or the first download, verification or extraction failure.
    pub async fn install(&mut self, version: &Version) -> Result<(), TfswError> {
        let binary = self.paths.binary_path(version);
        if binary.exists() {
            self.snapshot.insert(version);
            return Err(TfswError::already_installed(version));
        }

        std::fs::create_dir_all(&self.paths.scratch_root).map_err(|e| {
            TfswError::io_error(
                format!("failed to create {}", self.paths.scratch_root.display()),
                e,
            )
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("install-")
            .tempdir_in(&self.paths.scratch_root)
            .map_err(|e| TfswError::io_error("failed to create scratch directory", e))?;

        let archive_file = archive_name(version, self.platform);
        let manifest_file = manifest_name(version);
        let archive_path = scratch.path().join(&archive_file);
        let manifest_path = scratch.path().join(&manifest_file);

        let releases = &self.paths.releases_url;
        self.fetcher
            .fetch(&release_url(releases, version, &archive_file), &archive_path)
            .await?;
        self.fetcher
            .fetch(&release_url(releases, version, &manifest_file), &manifest_path)
            .await?;

        if !verify(&manifest_path, &archive_path)? {
            return Err(TfswError::checksum_mismatch(archive_file));
        }
        tracing::debug!(archive = %archive_file, "checksum verified");

        let version_dir = self.paths.version_dir(version);
        extract_zip(&archive_path, &version_dir)?;

        if !binary.is_file() {
            return Err(TfswError::extract_error(format!(
                "{archive_file} does not contain {}",
                SwitchPaths::tool_file_name()
            )));
        }

        if let Err(e) = self.paths.write_metadata(version, &InstallMetadata::now()) {
            tracing::warn!("{e:#}");
        }

        self.snapshot.insert(version);
        tracing::info!(%version, dir = %version_dir.display(), "installed");
        Ok(())
    }

    /// Makes `version` the active one, installing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TfswError::SameVersion`] if it is already active, any
    /// install failure, or an I/O error if the link cannot be replaced.
    pub async fn activate(&mut self, version: &Version) -> Result<(), TfswError> {
        if self.snapshot.is_active(version) {
            return Err(TfswError::same_version(version));
        }

        match self.install(version).await {
            Ok(()) | Err(TfswError::AlreadyInstalled { .. }) => {}
            Err(e) => return Err(e),
        }

        replace_link(&self.paths.binary_path(version), &self.paths.active_link())?;

        self.snapshot.active = Some(version.clone());
        tracing::info!(%version, link = %self.paths.active_link().display(), "activated");
        Ok(())
    }

    /// Deletes an installed version. The active version is never deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TfswError::CannotRemoveActive`] for the active version,
    /// [`TfswError::AlreadyRemoved`] if its directory does not exist, or an
    /// I/O error if the directory cannot be inspected or deleted.
    pub fn remove(&mut self, version: &Version) -> Result<(), TfswError> {
        if self.snapshot.is_active(version) {
            return Err(TfswError::cannot_remove_active(version));
        }

        let version_dir = self.paths.version_dir(version);
        match std::fs::symlink_metadata(&version_dir) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.snapshot.remove(version);
                return Err(TfswError::already_removed(version));
            }
            Err(e) => {
                return Err(TfswError::io_error(
                    format!("failed to inspect {}", version_dir.display()),
                    e,
                ));
            }
        }

        std::fs::remove_dir_all(&version_dir).map_err(|e| {
            TfswError::io_error(format!("failed to remove {}", version_dir.display()), e)
        })?;

        self.snapshot.remove(version);
        tracing::info!(%version, "removed");
        Ok(())
    }

    /// Versions that `delete --clean` removes: every installed version
    /// except the active one.
    #[must_use]
    pub fn clean_targets(&self) -> Vec<Version> {
        self.snapshot
            .installed
            .iter()
            .filter(|v| !self.snapshot.is_active(v))
            .cloned()
            .collect()
    }
}

/// Points `link` at `target`, replacing an existing symlink.
///
/// A regular file or directory at `link` is left alone and reported.
fn replace_link(target: &Path, link: &Path) -> Result<(), TfswError> {
    if let Some(bin_dir) = link.parent() {
        std::fs::create_dir_all(bin_dir).map_err(|e| {
            TfswError::io_error(format!("failed to create {}", bin_dir.display()), e)
        })?;
    }

    if let Ok(meta) = std::fs::symlink_metadata(link)
        && !meta.file_type().is_symlink()
    {
        return Err(TfswError::io_error(
            format!("{} exists and is not a symbolic link", link.display()),
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }

    swap_link(target, link)
}

#[cfg(unix)]
fn swap_link(target: &Path, link: &Path) -> Result<(), TfswError> {
    let staging = link.with_file_name(format!(
        ".{}.tfsw-{}",
        SwitchPaths::tool_file_name(),
        std::process::id()
    ));
    let _ = std::fs::remove_file(&staging);

    std::os::unix::fs::symlink(target, &staging).map_err(|e| {
        TfswError::io_error(
            format!(
                "failed to create symlink from {} to {}",
                staging.display(),
                target.display()
            ),
            e,
        )
    })?;

    std::fs::rename(&staging, link).map_err(|e| {
        let _ = std::fs::remove_file(&staging);
        TfswError::io_error(format!("failed to replace {}", link.display()), e)
    })
}

#[cfg(windows)]
fn swap_link(target: &Path, link: &Path) -> Result<(), TfswError> {
    match std::fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(TfswError::io_error(
                format!("failed to remove {}", link.display()),
                e,
            ));
        }
    }

    std::os::windows::fs::symlink_file(target, link).map_err(|e| {
        TfswError::io_error(
            format!(
                "failed to create symlink from {} to {}",
                link.display(),
                target.display()
            ),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::verify::compute_sha256;
    use sha2::{Digest, Sha256};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;

    const RELEASES: &str = "https://releases.test";

    /// Serves release files from memory; unknown URLs are reported missing.
    #[derive(Default)]
    struct FakeFetcher {
        files: HashMap<String, Vec<u8>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn publish(&mut self, version: &str, archive: Vec<u8>, manifest: String) {
            let v: Version = version.parse().unwrap();
            let platform = Platform::detect().unwrap();
            self.files.insert(
                release_url(RELEASES, &v, &archive_name(&v, platform)),
                archive,
            );
            self.files.insert(
                release_url(RELEASES, &v, &manifest_name(&v)),
                manifest.into_bytes(),
            );
        }

        fn publish_release(&mut self, version: &str) {
            let v: Version = version.parse().unwrap();
            let archive = zip_with(&[(
                SwitchPaths::tool_file_name().as_str(),
                format!("terraform {version}").as_str(),
            )]);
            let manifest = manifest_for(&v, &archive);
            self.publish(version, archive, manifest);
        }
    }

    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<(), TfswError> {
            self.requests.borrow_mut().push(url.to_string());
            let body = self
                .files
                .get(url)
                .ok_or_else(|| TfswError::not_found_upstream("releases.test", url))?;
            std::fs::write(dest, body).map_err(|e| TfswError::io_error("fake write", e))
        }
    }

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn manifest_for(version: &Version, archive: &[u8]) -> String {
        let platform = Platform::detect().unwrap();
        format!(
            "{}  terraform_{version}_plan9_386.zip\n{}  {}\n",
            "0".repeat(64),
            hex::encode(Sha256::digest(archive)),
            archive_name(version, platform)
        )
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn setup(fetcher: FakeFetcher) -> (tempfile::TempDir, Switcher<FakeFetcher>) {
        let temp = tempfile::tempdir().unwrap();
        let paths = SwitchPaths::with_dirs(
            temp.path().join("bin"),
            temp.path().join("versions"),
            temp.path().join("cache"),
            RELEASES,
        );
        let switcher = Switcher::open(paths, Platform::detect().unwrap(), fetcher).unwrap();
        (temp, switcher)
    }

    fn scratch_is_empty(switcher: &Switcher<FakeFetcher>) -> bool {
        std::fs::read_dir(&switcher.paths.scratch_root)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    #[tokio::test]
    async fn install_extracts_binary_and_records_metadata() {
        let mut fetcher = FakeFetcher::default();
        fetcher.publish_release("1.5.7");
        let (_temp, mut switcher) = setup(fetcher);

        switcher.install(&v("1.5.7")).await.unwrap();

        let binary = switcher.paths.binary_path(&v("1.5.7"));
        assert_eq!(std::fs::read(&binary).unwrap(), b"terraform 1.5.7");
        assert!(switcher.paths.read_metadata(&v("1.5.7")).is_some());
        assert!(switcher.snapshot.installed.contains(&v("1.5.7")));
        assert!(scratch_is_empty(&switcher));

        let requests = switcher.fetcher.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].ends_with(".zip"));
        assert!(requests[1].ends_with("_SHA256SUMS"));
    }

    #[tokio::test]
    async fn install_twice_reports_already_installed() {
        let mut fetcher = FakeFetcher::default();
        fetcher.publish_release("1.5.7");
        let (_temp, mut switcher) = setup(fetcher);

        switcher.install(&v("1.5.7")).await.unwrap();
        let binary = switcher.paths.binary_path(&v("1.5.7"));
        let digest = compute_sha256(&binary).unwrap();

        let err = switcher.install(&v("1.5.7")).await.unwrap_err();

        assert!(matches!(err, TfswError::AlreadyInstalled { .. }));
        assert_eq!(switcher.fetcher.requests.borrow().len(), 2);
        assert_eq!(compute_sha256(&binary).unwrap(), digest);
        assert_eq!(switcher.snapshot.installed, [v("1.5.7")]);
    }

    #[tokio::test]
    async fn checksum_mismatch_writes_nothing_permanent() {
        let mut fetcher = FakeFetcher::default();
        let archive = zip_with(&[("terraform", "tampered")]);
        let platform = Platform::detect().unwrap();
        let manifest = format!(
            "{}  {}\n",
            "f".repeat(64),
            archive_name(&v("1.0.0"), platform)
        );
        fetcher.publish("1.0.0", archive, manifest);
        let (_temp, mut switcher) = setup(fetcher);

        let err = switcher.install(&v("1.0.0")).await.unwrap_err();

        assert!(matches!(err, TfswError::ChecksumMismatch { .. }));
        assert!(!switcher.paths.version_dir(&v("1.0.0")).exists());
        assert!(scratch_is_empty(&switcher));
        assert!(!switcher.snapshot.installed.contains(&v("1.0.0")));
    }

    #[tokio::test]
    async fn missing_manifest_entry_aborts_install() {
        let mut fetcher = FakeFetcher::default();
        let archive = zip_with(&[("terraform", "bin")]);
        fetcher.publish("1.0.0", archive, format!("{}  other.zip\n", "a".repeat(64)));
        let (_temp, mut switcher) = setup(fetcher);

        let err = switcher.install(&v("1.0.0")).await.unwrap_err();

        assert!(matches!(err, TfswError::ManifestEntryNotFound { .. }));
        assert!(!switcher.paths.version_dir(&v("1.0.0")).exists());
    }

    #[tokio::test]
    async fn unknown_upstream_version_is_not_found() {
        let (_temp, mut switcher) = setup(FakeFetcher::default());

        let err = switcher.install(&v("9.9.9")).await.unwrap_err();

        assert!(matches!(err, TfswError::NotFoundUpstream { .. }));
        assert!(!switcher.paths.version_dir(&v("9.9.9")).exists());
        assert!(scratch_is_empty(&switcher));
    }

    #[tokio::test]
    async fn archive_without_binary_is_an_extract_error() {
        let mut fetcher = FakeFetcher::default();
        let archive = zip_with(&[("README.md", "no binary here")]);
        let manifest = manifest_for(&v("1.0.0"), &archive);
        fetcher.publish("1.0.0", archive, manifest);
        let (_temp, mut switcher) = setup(fetcher);

        let err = switcher.install(&v("1.0.0")).await.unwrap_err();

        assert!(matches!(err, TfswError::Extract { .. }));
        assert!(!switcher.snapshot.installed.contains(&v("1.0.0")));
    }

    #[test]
    fn list_with_nothing_installed_is_informational() {
        let (_temp, switcher) = setup(FakeFetcher::default());
        let err = switcher.list().unwrap_err();
        assert!(matches!(err, TfswError::NoneInstalled));
        assert!(err.is_informational());
    }

    #[test]
    fn remove_absent_version_is_already_removed() {
        let (_temp, mut switcher) = setup(FakeFetcher::default());
        let err = switcher.remove(&v("1.0.0")).unwrap_err();
        assert!(matches!(err, TfswError::AlreadyRemoved { .. }));
    }

    #[test]
    fn remove_reports_unreadable_install_root_as_io() {
        let (_temp, mut switcher) = setup(FakeFetcher::default());
        std::fs::write(&switcher.paths.install_root, b"not a directory").unwrap();

        let err = switcher.remove(&v("1.0.0")).unwrap_err();

        assert!(matches!(err, TfswError::Io { .. }));
        assert!(!err.is_informational());
    }

    #[tokio::test]
    async fn remove_deletes_inactive_version() {
        let mut fetcher = FakeFetcher::default();
        fetcher.publish_release("1.0.0");
        let (_temp, mut switcher) = setup(fetcher);
        switcher.install(&v("1.0.0")).await.unwrap();

        switcher.remove(&v("1.0.0")).unwrap();

        assert!(!switcher.paths.version_dir(&v("1.0.0")).exists());
        assert!(matches!(switcher.list(), Err(TfswError::NoneInstalled)));
    }

    #[cfg(unix)]
    mod links {
        use super::*;

        #[tokio::test]
        async fn activate_installs_and_links() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.5.7");
            let (_temp, mut switcher) = setup(fetcher);

            switcher.activate(&v("1.5.7")).await.unwrap();

            let link = switcher.paths.active_link();
            assert_eq!(
                std::fs::read_link(&link).unwrap(),
                switcher.paths.binary_path(&v("1.5.7"))
            );
            let (installed, active) = switcher.list().unwrap();
            assert_eq!(installed, [v("1.5.7")]);
            assert_eq!(active, Some(&v("1.5.7")));

            let reloaded = Snapshot::load(&switcher.paths).unwrap();
            assert_eq!(reloaded.active, Some(v("1.5.7")));
        }

        #[tokio::test]
        async fn activate_active_version_is_same_version() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.5.7");
            let (_temp, mut switcher) = setup(fetcher);
            switcher.activate(&v("1.5.7")).await.unwrap();

            let err = switcher.activate(&v("1.5.7")).await.unwrap_err();

            assert!(matches!(err, TfswError::SameVersion { .. }));
            assert!(err.is_informational());
        }

        #[tokio::test]
        async fn switching_replaces_the_link() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.0.0");
            fetcher.publish_release("1.5.7");
            let (_temp, mut switcher) = setup(fetcher);

            switcher.activate(&v("1.0.0")).await.unwrap();
            switcher.activate(&v("1.5.7")).await.unwrap();

            let reloaded = Snapshot::load(&switcher.paths).unwrap();
            assert_eq!(reloaded.installed, [v("1.0.0"), v("1.5.7")]);
            assert_eq!(reloaded.active, Some(v("1.5.7")));
            assert_eq!(
                std::fs::read(switcher.paths.active_link()).unwrap(),
                b"terraform 1.5.7"
            );
        }

        #[tokio::test]
        async fn active_version_cannot_be_removed() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.5.7");
            let (_temp, mut switcher) = setup(fetcher);
            switcher.activate(&v("1.5.7")).await.unwrap();

            let err = switcher.remove(&v("1.5.7")).unwrap_err();

            assert!(matches!(err, TfswError::CannotRemoveActive { .. }));
            assert!(!err.is_informational());
            assert!(switcher.paths.binary_path(&v("1.5.7")).exists());
        }

        #[tokio::test]
        async fn clean_targets_exclude_active() {
            let mut fetcher = FakeFetcher::default();
            for version in ["1.0.0", "1.5.7", "1.6.0-rc1"] {
                fetcher.publish_release(version);
            }
            let (_temp, mut switcher) = setup(fetcher);
            switcher.install(&v("1.0.0")).await.unwrap();
            switcher.install(&v("1.6.0-rc1")).await.unwrap();
            switcher.activate(&v("1.5.7")).await.unwrap();

            let targets = switcher.clean_targets();
            assert_eq!(targets, [v("1.0.0"), v("1.6.0-rc1")]);

            for target in &targets {
                switcher.remove(target).unwrap();
            }
            let (installed, active) = switcher.list().unwrap();
            assert_eq!(installed, [v("1.5.7")]);
            assert_eq!(active, Some(&v("1.5.7")));
        }

        #[tokio::test]
        async fn regular_file_at_link_path_is_an_error() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.0.0");
            let (_temp, mut switcher) = setup(fetcher);
            std::fs::create_dir_all(&switcher.paths.bin).unwrap();
            std::fs::write(switcher.paths.active_link(), b"not a link").unwrap();

            let err = switcher.activate(&v("1.0.0")).await.unwrap_err();

            assert!(matches!(err, TfswError::Io { .. }));
            assert_eq!(
                std::fs::read(switcher.paths.active_link()).unwrap(),
                b"not a link"
            );
        }

        #[tokio::test]
        async fn looping_link_is_replaced() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.0.0");
            let (_temp, mut installer) = setup(fetcher);
            installer.install(&v("1.0.0")).await.unwrap();
            let link = installer.paths.active_link();
            std::fs::create_dir_all(&installer.paths.bin).unwrap();
            std::os::unix::fs::symlink(&link, &link).unwrap();

            let mut switcher = Switcher::open(
                installer.paths.clone(),
                installer.platform,
                FakeFetcher::default(),
            )
            .unwrap();
            assert_eq!(switcher.snapshot.active, None);

            switcher.activate(&v("1.0.0")).await.unwrap();

            assert_eq!(std::fs::read(&link).unwrap(), b"terraform 1.0.0");
            assert!(switcher.fetcher.requests.borrow().is_empty());
        }

        #[tokio::test]
        async fn dangling_link_is_replaced() {
            let mut fetcher = FakeFetcher::default();
            fetcher.publish_release("1.0.0");
            let (temp, mut switcher) = setup(fetcher);
            std::fs::create_dir_all(&switcher.paths.bin).unwrap();
            std::os::unix::fs::symlink(
                temp.path().join("gone").join("terraform"),
                switcher.paths.active_link(),
            )
            .unwrap();

            switcher.activate(&v("1.0.0")).await.unwrap();

            assert_eq!(
                std::fs::read(switcher.paths.active_link()).unwrap(),
                b"terraform 1.0.0"
            );
        }
    }
}
