//! Release file transport.
//!
//! Downloads go through the [`Fetch`] trait so the install pipeline can be
//! exercised without a network. [`HttpFetcher`] is the production transport:
//! a `HEAD` probe followed by a streamed `GET`, with text progress on stderr.
//!
//! The releases server answers `403 Forbidden` for files that do not exist,
//! which is reported as [`TfswError::NotFoundUpstream`]. Failed transfers are
//! not retried.

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;

use super::{Platform, TOOL_NAME, Version};
use crate::errors::TfswError;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Retrieves a remote file into a local path.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// Downloads `url` into `dest`, creating or truncating it.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), TfswError>;
}

/// Release archive file name, e.g. `terraform_1.5.7_linux_amd64.zip`.
#[must_use]
pub fn archive_name(version: &Version, platform: Platform) -> String {
    format!("{TOOL_NAME}_{version}_{platform}.zip")
}

/// Checksum manifest file name, e.g. `terraform_1.5.7_SHA256SUMS`.
#[must_use]
pub fn manifest_name(version: &Version) -> String {
    format!("{TOOL_NAME}_{version}_SHA256SUMS")
}

/// URL of a release file: `<releases>/terraform/<version>/<file>`.
#[must_use]
pub fn release_url(releases_url: &str, version: &Version, file: &str) -> String {
    format!("{releases_url}/{TOOL_NAME}/{version}/{file}")
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, TfswError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("tfsw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TfswError::transport_with_source("failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    async fn probe(&self, url: &str) -> Result<(), TfswError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| TfswError::transport_with_source(format!("failed to connect to {url}"), e))?;
        check_status(response.status(), url)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), TfswError> {
        tracing::debug!(url, dest = %dest.display(), "fetching");

        self.probe(url).await?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TfswError::transport_with_source(format!("failed to connect to {url}"), e))?;
        check_status(response.status(), url)?;

        let total_size = response.content_length().unwrap_or(0);

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            TfswError::io_error(format!("failed to create {}", dest.display()), e)
        })?;

        let mut progress = Progress::new(file_name_of(url), total_size);
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                TfswError::transport_with_source(format!("failed to read response from {url}"), e)
            })?;
            file.write_all(&chunk).await.map_err(|e| {
                TfswError::io_error(format!("failed to write {}", dest.display()), e)
            })?;
            downloaded += chunk.len() as u64;
            progress.update(downloaded);
        }

        file.flush()
            .await
            .map_err(|e| TfswError::io_error(format!("failed to flush {}", dest.display()), e))?;

        progress.finish(downloaded);
        tracing::debug!(url, bytes = downloaded, "fetched");
        Ok(())
    }
}

/// Transport for commands that never download (`list`, `delete`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Fetch for Offline {
    async fn fetch(&self, url: &str, _dest: &Path) -> Result<(), TfswError> {
        Err(TfswError::transport(format!(
            "downloads are not available for this command: {url}"
        )))
    }
}

fn check_status(status: StatusCode, url: &str) -> Result<(), TfswError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::FORBIDDEN => Err(TfswError::not_found_upstream(host_of(url), url)),
        other => Err(TfswError::transport(format!("HTTP {other} for {url}"))),
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn file_name_of(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Text progress line on stderr, shown only when stderr is a terminal.
struct Progress<'a> {
    name: &'a str,
    total: u64,
    enabled: bool,
    start: Instant,
    last_update: Instant,
}

impl<'a> Progress<'a> {
    fn new(name: &'a str, total: u64) -> Self {
        let now = Instant::now();
        Self {
            name,
            total,
            enabled: std::io::stderr().is_terminal(),
            start: now,
            last_update: now,
        }
    }

    fn update(&mut self, downloaded: u64) {
        let now = Instant::now();
        if now.duration_since(self.last_update).as_millis() >= PROGRESS_INTERVAL_MS {
            self.print(downloaded);
            self.last_update = now;
        }
    }

    fn finish(&self, downloaded: u64) {
        if self.enabled {
            self.print(downloaded);
            eprintln!();
        }
    }

    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    fn print(&self, downloaded: u64) {
        if !self.enabled {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        let percent = if self.total > 0 {
            (downloaded as f64 / self.total as f64 * 100.0) as u8
        } else {
            0
        };
        let speed = if elapsed > 0.0 {
            downloaded as f64 / elapsed
        } else {
            0.0
        };

        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\r{} {}/{} ({percent}%) {}     ",
            self.name,
            format_bytes(downloaded),
            format_bytes(self.total),
            format_speed(speed)
        );
        let _ = stderr.flush();
    }
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
