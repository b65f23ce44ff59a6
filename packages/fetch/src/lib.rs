#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cached admission list PDF downloads.
//!
//! [`Fetcher::fetch`] makes sure a PDF exists at a destination path. A
//! destination that already exists is never downloaded again, so the body
//! is first streamed to a `.part` file and only renamed into place once the
//! transfer completed. A failed transfer therefore never leaves a file that
//! a later run would mistake for a finished download.
//!
//! The transfer itself sits behind the [`PdfSource`] trait; [`HttpSource`]
//! is the `reqwest` implementation.

pub mod http;
pub mod retry;

use std::path::{Path, PathBuf};

pub use http::HttpSource;
pub use retry::RetryPolicy;

/// Errors from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error for {url}: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error writing to disk.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl DownloadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Returns `true` if the failure is likely transient and worth
    /// retrying: timeouts, connection failures, HTTP 429 and HTTP 5xx.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_body() || source.is_request()
            }
            Self::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Io { .. } => false,
        }
    }
}

/// Something that can transfer the body behind a URL into a local file.
pub trait PdfSource: Send + Sync {
    /// Writes the body found at `url` to `dest`, truncating any existing
    /// file, and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the transfer or the write fails.
    fn download(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl std::future::Future<Output = Result<u64, DownloadError>> + Send;
}

/// Outcome of a successful [`Fetcher::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The destination already existed; nothing was downloaded.
    Cached,
    /// The file was downloaded; carries the number of bytes written.
    Downloaded(u64),
}

/// Downloads PDFs into a local cache, at most once per destination.
#[derive(Debug, Clone)]
pub struct Fetcher<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: PdfSource> Fetcher<S> {
    /// Creates a fetcher that never retries.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry: RetryPolicy::none(),
        }
    }

    /// Sets the retry policy for transient failures.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the underlying source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Makes sure `dest` holds the body found at `url`.
    ///
    /// If `dest` already exists no request is made.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the parent directory cannot be created,
    /// the download fails after the configured retries, or the finished
    /// download cannot be moved into place. No file is left at `dest` or at
    /// its `.part` path on failure.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchStatus, DownloadError> {
        if dest.exists() {
            log::debug!("{} already downloaded, skipping {url}", dest.display());
            return Ok(FetchStatus::Cached);
        }

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let part = part_path(dest);

        log::info!("Downloading {url}");
        log::info!("  -> {}", dest.display());

        let bytes = match self
            .retry
            .run(|| self.source.download(url, &part))
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_part(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, dest).await {
            remove_part(&part).await;
            return Err(DownloadError::io(dest, e));
        }

        #[allow(clippy::cast_precision_loss)]
        let kb = bytes as f64 / 1024.0;
        log::info!("  download complete: {kb:.1} KB");

        Ok(FetchStatus::Downloaded(bytes))
    }
}

/// Returns the temporary path a download is streamed to before it is
/// renamed to `dest`.
#[must_use]
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn remove_part(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => log::debug!("removed incomplete download {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {e}", part.display()),
    }
}
