//! `reqwest`-backed [`PdfSource`].

use std::path::Path;
use std::time::Duration;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::{DownloadError, PdfSource};

/// User agent sent with every download.
pub const USER_AGENT: &str = concat!("chamadas/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads over HTTP(S) with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Builds a client with the crate's user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Http`] if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| DownloadError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl PdfSource for HttpSource {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let http = |source| DownloadError::Http {
            url: url.to_owned(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http)?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_owned(),
                status: response.status().as_u16(),
            });
        }

        if let Some(size) = response.content_length() {
            log::debug!("  {url}: {size} bytes announced");
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(dest, e))?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::io(dest, e))?;

        Ok(downloaded)
    }
}
