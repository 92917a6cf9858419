//! Image acquisition over HTTP using wreq for browser emulation.

use super::ImageError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Downloads one remote image to a local path - enables mocking for tests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Writes the response body to `dest` and returns the byte count.
    ///
    /// Any transport error or non-2xx status is returned as-is; there is no
    /// retry or fallback at this level.
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, ImageError>;
}

/// Image fetcher with Chrome TLS emulation.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build image HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, ImageError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .header("Sec-Fetch-Dest", "image")
            .header("Sec-Fetch-Mode", "no-cors")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), dest.display());

        Ok(bytes.len() as u64)
    }
}
