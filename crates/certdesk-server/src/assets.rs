//! Best-effort download of logo and signature images.
//!
//! A missing or broken image never blocks issuance: failures are logged
//! and the image is left out of the certificate.

use certdesk_core::{Branding, CertificateAssets, RasterImage};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Largest image body accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Fetches and decodes remote branding images.
#[derive(Clone)]
pub struct AssetFetcher {
    client: Client,
    max_bytes: usize,
}

impl AssetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Overrides the body size limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Downloads and decodes one image, or `None` on any failure.
    pub async fn fetch_image(&self, url: &str) -> Option<RasterImage> {
        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, "Failed to fetch image: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Image request failed");
            return None;
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                warn!(url = %url, length, limit = self.max_bytes, "Image too large");
                return None;
            }
        }

        let mut bytes = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if bytes.len() + chunk.len() > self.max_bytes {
                        warn!(url = %url, limit = self.max_bytes, "Image too large");
                        return None;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(url = %url, "Failed to read image body: {}", e);
                    return None;
                }
            }
        }

        match tokio::task::spawn_blocking(move || RasterImage::decode(&bytes)).await {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                warn!(url = %url, "Failed to decode image: {}", e);
                None
            }
            Err(e) => {
                warn!(url = %url, "Image decode task failed: {}", e);
                None
            }
        }
    }

    /// Fetches whichever of logo and signature the branding names.
    pub async fn fetch_assets(&self, branding: &Branding) -> CertificateAssets {
        let logo = async {
            match branding.logo() {
                Some(url) => self.fetch_image(url).await,
                None => None,
            }
        };
        let signature = async {
            match branding.signature() {
                Some(url) => self.fetch_image(url).await,
                None => None,
            }
        };
        let (logo, signature) = tokio::join!(logo, signature);
        CertificateAssets { logo, signature }
    }
}
