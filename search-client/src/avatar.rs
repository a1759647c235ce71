use hashfeed_core::{CoreError, DecodedImage, SearchApiError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Fetches profile images and decodes them into RGBA8 bitmaps. The decoded
/// pixel footprint is what the image cache accounts against its capacity.
#[derive(Debug, Clone)]
pub struct AvatarLoader {
    http_client: Client,
}

impl Default for AvatarLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarLoader {
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client }
    }

    pub async fn fetch(&self, url: &str) -> Result<DecodedImage, CoreError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!(url, status = status.as_u16(), "avatar fetch rejected");
            return Err(SearchApiError::RequestFailed {
                status_code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }
            .into());
        }

        let bytes = response.bytes().await?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            error!(url, "failed to decode avatar: {e}");
            SearchApiError::InvalidResponse {
                details: format!("undecodable image at {url}"),
            }
        })?;

        let rgba = decoded.to_rgba8();
        debug!(
            url,
            width = rgba.width(),
            height = rgba.height(),
            "avatar decoded"
        );
        Ok(DecodedImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }
}
