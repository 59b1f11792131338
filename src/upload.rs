//! Uploads composed images to ImgBB and returns their public URL.

use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::LingoError;
use crate::media::{GeneratedImage, strip_data_url_prefix};

#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<UploadData>,
    #[serde(default)]
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the image hosting service.
#[derive(Clone, Debug)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl UploadClient {
    /// `endpoint` is the full upload URL.
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Uploads an encoded image.
    pub async fn upload(&self, image: &GeneratedImage, api_key: &str) -> Result<String, LingoError> {
        self.upload_base64(&image.to_base64(), api_key).await
    }

    /// Uploads base64 image data, with or without a `data:image/...;base64,` prefix.
    ///
    /// The key is checked before anything goes over the network.
    #[instrument(level = "debug", skip_all)]
    pub async fn upload_base64(&self, image: &str, api_key: &str) -> Result<String, LingoError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LingoError::MissingCredential("ImgBB API key"));
        }
        let payload = strip_data_url_prefix(image);
        debug!("Uploading {} base64 chars", payload.len());

        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&[("key", api_key), ("image", payload)])
            .send()
            .await
            .map_err(|err| LingoError::UploadRejected(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| LingoError::UploadRejected(err.to_string()))?;
        let parsed: UploadResponse = serde_json::from_slice(&body).unwrap_or_default();

        let url = parsed
            .data
            .and_then(|data| data.url)
            .filter(|url| !url.trim().is_empty());
        match url {
            Some(url) if status.is_success() && parsed.success => {
                info!("Uploaded image to {}", url);
                Ok(url)
            }
            _ => {
                let message = parsed
                    .error
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| {
                        format!(
                            "ImgBB upload failed ({status}). Please check your ImgBB key."
                        )
                    });
                Err(LingoError::UploadRejected(message))
            }
        }
    }
}
