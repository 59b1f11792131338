//! Encoded image bytes and their data URL form.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose;
use regex::Regex;

use crate::error::LingoError;

/// MIME type of composed cards
pub const JPEG_MIME: &str = "image/jpeg";

#[allow(clippy::unwrap_used)] // literal pattern
static DATA_URL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/[a-zA-Z+.-]+;base64,").unwrap());

/// An encoded raster image and its MIME type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedImage {
    /// Encoded bytes, eg. a JPEG stream
    pub bytes: Vec<u8>,
    /// MIME type, eg. `image/jpeg`
    pub mime: String,
}

impl GeneratedImage {
    /// Wraps bytes with their MIME type
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Base64 of the bytes, without any prefix
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }

    /// Parses a `data:image/...;base64,` URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, LingoError> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| LingoError::InvalidRequest("not a data URL".to_string()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| LingoError::InvalidRequest("data URL is not base64".to_string()))?;
        if !mime.starts_with("image/") {
            return Err(LingoError::InvalidRequest(format!(
                "data URL is not an image: {mime}"
            )));
        }
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|err| LingoError::InvalidRequest(format!("invalid base64 image: {err}")))?;
        Ok(Self::new(bytes, mime))
    }
}

/// Removes a leading `data:image/...;base64,` so only the payload is left.
pub fn strip_data_url_prefix(value: &str) -> &str {
    match DATA_URL_PREFIX.find(value) {
        Some(found) => &value[found.end()..],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip() {
        let image = GeneratedImage::new(vec![0xFF, 0xD8, 0xFF, 0x00], JPEG_MIME);
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(GeneratedImage::from_data_url(&url).expect("parse"), image);
    }

    #[test]
    fn rejects_non_image_data_urls() {
        assert!(GeneratedImage::from_data_url("https://example.org/a.jpg").is_err());
        assert!(GeneratedImage::from_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(GeneratedImage::from_data_url("data:image/png,raw").is_err());
    }

    #[test]
    fn strips_prefix_only_when_present() {
        assert_eq!(strip_data_url_prefix("data:image/jpeg;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:image/svg+xml;base64,BB"), "BB");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    }
}
