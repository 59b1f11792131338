//! Generative providers behind the Hugging Face router.
//!
//! Text and image generation fall back differently: text resolves one model against
//! the router's live catalog and fails loudly, images walk a fixed candidate list.

pub mod background;
pub mod content;

use url::Url;

use crate::error::LingoError;
use crate::http::join_segments;

pub use background::{BackgroundGenerator, CandidateFailure};
pub use content::ContentGenerator;

/// Connection details for the router, shared by both generators.
#[derive(Clone, Debug)]
pub struct HfRouter {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HfRouter {
    /// `base_url` must end with a slash so relative paths join beneath it.
    pub fn new(http: reqwest::Client, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> Result<&str, LingoError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(LingoError::MissingCredential("Hugging Face API token"));
        }
        Ok(token)
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, LingoError> {
        join_segments(&self.base_url, segments)
    }
}
