//! AI generated backgrounds, walking an ordered list of image models.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::HfRouter;
use crate::constants::{DEFAULT_SEED_WORD, IMAGE_MODEL_CANDIDATES, MAX_IMAGE_SEED_CHARS};
use crate::error::{LingoError, format_status};
use crate::media::{GeneratedImage, JPEG_MIME};
use crate::models::with_override;
use crate::translation::sanitize_seed;

/// One image model that did not produce an image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CandidateFailure {
    /// Model id that was tried
    pub model: String,
    /// HTTP status, `None` if no response arrived
    pub status: Option<u16>,
    /// Response body or transport error
    pub body: String,
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.model,
            format_status(&self.status),
            self.body
        )
    }
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    guidance_scale: f32,
    num_inference_steps: u32,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

/// Text sent to every image model.
pub fn background_prompt(word: &str) -> String {
    format!("realistic photo like image that would be in a theme of Spain and related to {word}")
}

/// Generates a background by trying each candidate model in order.
#[derive(Clone, Debug)]
pub struct BackgroundGenerator {
    router: HfRouter,
    candidates: Vec<String>,
}

impl BackgroundGenerator {
    /// Candidates are the built-in models, led by `model_override` when set.
    pub fn new(router: HfRouter, model_override: Option<&str>) -> Self {
        Self::with_candidates(router, with_override(model_override, &IMAGE_MODEL_CANDIDATES))
    }

    /// Uses an explicit candidate list.
    pub fn with_candidates(router: HfRouter, candidates: Vec<String>) -> Self {
        Self { router, candidates }
    }

    /// Candidate model ids, in attempt order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Returns the first image any candidate produces.
    ///
    /// Earlier failures are dropped once a candidate succeeds; if none does, every
    /// failure is returned in attempt order.
    #[instrument(level = "info", skip(self))]
    pub async fn generate_background(&self, seed_word: &str) -> Result<GeneratedImage, LingoError> {
        let token = self.router.token()?;
        let word = sanitize_seed(Some(seed_word), MAX_IMAGE_SEED_CHARS, DEFAULT_SEED_WORD);
        let prompt = background_prompt(&word);
        let mut failures: Vec<CandidateFailure> = Vec::with_capacity(self.candidates.len());

        for model in &self.candidates {
            match self.try_candidate(token, model, &prompt).await {
                Ok(image) => {
                    info!("Background generated by {} after {} failures", model, failures.len());
                    return Ok(image);
                }
                Err(failure) => {
                    warn!("Image model failed: {}", failure);
                    failures.push(failure);
                }
            }
        }

        Err(LingoError::AllCandidatesExhausted(failures))
    }

    async fn try_candidate(
        &self,
        token: &str,
        model: &str,
        prompt: &str,
    ) -> Result<GeneratedImage, CandidateFailure> {
        let failure = |status: Option<u16>, body: String| CandidateFailure {
            model: model.to_string(),
            status,
            body,
        };

        let url = self
            .router
            .endpoint(&["hf-inference", "models", model])
            .map_err(|err| failure(None, err.to_string()))?;
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                guidance_scale: 3.5,
                num_inference_steps: 6,
                width: 1024,
                height: 1024,
            },
        };

        let response = self
            .router
            .http()
            .post(url)
            .bearer_auth(token)
            .header(ACCEPT, JPEG_MIME)
            .json(&request)
            .send()
            .await
            .map_err(|err| failure(None, err.to_string()))?;

        let status = response.status();
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_else(|| JPEG_MIME.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| failure(Some(status.as_u16()), err.to_string()))?;

        if !status.is_success() {
            return Err(failure(
                Some(status.as_u16()),
                String::from_utf8_lossy(&bytes).to_string(),
            ));
        }
        if !mime.starts_with("image/") || bytes.is_empty() {
            return Err(failure(
                Some(status.as_u16()),
                format!(
                    "expected image bytes, got {} ({} bytes): {}",
                    mime,
                    bytes.len(),
                    String::from_utf8_lossy(&bytes)
                ),
            ));
        }
        Ok(GeneratedImage::new(bytes.to_vec(), mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn router(token: &str) -> HfRouter {
        let base = Url::parse("http://127.0.0.1:9/").expect("url");
        HfRouter::new(reqwest::Client::new(), base, token)
    }

    #[test]
    fn override_leads_default_candidates() {
        let generator = BackgroundGenerator::new(router("t"), Some("my/model"));
        assert_eq!(generator.candidates()[0], "my/model");
        assert_eq!(generator.candidates().len(), IMAGE_MODEL_CANDIDATES.len() + 1);
        let generator = BackgroundGenerator::new(router("t"), None);
        assert_eq!(generator.candidates()[0], IMAGE_MODEL_CANDIDATES[0]);
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_candidate() {
        let generator = BackgroundGenerator::new(router(""), None);
        let err = generator
            .generate_background("sunrise")
            .await
            .expect_err("no token");
        assert!(matches!(err, LingoError::MissingCredential(_)));
    }

    #[test]
    fn prompt_mentions_word() {
        assert!(background_prompt("paella").ends_with("related to paella"));
    }
}
