//! Top-level flows: content, background, composition, upload, publish and logging.
//!
//! Caller policies live here. A static background stands in only when every image
//! model failed, and every publish attempt is logged exactly once.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::LingoError;
use crate::generate::{BackgroundGenerator, ContentGenerator, HfRouter};
use crate::http::build_client;
use crate::media::GeneratedImage;
use crate::outcome::{
    JsonLinesLogger, OutcomeLogger, OutcomeRecord, TracingLogger, record_outcome,
};
use crate::publish::{GraphClient, MediaKind, PublishResult};
use crate::render::{Compositor, TextRenderer};
use crate::translation::{Translation, random_seed_word};
use crate::upload::UploadClient;

/// Everything needed for one publish attempt.
#[derive(Clone, Copy, Debug)]
pub struct PublishRequest<'a> {
    /// Card content, recorded in the outcome log when known
    pub translation: Option<&'a Translation>,
    /// Feed post caption
    pub caption: &'a str,
    /// Base64 image, with or without a data URL prefix
    pub image_data: &'a str,
    /// ImgBB key, falls back to the configured one
    pub imgbb_api_key: Option<&'a str>,
    /// Instagram token, falls back to the configured one
    pub access_token: Option<&'a str>,
    /// Surfaces to publish to
    pub targets: &'a [MediaKind],
}

/// Hosted image and published ids.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    /// Public URL of the uploaded image
    pub image_url: String,
    /// Published ids
    #[serde(flatten)]
    pub result: PublishResult,
}

fn credential(
    explicit: Option<&str>,
    fallback: Option<&str>,
    name: &'static str,
) -> Result<String, LingoError> {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| fallback.map(str::trim).filter(|value| !value.is_empty()))
        .map(str::to_string)
        .ok_or(LingoError::MissingCredential(name))
}

/// Wires the components together with the configured defaults.
#[derive(Clone)]
pub struct Pipeline {
    compositor: Compositor,
    content: ContentGenerator,
    background: BackgroundGenerator,
    uploader: UploadClient,
    graph: GraphClient,
    logger: Arc<dyn OutcomeLogger>,
    fallback_background_url: String,
    imgbb_api_key: Option<String>,
    access_token: Option<String>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("fallback_background_url", &self.fallback_background_url)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds every client from `settings`, drawing text with `renderer`.
    pub fn from_settings(
        settings: &Settings,
        renderer: Arc<dyn TextRenderer>,
    ) -> Result<Self, LingoError> {
        let http = build_client()?;
        let router = HfRouter::new(
            http.clone(),
            settings.hf_router_url.clone(),
            settings.hf_api_token.clone(),
        );
        let logger: Arc<dyn OutcomeLogger> = match &settings.outcome_log {
            Some(path) => Arc::new(JsonLinesLogger::new(path.clone())),
            None => Arc::new(TracingLogger),
        };

        Ok(Self {
            compositor: Compositor::new(renderer, http.clone()),
            content: ContentGenerator::new(router.clone(), settings.hf_text_model.clone()),
            background: BackgroundGenerator::new(router, settings.hf_image_model.as_deref()),
            uploader: UploadClient::new(http.clone(), settings.imgbb_upload_url.clone()),
            graph: GraphClient::new(
                http,
                settings.graph_api_url.clone(),
                settings.instagram_account_id.clone(),
            ),
            logger,
            fallback_background_url: settings.fallback_background_url.clone(),
            imgbb_api_key: settings.imgbb_api_key.clone(),
            access_token: settings.instagram_access_token.clone(),
        })
    }

    /// Replaces the outcome sink
    pub fn with_logger(mut self, logger: Arc<dyn OutcomeLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// AI translation for `seed`, or for a random seed word.
    pub async fn ai_translation(&self, seed: Option<&str>) -> Result<Translation, LingoError> {
        let seed = match seed {
            Some(seed) => seed,
            None => random_seed_word(),
        };
        self.content.generate_translation(seed).await
    }

    /// AI background, without any fallback.
    pub async fn generate_background(&self, word: &str) -> Result<GeneratedImage, LingoError> {
        self.background.generate_background(word).await
    }

    /// A background URL for `word`: generated as a data URL, or the static fallback
    /// when every image model failed. Other errors propagate.
    pub async fn background_url(&self, word: &str) -> Result<String, LingoError> {
        match self.background.generate_background(word).await {
            Ok(image) => Ok(image.to_data_url()),
            Err(err @ LingoError::AllCandidatesExhausted(_)) => {
                warn!("{} Using fallback background image.", err);
                Ok(self.fallback_background_url.clone())
            }
            Err(err) => Err(err),
        }
    }

    /// Composes the card, generating a background unless one is given.
    pub async fn preview(
        &self,
        translation: &Translation,
        background: Option<&str>,
    ) -> Result<GeneratedImage, LingoError> {
        let background_url = match background {
            Some(url) => url.to_string(),
            None => self.background_url(&translation.english.word).await?,
        };
        self.compositor.compose(translation, &background_url).await
    }

    /// Uploads an image and returns its public URL.
    pub async fn save(
        &self,
        image_data: &str,
        imgbb_api_key: Option<&str>,
    ) -> Result<String, LingoError> {
        let key = credential(imgbb_api_key, self.imgbb_api_key.as_deref(), "ImgBB API key")?;
        self.uploader.upload_base64(image_data, &key).await
    }

    /// Uploads and publishes, then logs the outcome once whatever happened.
    pub async fn publish(
        &self,
        request: PublishRequest<'_>,
    ) -> Result<PublishOutcome, LingoError> {
        let mut image_url = None;
        let result = self.try_publish(&request, &mut image_url).await;

        let record = match &result {
            Ok(outcome) => OutcomeRecord::success(
                request.translation,
                request.caption,
                &outcome.image_url,
                outcome.result.primary_id(),
            ),
            Err(err) => OutcomeRecord::failure(
                request.translation,
                request.caption,
                image_url.as_deref(),
                err,
            ),
        };
        record_outcome(self.logger.as_ref(), &record).await;
        result
    }

    async fn try_publish(
        &self,
        request: &PublishRequest<'_>,
        image_url: &mut Option<String>,
    ) -> Result<PublishOutcome, LingoError> {
        let key = credential(
            request.imgbb_api_key,
            self.imgbb_api_key.as_deref(),
            "ImgBB API key",
        )?;
        let token = credential(
            request.access_token,
            self.access_token.as_deref(),
            "Instagram access token",
        )?;

        let hosted = self.uploader.upload_base64(request.image_data, &key).await?;
        *image_url = Some(hosted.clone());

        let result = self
            .graph
            .publish(&hosted, request.caption, &token, request.targets)
            .await?;
        info!("Published {:?}", result);
        Ok(PublishOutcome {
            image_url: hosted,
            result,
        })
    }

    /// Composes `translation` and publishes it with its caption.
    pub async fn publish_translation(
        &self,
        translation: &Translation,
        background: Option<&str>,
        targets: &[MediaKind],
    ) -> Result<PublishOutcome, LingoError> {
        let image = self.preview(translation, background).await?;
        let caption = translation.caption();
        let image_data = image.to_data_url();
        self.publish(PublishRequest {
            translation: Some(translation),
            caption: &caption,
            image_data: &image_data,
            imgbb_api_key: None,
            access_token: None,
            targets,
        })
        .await
    }
}
