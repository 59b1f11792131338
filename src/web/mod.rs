//! JSON gateway over the pipeline.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::error::LingoError;
use crate::media::GeneratedImage;
use crate::pipeline::{Pipeline, PublishRequest};
use crate::publish::MediaKind;
use crate::translation::Translation;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WordRequest {
    #[serde(default)]
    word: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundResponse {
    image_data_url: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
enum PipelineAction {
    Save,
    PublishStoryPost,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaPipelineRequest {
    action: PipelineAction,
    image_data_url: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    imgbb_api_key: Option<String>,
    #[serde(default)]
    instagram_access_token: Option<String>,
    #[serde(default)]
    translation: Option<Translation>,
}

async fn translation_handler(
    State(state): State<AppState>,
    Json(request): Json<WordRequest>,
) -> Result<Json<Value>, LingoError> {
    let translation = state
        .pipeline
        .ai_translation(request.word.as_deref())
        .await
        .inspect_err(|err| error!("Translation failed: {}", err))?;
    Ok(Json(json!({ "translation": translation })))
}

async fn background_handler(
    State(state): State<AppState>,
    Json(request): Json<WordRequest>,
) -> Result<Json<BackgroundResponse>, LingoError> {
    let word = request.word.unwrap_or_default();
    let image: GeneratedImage = state
        .pipeline
        .generate_background(&word)
        .await
        .inspect_err(|err| error!("Background generation failed: {}", err))?;
    Ok(Json(BackgroundResponse {
        image_data_url: image.to_data_url(),
    }))
}

async fn media_pipeline_handler(
    State(state): State<AppState>,
    Json(request): Json<MediaPipelineRequest>,
) -> Result<Json<Value>, LingoError> {
    if !request.image_data_url.starts_with("data:image/") {
        return Err(LingoError::InvalidRequest(
            "imageDataUrl must be a data:image/ URL".to_string(),
        ));
    }

    match request.action {
        PipelineAction::Save => {
            let image_url = state
                .pipeline
                .save(&request.image_data_url, request.imgbb_api_key.as_deref())
                .await
                .inspect_err(|err| error!("Save failed: {}", err))?;
            Ok(Json(json!({ "imageUrl": image_url })))
        }
        PipelineAction::PublishStoryPost => {
            let caption = request.caption.unwrap_or_default();
            let outcome = state
                .pipeline
                .publish(PublishRequest {
                    translation: request.translation.as_ref(),
                    caption: &caption,
                    image_data: &request.image_data_url,
                    imgbb_api_key: request.imgbb_api_key.as_deref(),
                    access_token: request.instagram_access_token.as_deref(),
                    targets: &MediaKind::ALL,
                })
                .await
                .inspect_err(|err| error!("Publish failed: {}", err))?;
            Ok(Json(json!(outcome)))
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/translation", axum::routing::post(translation_handler))
        .route("/background", axum::routing::post(background_handler))
        .route(
            "/media-pipeline",
            axum::routing::post(media_pipeline_handler),
        )
}

/// Serves the gateway until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Pipeline,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
