//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info};

use crate::generate::background::CandidateFailure;
use crate::publish::MediaKind;

/// Every failure a lingopost operation can report.
#[derive(Debug, thiserror::Error)]
pub enum LingoError {
    /// A required key or token was empty, checked before any I/O
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    /// A provider returned a non-success status, or the request never completed
    #[error("Provider request failed ({}): {body}", format_status(.status))]
    ProviderRequest {
        /// HTTP status, `None` when the request failed before a response arrived
        status: Option<u16>,
        /// Response body or transport error text
        body: String,
    },

    /// The image host refused the upload or returned no usable URL
    #[error("Image upload failed: {0}")]
    UploadRejected(String),

    /// The platform did not hand back a creation id for a container
    #[error("Instagram {kind} container creation failed: {message}")]
    ContainerCreation {
        /// Which container failed
        kind: MediaKind,
        /// Platform error message
        message: String,
    },

    /// A created container could not be published
    #[error("Instagram {kind} publish failed: {message}")]
    Publish {
        /// Which container failed
        kind: MediaKind,
        /// Platform error message
        message: String,
    },

    /// The remote call succeeded but the payload did not have the expected structure
    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    /// Every image model candidate failed
    #[error("Image request failed for all candidate models. {}", format_failures(.0))]
    AllCandidatesExhausted(Vec<CandidateFailure>),

    /// The background image could not be fetched or decoded
    #[error("Failed to load background image: {0}")]
    ImageLoad(String),

    /// The canvas could not be serialized to JPEG
    #[error("Image encoding failed: {0}")]
    Encoding(String),

    /// The provider catalog was empty
    #[error("No available models found for this token")]
    NoAvailableModel,

    /// A publish state machine step was attempted out of order
    #[error("Illegal {kind} transition: {message}")]
    IllegalTransition {
        /// Container the transition was attempted on
        kind: MediaKind,
        /// What was attempted and from which state
        message: String,
    },

    /// No business account could be found for the access token
    #[error(
        "No Instagram business account found for this token. Link the Professional account to a Facebook Page."
    )]
    AccountNotFound,

    /// The caller sent something unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A font file could not be read or parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Local filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Renders an optional HTTP status, `network` when no response arrived.
pub(crate) fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

fn format_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl From<url::ParseError> for LingoError {
    fn from(err: url::ParseError) -> Self {
        LingoError::InvalidRequest(err.to_string())
    }
}

impl From<reqwest::Error> for LingoError {
    fn from(err: reqwest::Error) -> Self {
        LingoError::ProviderRequest {
            status: err.status().map(|status| status.as_u16()),
            body: err.to_string(),
        }
    }
}

impl LingoError {
    /// Status code used when the error reaches the gateway
    pub fn status_code(&self) -> StatusCode {
        match self {
            LingoError::MissingCredential(_) | LingoError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            LingoError::ImageLoad(_)
            | LingoError::Encoding(_)
            | LingoError::Font(_)
            | LingoError::IllegalTransition { .. }
            | LingoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for LingoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            info!("Bad request: {}", self);
        } else {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
