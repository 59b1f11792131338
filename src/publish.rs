//! Two-phase Instagram publishing: create every container, then publish each one.
//!
//! A successful post publish followed by a failed story publish is reported as a
//! failure even though the post is already live. No compensating delete is attempted.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::LingoError;
use crate::http::join_segments;

/// Which Instagram surface a container targets.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feed post, carries the caption
    Post,
    /// Story, never carries a caption
    Story,
}

impl MediaKind {
    /// Both targets in processing order
    pub const ALL: [MediaKind; 2] = [MediaKind::Post, MediaKind::Story];
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Post => write!(f, "post"),
            MediaKind::Story => write!(f, "story"),
        }
    }
}

/// Lifecycle of one remote container.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContainerState {
    /// Nothing has been sent yet
    NotStarted,
    /// Container exists remotely and awaits publishing
    Created {
        /// Id returned by the create call
        creation_id: String,
    },
    /// Container is live
    Published {
        /// Id returned by the create call
        creation_id: String,
        /// Id of the published media
        media_id: String,
    },
}

/// A container and where it is in its lifecycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MediaContainer {
    kind: MediaKind,
    state: ContainerState,
}

impl MediaContainer {
    /// A container that has not been created yet
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            state: ContainerState::NotStarted,
        }
    }

    /// Target surface
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Current state
    pub fn state(&self) -> &ContainerState {
        &self.state
    }

    fn illegal(&self, attempted: &str) -> LingoError {
        LingoError::IllegalTransition {
            kind: self.kind,
            message: format!("cannot {attempted} from {:?}", self.state),
        }
    }

    /// `NotStarted -> Created`
    pub fn mark_created(&mut self, creation_id: String) -> Result<(), LingoError> {
        match self.state {
            ContainerState::NotStarted => {
                self.state = ContainerState::Created { creation_id };
                Ok(())
            }
            _ => Err(self.illegal("create")),
        }
    }

    /// The creation id, only available while awaiting publish.
    pub fn pending_creation_id(&self) -> Result<&str, LingoError> {
        match &self.state {
            ContainerState::Created { creation_id } => Ok(creation_id),
            _ => Err(self.illegal("publish")),
        }
    }

    /// `Created -> Published`
    pub fn mark_published(&mut self, media_id: String) -> Result<(), LingoError> {
        let creation_id = self.pending_creation_id()?.to_string();
        self.state = ContainerState::Published {
            creation_id,
            media_id,
        };
        Ok(())
    }

    /// Published media id, if any
    pub fn media_id(&self) -> Option<&str> {
        match &self.state {
            ContainerState::Published { media_id, .. } => Some(media_id),
            _ => None,
        }
    }
}

/// Ids of the published media. Only built once every requested target is live.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// Feed post media id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    /// Story media id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
}

impl PublishResult {
    fn from_containers(containers: &[MediaContainer]) -> Self {
        let mut result = Self::default();
        for container in containers {
            let id = container.media_id().map(str::to_string);
            match container.kind() {
                MediaKind::Post => result.post_id = id,
                MediaKind::Story => result.story_id = id,
            }
        }
        result
    }

    /// The id most useful to show a person: the post, else the story
    pub fn primary_id(&self) -> Option<&str> {
        self.post_id.as_deref().or(self.story_id.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct GraphIdResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    data: Vec<PageEntry>,
    #[serde(default)]
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageDetails {
    #[serde(default)]
    instagram_business_account: Option<PageEntry>,
}

/// Result of a Graph call that should hand back an `id`.
enum GraphOutcome {
    Id(String),
    Failed(String),
}

/// Client for the Instagram Graph API.
#[derive(Clone, Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: Url,
    account_id: Option<String>,
}

impl GraphClient {
    /// `base_url` includes the API version, eg. `https://graph.facebook.com/v18.0/`.
    /// When `account_id` is blank the business account is discovered from the token.
    pub fn new(http: reqwest::Client, base_url: Url, account_id: Option<String>) -> Self {
        let account_id = account_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self {
            http,
            base_url,
            account_id,
        }
    }

    /// The configured account id, or the first business account linked to the token's pages.
    #[instrument(level = "debug", skip_all)]
    pub async fn resolve_account_id(&self, access_token: &str) -> Result<String, LingoError> {
        if let Some(id) = &self.account_id {
            return Ok(id.clone());
        }

        let url = join_segments(&self.base_url, &["me", "accounts"])?;
        let response = self
            .http
            .get(url)
            .query(&[("access_token", access_token)])
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let pages: PagesResponse = serde_json::from_slice(&body).unwrap_or_default();
        if !status.is_success() {
            return Err(LingoError::ProviderRequest {
                status: Some(status.as_u16()),
                body: pages
                    .error
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| "Failed to load Facebook pages.".to_string()),
            });
        }

        for page_id in pages.data.into_iter().filter_map(|page| page.id) {
            let url = join_segments(&self.base_url, &[page_id.as_str()])?;
            let response = self
                .http
                .get(url)
                .query(&[
                    ("fields", "instagram_business_account"),
                    ("access_token", access_token),
                ])
                .send()
                .await?;
            let details: PageDetails = response.json().await.unwrap_or_default();
            if let Some(id) = details.instagram_business_account.and_then(|account| account.id) {
                debug!("Page {} is linked to business account {}", page_id, id);
                return Ok(id);
            }
        }
        Err(LingoError::AccountNotFound)
    }

    async fn post_for_id(&self, url: Url, body: serde_json::Value) -> GraphOutcome {
        let response = match self.http.post(url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => return GraphOutcome::Failed(err.to_string()),
        };
        let status = response.status();
        let parsed: GraphIdResponse = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(err) => return GraphOutcome::Failed(err.to_string()),
        };
        match parsed.id.filter(|id| !id.trim().is_empty()) {
            Some(id) if status.is_success() => GraphOutcome::Id(id),
            _ => GraphOutcome::Failed(
                parsed
                    .error
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| format!("no id returned ({status})")),
            ),
        }
    }

    /// Creates one container and returns its creation id. Stories never get a caption.
    pub async fn create_container(
        &self,
        account_id: &str,
        access_token: &str,
        kind: MediaKind,
        image_url: &str,
        caption: &str,
    ) -> Result<String, LingoError> {
        let url = join_segments(&self.base_url, &[account_id, "media"])?;
        let body = match kind {
            MediaKind::Post => json!({
                "image_url": image_url,
                "caption": caption,
                "access_token": access_token,
            }),
            MediaKind::Story => json!({
                "image_url": image_url,
                "access_token": access_token,
                "media_type": "STORIES",
            }),
        };
        match self.post_for_id(url, body).await {
            GraphOutcome::Id(id) => Ok(id),
            GraphOutcome::Failed(message) => Err(LingoError::ContainerCreation { kind, message }),
        }
    }

    /// Publishes a created container and returns the media id.
    pub async fn publish_container(
        &self,
        account_id: &str,
        access_token: &str,
        kind: MediaKind,
        creation_id: &str,
    ) -> Result<String, LingoError> {
        let url = join_segments(&self.base_url, &[account_id, "media_publish"])?;
        let body = json!({
            "creation_id": creation_id,
            "access_token": access_token,
        });
        match self.post_for_id(url, body).await {
            GraphOutcome::Id(id) => Ok(id),
            GraphOutcome::Failed(message) => Err(LingoError::Publish { kind, message }),
        }
    }

    /// Creates every requested container, then publishes them in the same order.
    ///
    /// Any creation failure aborts before anything is published. Targets are processed
    /// post first, then story, whatever order they are passed in.
    #[instrument(level = "info", skip(self, caption, access_token))]
    pub async fn publish(
        &self,
        image_url: &str,
        caption: &str,
        access_token: &str,
        targets: &[MediaKind],
    ) -> Result<PublishResult, LingoError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(LingoError::MissingCredential("Instagram access token"));
        }
        let mut containers: Vec<MediaContainer> = MediaKind::ALL
            .into_iter()
            .filter(|kind| targets.contains(kind))
            .map(MediaContainer::new)
            .collect();
        if containers.is_empty() {
            return Err(LingoError::InvalidRequest(
                "at least one publish target is required".to_string(),
            ));
        }

        let account_id = self.resolve_account_id(access_token).await?;

        for container in &mut containers {
            let creation_id = self
                .create_container(&account_id, access_token, container.kind(), image_url, caption)
                .await?;
            debug!("Created {} container {}", container.kind(), creation_id);
            container.mark_created(creation_id)?;
        }

        for container in &mut containers {
            let media_id = self
                .publish_container(
                    &account_id,
                    access_token,
                    container.kind(),
                    container.pending_creation_id()?,
                )
                .await?;
            info!("Published {} as {}", container.kind(), media_id);
            container.mark_published(media_id)?;
        }

        Ok(PublishResult::from_containers(&containers))
    }
}
