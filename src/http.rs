//! Shared HTTP plumbing

use std::time::Duration;

use url::Url;

use crate::error::LingoError;

/// User-Agent sent on every outbound request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Image models can take a while to warm up
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the client shared by every component.
pub fn build_client() -> Result<reqwest::Client, LingoError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(LingoError::from)
}

/// Appends percent-encoded path segments to `base`.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, LingoError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| LingoError::InvalidRequest(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
