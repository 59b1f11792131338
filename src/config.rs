//! Config handling

use std::path::PathBuf;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Resolved endpoints, keys and paths shared by every command.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Hugging Face router base URL
    pub hf_router_url: Url,
    /// Hugging Face API token
    pub hf_api_token: String,
    /// Chat model tried before the built-in preferences
    pub hf_text_model: Option<String>,
    /// Image model tried before the built-in candidates
    pub hf_image_model: Option<String>,
    /// ImgBB upload endpoint
    pub imgbb_upload_url: Url,
    /// Default ImgBB key, used when a request does not carry one
    pub imgbb_api_key: Option<String>,
    /// Graph API base including version
    pub graph_api_url: Url,
    /// Default Instagram token, used when a request does not carry one
    pub instagram_access_token: Option<String>,
    /// Business account id; discovered from the token when unset
    pub instagram_account_id: Option<String>,
    /// Background used when every image model fails
    pub fallback_background_url: String,
    /// Regular weight font file
    pub font_path: PathBuf,
    /// Bold font file for titles and words
    pub bold_font_path: Option<PathBuf>,
    /// JSON lines file for publish outcomes; outcomes only go to the log when unset
    pub outcome_log: Option<PathBuf>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl From<&CliOptions> for Settings {
    fn from(cli: &CliOptions) -> Self {
        Self {
            hf_router_url: cli.hf_router_url.clone(),
            hf_api_token: cli.hf_api_token.clone().unwrap_or_default(),
            hf_text_model: non_blank(&cli.hf_model),
            hf_image_model: non_blank(&cli.hf_image_model),
            imgbb_upload_url: cli.imgbb_upload_url.clone(),
            imgbb_api_key: non_blank(&cli.imgbb_api_key),
            graph_api_url: cli.graph_api_url.clone(),
            instagram_access_token: non_blank(&cli.instagram_access_token),
            instagram_account_id: non_blank(&cli.instagram_account_id),
            fallback_background_url: cli.fallback_background_url.clone(),
            font_path: cli.font.clone(),
            bold_font_path: cli.bold_font.clone(),
            outcome_log: cli.outcome_log.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn blank_secrets_become_none() {
        let cli = CliOptions::parse_from([
            "lingopost",
            "--font",
            "/tmp/Inter.ttf",
            "--imgbb-api-key",
            "  ",
            "--instagram-account-id",
            " 1784 ",
            "word",
        ]);
        let settings = Settings::from(&cli);
        assert_eq!(settings.imgbb_api_key, None);
        assert_eq!(settings.instagram_account_id.as_deref(), Some("1784"));
        assert_eq!(
            settings.graph_api_url.as_str(),
            crate::constants::GRAPH_API_BASE_URL
        );
    }
}
