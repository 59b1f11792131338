//! CLI parser
use std::num::NonZeroU16;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::publish::MediaKind;

#[derive(Parser, Debug)]
#[command(name = "lingopost", version)]
/// Compose trilingual word cards and publish them to Instagram
pub struct CliOptions {
    #[clap(long, global = true, help = "Enable debug logging", env = "LINGOPOST_DEBUG")]
    /// Enable debug logging. Env: LINGOPOST_DEBUG
    pub debug: bool,

    #[clap(long, env = "HF_API_TOKEN", hide_env_values = true)]
    /// Hugging Face API token. Env: HF_API_TOKEN
    pub hf_api_token: Option<String>,

    #[clap(long, env = "HF_MODEL")]
    /// Chat model tried before the built-in list. Env: HF_MODEL
    pub hf_model: Option<String>,

    #[clap(long, env = "HF_IMAGE_MODEL")]
    /// Image model tried before the built-in list. Env: HF_IMAGE_MODEL
    pub hf_image_model: Option<String>,

    #[clap(long, default_value = crate::constants::HF_ROUTER_BASE_URL, env = "LINGOPOST_HF_ROUTER_URL")]
    /// Hugging Face router base URL. Env: LINGOPOST_HF_ROUTER_URL
    pub hf_router_url: Url,

    #[clap(long, env = "IMGBB_API_KEY", hide_env_values = true)]
    /// Default ImgBB API key. Env: IMGBB_API_KEY
    pub imgbb_api_key: Option<String>,

    #[clap(long, default_value = crate::constants::IMGBB_UPLOAD_URL, env = "LINGOPOST_IMGBB_UPLOAD_URL")]
    /// ImgBB upload endpoint. Env: LINGOPOST_IMGBB_UPLOAD_URL
    pub imgbb_upload_url: Url,

    #[clap(long, env = "INSTAGRAM_ACCESS_TOKEN", hide_env_values = true)]
    /// Default Instagram access token. Env: INSTAGRAM_ACCESS_TOKEN
    pub instagram_access_token: Option<String>,

    #[clap(long, env = "INSTAGRAM_BUSINESS_ACCOUNT_ID")]
    /// Instagram business account id, discovered from the token when unset.
    /// Env: INSTAGRAM_BUSINESS_ACCOUNT_ID
    pub instagram_account_id: Option<String>,

    #[clap(long, default_value = crate::constants::GRAPH_API_BASE_URL, env = "LINGOPOST_GRAPH_API_URL")]
    /// Graph API base URL including version. Env: LINGOPOST_GRAPH_API_URL
    pub graph_api_url: Url,

    #[clap(long, default_value = crate::constants::FALLBACK_BACKGROUND_URL, env = "LINGOPOST_FALLBACK_BACKGROUND")]
    /// Background used when every image model fails. Env: LINGOPOST_FALLBACK_BACKGROUND
    pub fallback_background_url: String,

    #[clap(long, default_value = "./fonts/Inter-Regular.ttf", env = "LINGOPOST_FONT")]
    /// Regular font file. Env: LINGOPOST_FONT
    pub font: PathBuf,

    #[clap(long, env = "LINGOPOST_BOLD_FONT")]
    /// Bold font file for titles and words. Env: LINGOPOST_BOLD_FONT
    pub bold_font: Option<PathBuf>,

    #[clap(long, env = "LINGOPOST_OUTCOME_LOG")]
    /// Append publish outcomes to this JSON lines file. Env: LINGOPOST_OUTCOME_LOG
    pub outcome_log: Option<PathBuf>,

    #[command(subcommand)]
    /// What to do
    pub command: Command,
}

/// Where card content comes from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContentArgs {
    #[arg(long, conflicts_with = "ai_word")]
    /// Read the translation from a JSON file
    pub translation: Option<PathBuf>,

    #[arg(long)]
    /// Generate the translation with the text model
    pub ai_word: bool,

    #[arg(long, requires = "ai_word")]
    /// Seed word for AI generation, random when unset
    pub word: Option<String>,

    #[arg(long)]
    /// Background image URL (http(s) or data:), skips AI background generation
    pub background: Option<String>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a random translation from the built-in catalog
    Word,
    /// Generate a translation with the text model and print it
    AiWord {
        #[arg(long)]
        /// Seed word, random when unset
        word: Option<String>,
    },
    /// Generate a background image
    Background {
        #[arg(long)]
        /// Seed word
        word: String,
        #[arg(long, short)]
        /// Output file
        out: PathBuf,
    },
    /// Compose a card and write it as JPEG
    Compose {
        #[command(flatten)]
        /// Card content
        content: ContentArgs,
        #[arg(long, short, default_value = "card.jpg")]
        /// Output file
        out: PathBuf,
    },
    /// Upload an image file to ImgBB and print its URL
    Upload {
        /// Image file to upload
        image: PathBuf,
    },
    /// Compose, upload and publish a card
    Publish {
        #[command(flatten)]
        /// Card content
        content: ContentArgs,
        #[arg(long, value_enum, value_delimiter = ',', default_value = "post,story")]
        /// Targets to publish to
        targets: Vec<MediaKind>,
    },
    /// Run the HTTP gateway
    Serve {
        #[clap(long, short, default_value = "9000", env = "LINGOPOST_PORT")]
        /// http listener, defaults to `9000`.
        /// Env: LINGOPOST_PORT
        port: NonZeroU16,
        #[clap(long, short, default_value = "127.0.0.1", env = "LINGOPOST_LISTEN_ADDRESS")]
        /// Listen address, defaults to `127.0.0.1`.
        /// Env: LINGOPOST_LISTEN_ADDRESS
        listen_address: String,
    },
}
