//! Shared constants for endpoints, model lists and canvas geometry
//!

/// ImgBB upload endpoint
pub const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// Graph API base, including the version segment
pub const GRAPH_API_BASE_URL: &str = "https://graph.facebook.com/v18.0/";

/// Hugging Face router base
pub const HF_ROUTER_BASE_URL: &str = "https://router.huggingface.co/";

/// Chat models tried in order against the router's live catalog.
pub const PREFERRED_TEXT_MODELS: [&str; 3] = [
    "Qwen/Qwen2.5-Coder-7B-Instruct",
    "Qwen/Qwen2.5-7B-Instruct",
    "deepseek-ai/DeepSeek-R1:fastest",
];

/// Image models tried in order until one returns an image.
pub const IMAGE_MODEL_CANDIDATES: [&str; 4] = [
    "black-forest-labs/FLUX.1-schnell",
    "stabilityai/stable-diffusion-xl-base-1.0",
    "stabilityai/stable-diffusion-2-1",
    "runwayml/stable-diffusion-v1-5",
];

/// Used when every image model fails.
pub const FALLBACK_BACKGROUND_URL: &str =
    "https://images.pexels.com/photos/457882/pexels-photo-457882.jpeg";

/// Seed used when the caller sends a blank word
pub const DEFAULT_SEED_WORD: &str = "journey";

/// Longest seed word sent to the text model
pub const MAX_TEXT_SEED_CHARS: usize = 40;

/// Longest seed word sent to the image model
pub const MAX_IMAGE_SEED_CHARS: usize = 50;

/// Output canvas width
pub const CANVAS_WIDTH: u32 = 1080;

/// Output canvas height
pub const CANVAS_HEIGHT: u32 = 1080;

/// JPEG quality for the composed image
pub const JPEG_QUALITY: u8 = 90;

/// Hashtags appended to every caption
pub const CAPTION_HASHTAGS: &str = "#languages #english #spanish #catalan";
