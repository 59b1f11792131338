use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lingopost::cli::{CliOptions, Command, ContentArgs};
use lingopost::config::{Settings, setup_logging};
use lingopost::error::LingoError;
use lingopost::generate::{BackgroundGenerator, ContentGenerator, HfRouter};
use lingopost::http::build_client;
use lingopost::media::GeneratedImage;
use lingopost::pipeline::Pipeline;
use lingopost::render::FontSet;
use lingopost::translation::{Translation, random_seed_word, random_translation};
use lingopost::upload::UploadClient;
use tracing::{error, info};

fn build_pipeline(settings: &Settings) -> anyhow::Result<Pipeline> {
    let fonts = FontSet::load(&settings.font_path, settings.bold_font_path.as_deref())?;
    Ok(Pipeline::from_settings(settings, Arc::new(fonts))?)
}

fn hf_router(settings: &Settings) -> anyhow::Result<HfRouter> {
    Ok(HfRouter::new(
        build_client()?,
        settings.hf_router_url.clone(),
        settings.hf_api_token.clone(),
    ))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn write_image(path: &Path, image: &GeneratedImage) -> anyhow::Result<()> {
    tokio::fs::write(path, &image.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), image.bytes.len());
    Ok(())
}

async fn load_translation(
    pipeline: &Pipeline,
    content: &ContentArgs,
) -> anyhow::Result<Translation> {
    if let Some(path) = &content.translation {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let translation: Translation = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a translation", path.display()))?;
        translation.validate()?;
        return Ok(translation);
    }
    if content.ai_word {
        return Ok(pipeline.ai_translation(content.word.as_deref()).await?);
    }
    Ok(random_translation())
}

async fn run(cli: CliOptions) -> anyhow::Result<()> {
    let settings = Settings::from(&cli);

    match cli.command {
        Command::Word => print_json(&random_translation())?,
        Command::AiWord { word } => {
            let generator = ContentGenerator::new(hf_router(&settings)?, settings.hf_text_model);
            let seed = match word.as_deref() {
                Some(seed) => seed,
                None => random_seed_word(),
            };
            print_json(&generator.generate_translation(seed).await?)?;
        }
        Command::Background { word, out } => {
            let generator =
                BackgroundGenerator::new(hf_router(&settings)?, settings.hf_image_model.as_deref());
            let image = generator.generate_background(&word).await?;
            write_image(&out, &image).await?;
        }
        Command::Compose { content, out } => {
            let pipeline = build_pipeline(&settings)?;
            let translation = load_translation(&pipeline, &content).await?;
            let image = pipeline
                .preview(&translation, content.background.as_deref())
                .await?;
            write_image(&out, &image).await?;
        }
        Command::Upload { image } => {
            let key = settings
                .imgbb_api_key
                .as_deref()
                .ok_or(LingoError::MissingCredential("ImgBB API key"))?;
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("failed to read {}", image.display()))?;
            let client = UploadClient::new(build_client()?, settings.imgbb_upload_url);
            let url = client
                .upload(&GeneratedImage::new(bytes, "image/jpeg"), key)
                .await?;
            println!("{url}");
        }
        Command::Publish { content, targets } => {
            let pipeline = build_pipeline(&settings)?;
            let translation = load_translation(&pipeline, &content).await?;
            let outcome = pipeline
                .publish_translation(&translation, content.background.as_deref(), &targets)
                .await?;
            print_json(&outcome)?;
        }
        Command::Serve {
            port,
            listen_address,
        } => {
            let pipeline = build_pipeline(&settings)?;
            lingopost::web::setup_server(&listen_address, port, pipeline).await?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
