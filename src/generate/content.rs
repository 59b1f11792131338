//! AI generated translations via router chat completions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::HfRouter;
use crate::constants::{DEFAULT_SEED_WORD, MAX_TEXT_SEED_CHARS, PREFERRED_TEXT_MODELS};
use crate::error::LingoError;
use crate::models::{resolve, with_override};
use crate::translation::{Translation, sanitize_seed};

const MAX_TOKENS: u32 = 320;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    #[serde(default)]
    data: Vec<ModelListEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelListEntry {
    id: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_prompt(word: &str) -> String {
    let input = format!("Input word: {word}");
    [
        "Return only valid JSON without markdown or explanation.",
        "Schema:",
        r#"{"english":{"word":"","phrase":""},"spanish":{"word":"","phrase":""},"catalan":{"word":"","phrase":""}}"#,
        input.as_str(),
        "Task: Translate the word and generate one short, natural example phrase in each language.",
    ]
    .join("\n")
}

/// Returns the first balanced `{...}` span in `text`, skipping braces inside strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pulls a translation out of free model text and validates it.
pub fn parse_translation(generated: &str) -> Result<Translation, LingoError> {
    let extracted = extract_json_object(generated).ok_or_else(|| {
        LingoError::InvalidResponseShape("no JSON object in model output".to_string())
    })?;
    let translation: Translation = serde_json::from_str(extracted)
        .map_err(|err| LingoError::InvalidResponseShape(format!("{err}: {extracted}")))?;
    translation.validate()?;
    Ok(translation)
}

async fn read_failure(response: reqwest::Response) -> LingoError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
    LingoError::ProviderRequest {
        status: Some(status),
        body,
    }
}

/// Generates translations with whichever preferred chat model the router offers.
#[derive(Clone, Debug)]
pub struct ContentGenerator {
    router: HfRouter,
    model_override: Option<String>,
}

impl ContentGenerator {
    /// `model_override` is tried before the built-in preferences.
    pub fn new(router: HfRouter, model_override: Option<String>) -> Self {
        Self {
            router,
            model_override,
        }
    }

    /// Model ids currently served to this token, in router order.
    pub async fn fetch_catalog(&self) -> Result<Vec<String>, LingoError> {
        let url = self.router.endpoint(&["v1", "models"])?;
        let response = self
            .router
            .http()
            .get(url)
            .bearer_auth(self.router.token()?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }
        let models: ModelListResponse = response.json().await.map_err(|err| {
            LingoError::InvalidResponseShape(format!("model list is not valid JSON: {err}"))
        })?;
        Ok(models.data.into_iter().map(|model| model.id).collect())
    }

    /// Asks for the seed word translated into all three languages.
    ///
    /// Single attempt; the catalog is fetched fresh on every call.
    #[instrument(level = "info", skip(self))]
    pub async fn generate_translation(&self, seed_word: &str) -> Result<Translation, LingoError> {
        let word = sanitize_seed(Some(seed_word), MAX_TEXT_SEED_CHARS, DEFAULT_SEED_WORD);
        let catalog = self.fetch_catalog().await?;
        let preferred = with_override(self.model_override.as_deref(), &PREFERRED_TEXT_MODELS);
        let model = resolve(&preferred, &catalog)?;
        info!("Generating translation for {:?} with {}", word, model);

        let prompt = build_prompt(&word);
        let request = ChatCompletionRequest {
            model: &model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = self.router.endpoint(&["v1", "chat", "completions"])?;
        let response = self
            .router
            .http()
            .post(url)
            .bearer_auth(self.router.token()?)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|err| {
            LingoError::InvalidResponseShape(format!("completion is not valid JSON: {err}"))
        })?;
        let generated = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        debug!("Model output: {}", generated);

        parse_translation(&generated)
    }
}
