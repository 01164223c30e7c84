//! Vision-LLM OCR provider
//!
//! Sends the page bitmap to an OpenAI-compatible chat-completions endpoint
//! and asks for the page transcribed as markdown inside a fenced block.
//! Works against OpenAI itself or local servers such as Ollama via
//! `api_base`.

use super::types::{OcrError, OcrResult};
use super::{OcrContext, OcrProvider};
use crate::config::OcrConfig;
use base64::{Engine as _, engine::general_purpose};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Offered when the endpoint cannot list its own models
pub const FALLBACK_VISION_MODELS: &[&str] = &[
    "gpt-4o-mini",
    "gpt-4o",
    "claude-3-haiku",
    "claude-3-sonnet",
    "claude-3-opus",
    "gemini-pro-vision",
];

const CONNECTION_PROMPT: &str = "Hello, just testing connection. Reply with 'OK'.";

/// Prompt sent alongside every page image
pub const OCR_PROMPT: &str = "Turn this into markdown text, demarcated by the ```markdown code tag. \
     If there are parts of the text which appear to be illustrations or unreadable, \
     embed them as SVG content. If this is a blank page with no text content, \
     just return an empty ```markdown region.";

static MARKDOWN_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```markdown\s*\n(.*?)\n```").expect("valid regex"));
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\s*\n(.*?)\n```").expect("valid regex"));

/// OCR through a vision-capable chat model
#[derive(Debug, Clone)]
pub struct LlmOcr {
    api_base: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl LlmOcr {
    /// Build the provider and its HTTP client; the client is reused for every page
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self {
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: config.api_key.clone(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    /// A key is needed unless the endpoint is a custom (usually local) one
    pub fn is_available(&self) -> bool {
        self.api_key.is_some() || self.api_base != DEFAULT_API_BASE
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn models_endpoint(&self) -> String {
        format!("{}/models", self.api_base.trim_end_matches('/'))
    }

    /// Send a tiny prompt and report whether the model answered with OK
    pub fn check_connection(&self) -> Result<bool, OcrError> {
        let reply = self.chat(
            vec![ContentPart::Text {
                text: CONNECTION_PROMPT.to_string(),
            }],
            10,
        )?;
        log::debug!("Connection check reply: {}", reply.trim());
        Ok(reply_confirms(&reply))
    }

    /// Model ids served by the endpoint, or [`FALLBACK_VISION_MODELS`] when
    /// the listing cannot be fetched
    pub fn list_models(&self) -> Vec<String> {
        match self.fetch_models() {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                log::warn!("{} listed no models, using defaults", self.models_endpoint());
                fallback_models()
            }
            Err(e) => {
                log::warn!("Could not list models from {}: {}", self.models_endpoint(), e);
                fallback_models()
            }
        }
    }

    fn fetch_models(&self) -> Result<Vec<String>, OcrError> {
        let mut builder = self.client.get(self.models_endpoint());
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(OcrError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_model_list(&body)
    }

    fn request_completion(&self, bitmap: &[u8]) -> Result<String, OcrError> {
        // Refuse before encoding the image so a missing key fails fast
        self.ensure_available()?;

        self.chat(
            vec![
                ContentPart::Text {
                    text: OCR_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_uri(bitmap)?,
                    },
                },
            ],
            4096,
        )
    }

    fn ensure_available(&self) -> Result<(), OcrError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(OcrError::NotAvailable(
                "No API key configured (set SCRAWL2ORG_API_KEY or OPENAI_API_KEY)".to_string(),
            ))
        }
    }

    /// One user turn against the chat-completions endpoint; returns the reply text
    fn chat(&self, content: Vec<ContentPart>, max_tokens: u32) -> Result<String, OcrError> {
        self.ensure_available()?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: 0.1,
            max_tokens,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ChatResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(OcrError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OcrError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(OcrError::Api {
                status: status.as_u16(),
                message: error.message,
            });
        }

        parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .ok_or_else(|| OcrError::InvalidResponse("Model returned no content".to_string()))
    }
}

impl OcrProvider for LlmOcr {
    fn engine(&self) -> &str {
        "llm"
    }

    fn model(&self) -> Option<String> {
        Some(self.model.clone())
    }

    fn extract(&self, bitmap: &[u8], context: &OcrContext) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let response = self.request_completion(bitmap)?;
        let text = extract_markdown_content(&response);

        Ok(OcrResult {
            confidence: 1.0,
            processing_time_ms: start.elapsed().as_millis() as u64,
            engine: self.engine().to_string(),
            model: Some(self.model.clone()),
            version: Some("1.0.0".to_string()),
            error: None,
            metadata: Some(serde_json::json!({
                "response_length": text.len(),
                "debug_info": format!("LLM OCR using {}{}", self.model, context.describe()),
            })),
            text,
        })
    }
}

fn fallback_models() -> Vec<String> {
    FALLBACK_VISION_MODELS.iter().map(|m| m.to_string()).collect()
}

/// Model ids from an OpenAI-style `{"data": [{"id": ...}]}` listing
fn parse_model_list(body: &str) -> Result<Vec<String>, OcrError> {
    let list: ModelList = serde_json::from_str(body)
        .map_err(|e| OcrError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}

fn reply_confirms(reply: &str) -> bool {
    reply.to_uppercase().contains("OK")
}

/// Encode a bitmap as a data URI, sniffing its MIME type
fn image_data_uri(bitmap: &[u8]) -> Result<String, OcrError> {
    let format = image::guess_format(bitmap)
        .map_err(|e| OcrError::UnsupportedImage(e.to_string()))?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        general_purpose::STANDARD.encode(bitmap)
    ))
}

/// Pull the body of the ```markdown fence (or any fence) out of a reply.
///
/// A reply with no fence yields an empty string.
pub fn extract_markdown_content(response: &str) -> String {
    if let Some(captures) = MARKDOWN_FENCE.captures(response) {
        return captures[1].trim().to_string();
    }
    if let Some(captures) = ANY_FENCE.captures(response) {
        return captures[1].trim().to_string();
    }

    let preview: String = response.chars().take(100).collect();
    log::warn!(
        "LLM response did not contain markdown delimiters. Response was: {}{}",
        preview,
        if response.chars().count() > 100 { "..." } else { "" }
    );
    String::new()
}
