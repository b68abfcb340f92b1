//! Structured language-model completion collaborator.
//!
//! One client, two consumers: the content analyzer and the script generator
//! both send an instruction plus a content payload and expect a JSON-shaped
//! text payload back.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One structured completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role / instruction prompt, prepended to the content
    pub instruction: String,

    /// Content payload the instruction operates on
    pub content: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on the generated response size
    pub max_output_tokens: u32,
}

/// Structured LLM completion collaborator.
///
/// Returns the raw JSON-shaped text payload; callers deserialize it into
/// their own typed models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    const DEFAULT_BASE_URL: &'static str =
        "https://generativelanguage.googleapis.com/v1beta/models";

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    ///
    /// Returns `None` when the key is absent, so the dependent stages can
    /// degrade to `unavailable` instead of crashing the process.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;

        Some(Self {
            api_key,
            client: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let prompt = format!("{}\n\n{}", request.instruction, request.content);

        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        tracing::debug!("Calling Gemini model {}", request.model);

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API returned {}: {}", status, error_text);
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow::anyhow!("no content in Gemini response"))?;

        Ok(strip_code_fences(text).to_string())
    }
}

/// Strip a markdown code fence some models wrap JSON payloads in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
