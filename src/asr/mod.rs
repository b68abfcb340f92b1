use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Speech-to-text collaborator: turns one short audio artifact into text.
///
/// Implementations may fail per call (no speech, network error); the
/// transcription engine absorbs those failures at the chunk boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize speech in the audio file at `path`, in the given language.
    async fn recognize(&self, path: &Path, language: &str) -> Result<String>;
}

/// Google Speech-to-Text REST client.
pub struct GoogleSpeechClient {
    api_key: Option<String>,
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
struct RecognitionConfig {
    encoding: &'static str,
    #[serde(rename = "sampleRateHertz")]
    sample_rate_hertz: u32,
    #[serde(rename = "languageCode")]
    language_code: String,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    transcript: String,
}

impl GoogleSpeechClient {
    const DEFAULT_ENDPOINT: &'static str = "https://speech.googleapis.com/v1/speech:recognize";

    /// Create a client from the `SPEECH_API_KEY` environment variable.
    ///
    /// A missing key does not fail construction: every recognition attempt
    /// will error instead, and the transcription engine converts those
    /// errors into placeholder segments.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SPEECH_API_KEY").ok(),
            client: Client::new(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_endpoint(api_key: Option<String>, endpoint: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(&self, path: &Path, language: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("SPEECH_API_KEY not configured"))?;

        let audio_bytes = fs_err::read(path)?;

        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16_000,
                language_code: language.to_string(),
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(&audio_bytes),
            },
        };

        let url = format!("{}?key={}", self.endpoint, api_key);
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("speech API returned {}: {}", status, body);
        }

        let recognized: RecognizeResponse = response.json().await?;

        let text = recognized
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            anyhow::bail!("no speech recognized in audio");
        }

        Ok(text)
    }
}
