//! Derived-content stages: transcript analysis and reel script generation.
//!
//! Both stages call the structured completion collaborator and degrade to a
//! typed [`StageError`] instead of aborting the pipeline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::StageError;
use crate::llm::{CompletionClient, CompletionRequest};

/// Outcome of a derived-content stage.
pub type StageResult<T> = Result<T, StageError>;

/// Structured analysis derived from one transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// Central topic of the content
    pub central_topic: String,

    /// Key points, in the order they matter
    pub key_points: Vec<String>,

    /// Audience the content is aimed at
    pub target_audience: String,
}

/// One scene of a short-form reel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelScene {
    /// What is on screen
    pub visual: String,

    /// What is said over it
    pub narration: String,
}

/// Short-form video script derived from one content analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelScript {
    pub title: String,
    pub scenes: Vec<ReelScene>,
}

/// Sampling settings for one derived-content stage.
#[derive(Debug, Clone)]
pub struct StageSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Derives a [`ContentAnalysis`] from a transcript via the LLM collaborator.
pub struct ContentAnalyzer {
    client: Option<Arc<dyn CompletionClient>>,
    settings: StageSettings,
}

impl ContentAnalyzer {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, settings: StageSettings) -> Self {
        Self { client, settings }
    }

    /// Analyze a transcript.
    ///
    /// Fails with [`StageError::Unavailable`] without attempting a call when
    /// the collaborator is unconfigured. Never retried.
    pub async fn analyze(&self, transcript: &str) -> StageResult<ContentAnalysis> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;

        tracing::info!("Analyzing transcript ({} chars)", transcript.len());

        let payload = client
            .complete(CompletionRequest {
                instruction: analysis_instruction().to_string(),
                content: transcript.to_string(),
                model: self.settings.model.clone(),
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            })
            .await
            .map_err(|e| StageError::Request(format!("{:#}", e)))?;

        serde_json::from_str(&payload).map_err(|e| StageError::InvalidResponse(e.to_string()))
    }
}

/// Derives a [`ReelScript`] from a content analysis via the LLM collaborator.
pub struct ScriptGenerator {
    client: Option<Arc<dyn CompletionClient>>,
    settings: StageSettings,
}

impl ScriptGenerator {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, settings: StageSettings) -> Self {
        Self { client, settings }
    }

    /// Generate a reel script from the analysis stage outcome.
    ///
    /// Reports [`StageError::Unavailable`] when the collaborator is
    /// unconfigured and [`StageError::UpstreamFailed`] when the analysis it
    /// depends on failed; in both cases zero collaborator calls are made.
    pub async fn generate(&self, analysis: &StageResult<ContentAnalysis>) -> StageResult<ReelScript> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let analysis = analysis.as_ref().map_err(|_| StageError::UpstreamFailed)?;

        tracing::info!("Generating reel script for topic: {}", analysis.central_topic);

        let content = serde_json::to_string(analysis)
            .map_err(|e| StageError::Request(e.to_string()))?;

        let payload = client
            .complete(CompletionRequest {
                instruction: script_instruction().to_string(),
                content,
                model: self.settings.model.clone(),
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            })
            .await
            .map_err(|e| StageError::Request(format!("{:#}", e)))?;

        serde_json::from_str(&payload).map_err(|e| StageError::InvalidResponse(e.to_string()))
    }
}

fn analysis_instruction() -> &'static str {
    r#"You are a content analyst. Analyze the video transcript below.

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{
  "central_topic": "The central topic of the content",
  "key_points": ["First key point", "Second key point"],
  "target_audience": "Who this content is aimed at"
}

TRANSCRIPT:"#
}

fn script_instruction() -> &'static str {
    r#"You are a short-form video scriptwriter. Using the content analysis
below, write the script for an engaging 30-second reel.

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{
  "title": "Catchy reel title",
  "scenes": [
    {
      "visual": "What is shown on screen",
      "narration": "What the voiceover says"
    }
  ]
}

CONTENT ANALYSIS:"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockCompletionClient;

    fn settings() -> StageSettings {
        StageSettings {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.5,
            max_output_tokens: 1024,
        }
    }

    fn sample_analysis() -> ContentAnalysis {
        ContentAnalysis {
            central_topic: "Rust ownership".to_string(),
            key_points: vec!["borrowing".to_string(), "lifetimes".to_string()],
            target_audience: "systems programmers".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_structured_response() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().times(1).returning(|_| {
            Ok(r#"{"central_topic":"Rust ownership","key_points":["borrowing"],"target_audience":"developers"}"#.to_string())
        });

        let analyzer = ContentAnalyzer::new(Some(Arc::new(client)), settings());
        let analysis = analyzer.analyze("some transcript").await.unwrap();

        assert_eq!(analysis.central_topic, "Rust ownership");
        assert_eq!(analysis.key_points, vec!["borrowing"]);
        assert_eq!(analysis.target_audience, "developers");
    }

    #[tokio::test]
    async fn test_analyze_unconfigured_reports_unavailable() {
        let analyzer = ContentAnalyzer::new(None, settings());
        assert!(matches!(
            analyzer.analyze("text").await,
            Err(StageError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_analyze_malformed_response() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_| Ok("not json at all".to_string()));

        let analyzer = ContentAnalyzer::new(Some(Arc::new(client)), settings());
        assert!(matches!(
            analyzer.analyze("text").await,
            Err(StageError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_skips_collaborator_when_upstream_failed() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().times(0);

        let generator = ScriptGenerator::new(Some(Arc::new(client)), settings());
        let failed: StageResult<ContentAnalysis> =
            Err(StageError::Request("boom".to_string()));

        assert!(matches!(
            generator.generate(&failed).await,
            Err(StageError::UpstreamFailed)
        ));
    }

    #[tokio::test]
    async fn test_generate_unconfigured_reports_unavailable_even_after_failed_analysis() {
        let generator = ScriptGenerator::new(None, settings());
        let failed: StageResult<ContentAnalysis> = Err(StageError::Unavailable);

        assert!(matches!(
            generator.generate(&failed).await,
            Err(StageError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_generate_parses_scenes() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().times(1).returning(|_| {
            Ok(r#"{"title":"Own your memory","scenes":[{"visual":"Crab on a keyboard","narration":"Rust owns it"}]}"#.to_string())
        });

        let generator = ScriptGenerator::new(Some(Arc::new(client)), settings());
        let analysis: StageResult<ContentAnalysis> = Ok(sample_analysis());

        let script = generator.generate(&analysis).await.unwrap();
        assert_eq!(script.title, "Own your memory");
        assert_eq!(script.scenes.len(), 1);
        assert_eq!(script.scenes[0].narration, "Rust owns it");
    }
}
