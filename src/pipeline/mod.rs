//! Pipeline orchestrator.
//!
//! Sequences fetch -> segment -> transcribe -> aggregate -> analyze ->
//! script-generate. Failures before a usable transcript exists abort the
//! whole run; once a transcript exists the derived-content stages degrade
//! into their own result slots instead.

use serde::Serialize;
use std::sync::Arc;
use tempfile::TempDir;

use crate::analyze::{ContentAnalysis, ContentAnalyzer, ReelScript, ScriptGenerator, StageResult};
use crate::audio;
use crate::error::PipelineError;
use crate::fetch::MediaFetcher;
use crate::transcribe::{aggregate, ChunkTranscriber, TranscriptSegment};
use crate::utils;

/// Outcome of one result slot: the stage's value, or a descriptive error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StageOutcome<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> StageOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, StageOutcome::Ready(_))
    }
}

impl<T> From<StageResult<T>> for StageOutcome<T> {
    fn from(result: StageResult<T>) -> Self {
        match result {
            Ok(value) => StageOutcome::Ready(value),
            Err(e) => StageOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Best-effort result of one pipeline run.
///
/// The transcript is always populated; the derived slots carry either their
/// stage's output or that stage's own error.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub transcript: String,
    pub analysis: StageOutcome<ContentAnalysis>,
    pub script: StageOutcome<ReelScript>,
}

/// The media-to-insight pipeline.
pub struct Pipeline {
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn ChunkTranscriber>,
    analyzer: ContentAnalyzer,
    script_generator: ScriptGenerator,
    chunk_length_ms: u64,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn ChunkTranscriber>,
        analyzer: ContentAnalyzer,
        script_generator: ScriptGenerator,
        chunk_length_ms: u64,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            analyzer,
            script_generator,
            chunk_length_ms,
        }
    }

    /// Run the full pipeline for one media URL.
    ///
    /// The URL is validated before any collaborator is invoked. All audio
    /// artifacts live in a per-run temporary directory owned by this call,
    /// so they are removed on every exit path.
    pub async fn run(&self, url: &str) -> Result<PipelineResult, PipelineError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PipelineError::EmptyUrl);
        }
        let url = utils::validate_media_url(url)?;

        let workdir = TempDir::new().map_err(crate::error::FetchError::Io)?;

        tracing::info!("Starting pipeline for URL: {}", url);
        let track = self.fetcher.fetch(&url, workdir.path()).await?;

        let chunks = audio::segment(track.duration_ms, self.chunk_length_ms)?;
        tracing::info!(
            "Transcribing {} chunk(s) of up to {} ms",
            chunks.len(),
            self.chunk_length_ms
        );

        let mut segments: Vec<TranscriptSegment> = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            segments.push(self.transcriber.transcribe(&track, chunk, workdir.path()).await);
        }

        // The track artifact is no longer needed once every chunk has been
        // processed; the TempDir catches anything left behind
        if let Err(e) = fs_err::remove_file(&track.path) {
            tracing::debug!("Track artifact already gone: {}", e);
        }

        let failed = segments.iter().filter(|s| !s.success).count();
        if failed > 0 {
            tracing::warn!("{} of {} chunk(s) failed recognition", failed, segments.len());
        }

        let transcript = aggregate(&segments);

        let analysis = self.analyzer.analyze(&transcript).await;
        let script = self.script_generator.generate(&analysis).await;

        tracing::info!("Pipeline complete for URL: {}", url);

        Ok(PipelineResult {
            transcript,
            analysis: analysis.into(),
            script: script.into(),
        })
    }
}
