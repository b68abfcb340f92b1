use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::asr::SpeechRecognizer;
use crate::audio::AudioChunk;
use crate::fetch::AudioTrack;

/// Placeholder text substituted for a chunk whose recognition failed.
pub const UNRECOGNIZED_CHUNK: &str = "[fragmento no reconocido]";

/// Result of transcribing one audio chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Index of the chunk this segment was produced from
    pub index: usize,

    /// Recognized text, or the placeholder sentinel on failure
    pub text: String,

    /// Whether recognition succeeded for this chunk
    pub success: bool,
}

impl TranscriptSegment {
    pub fn recognized(index: usize, text: String) -> Self {
        Self {
            index,
            text,
            success: true,
        }
    }

    pub fn unrecognized(index: usize) -> Self {
        Self {
            index,
            text: UNRECOGNIZED_CHUNK.to_string(),
            success: false,
        }
    }
}

/// Transcribes one chunk of a track, absorbing every failure into a
/// placeholder segment so a bad chunk never aborts the ones after it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkTranscriber: Send + Sync {
    async fn transcribe(
        &self,
        track: &AudioTrack,
        chunk: &AudioChunk,
        workdir: &Path,
    ) -> TranscriptSegment;
}

/// Chunk transcription engine: cuts one chunk out of the track with ffmpeg,
/// sends it to the speech recognizer and guarantees the chunk artifact is
/// removed whatever the outcome.
pub struct TranscriptionEngine {
    recognizer: Arc<dyn SpeechRecognizer>,
    language: String,
    ffmpeg_path: String,
}

impl TranscriptionEngine {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, language: String) -> Self {
        Self {
            recognizer,
            language,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    #[cfg(test)]
    fn with_ffmpeg_path(
        recognizer: Arc<dyn SpeechRecognizer>,
        language: String,
        ffmpeg_path: String,
    ) -> Self {
        Self {
            recognizer,
            language,
            ffmpeg_path,
        }
    }

    /// Export one chunk of the track as a standalone 16 kHz mono WAV.
    async fn export_chunk(
        &self,
        track: &AudioTrack,
        chunk: &AudioChunk,
        chunk_path: &Path,
    ) -> crate::Result<()> {
        let offset_s = format!("{:.3}", chunk.offset_ms as f64 / 1000.0);
        let duration_s = format!("{:.3}", chunk.duration_ms as f64 / 1000.0);

        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-y", "-ss", offset_s.as_str(), "-t", duration_s.as_str(), "-i"])
            .arg(&track.path)
            .args(["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(chunk_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg chunk export failed: {}", error.trim());
        }

        Ok(())
    }

    async fn recognize_chunk(
        &self,
        track: &AudioTrack,
        chunk: &AudioChunk,
        chunk_path: &Path,
    ) -> crate::Result<String> {
        self.export_chunk(track, chunk, chunk_path).await?;
        self.recognizer.recognize(chunk_path, &self.language).await
    }
}

#[async_trait]
impl ChunkTranscriber for TranscriptionEngine {
    async fn transcribe(
        &self,
        track: &AudioTrack,
        chunk: &AudioChunk,
        workdir: &Path,
    ) -> TranscriptSegment {
        let chunk_path = workdir.join(format!("chunk_{}.wav", chunk.index));

        let result = self.recognize_chunk(track, chunk, &chunk_path).await;

        // The chunk artifact is removed on every exit path, recognized or not
        if chunk_path.exists() {
            if let Err(e) = fs_err::remove_file(&chunk_path) {
                tracing::warn!("Failed to remove chunk artifact: {}", e);
            }
        }

        match result {
            Ok(text) => TranscriptSegment::recognized(chunk.index, text),
            Err(e) => {
                tracing::warn!("Chunk {} failed recognition: {:#}", chunk.index, e);
                TranscriptSegment::unrecognized(chunk.index)
            }
        }
    }
}

/// Merge chunk results into one transcript.
///
/// Segments are keyed on chunk index, so the completion order they arrive
/// in does not matter. Texts are single-space-joined and trimmed; an empty
/// segment sequence yields an empty transcript.
pub fn aggregate(segments: &[TranscriptSegment]) -> String {
    let mut ordered: Vec<&TranscriptSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);

    ordered
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::MockSpeechRecognizer;
    use std::path::PathBuf;

    fn segment(index: usize, text: &str) -> TranscriptSegment {
        TranscriptSegment::recognized(index, text.to_string())
    }

    #[test]
    fn test_aggregate_joins_in_index_order() {
        let segments = vec![segment(0, "hola"), segment(1, "que"), segment(2, "tal")];
        assert_eq!(aggregate(&segments), "hola que tal");
    }

    #[test]
    fn test_aggregate_ignores_completion_order() {
        let in_order = vec![segment(0, "uno"), segment(1, "dos"), segment(2, "tres")];
        let permuted = vec![segment(2, "tres"), segment(0, "uno"), segment(1, "dos")];
        assert_eq!(aggregate(&in_order), aggregate(&permuted));
    }

    #[test]
    fn test_aggregate_places_sentinel_at_failed_chunk_position() {
        let segments = vec![
            segment(0, "antes"),
            TranscriptSegment::unrecognized(1),
            segment(2, "despues"),
        ];
        assert_eq!(
            aggregate(&segments),
            format!("antes {} despues", UNRECOGNIZED_CHUNK)
        );
    }

    #[test]
    fn test_aggregate_all_failed_chunks() {
        let segments = vec![
            TranscriptSegment::unrecognized(0),
            TranscriptSegment::unrecognized(1),
            TranscriptSegment::unrecognized(2),
        ];
        assert_eq!(
            aggregate(&segments),
            format!(
                "{0} {0} {0}",
                UNRECOGNIZED_CHUNK
            )
        );
    }

    #[test]
    fn test_aggregate_empty_is_empty() {
        assert_eq!(aggregate(&[]), "");
    }

    #[tokio::test]
    async fn test_failed_chunk_export_yields_sentinel_without_asr_call() {
        let mut recognizer = MockSpeechRecognizer::new();
        recognizer.expect_recognize().times(0);

        let engine = TranscriptionEngine::with_ffmpeg_path(
            Arc::new(recognizer),
            "es-ES".to_string(),
            "ffmpeg-that-does-not-exist".to_string(),
        );

        let workdir = tempfile::tempdir().unwrap();
        let track = AudioTrack {
            path: PathBuf::from("/nonexistent/track.wav"),
            duration_ms: 90_000,
            title: None,
        };
        let chunk = AudioChunk {
            index: 0,
            offset_ms: 0,
            duration_ms: 60_000,
        };

        let result = engine.transcribe(&track, &chunk, workdir.path()).await;

        assert!(!result.success);
        assert_eq!(result.text, UNRECOGNIZED_CHUNK);
        assert!(!workdir.path().join("chunk_0.wav").exists());
    }
}
