use thiserror::Error;

/// Fatal failures while materializing the audio track for a URL.
///
/// Any of these aborts the whole pipeline run: without audio there is
/// nothing downstream stages could work on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("media extractor is not available: {0}")]
    ExtractorUnavailable(String),

    #[error("failed to download audio: {0}")]
    Download(String),

    #[error("failed to probe audio duration: {0}")]
    Probe(String),

    #[error("audio artifact missing after download: {0}")]
    MissingArtifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration-only failure of the audio segmenter.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("chunk length must be greater than zero, got {0} ms")]
    InvalidChunkLength(u64),
}

/// Failure of a derived-content stage (analysis or script generation).
///
/// These never abort the pipeline once a transcript exists; they degrade
/// their own result slot instead.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("language model collaborator is not configured")]
    Unavailable,

    #[error("upstream analysis failed, generation not attempted")]
    UpstreamFailed,

    #[error("language model request failed: {0}")]
    Request(String),

    #[error("language model returned a malformed response: {0}")]
    InvalidResponse(String),
}

/// Top-level pipeline failure, surfaced to the caller when no usable
/// transcript could be produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("empty media URL")]
    EmptyUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
}
