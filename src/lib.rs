//! Reelscribe - turn a video URL into a transcript, a content analysis and a
//! short-form reel script.
//!
//! The library exposes a sequential media-to-insight pipeline (download ->
//! segment -> transcribe -> aggregate -> analyze -> script) plus the axum
//! server that fronts it with a single `POST /transcribe` endpoint.

pub mod analyze;
pub mod asr;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod transcribe;
pub mod utils;

pub use config::Config;
pub use error::{FetchError, PipelineError, SegmentationError, StageError};
pub use pipeline::{Pipeline, PipelineResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
