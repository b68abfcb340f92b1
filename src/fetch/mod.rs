use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::FetchError;
use crate::utils;

/// A fully downloaded audio track in canonical 16-bit PCM WAV format.
///
/// The artifact lives inside the per-invocation working directory and is
/// removed together with it once the pipeline run finishes.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Path of the WAV artifact on local storage
    pub path: PathBuf,

    /// Total duration in milliseconds
    pub duration_ms: u64,

    /// Media title, when the extractor reports one
    pub title: Option<String>,
}

/// Media extraction collaborator: resolves a URL to a local audio track.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the media at `url` and materialize its audio inside
    /// `workdir` as a canonical WAV track with a known duration.
    async fn fetch(&self, url: &str, workdir: &Path) -> Result<AudioTrack, FetchError>;
}

/// Audio fetcher backed by yt-dlp, with ffprobe for duration probing.
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    ffprobe_path: String,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Get media metadata using yt-dlp
    async fn get_media_info(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!("Extracting media info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Download(format!("yt-dlp failed: {}", error)));
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::Download(format!("unparseable yt-dlp metadata: {}", e)))?;

        Ok(info)
    }

    /// Download the best audio stream and transcode it to 16 kHz mono WAV.
    async fn download_audio(&self, url: &str, track_path: &Path) -> Result<(), FetchError> {
        // yt-dlp substitutes the final extension for %(ext)s after the
        // audio postprocessor runs
        let template = track_path.with_extension("%(ext)s");
        let template_arg = template.to_string_lossy();

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                template_arg.as_ref(),
                "--extract-audio",
                "--audio-format",
                "wav",
                "--postprocessor-args",
                "ffmpeg:-ar 16000 -ac 1",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Download(error.trim().to_string()));
        }

        Ok(())
    }

    /// Probe the duration of a local audio artifact with ffprobe.
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, FetchError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Probe(error.trim().to_string()));
        }

        let seconds: f64 = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(|e| FetchError::Probe(format!("unparseable ffprobe output: {}", e)))?;

        Ok((seconds * 1000.0).round() as u64)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, workdir: &Path) -> Result<AudioTrack, FetchError> {
        if !self.check_availability().await {
            return Err(FetchError::ExtractorUnavailable(
                "yt-dlp is not installed or not on PATH".to_string(),
            ));
        }

        let info = self.get_media_info(url).await?;
        let title = info["title"].as_str().map(|s| s.to_string());

        let track_path = workdir.join(utils::generate_unique_filename("track", "wav"));

        tracing::info!(
            "Downloading audio for {} to {}",
            title.as_deref().unwrap_or(url),
            track_path.display()
        );
        self.download_audio(url, &track_path).await?;

        if !track_path.exists() {
            return Err(FetchError::MissingArtifact(
                track_path.to_string_lossy().into_owned(),
            ));
        }

        let duration_ms = self.probe_duration_ms(&track_path).await?;
        tracing::info!(
            "Download complete: {} of audio",
            utils::format_duration(duration_ms as f64 / 1000.0)
        );

        Ok(AudioTrack {
            path: track_path,
            duration_ms,
            title,
        })
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
