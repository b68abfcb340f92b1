use url::Url;

use crate::error::FetchError;

/// Validate a media URL and return its normalized form.
///
/// Only http(s) URLs are accepted; anything else is rejected before any
/// collaborator is invoked.
pub fn validate_media_url(url: &str) -> Result<String, FetchError> {
    let parsed =
        Url::parse(url).map_err(|_| FetchError::InvalidUrl(format!("not a URL: {}", url)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "URL must use HTTP or HTTPS, got {}",
            parsed.scheme()
        )));
    }

    Ok(parsed.to_string())
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Generate a unique filename with timestamp
pub fn generate_unique_filename(base_name: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let random_suffix = uuid::Uuid::new_v4().to_string()[..8].to_string();

    format!("{}_{}_{}.{}", base_name, timestamp, random_suffix, extension)
}

/// Check if the current environment has required external tools
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp").await {
        missing.push("yt-dlp - required for media extraction".to_string());
    }

    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - required for chunk export".to_string());
    }

    if !check_command_available("ffprobe").await {
        missing.push("ffprobe - required for duration probing".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
