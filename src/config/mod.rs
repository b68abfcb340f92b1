use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Pipeline settings
    pub pipeline: PipelineConfig,

    /// Language model settings
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port (overridden by the PORT environment variable)
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunk length for transcription in milliseconds
    pub chunk_length_ms: u64,

    /// Target language for speech recognition
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier for both derived-content stages
    pub model: String,

    /// Sampling temperature for content analysis (low: the output feeds
    /// the next stage)
    pub analysis_temperature: f32,

    /// Sampling temperature for script generation (higher: creative
    /// variety is acceptable)
    pub script_temperature: f32,

    /// Upper bound on generated response size
    pub max_output_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            pipeline: PipelineConfig {
                chunk_length_ms: 60_000,
                language: "es-ES".to_string(),
            },
            llm: LlmConfig {
                model: "gemini-2.5-flash".to_string(),
                analysis_temperature: 0.5,
                script_temperature: 0.7,
                max_output_tokens: 2048,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default, then apply
    /// environment overrides.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            serde_yaml::from_str(&content).context("Failed to parse config file")?
        } else {
            Self::default()
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse().context("Invalid PORT value")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("reelscribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_length_ms == 0 {
            anyhow::bail!("chunk_length_ms must be greater than zero");
        }

        if self.pipeline.language.is_empty() {
            anyhow::bail!("transcription language must be configured");
        }

        Ok(())
    }

    /// Display current configuration (secrets excluded)
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Host: {}", self.server.host);
        println!("  Port: {}", self.server.port);
        println!("  Chunk length: {} ms", self.pipeline.chunk_length_ms);
        println!("  Language: {}", self.pipeline.language);
        println!("  LLM model: {}", self.llm.model);
        println!(
            "  Speech API key: {}",
            if std::env::var("SPEECH_API_KEY").is_ok() {
                "configured"
            } else {
                "missing"
            }
        );
        println!(
            "  Gemini API key: {}",
            if std::env::var("GEMINI_API_KEY").is_ok() {
                "configured"
            } else {
                "missing"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_length_is_rejected() {
        let mut config = Config::default();
        config.pipeline.chunk_length_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.pipeline.chunk_length_ms, 60_000);
        assert_eq!(parsed.pipeline.language, "es-ES");
    }
}
