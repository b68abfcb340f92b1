use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reelscribe",
    about = "Reelscribe - transcribe a video URL and derive a content analysis and reel script",
    version,
    long_about = "HTTP service exposing a media-to-insight pipeline: downloads the audio of a \
video URL, transcribes it chunk by chunk, and derives a structured content analysis and a \
short-form reel script from the transcript."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Listen port
        #[arg(short, long, env = "PORT", value_name = "PORT")]
        port: Option<u16>,
    },

    /// Show the effective configuration
    Config,
}
