use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelscribe::analyze::{ContentAnalyzer, ScriptGenerator, StageSettings};
use reelscribe::asr::GoogleSpeechClient;
use reelscribe::cli::{Cli, Commands};
use reelscribe::config::Config;
use reelscribe::fetch::YtDlpFetcher;
use reelscribe::llm::{CompletionClient, GeminiClient};
use reelscribe::pipeline::Pipeline;
use reelscribe::server::{create_router, AppState};
use reelscribe::transcribe::TranscriptionEngine;
use reelscribe::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials and port come from the environment, read once at start
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "reelscribe=debug"
    } else {
        "reelscribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            // External tools may still be reachable inside containers even
            // when the check fails, so warn instead of aborting
            let missing_deps = utils::check_dependencies().await;
            for dep in &missing_deps {
                tracing::warn!("Missing external tool: {}", dep);
            }

            serve(config).await?;
        }
        Commands::Config => {
            config.display();
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let llm: Option<Arc<dyn CompletionClient>> = match GeminiClient::from_env() {
        Some(client) => Some(Arc::new(client)),
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not configured; analysis and script stages will report unavailable"
            );
            None
        }
    };

    let recognizer = Arc::new(GoogleSpeechClient::from_env());
    let engine = TranscriptionEngine::new(recognizer, config.pipeline.language.clone());

    let pipeline = Pipeline::new(
        Arc::new(YtDlpFetcher::new()),
        Arc::new(engine),
        ContentAnalyzer::new(
            llm.clone(),
            StageSettings {
                model: config.llm.model.clone(),
                temperature: config.llm.analysis_temperature,
                max_output_tokens: config.llm.max_output_tokens,
            },
        ),
        ScriptGenerator::new(
            llm,
            StageSettings {
                model: config.llm.model.clone(),
                temperature: config.llm.script_temperature,
                max_output_tokens: config.llm.max_output_tokens,
            },
        ),
        config.pipeline.chunk_length_ms,
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Received shutdown signal");
}
