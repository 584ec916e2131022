use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_sieve::config::Settings;
use feature_sieve::sieve_core::Engine;
use feature_sieve::{ai, api};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Deduplicates and links feature requests mined from customer conversations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API (overrides SIEVE_PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Process one transcript file and print the result as JSON
    Process {
        /// Path to the transcript
        file: PathBuf,
    },
}

/// Initialize tracing. Logs go to stderr so `process` output stays clean JSON.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "feature_sieve=debug,sieve_core=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_engine(settings: &Settings) -> anyhow::Result<Arc<Engine>> {
    let engine = Engine::new(ai::collaborators(settings), settings.dedup.clone())
        .context("Invalid deduplication settings")?;
    Ok(Arc::new(engine))
}

async fn serve(settings: Settings, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting Feature Sieve server on port {}", port);

    let engine = build_engine(&settings)?;
    let app = api::create_router_with_cors(engine, settings.cors_origins.as_deref());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Feature Sieve server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn process(settings: Settings, file: PathBuf) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read transcript {}", file.display()))?;

    let engine = build_engine(&settings)?;
    let result = engine.process_transcript(content).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = Settings::load();

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(settings.port);
            serve(settings, port).await?;
        }
        Some(Commands::Process { file }) => {
            process(settings, file).await?;
        }
        None => {
            // Default: start server
            let port = settings.port;
            serve(settings, port).await?;
        }
    }

    Ok(())
}
