//! mmrag HTTP server
//!
//! Run with: cargo run -p mmrag --bin mmrag-server -- --config mmrag.toml

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mmrag::{config::RagConfig, server::RagServer};

#[derive(Parser, Debug)]
#[command(name = "mmrag-server", version, about = "Multi-modal RAG ingestion and query server")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, env = "MMRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Port, overrides the config file
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mmrag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vector store: {} ({})", config.vector_db.url, config.vector_db.collection);
    tracing::info!("  - Vector dimension: {}", config.embeddings.vector_dim);
    tracing::info!("  - Text embedding model: {}", config.embeddings.text_model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: {} words, {} overlap",
        config.chunking.window_size,
        config.chunking.overlap
    );

    let server = RagServer::new(config)?;

    tracing::info!("Endpoints:");
    tracing::info!("  POST /ingest/upload - Upload a document");
    tracing::info!("  POST /query         - Ask a question");
    tracing::info!("  GET  /health        - Backend status");
    tracing::info!("  GET  /storage/*     - Stored originals");

    server.start().await?;

    Ok(())
}
