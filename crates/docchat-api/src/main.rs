//! docchat API Server
//!
//! Builds the document index and completion client once, then serves
//! `POST /chat`.
//!
//! Author: hephaex@gmail.com

use clap::Parser;
use docchat_api::{create_router, state::AppState};
use docchat_core::config::{AppConfig, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the API server
#[derive(Parser, Debug)]
#[command(name = "docchat-api", about = "docchat HTTP chat endpoint", version)]
struct Args {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory of documents to index at startup
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Send prompts without retrieved context
    #[arg(long, default_value_t = false)]
    no_retrieval: bool,
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = &args.docs_dir {
        config.index.documents_dir = dir.clone();
    }
    if args.no_retrieval {
        config.index.enabled = false;
    }

    Ok(config)
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(level: &str) -> String {
    format!(
        "{level},docchat_api={level},docchat_rag={level},docchat_index={level},tower_http=debug"
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&logging.level).into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.logging);

    // Explicit startup phase: index and client are ready before binding
    let chat = docchat_rag::build_chat_service(&config).await?;
    tracing::info!(
        model = chat.model(),
        retrieval = chat.has_retriever(),
        "Chat service initialised"
    );

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(chat));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("docchat API Server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        "Shut down after {} requests over {}s",
        state.get_request_count(),
        state.uptime_secs()
    );

    Ok(())
}
