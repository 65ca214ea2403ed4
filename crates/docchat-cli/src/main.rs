//! docchat CLI - Command-line interface
//!
//! Usage:
//!   docchat ask <question>
//!   docchat search <query>
//!   docchat index [--dir <path>]
//!   docchat openapi

use clap::{Parser, Subcommand};
use docchat_api::{ApiDoc, ChatResponse};
use docchat_core::{AppConfig, Retriever};
use docchat_index::{chunk_document, load_directory, ChunkConfig, Document};
use std::path::PathBuf;
use utoipa::OpenApi;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Document-grounded chat assistant CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the JSON the endpoint would return
    Ask {
        /// Question to ask
        question: String,

        /// Send the question without retrieved context
        #[arg(long)]
        no_retrieval: bool,
    },
    /// Show the snippets retrieved for a query
    Search {
        /// Query text
        query: String,
    },
    /// Load and chunk the documents directory without embedding it
    Index {
        /// Documents directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the OpenAPI document for the HTTP API
    Openapi,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    Ok(match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    })
}

/// One line per document: path, type, characters, chunks
fn index_report(documents: &[Document], chunk_config: &ChunkConfig) -> (Vec<String>, usize) {
    let mut lines = Vec::with_capacity(documents.len());
    let mut total = 0;
    for doc in documents {
        let chunks = chunk_document(doc, chunk_config).len();
        total += chunks;
        lines.push(format!(
            "{}\t{}\t{} chars\t{} chunks",
            doc.path.display(),
            doc.file_type,
            doc.content.chars().count(),
            chunks
        ));
    }
    (lines, total)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,docchat_rag=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            no_retrieval,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if no_retrieval {
                config.index.enabled = false;
            }
            let service = docchat_rag::build_chat_service(&config).await?;
            let response = ChatResponse::from(service.respond(&question).await);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Search { query } => {
            let config = load_config(cli.config.as_ref())?;
            let retriever = docchat_rag::build_retriever(&config).await?;
            let snippets = retriever.retrieve(&query).await?;
            if snippets.is_empty() {
                println!("No snippets found.");
            } else {
                println!("{}", docchat_rag::render_context(&snippets));
            }
        }
        Commands::Index { dir } => {
            let config = load_config(cli.config.as_ref())?;
            let dir = dir.unwrap_or(config.index.documents_dir);
            let documents = load_directory(&dir)?;
            let chunk_config = ChunkConfig::new(config.index.chunk_size, config.index.chunk_overlap);

            let (lines, total) = index_report(&documents, &chunk_config);
            for line in lines {
                println!("{line}");
            }
            println!("{} documents, {} chunks", documents.len(), total);
        }
        Commands::Openapi => {
            println!("{}", ApiDoc::openapi().to_pretty_json()?);
        }
    }

    Ok(())
}
