use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use pagewise::api::{create_router, AppState};
use pagewise::config::Config;
use pagewise::ocr::{DocumentIngestion, FileDescriptor, IngestionRequest};
use pagewise::secrets::{EnvSecretStore, SecretStore};

#[derive(Parser)]
#[command(name = "pagewise")]
#[command(about = "Convert documents and images to text with Mistral OCR")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single file through the OCR pipeline and print the result as JSON
    Extract {
        /// Local file to convert
        path: PathBuf,

        /// MIME type hint, used to tell images from documents
        #[arg(long)]
        mimetype: Option<String>,

        /// Name to report in the output (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Requester id used for per-user secret lookup
        #[arg(long, env = "PAGEWISE_USER_ID", default_value = "cli")]
        user: String,
    },
    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    let secrets: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::new());

    match args.command {
        Command::Extract {
            path,
            mimetype,
            name,
            user,
        } => extract(config, secrets, path, mimetype, name, user).await,
        Command::Serve => serve(config, secrets).await,
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pagewise=info,tower_http=debug".into());

    let json = std::env::var("PAGEWISE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn extract(
    config: Config,
    secrets: Arc<dyn SecretStore>,
    path: PathBuf,
    mimetype: Option<String>,
    name: Option<String>,
    user: String,
) -> anyhow::Result<()> {
    let original_name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?,
    };

    let ingestion = DocumentIngestion::new(&config.ocr, secrets)?;
    let request = IngestionRequest {
        user_id: user,
        file: FileDescriptor {
            path,
            original_name,
            mimetype,
        },
        file_id: Some(Uuid::new_v4().to_string()),
        entity_id: None,
    };

    let output = ingestion.ingest(&request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn serve(config: Config, secrets: Arc<dyn SecretStore>) -> anyhow::Result<()> {
    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "PAGEWISE_API_KEYS is not set, OCR endpoints are locked. Set PAGEWISE_API_KEYS to enable /api/v1/documents:ocr."
        );
    }

    tracing::info!(
        model = %config.ocr.model,
        "Initializing OCR pipeline..."
    );
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, secrets)?;
    let app = create_router(state);

    tracing::info!("Pagewise starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
}
