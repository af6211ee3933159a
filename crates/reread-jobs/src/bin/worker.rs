//! reread-worker - background enrichment daemon for reread.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reread_classify::{BookmarkClassifier, CategorySet, OllamaEmbedding};
use reread_core::EmbeddingBackend;
use reread_db::Database;
use reread_jobs::{ClassifyHandler, ScrapeHandler, WorkerBuilder, WorkerConfig};
use reread_scrape::MetadataScraper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "reread_jobs=debug,reread_scrape=debug,reread_classify=debug,reread_db=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("reread-worker.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/reread".to_string());

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Probe the embedding backend. Classification degrades to the
    // deterministic strategies when it is down, so an unreachable backend
    // never blocks startup.
    let embedding = OllamaEmbedding::from_env();
    let backend: Option<Arc<dyn EmbeddingBackend>> = if embedding.health_check().await {
        info!(
            "Embedding backend reachable: {}",
            EmbeddingBackend::model_name(&embedding)
        );
        Some(Arc::new(embedding))
    } else {
        warn!("Embedding backend unreachable, classification will use deterministic fallbacks");
        None
    };

    let classifier = BookmarkClassifier::new(backend, CategorySet::default());

    // Create and start the job worker
    let worker = WorkerBuilder::new(db.clone())
        .with_config(WorkerConfig::from_env())
        .with_handler(ScrapeHandler::new(db.clone(), MetadataScraper::from_env()))
        .with_handler(ClassifyHandler::new(db.clone(), classifier))
        .build()
        .await;

    let pending = worker.pending_count().await.unwrap_or(0);
    info!(pending, "Starting job worker");

    let handle = worker.start();

    // Wait for ctrl-c
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    handle.shutdown().await?;
    info!("Worker stopped");

    Ok(())
}
