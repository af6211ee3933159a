//! # reread-jobs
//!
//! Background enrichment pipeline for reread.
//!
//! This crate provides:
//! - The enrichment orchestrator (bookmark creation, reminder operations,
//!   explicit re-triggers)
//! - Async job processing with concurrent workers
//! - Progress tracking and notifications via broadcast channels
//! - Handlers for metadata scraping and bookmark classification
//!
//! ## Example
//!
//! ```ignore
//! use reread_jobs::{EnrichmentOrchestrator, NoOpHandler, WorkerBuilder, WorkerConfig};
//! use reread_db::Database;
//! use reread_core::CreateBookmarkRequest;
//!
//! let db = Database::connect("postgres://...").await?;
//!
//! // Create worker with handlers
//! let worker = WorkerBuilder::new(db.clone())
//!     .with_config(WorkerConfig::default().with_poll_interval(1000))
//!     .with_handler(NoOpHandler::new(JobType::ScrapeMetadata))
//!     .build()
//!     .await;
//!
//! // Start worker and get handle
//! let handle = worker.start();
//!
//! // Saving a bookmark enqueues enrichment and returns immediately
//! let orchestrator = EnrichmentOrchestrator::new(db);
//! let bookmark = orchestrator
//!     .create_bookmark(CreateBookmarkRequest::new(user_id, "https://example.com/post"))
//!     .await?;
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod classify_handler;
pub mod handler;
pub mod orchestrator;
pub mod scrape_handler;
pub mod worker;

// Re-export core types
pub use reread_core::*;

// Re-export job types
pub use classify_handler::ClassifyHandler;
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use orchestrator::EnrichmentOrchestrator;
pub use scrape_handler::ScrapeHandler;
pub use worker::{JobWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};

/// Default maximum retries for failed jobs.
pub const DEFAULT_MAX_RETRIES: i32 = reread_core::defaults::JOB_MAX_RETRIES;

/// Default polling interval for job processing (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = reread_core::defaults::JOB_POLL_INTERVAL_MS;
