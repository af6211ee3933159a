//! Handler for metadata scrape jobs.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use reread_core::{JobRepository, JobType, UrlCacheRepository};
use reread_db::Database;
use reread_scrape::MetadataScraper;

use crate::handler::{JobContext, JobHandler, JobResult};

/// Handler for metadata scrape jobs.
///
/// Fetches the cached URL's page, replaces the stored metadata, and
/// dispatches classification once the cache write has committed. A failed
/// fetch is a soft failure: the cache row stays untouched and the job
/// completes with `{"scraped": false}`.
pub struct ScrapeHandler {
    db: Database,
    scraper: MetadataScraper,
}

impl ScrapeHandler {
    /// Create a new scrape handler.
    pub fn new(db: Database, scraper: MetadataScraper) -> Self {
        Self { db, scraper }
    }
}

#[async_trait]
impl JobHandler for ScrapeHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeMetadata
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "scrape", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let start = Instant::now();

        let cached_url_id = match ctx
            .payload()
            .and_then(|p| p.get("cached_url_id"))
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            Some(id) => id,
            None => return JobResult::Failed("No cached_url_id in payload".into()),
        };
        let classify = ctx
            .payload()
            .and_then(|p| p.get("classify"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let bookmark_id = ctx.bookmark_id();

        ctx.report_progress(10, Some("Loading cache entry..."));
        let entry = match self.db.cache.get(cached_url_id).await {
            Ok(entry) => entry,
            Err(e) => return JobResult::Failed(format!("Failed to load cache entry: {}", e)),
        };

        ctx.report_progress(30, Some("Fetching page..."));
        let metadata = match self.scraper.scrape(&entry.url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                // Soft failure: the cache keeps its previous state (including
                // last_scraped_at) so the entry stays stale and an explicit
                // requeue retries the fetch.
                warn!(
                    cached_url_id = %cached_url_id,
                    url = %entry.url,
                    error = %e,
                    "Scrape failed, cache left untouched"
                );
                return JobResult::Success(Some(json!({
                    "scraped": false,
                    "error": e.to_string(),
                })));
            }
        };

        // A page with no extractable metadata still counts as scraped; the
        // write stamps last_scraped_at so the entry reads as fresh.
        if metadata.is_empty() {
            debug!(cached_url_id = %cached_url_id, url = %entry.url, "Page yielded no metadata");
        }

        ctx.report_progress(70, Some("Writing metadata..."));
        if let Err(e) = self.db.cache.write_metadata(cached_url_id, &metadata).await {
            return JobResult::Failed(format!("Failed to write metadata: {}", e));
        }

        // Classification is dispatched only after its input has committed.
        let mut classify_queued = false;
        if classify {
            if let Some(bookmark_id) = bookmark_id {
                match self
                    .db
                    .jobs
                    .queue_deduplicated(
                        Some(bookmark_id),
                        JobType::ClassifyBookmark,
                        JobType::ClassifyBookmark.default_priority(),
                        None,
                    )
                    .await
                {
                    Ok(queued) => classify_queued = queued.is_some(),
                    Err(e) => {
                        return JobResult::Failed(format!("Failed to queue classification: {}", e))
                    }
                }
            }
        }

        info!(
            cached_url_id = %cached_url_id,
            has_title = metadata.title.is_some(),
            classify_queued,
            duration_ms = start.elapsed().as_millis() as u64,
            "Scrape completed"
        );

        JobResult::Success(Some(json!({
            "scraped": true,
            "has_title": metadata.title.is_some(),
            "classify_queued": classify_queued,
        })))
    }
}
