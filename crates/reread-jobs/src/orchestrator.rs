//! Enrichment orchestration: synchronous entry points that enqueue work.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use reread_core::{
    canonicalize_url, defaults, Bookmark, BookmarkRepository, CreateBookmarkRequest, JobRepository,
    JobType, Result, UrlCacheRepository,
};
use reread_db::Database;

/// Coordinates bookmark creation with background enrichment.
///
/// Nothing here performs network I/O or inference. The methods write rows
/// and enqueue jobs, leaving the slow work to the worker; callers get their
/// bookmark back immediately with `classification_status = pending`.
#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    db: Database,
    ttl_days: i64,
    classify_fresh_hits: bool,
}

impl EnrichmentOrchestrator {
    /// Create an orchestrator with the default staleness window.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            ttl_days: defaults::CACHE_TTL_DAYS,
            classify_fresh_hits: false,
        }
    }

    /// Override the cache staleness window.
    pub fn with_ttl_days(mut self, days: i64) -> Self {
        self.ttl_days = days;
        self
    }

    /// Dispatch classification against cached text when a fresh cache hit
    /// skips the scrape. Off by default: a fresh hit dispatches nothing.
    pub fn with_classify_fresh_hits(mut self, enabled: bool) -> Self {
        self.classify_fresh_hits = enabled;
        self
    }

    /// Create a bookmark and dispatch enrichment for it.
    ///
    /// Saving a URL the user already has returns the existing bookmark
    /// unchanged and dispatches nothing. Invalid URLs fail synchronously
    /// with [`reread_core::Error::InvalidInput`].
    #[instrument(
        skip(self, req),
        fields(
            subsystem = "jobs",
            component = "orchestrator",
            op = "create_bookmark",
            user_id = %req.user_id
        )
    )]
    pub async fn create_bookmark(&self, req: CreateBookmarkRequest) -> Result<Bookmark> {
        let canonical = canonicalize_url(&req.url)?;

        let (entry, cache_created) = self.db.cache.get_or_create(&canonical).await?;
        let (bookmark, bookmark_created) =
            self.db.bookmarks.find_or_create(&req, entry.id).await?;

        if !bookmark_created {
            debug!(bookmark_id = %bookmark.id, "Bookmark already exists, nothing dispatched");
            return Ok(bookmark);
        }

        if cache_created || entry.is_stale(self.ttl_days, Utc::now()) {
            self.queue_scrape(&bookmark, entry.id).await?;
            info!(
                bookmark_id = %bookmark.id,
                cached_url_id = %entry.id,
                "Bookmark created, scrape dispatched"
            );
        } else if self.classify_fresh_hits {
            self.queue_classify(&bookmark).await?;
            info!(
                bookmark_id = %bookmark.id,
                "Bookmark created, fresh cache hit, classification dispatched"
            );
        } else {
            debug!(bookmark_id = %bookmark.id, "Bookmark created, fresh cache hit");
        }

        Ok(bookmark)
    }

    /// Record one read of a bookmark and advance its reminder schedule.
    pub async fn mark_as_read(&self, bookmark_id: Uuid) -> Result<Bookmark> {
        self.db
            .bookmarks
            .mark_as_read(bookmark_id, Utc::now().date_naive())
            .await
    }

    /// The user's bookmarks due for rereading today or earlier.
    pub async fn due_reminders(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        self.db
            .bookmarks
            .due_reminders(user_id, Utc::now().date_naive())
            .await
    }

    /// Re-dispatch enrichment, e.g. for a bookmark left `pending` by a soft
    /// scrape failure.
    ///
    /// `force` runs the scrape regardless of cache freshness. Without it, a
    /// fresh cache entry skips the fetch and classification runs directly
    /// against the cached text. Returns the queued job's ID, or `None` when
    /// an equivalent job was already pending.
    #[instrument(
        skip(self),
        fields(
            subsystem = "jobs",
            component = "orchestrator",
            op = "requeue_enrichment",
            bookmark_id = %bookmark_id
        )
    )]
    pub async fn requeue_enrichment(
        &self,
        bookmark_id: Uuid,
        force: bool,
    ) -> Result<Option<Uuid>> {
        let bookmark = self.db.bookmarks.get(bookmark_id).await?;
        let entry = self.db.cache.get(bookmark.cached_url_id).await?;

        if force || entry.is_stale(self.ttl_days, Utc::now()) {
            self.queue_scrape(&bookmark, entry.id).await
        } else {
            debug!(bookmark_id = %bookmark.id, "Cache fresh, requeueing classification only");
            self.queue_classify(&bookmark).await
        }
    }

    async fn queue_scrape(&self, bookmark: &Bookmark, cached_url_id: Uuid) -> Result<Option<Uuid>> {
        let payload = json!({
            "cached_url_id": cached_url_id,
            "bookmark_id": bookmark.id,
            "classify": true,
        });
        self.db
            .jobs
            .queue_deduplicated(
                Some(bookmark.id),
                JobType::ScrapeMetadata,
                JobType::ScrapeMetadata.default_priority(),
                Some(payload),
            )
            .await
    }

    async fn queue_classify(&self, bookmark: &Bookmark) -> Result<Option<Uuid>> {
        self.db
            .jobs
            .queue_deduplicated(
                Some(bookmark.id),
                JobType::ClassifyBookmark,
                JobType::ClassifyBookmark.default_priority(),
                None,
            )
            .await
    }
}
