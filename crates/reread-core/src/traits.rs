//! Core traits for reread abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// URL CACHE REPOSITORY
// =============================================================================

/// Repository for the shared URL metadata cache.
#[async_trait]
pub trait UrlCacheRepository: Send + Sync {
    /// Fetch the entry for a canonical URL, creating an empty one if none
    /// exists. Returns the entry and whether it was created by this call.
    /// Safe under concurrent callers racing on the same URL.
    async fn get_or_create(&self, url: &str) -> Result<(CachedUrl, bool)>;

    /// Fetch an entry by ID.
    async fn get(&self, id: Uuid) -> Result<CachedUrl>;

    /// Fetch an entry by canonical URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<CachedUrl>>;

    /// Replace the scraped fields with `metadata` and stamp
    /// `last_scraped_at = now()`. Full replace, last writer wins.
    async fn write_metadata(&self, id: Uuid, metadata: &PageMetadata) -> Result<CachedUrl>;
}

// =============================================================================
// BOOKMARK REPOSITORY
// =============================================================================

/// Request for creating a bookmark.
#[derive(Debug, Clone)]
pub struct CreateBookmarkRequest {
    pub user_id: Uuid,
    /// Raw URL as supplied by the user; canonicalized before use.
    pub url: String,
    pub user_memo: Option<String>,
    pub user_summary: Option<String>,
    pub priority: Option<Priority>,
    pub is_favorite: bool,
}

impl CreateBookmarkRequest {
    pub fn new(user_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            user_id,
            url: url.into(),
            user_memo: None,
            user_summary: None,
            priority: None,
            is_favorite: false,
        }
    }
}

/// Request for updating the user-owned fields of a bookmark.
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateBookmarkRequest {
    pub status: Option<BookmarkStatus>,
    pub priority: Option<Priority>,
    pub is_favorite: Option<bool>,
    pub user_memo: Option<String>,
    pub user_summary: Option<String>,
}

/// Request for listing bookmarks. All filters are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ListBookmarksRequest {
    pub status: Option<BookmarkStatus>,
    pub priority: Option<Priority>,
    pub is_favorite: Option<bool>,
    /// Only bookmarks carrying this tag name.
    pub tag: Option<String>,
    /// Free-text search across cached title/description/site_name and the
    /// user's memo/summary.
    pub query: Option<String>,
    /// Maximum results
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for listing bookmarks.
#[derive(Debug, Clone)]
pub struct ListBookmarksResponse {
    pub bookmarks: Vec<BookmarkSummary>,
    pub total: i64,
}

/// Repository for bookmark state.
///
/// The write methods are grouped by field owner: `update` covers the
/// user-owned fields, `mark_as_read` the scheduler-owned fields, and the
/// `*_classification` methods the classifier-owned fields. No method
/// crosses groups.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Fetch the bookmark for (user, cached URL), creating it if absent.
    /// Returns the bookmark and whether it was created by this call; an
    /// existing bookmark comes back unchanged.
    async fn find_or_create(
        &self,
        req: &CreateBookmarkRequest,
        cached_url_id: Uuid,
    ) -> Result<(Bookmark, bool)>;

    /// Fetch a bookmark by ID.
    async fn get(&self, id: Uuid) -> Result<Bookmark>;

    /// Fetch a bookmark with its cache row and tags.
    async fn get_detail(&self, id: Uuid) -> Result<BookmarkDetail>;

    /// List a user's bookmarks with filtering and pagination.
    async fn list(&self, user_id: Uuid, req: ListBookmarksRequest) -> Result<ListBookmarksResponse>;

    /// Update user-owned fields.
    async fn update(&self, id: Uuid, req: UpdateBookmarkRequest) -> Result<Bookmark>;

    /// Delete a bookmark. The shared cache entry stays.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Apply one read event: advance the repetition schedule, bump
    /// `read_count`, stamp `last_read_at`. All four fields change in one
    /// atomic transition.
    async fn mark_as_read(&self, id: Uuid, today: NaiveDate) -> Result<Bookmark>;

    /// A user's bookmarks due on or before `today`, oldest due first.
    async fn due_reminders(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<Bookmark>>;

    /// Mark classification as started (`processing`).
    async fn begin_classification(&self, id: Uuid) -> Result<()>;

    /// Record a successful classification result (`completed`).
    async fn complete_classification(
        &self,
        id: Uuid,
        category: &str,
        category_score: f64,
        suggested_tags: &[SuggestedTag],
    ) -> Result<()>;

    /// Record a failed classification (`error` with message).
    async fn fail_classification(&self, id: Uuid, message: &str) -> Result<()>;

    /// One random non-trash bookmark for serendipitous rereading.
    async fn random_pick(&self, user_id: Uuid) -> Result<Option<BookmarkSummary>>;

    /// Same-user bookmarks sharing at least one tag with this one, ranked
    /// by shared-tag count then recency. Non-positive limits fall back to
    /// the default.
    async fn related(&self, bookmark_id: Uuid, limit: i64) -> Result<Vec<BookmarkSummary>>;

    /// Aggregate reading statistics for a user.
    async fn statistics(&self, user_id: Uuid) -> Result<UserStatistics>;
}

// =============================================================================
// TAG REPOSITORY
// =============================================================================

/// Repository for user-scoped tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag for a user if it doesn't exist, returning it either way.
    async fn get_or_create(&self, user_id: Uuid, name: &str) -> Result<Tag>;

    /// List a user's tags with bookmark counts.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Tag>>;

    /// Attach a tag to a bookmark. Attaching an existing tag is a no-op.
    async fn attach(&self, bookmark_id: Uuid, tag_id: Uuid, source: TagSource) -> Result<()>;

    /// Get-or-create a tag by name for the bookmark's owner and attach it.
    async fn attach_by_name(
        &self,
        user_id: Uuid,
        bookmark_id: Uuid,
        name: &str,
        source: TagSource,
    ) -> Result<Tag>;

    /// Remove a tag from a bookmark. The tag itself stays.
    async fn detach(&self, bookmark_id: Uuid, name: &str) -> Result<()>;

    /// All tags attached to a bookmark, alphabetical.
    async fn get_for_bookmark(&self, bookmark_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// JOB REPOSITORY
// =============================================================================

/// Repository for job queue operations.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Queue a new job.
    async fn queue(
        &self,
        bookmark_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Uuid>;

    /// Queue a job with deduplication (skip if same type+bookmark pending).
    async fn queue_deduplicated(
        &self,
        bookmark_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Option<Uuid>>;

    /// Claim the next pending job for processing.
    async fn claim_next(&self) -> Result<Option<Job>>;

    /// Claim the next pending job whose type is in `job_types`.
    /// An empty slice means "claim any type" (same as `claim_next`).
    async fn claim_next_for_types(&self, job_types: &[JobType]) -> Result<Option<Job>>;

    /// Update job progress.
    async fn update_progress(
        &self,
        job_id: Uuid,
        percent: i32,
        message: Option<&str>,
    ) -> Result<()>;

    /// Mark job as completed.
    async fn complete(&self, job_id: Uuid, result: Option<JsonValue>) -> Result<()>;

    /// Mark job as failed, or back to pending when retries remain.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Get job by ID.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Get all jobs for a bookmark.
    async fn get_for_bookmark(&self, bookmark_id: Uuid) -> Result<Vec<Job>>;

    /// Get pending jobs count.
    async fn pending_count(&self) -> Result<i64>;

    /// Get queue statistics.
    async fn queue_stats(&self) -> Result<QueueStats>;

    /// Clean up old completed/failed jobs, keeping the newest `keep_count`.
    async fn cleanup(&self, keep_count: i64) -> Result<i64>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
///
/// Implementations map "cannot reach the backend" conditions to
/// [`crate::Error::BackendUnavailable`] so classification strategy chains
/// can fall through to deterministic alternatives.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
