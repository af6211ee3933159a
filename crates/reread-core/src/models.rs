//! Core data models for reread.
//!
//! These types are shared across all reread crates and represent the
//! core domain entities: cached URL metadata, bookmarks with their
//! spaced-repetition and classification state, user tags, and the
//! background job queue.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// URL CACHE TYPES
// =============================================================================

/// The shared, URL-keyed record of the last successful scrape.
///
/// One row per distinct canonical URL, referenced by every bookmark of that
/// URL regardless of owner. Created lazily on first bookmark, mutated only
/// by the metadata scraper, never deleted while bookmarks reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedUrl {
    pub id: Uuid,
    /// Canonical form of the URL (scheme lowercased, fragment stripped).
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub site_name: Option<String>,
    /// None until the first successful scrape. A never-scraped entry is
    /// always considered stale.
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CachedUrl {
    /// True when the last scrape is older than `ttl_days` (strictly), or
    /// when the entry has never been scraped.
    pub fn is_stale(&self, ttl_days: i64, now: DateTime<Utc>) -> bool {
        match self.last_scraped_at {
            Some(scraped_at) => now - scraped_at > Duration::days(ttl_days),
            None => true,
        }
    }

    /// Text handed to the classifier: cached title and description joined
    /// with a space and trimmed. Empty result means nothing to classify.
    pub fn classification_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        let description = self.description.as_deref().unwrap_or("");
        format!("{} {}", title, description).trim().to_string()
    }
}

/// Metadata derived from one fetched page.
///
/// Every field is optional; a parse that matches nothing is still a
/// successful scrape and refreshes the cache timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub site_name: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.site_name.is_none()
    }
}

// =============================================================================
// BOOKMARK TYPES
// =============================================================================

/// Reading status of a bookmark, set by the user.
///
/// Independent of `ClassificationStatus`; the scheduler and classifier
/// never write this field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkStatus {
    #[default]
    Unread,
    ReadLater,
    Read,
    Reread,
    /// Hall of fame: content worth keeping permanently.
    Hof,
    Archived,
    Trash,
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::ReadLater => "read_later",
            Self::Read => "read",
            Self::Reread => "reread",
            Self::Hof => "hof",
            Self::Archived => "archived",
            Self::Trash => "trash",
        }
    }

    /// All statuses in lifecycle order, for statistics and validation.
    pub fn all() -> [BookmarkStatus; 7] {
        [
            Self::Unread,
            Self::ReadLater,
            Self::Read,
            Self::Reread,
            Self::Hof,
            Self::Archived,
            Self::Trash,
        ]
    }
}

impl std::fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookmarkStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unread" => Ok(Self::Unread),
            "read_later" => Ok(Self::ReadLater),
            "read" => Ok(Self::Read),
            "reread" => Ok(Self::Reread),
            "hof" => Ok(Self::Hof),
            "archived" => Ok(Self::Archived),
            "trash" => Ok(Self::Trash),
            _ => Err(format!("Invalid bookmark status: {}", s)),
        }
    }
}

/// User-assigned reading priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Lifecycle marker for the automatic category/tag suggestion.
///
/// `pending -> processing -> {completed, error}`. The `processing` marker
/// is written before classification work starts so progress is visible;
/// terminal states are never left ambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl ClassificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for ClassificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClassificationStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid classification status: {}", s)),
        }
    }
}

/// One suggested keyword with its relevance score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTag {
    pub name: String,
    pub score: f32,
}

impl SuggestedTag {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// A user's saved reference to a cached URL.
///
/// Field groups have distinct owners: `status`/`priority`/`is_favorite`/
/// memo/summary belong to the user; `read_count`/`last_read_at`/
/// `repetition_level`/`next_reminder_date` are written only by the
/// reminder scheduler; the `classification_*` and `suggested_*` fields
/// are written only by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cached_url_id: Uuid,
    pub status: BookmarkStatus,
    pub priority: Priority,
    pub is_favorite: bool,
    pub read_count: i32,
    pub user_memo: Option<String>,
    pub user_summary: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
    /// 0-based index into the repetition interval table.
    pub repetition_level: i32,
    /// None before the first read and after the schedule is exhausted.
    pub next_reminder_date: Option<NaiveDate>,
    pub classification_status: ClassificationStatus,
    pub classification_error: Option<String>,
    pub suggested_category: Option<String>,
    pub suggested_category_score: Option<f64>,
    /// Ordered by relevance, highest first.
    pub suggested_tags: Vec<SuggestedTag>,
}

/// Bookmark with its shared cache row and attached tags resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkDetail {
    pub bookmark: Bookmark,
    pub cached_url: CachedUrl,
    pub tags: Vec<Tag>,
}

/// Flattened view of a bookmark for listings: own state plus the cached
/// title/site and tag names, resolved in one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub site_name: Option<String>,
    pub status: BookmarkStatus,
    pub priority: Priority,
    pub is_favorite: bool,
    pub read_count: i32,
    pub saved_at: DateTime<Utc>,
    pub next_reminder_date: Option<NaiveDate>,
    pub classification_status: ClassificationStatus,
    pub suggested_category: Option<String>,
    pub tags: Vec<String>,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// How a tag ended up attached to a bookmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    #[default]
    User,
    Classifier,
}

impl TagSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Classifier => "classifier",
        }
    }
}

impl std::fmt::Display for TagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-scoped label, unique per (user, name).
///
/// Created explicitly by the user or implicitly by the classifier when it
/// materializes suggested keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Number of bookmarks carrying this tag (computed)
    #[serde(default)]
    pub bookmark_count: i64,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Status of a job in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Type of background job to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Fetch a cached URL and refresh its stored metadata
    ScrapeMetadata,
    /// Suggest a category and keyword tags for one bookmark
    ClassifyBookmark,
}

impl JobType {
    /// Default priority for this job type (higher = more urgent)
    pub fn default_priority(&self) -> i32 {
        match self {
            // Scraping gates classification, so it runs first
            JobType::ScrapeMetadata => 7,
            JobType::ClassifyBookmark => 4,
        }
    }
}

/// A job in the processing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub bookmark_id: Option<Uuid>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: i32,
    pub payload: Option<JsonValue>,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub progress_percent: i32,
    pub progress_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Queue statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed_last_hour: i64,
    pub failed_last_hour: i64,
    pub total: i64,
}

// =============================================================================
// STATISTICS TYPES
// =============================================================================

/// Bookmark count for one status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: BookmarkStatus,
    pub count: i64,
}

/// Tag usage entry for the statistics view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagUsage {
    pub name: String,
    pub bookmark_count: i64,
}

/// Bookmarks saved in one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySaves {
    /// Month in `YYYY-MM` form.
    pub month: String,
    pub count: i64,
}

/// Aggregated reading statistics for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total_bookmarks: i64,
    pub favorite_count: i64,
    /// Sum of read_count across all bookmarks.
    pub total_reads: i64,
    pub status_counts: Vec<StatusCount>,
    /// Top tags by bookmark count, largest first.
    pub top_tags: Vec<TagUsage>,
    /// Saves per month, oldest first.
    pub saved_per_month: Vec<MonthlySaves>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cached_url(last_scraped_at: Option<DateTime<Utc>>) -> CachedUrl {
        CachedUrl {
            id: Uuid::new_v4(),
            url: "https://example.com/article".to_string(),
            title: None,
            description: None,
            image_url: None,
            site_name: None,
            last_scraped_at,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_is_stale_never_scraped() {
        let entry = cached_url(None);
        assert!(entry.is_stale(7, Utc::now()));
    }

    #[test]
    fn test_is_stale_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();

        // Scraped 6 days ago: fresh.
        let entry = cached_url(Some(now - Duration::days(6)));
        assert!(!entry.is_stale(7, now));

        // Scraped exactly 7 days ago: still fresh (staleness is strict).
        let entry = cached_url(Some(now - Duration::days(7)));
        assert!(!entry.is_stale(7, now));

        // Scraped 8 days ago: stale.
        let entry = cached_url(Some(now - Duration::days(8)));
        assert!(entry.is_stale(7, now));
    }

    #[test]
    fn test_classification_text_joins_title_and_description() {
        let mut entry = cached_url(None);
        entry.title = Some("Rust ownership".to_string());
        entry.description = Some("A tour of the borrow checker".to_string());
        assert_eq!(
            entry.classification_text(),
            "Rust ownership A tour of the borrow checker"
        );
    }

    #[test]
    fn test_classification_text_title_only() {
        let mut entry = cached_url(None);
        entry.title = Some("Rust ownership".to_string());
        assert_eq!(entry.classification_text(), "Rust ownership");
    }

    #[test]
    fn test_classification_text_empty_when_both_missing() {
        let entry = cached_url(None);
        assert!(entry.classification_text().is_empty());

        let mut blank = cached_url(None);
        blank.title = Some("   ".to_string());
        blank.description = Some("".to_string());
        assert!(blank.classification_text().is_empty());
    }

    #[test]
    fn test_page_metadata_is_empty() {
        assert!(PageMetadata::default().is_empty());
        let meta = PageMetadata {
            title: Some("t".to_string()),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_bookmark_status_round_trip() {
        for status in BookmarkStatus::all() {
            let parsed: BookmarkStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_bookmark_status_serde_form() {
        let json = serde_json::to_string(&BookmarkStatus::ReadLater).unwrap();
        assert_eq!(json, "\"read_later\"");
        let status: BookmarkStatus = serde_json::from_str("\"hof\"").unwrap();
        assert_eq!(status, BookmarkStatus::Hof);
    }

    #[test]
    fn test_bookmark_status_rejects_unknown() {
        assert!("reading".parse::<BookmarkStatus>().is_err());
    }

    #[test]
    fn test_priority_round_trip_and_default() {
        assert_eq!(Priority::default(), Priority::Medium);
        for p in [Priority::High, Priority::Medium, Priority::Low] {
            let parsed: Priority = p.as_str().parse().unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn test_classification_status_terminal() {
        assert!(!ClassificationStatus::Pending.is_terminal());
        assert!(!ClassificationStatus::Processing.is_terminal());
        assert!(ClassificationStatus::Completed.is_terminal());
        assert!(ClassificationStatus::Error.is_terminal());
    }

    #[test]
    fn test_classification_status_round_trip() {
        for s in [
            ClassificationStatus::Pending,
            ClassificationStatus::Processing,
            ClassificationStatus::Completed,
            ClassificationStatus::Error,
        ] {
            let parsed: ClassificationStatus = s.as_str().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn test_job_type_serde_form() {
        let json = serde_json::to_string(&JobType::ScrapeMetadata).unwrap();
        assert_eq!(json, "\"scrape_metadata\"");
        let parsed: JobType = serde_json::from_str("\"classify_bookmark\"").unwrap();
        assert_eq!(parsed, JobType::ClassifyBookmark);
    }

    #[test]
    fn test_job_type_priorities() {
        assert!(JobType::ScrapeMetadata.default_priority() > JobType::ClassifyBookmark.default_priority());
    }

    #[test]
    fn test_suggested_tag_serde_round_trip() {
        let tag = SuggestedTag::new("rust", 0.82);
        let json = serde_json::to_string(&tag).unwrap();
        let back: SuggestedTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn test_tag_source_as_str() {
        assert_eq!(TagSource::User.as_str(), "user");
        assert_eq!(TagSource::Classifier.as_str(), "classifier");
    }
}
