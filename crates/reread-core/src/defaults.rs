//! Centralized default constants for the reread system.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SCRAPING
// =============================================================================

/// Timeout for one page fetch in seconds.
pub const SCRAPE_TIMEOUT_SECS: u64 = 10;

/// Identifying User-Agent sent with every page fetch, so site operators can
/// see who is requesting their pages.
pub const SCRAPE_USER_AGENT: &str =
    "reread-bot/1.0 (+https://github.com/reread-app/reread)";

/// Days before a cached URL's metadata is considered stale and eligible for
/// a re-scrape on the next bookmark of that URL.
pub const CACHE_TTL_DAYS: i64 = 7;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Maximum keyword tags suggested per bookmark.
pub const MAX_SUGGESTED_TAGS: usize = 5;

/// Minimum token length considered a keyword candidate.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Frequency that maps to a 1.0 score in the frequency fallback
/// (`score = min(frequency / 10, 1.0)`).
pub const KEYWORD_FREQUENCY_CAP: f32 = 10.0;

/// Relevance/diversity trade-off for embedding keyword selection.
/// 1.0 = pure relevance, 0.0 = pure diversity.
pub const KEYWORD_MMR_LAMBDA: f32 = 0.7;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for bookmark and tag listings.
pub const PAGE_LIMIT: i64 = 50;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

/// Related-bookmark suggestions returned per bookmark.
pub const RELATED_LIMIT: i64 = 5;

/// Tags shown in the statistics view.
pub const STATS_TOP_TAGS: i64 = 10;

/// Months of save history in the statistics view.
pub const STATS_MONTHS: i64 = 12;

// =============================================================================
// JOB PROCESSING
// =============================================================================

/// Default maximum retry count for enrichment jobs. Zero: a failed scrape
/// or classification stays failed until explicitly re-triggered.
pub const JOB_MAX_RETRIES: i32 = 0;

/// Default job worker safety-net poll interval in milliseconds.
///
/// With event-driven waking, the worker sleeps until notified. This
/// interval is only a safety net for edge cases (crash recovery, external
/// SQL inserts, race conditions between notify and claim).
pub const JOB_POLL_INTERVAL_MS: u64 = 60_000;

/// Default maximum concurrent jobs per worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Default job execution timeout in seconds. Bounds classification runs
/// against a hung inference backend; page fetches have their own shorter
/// timeout.
pub const JOB_TIMEOUT_SECS: u64 = 120;

/// Worker event broadcast channel capacity.
pub const WORKER_EVENT_CAPACITY: usize = 256;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LENGTH: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_defaults() {
        const {
            assert!(SCRAPE_TIMEOUT_SECS == 10);
            assert!(CACHE_TTL_DAYS == 7);
        }
        assert!(SCRAPE_USER_AGENT.starts_with("reread-bot/"));
    }

    #[test]
    fn classification_defaults_consistent() {
        const {
            assert!(MAX_SUGGESTED_TAGS == 5);
            assert!(MIN_KEYWORD_LEN >= 1);
        }
        // Runtime check needed for floating point arithmetic
        assert!(KEYWORD_MMR_LAMBDA > 0.0 && KEYWORD_MMR_LAMBDA < 1.0);
        assert!((KEYWORD_FREQUENCY_CAP - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn job_timeout_exceeds_fetch_timeout() {
        const {
            assert!(JOB_TIMEOUT_SECS > SCRAPE_TIMEOUT_SECS);
        }
    }

    #[test]
    fn enrichment_jobs_do_not_retry() {
        const {
            assert!(JOB_MAX_RETRIES == 0);
        }
    }
}
