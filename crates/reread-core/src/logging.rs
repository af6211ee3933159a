//! Structured logging schema and field name constants for reread.
//!
//! All crates use these constants for consistent structured logging fields.
//! This ensures log aggregation tools (Loki, Elasticsearch) can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (candidates, rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "db", "scrape", "classify", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "fetcher", "ollama", "pool", "worker", "orchestrator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "scrape", "embed_texts", "classify", "claim_next"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Bookmark UUID being operated on.
pub const BOOKMARK_ID: &str = "bookmark_id";

/// Cached URL entry UUID being operated on.
pub const CACHED_URL_ID: &str = "cached_url_id";

/// User UUID owning the affected rows.
pub const USER_ID: &str = "user_id";

/// URL being fetched or canonicalized.
pub const URL: &str = "url";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Job type enum variant.
pub const JOB_TYPE: &str = "job_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// HTTP status code from a page fetch.
pub const HTTP_STATUS: &str = "http_status";

/// Byte length of a fetched response body.
pub const BODY_LEN: &str = "body_len";

/// Number of input texts sent to an embedding model.
pub const INPUT_COUNT: &str = "input_count";

/// Number of keyword candidates considered.
pub const CANDIDATE_COUNT: &str = "candidate_count";

// ─── Classification fields ─────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Strategy that produced a classification result.
/// Values: "embedding", "keyword_overlap", "frequency"
pub const STRATEGY: &str = "strategy";

/// Suggested category label.
pub const CATEGORY: &str = "category";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether a cache entry was stale at decision time.
pub const STALE: &str = "stale";
