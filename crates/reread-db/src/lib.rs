//! # reread-db
//!
//! PostgreSQL database layer for reread.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for the URL metadata cache, bookmarks,
//!   user tags, and the background job queue
//! - The [`Database`] aggregate wiring one pool into all repositories
//!
//! ## Example
//!
//! ```rust,ignore
//! use reread_db::{Database, BookmarkRepository, UrlCacheRepository, CreateBookmarkRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/reread").await?;
//!
//!     let (cached, _) = db.cache.get_or_create("https://example.com/article").await?;
//!     let req = CreateBookmarkRequest::new(uuid::Uuid::new_v4(), "https://example.com/article");
//!     let (bookmark, created) = db.bookmarks.find_or_create(&req, cached.id).await?;
//!
//!     println!("bookmark {} (created: {})", bookmark.id, created);
//!     Ok(())
//! }
//! ```

pub mod bookmarks;
pub mod jobs;
pub mod pool;
pub mod tags;
pub mod url_cache;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use reread_core::*;

// Re-export repository implementations
pub use bookmarks::PgBookmarkRepository;
pub use jobs::PgJobRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::{validate_tag_name, PgTagRepository};
pub use url_cache::PgUrlCacheRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Aggregated database access with all repositories.
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub cache: PgUrlCacheRepository,
    pub bookmarks: PgBookmarkRepository,
    pub tags: PgTagRepository,
    pub jobs: PgJobRepository,
}

impl Database {
    /// Create a new Database instance with the given connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            cache: PgUrlCacheRepository::new(pool.clone()),
            bookmarks: PgBookmarkRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            cache: PgUrlCacheRepository::new(self.pool.clone()),
            bookmarks: PgBookmarkRepository::new(self.pool.clone()),
            tags: PgTagRepository::new(self.pool.clone()),
            // Share the notify handle so enqueues through any clone wake
            // the same workers.
            jobs: PgJobRepository::with_notify(self.pool.clone(), self.jobs.job_notify()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_passthrough() {
        assert_eq!(escape_like("plain text"), "plain text");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_escape_like_escapes_backslash_first() {
        // A literal backslash-percent must not end up double-escaped.
        assert_eq!(escape_like("\\%"), "\\\\\\%");
    }
}
