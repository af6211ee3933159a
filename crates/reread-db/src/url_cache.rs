//! URL metadata cache repository implementation.
//!
//! One row per canonical URL, shared by every bookmark of that URL. Rows
//! are created empty on first bookmark and only the scraper writes the
//! metadata columns.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use reread_core::{new_v7, CachedUrl, Error, PageMetadata, Result, UrlCacheRepository};

/// Parse a url_cache row into a CachedUrl struct.
pub(crate) fn parse_cached_url_row(row: sqlx::postgres::PgRow) -> CachedUrl {
    CachedUrl {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        site_name: row.get("site_name"),
        last_scraped_at: row.get("last_scraped_at"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of UrlCacheRepository.
pub struct PgUrlCacheRepository {
    pool: Pool<Postgres>,
}

impl PgUrlCacheRepository {
    /// Create a new PgUrlCacheRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlCacheRepository for PgUrlCacheRepository {
    async fn get_or_create(&self, url: &str) -> Result<(CachedUrl, bool)> {
        // INSERT ... ON CONFLICT DO NOTHING returns a row only when this
        // call actually created the entry, which doubles as the race
        // detector for concurrent callers on the same URL.
        let row = sqlx::query(
            "INSERT INTO url_cache (id, url, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (url) DO NOTHING
             RETURNING id, url, title, description, image_url, site_name,
                       last_scraped_at, created_at",
        )
        .bind(new_v7())
        .bind(url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = row {
            return Ok((parse_cached_url_row(row), true));
        }

        // Entry already existed (or another caller won the insert race).
        let row = sqlx::query(
            "SELECT id, url, title, description, image_url, site_name,
                    last_scraped_at, created_at
             FROM url_cache WHERE url = $1",
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((parse_cached_url_row(row), false))
    }

    async fn get(&self, id: Uuid) -> Result<CachedUrl> {
        let row = sqlx::query(
            "SELECT id, url, title, description, image_url, site_name,
                    last_scraped_at, created_at
             FROM url_cache WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(parse_cached_url_row)
            .ok_or(Error::CacheEntryNotFound(id))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<CachedUrl>> {
        let row = sqlx::query(
            "SELECT id, url, title, description, image_url, site_name,
                    last_scraped_at, created_at
             FROM url_cache WHERE url = $1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(parse_cached_url_row))
    }

    async fn write_metadata(&self, id: Uuid, metadata: &PageMetadata) -> Result<CachedUrl> {
        // Full replace: a field the page no longer declares is cleared.
        // last_scraped_at moves forward even when every field is None, so
        // an empty-but-successful parse still counts as a fresh scrape.
        let row = sqlx::query(
            "UPDATE url_cache
             SET title = $1, description = $2, image_url = $3, site_name = $4,
                 last_scraped_at = $5
             WHERE id = $6
             RETURNING id, url, title, description, image_url, site_name,
                       last_scraped_at, created_at",
        )
        .bind(&metadata.title)
        .bind(&metadata.description)
        .bind(&metadata.image_url)
        .bind(&metadata.site_name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(parse_cached_url_row)
            .ok_or(Error::CacheEntryNotFound(id))
    }
}
