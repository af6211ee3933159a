//! Tag repository implementation.
//!
//! Tags are scoped to one user and unique per (user, name). The
//! classifier materializes suggested keywords through the same
//! get-or-create path users go through, so names never collide.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use reread_core::{defaults, new_v7, Error, Result, Tag, TagRepository, TagSource};

/// Validate a tag name.
///
/// Rules:
/// - Length between 1 and 100 characters
/// - Allowed characters: alphanumeric, hyphens (-), underscores (_)
/// - No spaces or other special characters
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.len() > defaults::TAG_NAME_MAX_LENGTH {
        return Err(format!(
            "Tag name must be {} characters or less",
            defaults::TAG_NAME_MAX_LENGTH
        ));
    }

    let invalid_chars: Vec<char> = tag
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != '-' && *c != '_')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only alphanumeric characters, hyphens, and underscores are allowed",
            chars_display
        ));
    }

    Ok(())
}

/// Parse a tags row into a Tag struct. Expects a `bookmark_count` column;
/// selects that don't compute one alias a literal zero.
pub(crate) fn parse_tag_row(row: sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        bookmark_count: row.get("bookmark_count"),
    }
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn get_or_create(&self, user_id: Uuid, name: &str) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;

        let row = sqlx::query(
            "INSERT INTO tags (id, user_id, name, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, name) DO NOTHING
             RETURNING id, user_id, name, created_at, 0::BIGINT AS bookmark_count",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = row {
            return Ok(parse_tag_row(row));
        }

        let row = sqlx::query(
            "SELECT id, user_id, name, created_at, 0::BIGINT AS bookmark_count
             FROM tags WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(parse_tag_row(row))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.user_id, t.name, t.created_at,
                    COUNT(bt.bookmark_id) AS bookmark_count
             FROM tags t
             LEFT JOIN bookmark_tags bt ON bt.tag_id = t.id
             WHERE t.user_id = $1
             GROUP BY t.id
             ORDER BY t.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_tag_row).collect())
    }

    async fn attach(&self, bookmark_id: Uuid, tag_id: Uuid, source: TagSource) -> Result<()> {
        sqlx::query(
            "INSERT INTO bookmark_tags (bookmark_id, tag_id, source, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (bookmark_id, tag_id) DO NOTHING",
        )
        .bind(bookmark_id)
        .bind(tag_id)
        .bind(source.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn attach_by_name(
        &self,
        user_id: Uuid,
        bookmark_id: Uuid,
        name: &str,
        source: TagSource,
    ) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Ensure the tag exists for this user.
        sqlx::query(
            "INSERT INTO tags (id, user_id, name, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, name) DO NOTHING",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(name)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let row = sqlx::query(
            "SELECT id, user_id, name, created_at, 0::BIGINT AS bookmark_count
             FROM tags WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let tag = parse_tag_row(row);

        // Link tag to bookmark; re-attaching is a no-op.
        sqlx::query(
            "INSERT INTO bookmark_tags (bookmark_id, tag_id, source, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (bookmark_id, tag_id) DO NOTHING",
        )
        .bind(bookmark_id)
        .bind(tag.id)
        .bind(source.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(tag)
    }

    async fn detach(&self, bookmark_id: Uuid, name: &str) -> Result<()> {
        sqlx::query(
            "DELETE FROM bookmark_tags bt
             USING tags t
             WHERE bt.tag_id = t.id
               AND bt.bookmark_id = $1
               AND LOWER(t.name) = LOWER($2)",
        )
        .bind(bookmark_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get_for_bookmark(&self, bookmark_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.user_id, t.name, t.created_at, 0::BIGINT AS bookmark_count
             FROM tags t
             JOIN bookmark_tags bt ON bt.tag_id = t.id
             WHERE bt.bookmark_id = $1
             ORDER BY t.name",
        )
        .bind(bookmark_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_tag_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag_name_accepts_simple_names() {
        assert!(validate_tag_name("rust").is_ok());
        assert!(validate_tag_name("machine-learning").is_ok());
        assert!(validate_tag_name("web_dev").is_ok());
        assert!(validate_tag_name("2026").is_ok());
    }

    #[test]
    fn test_validate_tag_name_rejects_empty() {
        assert!(validate_tag_name("").is_err());
    }

    #[test]
    fn test_validate_tag_name_rejects_too_long() {
        let long = "a".repeat(101);
        assert!(validate_tag_name(&long).is_err());
        let exact = "a".repeat(100);
        assert!(validate_tag_name(&exact).is_ok());
    }

    #[test]
    fn test_validate_tag_name_rejects_special_characters() {
        assert!(validate_tag_name("has space").is_err());
        assert!(validate_tag_name("semi;colon").is_err());
        assert!(validate_tag_name("path/segment").is_err());
        assert!(validate_tag_name("tag!").is_err());
    }

    #[test]
    fn test_validate_tag_name_error_lists_offending_characters() {
        let err = validate_tag_name("a b!c").unwrap_err();
        assert!(err.contains("' '"));
        assert!(err.contains("'!'"));
    }

    #[test]
    fn test_validate_tag_name_accepts_unicode_alphanumerics() {
        assert!(validate_tag_name("日本語").is_ok());
        assert!(validate_tag_name("café").is_ok());
    }
}
