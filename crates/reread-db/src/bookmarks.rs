//! Bookmark repository implementation.
//!
//! Write paths are grouped by field owner. `update` touches only the
//! user-owned columns, `mark_as_read` only the scheduler-owned columns,
//! and the `*_classification` methods only the classifier-owned columns.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use reread_core::{
    defaults, new_v7, next_review, Bookmark, BookmarkDetail, BookmarkRepository, BookmarkStatus,
    BookmarkSummary, CreateBookmarkRequest, Error, ListBookmarksRequest, ListBookmarksResponse,
    MonthlySaves, Result, StatusCount, SuggestedTag, TagUsage, UpdateBookmarkRequest,
    UserStatistics,
};

use crate::escape_like;
use crate::tags::parse_tag_row;
use crate::url_cache::parse_cached_url_row;

/// PostgreSQL implementation of BookmarkRepository.
pub struct PgBookmarkRepository {
    pool: Pool<Postgres>,
}

/// Bind the optional list filters in declaration order. Must match the
/// parameter order produced by the condition builder in `list`.
macro_rules! bind_list_filters {
    ($query:expr, $user_id:expr, $req:expr, $pattern:expr) => {{
        let mut q = $query.bind($user_id);
        if let Some(status) = $req.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = $req.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(favorite) = $req.is_favorite {
            q = q.bind(favorite);
        }
        if let Some(tag) = &$req.tag {
            q = q.bind(tag);
        }
        if let Some(pattern) = &$pattern {
            q = q.bind(pattern);
        }
        q
    }};
}

impl PgBookmarkRepository {
    /// Create a new PgBookmarkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a bookmarks row into a Bookmark struct.
    fn parse_bookmark_row(row: sqlx::postgres::PgRow) -> Bookmark {
        let status: String = row.get("status");
        let priority: String = row.get("priority");
        let classification_status: String = row.get("classification_status");
        let suggested_tags: JsonValue = row.get("suggested_tags");

        Bookmark {
            id: row.get("id"),
            user_id: row.get("user_id"),
            cached_url_id: row.get("cached_url_id"),
            status: status.parse().unwrap_or_default(),
            priority: priority.parse().unwrap_or_default(),
            is_favorite: row.get("is_favorite"),
            read_count: row.get("read_count"),
            user_memo: row.get("user_memo"),
            user_summary: row.get("user_summary"),
            saved_at: row.get("saved_at"),
            last_read_at: row.get("last_read_at"),
            repetition_level: row.get("repetition_level"),
            next_reminder_date: row.get("next_reminder_date"),
            classification_status: classification_status.parse().unwrap_or_default(),
            classification_error: row.get("classification_error"),
            suggested_category: row.get("suggested_category"),
            suggested_category_score: row.get("suggested_category_score"),
            suggested_tags: serde_json::from_value(suggested_tags).unwrap_or_default(),
        }
    }

    /// Parse a joined summary row (bookmark + cache columns + comma-joined
    /// tag names) into a BookmarkSummary.
    fn parse_summary_row(row: sqlx::postgres::PgRow) -> BookmarkSummary {
        let status: String = row.get("status");
        let priority: String = row.get("priority");
        let classification_status: String = row.get("classification_status");

        let tags_str: String = row.get("tags");
        let tags = if tags_str.is_empty() {
            Vec::new()
        } else {
            tags_str.split(',').map(String::from).collect()
        };

        BookmarkSummary {
            id: row.get("id"),
            user_id: row.get("user_id"),
            url: row.get("url"),
            title: row.get("title"),
            site_name: row.get("site_name"),
            status: status.parse().unwrap_or_default(),
            priority: priority.parse().unwrap_or_default(),
            is_favorite: row.get("is_favorite"),
            read_count: row.get("read_count"),
            saved_at: row.get("saved_at"),
            next_reminder_date: row.get("next_reminder_date"),
            classification_status: classification_status.parse().unwrap_or_default(),
            suggested_category: row.get("suggested_category"),
            tags,
        }
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn find_or_create(
        &self,
        req: &CreateBookmarkRequest,
        cached_url_id: Uuid,
    ) -> Result<(Bookmark, bool)> {
        let priority = req.priority.unwrap_or_default();

        // INSERT ... ON CONFLICT DO NOTHING returns a row only for the
        // caller that actually created the bookmark.
        let row = sqlx::query(
            "INSERT INTO bookmarks (id, user_id, cached_url_id, priority, is_favorite,
                                    user_memo, user_summary, saved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id, cached_url_id) DO NOTHING
             RETURNING id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                       user_memo, user_summary, saved_at, last_read_at, repetition_level,
                       next_reminder_date, classification_status, classification_error,
                       suggested_category, suggested_category_score, suggested_tags",
        )
        .bind(new_v7())
        .bind(req.user_id)
        .bind(cached_url_id)
        .bind(priority.as_str())
        .bind(req.is_favorite)
        .bind(&req.user_memo)
        .bind(&req.user_summary)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = row {
            return Ok((Self::parse_bookmark_row(row), true));
        }

        // Saving the same URL again returns the existing bookmark untouched.
        let row = sqlx::query(
            "SELECT id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                    user_memo, user_summary, saved_at, last_read_at, repetition_level,
                    next_reminder_date, classification_status, classification_error,
                    suggested_category, suggested_category_score, suggested_tags
             FROM bookmarks WHERE user_id = $1 AND cached_url_id = $2",
        )
        .bind(req.user_id)
        .bind(cached_url_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((Self::parse_bookmark_row(row), false))
    }

    async fn get(&self, id: Uuid) -> Result<Bookmark> {
        let row = sqlx::query(
            "SELECT id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                    user_memo, user_summary, saved_at, last_read_at, repetition_level,
                    next_reminder_date, classification_status, classification_error,
                    suggested_category, suggested_category_score, suggested_tags
             FROM bookmarks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_bookmark_row)
            .ok_or(Error::BookmarkNotFound(id))
    }

    async fn get_detail(&self, id: Uuid) -> Result<BookmarkDetail> {
        let bookmark = self.get(id).await?;

        let row = sqlx::query(
            "SELECT id, url, title, description, image_url, site_name,
                    last_scraped_at, created_at
             FROM url_cache WHERE id = $1",
        )
        .bind(bookmark.cached_url_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        let cached_url = parse_cached_url_row(row);

        let tags = sqlx::query(
            "SELECT t.id, t.user_id, t.name, t.created_at, 0::BIGINT AS bookmark_count
             FROM tags t
             JOIN bookmark_tags bt ON bt.tag_id = t.id
             WHERE bt.bookmark_id = $1
             ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?
        .into_iter()
        .map(parse_tag_row)
        .collect();

        Ok(BookmarkDetail {
            bookmark,
            cached_url,
            tags,
        })
    }

    async fn list(
        &self,
        user_id: Uuid,
        req: ListBookmarksRequest,
    ) -> Result<ListBookmarksResponse> {
        let mut conditions = vec!["b.user_id = $1".to_string()];
        let mut param_idx = 2;

        if req.status.is_some() {
            conditions.push(format!("b.status = ${}", param_idx));
            param_idx += 1;
        }
        if req.priority.is_some() {
            conditions.push(format!("b.priority = ${}", param_idx));
            param_idx += 1;
        }
        if req.is_favorite.is_some() {
            conditions.push(format!("b.is_favorite = ${}", param_idx));
            param_idx += 1;
        }
        if req.tag.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM bookmark_tags fbt
                         JOIN tags ft ON ft.id = fbt.tag_id
                         WHERE fbt.bookmark_id = b.id AND LOWER(ft.name) = LOWER(${}))",
                param_idx
            ));
            param_idx += 1;
        }
        if req.query.is_some() {
            conditions.push(format!(
                "(c.title ILIKE ${idx} OR c.description ILIKE ${idx} OR c.site_name ILIKE ${idx}
                  OR b.user_memo ILIKE ${idx} OR b.user_summary ILIKE ${idx})",
                idx = param_idx
            ));
            param_idx += 1;
        }

        let where_clause = conditions.join(" AND ");
        let pattern = req
            .query
            .as_deref()
            .map(|q| format!("%{}%", escape_like(q)));

        let limit = req.limit.unwrap_or(defaults::PAGE_LIMIT);
        let offset = req.offset.unwrap_or(defaults::PAGE_OFFSET);

        let list_query = format!(
            "SELECT b.id, b.user_id, c.url, c.title, c.site_name, b.status, b.priority,
                    b.is_favorite, b.read_count, b.saved_at, b.next_reminder_date,
                    b.classification_status, b.suggested_category,
                    COALESCE(string_agg(t.name, ',' ORDER BY t.name), '') AS tags
             FROM bookmarks b
             JOIN url_cache c ON c.id = b.cached_url_id
             LEFT JOIN bookmark_tags bt ON bt.bookmark_id = b.id
             LEFT JOIN tags t ON t.id = bt.tag_id
             WHERE {}
             GROUP BY b.id, c.id
             ORDER BY b.saved_at DESC
             LIMIT ${} OFFSET ${}",
            where_clause,
            param_idx,
            param_idx + 1
        );

        let rows = bind_list_filters!(sqlx::query(&list_query), user_id, req, pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let count_query = format!(
            "SELECT COUNT(*) FROM bookmarks b
             JOIN url_cache c ON c.id = b.cached_url_id
             WHERE {}",
            where_clause
        );
        let total: i64 = bind_list_filters!(sqlx::query_scalar(&count_query), user_id, req, pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(ListBookmarksResponse {
            bookmarks: rows.into_iter().map(Self::parse_summary_row).collect(),
            total,
        })
    }

    async fn update(&self, id: Uuid, req: UpdateBookmarkRequest) -> Result<Bookmark> {
        let mut sets = Vec::new();
        let mut param_idx = 1;

        if req.status.is_some() {
            sets.push(format!("status = ${}", param_idx));
            param_idx += 1;
        }
        if req.priority.is_some() {
            sets.push(format!("priority = ${}", param_idx));
            param_idx += 1;
        }
        if req.is_favorite.is_some() {
            sets.push(format!("is_favorite = ${}", param_idx));
            param_idx += 1;
        }
        if req.user_memo.is_some() {
            sets.push(format!("user_memo = ${}", param_idx));
            param_idx += 1;
        }
        if req.user_summary.is_some() {
            sets.push(format!("user_summary = ${}", param_idx));
            param_idx += 1;
        }

        if sets.is_empty() {
            return self.get(id).await;
        }

        let query = format!(
            "UPDATE bookmarks SET {} WHERE id = ${}
             RETURNING id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                       user_memo, user_summary, saved_at, last_read_at, repetition_level,
                       next_reminder_date, classification_status, classification_error,
                       suggested_category, suggested_category_score, suggested_tags",
            sets.join(", "),
            param_idx
        );

        let mut q = sqlx::query(&query);
        if let Some(status) = req.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = req.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(favorite) = req.is_favorite {
            q = q.bind(favorite);
        }
        if let Some(memo) = &req.user_memo {
            q = q.bind(memo);
        }
        if let Some(summary) = &req.user_summary {
            q = q.bind(summary);
        }
        q = q.bind(id);

        let row = q.fetch_optional(&self.pool).await.map_err(Error::Database)?;
        row.map(Self::parse_bookmark_row)
            .ok_or(Error::BookmarkNotFound(id))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn mark_as_read(&self, id: Uuid, today: NaiveDate) -> Result<Bookmark> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Lock the row so concurrent read events serialize; the schedule
        // advance depends on the level read here.
        let level: Option<i32> =
            sqlx::query_scalar("SELECT repetition_level FROM bookmarks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let level = level.ok_or(Error::BookmarkNotFound(id))?;
        let advance = next_review(level, today);

        let row = sqlx::query(
            "UPDATE bookmarks
             SET read_count = read_count + 1, last_read_at = $1,
                 repetition_level = $2, next_reminder_date = $3
             WHERE id = $4
             RETURNING id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                       user_memo, user_summary, saved_at, last_read_at, repetition_level,
                       next_reminder_date, classification_status, classification_error,
                       suggested_category, suggested_category_score, suggested_tags",
        )
        .bind(Utc::now())
        .bind(advance.repetition_level)
        .bind(advance.next_reminder_date)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(Self::parse_bookmark_row(row))
    }

    async fn due_reminders(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query(
            "SELECT id, user_id, cached_url_id, status, priority, is_favorite, read_count,
                    user_memo, user_summary, saved_at, last_read_at, repetition_level,
                    next_reminder_date, classification_status, classification_error,
                    suggested_category, suggested_category_score, suggested_tags
             FROM bookmarks
             WHERE user_id = $1
               AND next_reminder_date IS NOT NULL
               AND next_reminder_date <= $2
             ORDER BY next_reminder_date ASC, saved_at ASC",
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_bookmark_row).collect())
    }

    async fn begin_classification(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bookmarks
             SET classification_status = 'processing', classification_error = NULL
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn complete_classification(
        &self,
        id: Uuid,
        category: &str,
        category_score: f64,
        suggested_tags: &[SuggestedTag],
    ) -> Result<()> {
        let tags_json = serde_json::to_value(suggested_tags)?;

        let result = sqlx::query(
            "UPDATE bookmarks
             SET classification_status = 'completed', classification_error = NULL,
                 suggested_category = $1, suggested_category_score = $2, suggested_tags = $3
             WHERE id = $4",
        )
        .bind(category)
        .bind(category_score)
        .bind(tags_json)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn fail_classification(&self, id: Uuid, message: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE bookmarks
             SET classification_status = 'error', classification_error = $1
             WHERE id = $2",
        )
        .bind(message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn random_pick(&self, user_id: Uuid) -> Result<Option<BookmarkSummary>> {
        let row = sqlx::query(
            "SELECT b.id, b.user_id, c.url, c.title, c.site_name, b.status, b.priority,
                    b.is_favorite, b.read_count, b.saved_at, b.next_reminder_date,
                    b.classification_status, b.suggested_category,
                    COALESCE(string_agg(t.name, ',' ORDER BY t.name), '') AS tags
             FROM bookmarks b
             JOIN url_cache c ON c.id = b.cached_url_id
             LEFT JOIN bookmark_tags bt ON bt.bookmark_id = b.id
             LEFT JOIN tags t ON t.id = bt.tag_id
             WHERE b.user_id = $1 AND b.status <> 'trash'
             GROUP BY b.id, c.id
             ORDER BY RANDOM()
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_summary_row))
    }

    async fn related(&self, bookmark_id: Uuid, limit: i64) -> Result<Vec<BookmarkSummary>> {
        let limit = if limit > 0 {
            limit
        } else {
            defaults::RELATED_LIMIT
        };
        // Candidates belong to the same user and share at least one tag
        // with the source bookmark. Ranked by shared-tag count, then
        // recency. bt walks the source's tags, bt2 fans out to other
        // bookmarks carrying them, bt3/t2 collect each candidate's full
        // tag list for the summary.
        let rows = sqlx::query(
            "SELECT b2.id, b2.user_id, c.url, c.title, c.site_name, b2.status, b2.priority,
                    b2.is_favorite, b2.read_count, b2.saved_at, b2.next_reminder_date,
                    b2.classification_status, b2.suggested_category,
                    COALESCE(string_agg(DISTINCT t2.name, ',' ORDER BY t2.name), '') AS tags,
                    COUNT(DISTINCT bt.tag_id) AS shared_tags
             FROM bookmarks b
             JOIN bookmark_tags bt ON bt.bookmark_id = b.id
             JOIN bookmark_tags bt2 ON bt2.tag_id = bt.tag_id AND bt2.bookmark_id <> b.id
             JOIN bookmarks b2 ON b2.id = bt2.bookmark_id AND b2.user_id = b.user_id
             JOIN url_cache c ON c.id = b2.cached_url_id
             LEFT JOIN bookmark_tags bt3 ON bt3.bookmark_id = b2.id
             LEFT JOIN tags t2 ON t2.id = bt3.tag_id
             WHERE b.id = $1
             GROUP BY b2.id, c.id
             ORDER BY shared_tags DESC, b2.saved_at DESC
             LIMIT $2",
        )
        .bind(bookmark_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_summary_row).collect())
    }

    async fn statistics(&self, user_id: Uuid) -> Result<UserStatistics> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_favorite) AS favorites,
                    COALESCE(SUM(read_count), 0)::BIGINT AS total_reads
             FROM bookmarks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let status_rows = sqlx::query(
            "SELECT status, COUNT(*) AS count
             FROM bookmarks WHERE user_id = $1
             GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_status: HashMap<String, i64> = HashMap::new();
        for row in status_rows {
            by_status.insert(row.get("status"), row.get("count"));
        }
        // Zero-filled so every status shows up even with no bookmarks.
        let status_counts = BookmarkStatus::all()
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: by_status.get(status.as_str()).copied().unwrap_or(0),
            })
            .collect();

        let top_tags = sqlx::query(
            "SELECT t.name, COUNT(bt.bookmark_id) AS bookmark_count
             FROM tags t
             JOIN bookmark_tags bt ON bt.tag_id = t.id
             WHERE t.user_id = $1
             GROUP BY t.name
             ORDER BY COUNT(bt.bookmark_id) DESC, t.name ASC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(defaults::STATS_TOP_TAGS)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?
        .into_iter()
        .map(|row| TagUsage {
            name: row.get("name"),
            bookmark_count: row.get("bookmark_count"),
        })
        .collect();

        let saved_per_month = sqlx::query(
            "SELECT to_char(date_trunc('month', saved_at), 'YYYY-MM') AS month,
                    COUNT(*) AS count
             FROM bookmarks
             WHERE user_id = $1
               AND saved_at >= date_trunc('month', now()) - make_interval(months => $2)
             GROUP BY 1
             ORDER BY 1 ASC",
        )
        .bind(user_id)
        .bind(defaults::STATS_MONTHS as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?
        .into_iter()
        .map(|row| MonthlySaves {
            month: row.get("month"),
            count: row.get("count"),
        })
        .collect();

        Ok(UserStatistics {
            total_bookmarks: totals.get("total"),
            favorite_count: totals.get("favorites"),
            total_reads: totals.get("total_reads"),
            status_counts,
            top_tags,
            saved_per_month,
        })
    }
}
