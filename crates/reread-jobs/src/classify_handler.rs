//! Handler for bookmark classification jobs.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use reread_classify::{BookmarkClassifier, Classification};
use reread_core::{
    Bookmark, BookmarkRepository, JobType, Result, TagRepository, TagSource, UrlCacheRepository,
};
use reread_db::{validate_tag_name, Database};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Handler for bookmark classification jobs.
///
/// Runs the classifier over the bookmark's cached text and records the
/// outcome on the bookmark. The job itself completes in every case except a
/// failed database write: a classification failure lands on the bookmark as
/// `error` status, never as a dangling `processing`.
pub struct ClassifyHandler {
    db: Database,
    classifier: BookmarkClassifier,
}

impl ClassifyHandler {
    /// Create a new classification handler.
    pub fn new(db: Database, classifier: BookmarkClassifier) -> Self {
        Self { db, classifier }
    }

    /// Classify and persist the result plus materialized tags.
    ///
    /// Any error in here is recorded on the bookmark by the caller.
    async fn run(
        &self,
        bookmark: &Bookmark,
        text: &str,
        ctx: &JobContext,
    ) -> Result<(Classification, usize)> {
        ctx.report_progress(30, Some("Classifying..."));
        let classification = self.classifier.classify(text).await?;

        ctx.report_progress(70, Some("Recording results..."));
        self.db
            .bookmarks
            .complete_classification(
                bookmark.id,
                &classification.category,
                classification.category_score,
                &classification.keywords,
            )
            .await?;

        // Materialize keywords as the owner's tags. Invalid names stay in
        // suggested_tags but never become tags; existing tags are untouched.
        let mut attached = 0;
        for keyword in &classification.keywords {
            let name = keyword.name.trim();
            if validate_tag_name(name).is_err() {
                debug!(
                    bookmark_id = %bookmark.id,
                    keyword = %keyword.name,
                    "Skipping invalid tag name"
                );
                continue;
            }
            self.db
                .tags
                .attach_by_name(bookmark.user_id, bookmark.id, name, TagSource::Classifier)
                .await?;
            attached += 1;
        }

        Ok((classification, attached))
    }
}

#[async_trait]
impl JobHandler for ClassifyHandler {
    fn job_type(&self) -> JobType {
        JobType::ClassifyBookmark
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "classify", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let start = Instant::now();
        let bookmark_id = match ctx.bookmark_id() {
            Some(id) => id,
            None => return JobResult::Failed("No bookmark_id provided".into()),
        };

        ctx.report_progress(10, Some("Loading bookmark..."));
        let bookmark = match self.db.bookmarks.get(bookmark_id).await {
            Ok(b) => b,
            Err(e) => return JobResult::Failed(format!("Failed to load bookmark: {}", e)),
        };
        let entry = match self.db.cache.get(bookmark.cached_url_id).await {
            Ok(entry) => entry,
            Err(e) => return JobResult::Failed(format!("Failed to load cache entry: {}", e)),
        };

        // Empty input is a terminal classification outcome, not a job failure.
        let text = entry.classification_text();
        if text.is_empty() {
            if let Err(e) = self
                .db
                .bookmarks
                .fail_classification(bookmark_id, "empty text")
                .await
            {
                return JobResult::Failed(format!("Failed to record classification error: {}", e));
            }
            info!(bookmark_id = %bookmark_id, "No text to classify");
            return JobResult::Success(Some(json!({
                "classified": false,
                "error": "empty text",
            })));
        }

        if let Err(e) = self.db.bookmarks.begin_classification(bookmark_id).await {
            return JobResult::Failed(format!("Failed to mark classification started: {}", e));
        }

        match self.run(&bookmark, &text, &ctx).await {
            Ok((classification, attached)) => {
                info!(
                    bookmark_id = %bookmark_id,
                    category = %classification.category,
                    keywords = classification.keywords.len(),
                    attached,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Classification completed"
                );
                JobResult::Success(Some(json!({
                    "classified": true,
                    "category": classification.category,
                    "keywords": classification.keywords.len(),
                    "tags_attached": attached,
                })))
            }
            Err(e) => {
                // The bookmark must never stay in processing. Record the
                // error there; the job fails only when that write fails.
                let message = e.to_string();
                warn!(bookmark_id = %bookmark_id, error = %message, "Classification failed");
                if let Err(db_err) = self
                    .db
                    .bookmarks
                    .fail_classification(bookmark_id, &message)
                    .await
                {
                    return JobResult::Failed(format!(
                        "Failed to record classification error: {}",
                        db_err
                    ));
                }
                JobResult::Success(Some(json!({
                    "classified": false,
                    "error": message,
                })))
            }
        }
    }
}
