//! Job handlers for each job type.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use reread_core::{Job, JobType};

/// Progress callback type for job handlers.
pub type ProgressCallback = Box<dyn Fn(i32, Option<&str>) + Send + Sync>;

/// Context provided to job handlers.
pub struct JobContext {
    /// The job being processed.
    pub job: Job,
    /// Progress callback for updating job progress.
    progress_callback: Option<ProgressCallback>,
}

impl JobContext {
    /// Create a new job context.
    pub fn new(job: Job) -> Self {
        Self {
            job,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(i32, Option<&str>) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Report progress to the callback.
    pub fn report_progress(&self, percent: i32, message: Option<&str>) {
        if let Some(ref callback) = self.progress_callback {
            callback(percent, message);
        }
    }

    /// Get the bookmark ID for this job, if any.
    pub fn bookmark_id(&self) -> Option<Uuid> {
        self.job.bookmark_id
    }

    /// Get the job payload.
    pub fn payload(&self) -> Option<&JsonValue> {
        self.job.payload.as_ref()
    }
}

/// Result of job execution.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully with optional result data.
    Success(Option<JsonValue>),
    /// Job failed with an error message.
    Failed(String),
    /// Job should be retried after a delay.
    Retry(String),
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job type this handler processes.
    fn job_type(&self) -> JobType;

    /// Execute the job.
    async fn execute(&self, ctx: JobContext) -> JobResult;

    /// Check if this handler can process the given job type.
    fn can_handle(&self, job_type: JobType) -> bool {
        self.job_type() == job_type
    }
}

/// No-op handler for testing.
pub struct NoOpHandler {
    job_type: JobType,
}

impl NoOpHandler {
    /// Create a new no-op handler for the given job type.
    pub fn new(job_type: JobType) -> Self {
        Self { job_type }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn job_type(&self) -> JobType {
        self.job_type
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        ctx.report_progress(50, Some("Processing..."));
        ctx.report_progress(100, Some("Done"));
        JobResult::Success(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reread_core::JobStatus;

    fn test_job(
        job_type: JobType,
        bookmark_id: Option<Uuid>,
        payload: Option<JsonValue>,
    ) -> Job {
        Job {
            id: Uuid::new_v4(),
            bookmark_id,
            job_type,
            status: JobStatus::Pending,
            priority: 0,
            payload,
            result: None,
            error_message: None,
            progress_percent: 0,
            progress_message: None,
            retry_count: 0,
            max_retries: 0,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_job_context_bookmark_id() {
        let bookmark_id = Uuid::new_v4();
        let job = test_job(JobType::ClassifyBookmark, Some(bookmark_id), None);

        let ctx = JobContext::new(job);
        assert_eq!(ctx.bookmark_id(), Some(bookmark_id));
    }

    #[test]
    fn test_job_context_bookmark_id_none() {
        let job = test_job(JobType::ScrapeMetadata, None, None);

        let ctx = JobContext::new(job);
        assert!(ctx.bookmark_id().is_none());
    }

    #[test]
    fn test_job_context_payload() {
        use serde_json::json;

        let payload = json!({"cached_url_id": Uuid::new_v4(), "classify": true});
        let job = test_job(JobType::ScrapeMetadata, None, Some(payload));

        let ctx = JobContext::new(job);
        assert!(ctx.payload().is_some());
        assert_eq!(ctx.payload().unwrap()["classify"], true);
    }

    #[test]
    fn test_job_context_report_progress_no_callback() {
        let job = test_job(JobType::ScrapeMetadata, None, None);

        let ctx = JobContext::new(job);
        // Should not panic
        ctx.report_progress(50, Some("test"));
        ctx.report_progress(100, None);
    }

    #[test]
    fn test_job_context_with_progress_callback() {
        use std::sync::{Arc, Mutex};

        let job = test_job(JobType::ClassifyBookmark, None, None);

        let progress_log = Arc::new(Mutex::new(Vec::new()));
        let progress_log_clone = progress_log.clone();

        let ctx = JobContext::new(job).with_progress_callback(move |percent, message| {
            progress_log_clone
                .lock()
                .unwrap()
                .push((percent, message.map(String::from)));
        });

        ctx.report_progress(25, Some("Starting"));
        ctx.report_progress(50, Some("Halfway"));
        ctx.report_progress(100, None);

        let log = progress_log.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], (25, Some("Starting".to_string())));
        assert_eq!(log[1], (50, Some("Halfway".to_string())));
        assert_eq!(log[2], (100, None));
    }

    #[tokio::test]
    async fn test_noop_handler() {
        let handler = NoOpHandler::new(JobType::ScrapeMetadata);
        assert_eq!(handler.job_type(), JobType::ScrapeMetadata);
        assert!(handler.can_handle(JobType::ScrapeMetadata));
        assert!(!handler.can_handle(JobType::ClassifyBookmark));

        let job = test_job(JobType::ScrapeMetadata, None, None);
        let ctx = JobContext::new(job);
        let result = handler.execute(ctx).await;
        assert!(matches!(result, JobResult::Success(None)));
    }

    #[tokio::test]
    async fn test_noop_handler_reports_progress() {
        use std::sync::{Arc, Mutex};

        let handler = NoOpHandler::new(JobType::ClassifyBookmark);
        let job = test_job(JobType::ClassifyBookmark, None, None);

        let progress_log = Arc::new(Mutex::new(Vec::new()));
        let progress_log_clone = progress_log.clone();

        let ctx = JobContext::new(job).with_progress_callback(move |percent, message| {
            progress_log_clone
                .lock()
                .unwrap()
                .push((percent, message.map(String::from)));
        });

        let result = handler.execute(ctx).await;
        assert!(matches!(result, JobResult::Success(None)));

        let log = progress_log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], (50, Some("Processing...".to_string())));
        assert_eq!(log[1], (100, Some("Done".to_string())));
    }

    #[test]
    fn test_job_result_variants() {
        use serde_json::json;

        let result1 = JobResult::Success(None);
        assert!(matches!(result1, JobResult::Success(None)));

        let result2 = JobResult::Success(Some(json!({"scraped": true})));
        assert!(matches!(result2, JobResult::Success(Some(_))));

        let result3 = JobResult::Failed("error message".to_string());
        assert!(matches!(result3, JobResult::Failed(_)));

        let result4 = JobResult::Retry("retry reason".to_string());
        assert!(matches!(result4, JobResult::Retry(_)));
    }
}
