use std::env;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use tutor_core::model::{LessonId, Score};

use crate::error::GradebookError;

/// Result reported for a passed lesson or the final assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonResult {
    pub lesson_id: LessonId,
    pub score: Score,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// External gradebook. Calls are best effort; callers log and move on.
#[async_trait]
pub trait GradebookClient: Send + Sync {
    /// Report one result for `student_id`.
    ///
    /// # Errors
    ///
    /// Returns `GradebookError` when the gradebook rejects or cannot be reached.
    async fn submit_result(
        &self,
        student_id: &str,
        result: &LessonResult,
    ) -> Result<(), GradebookError>;
}

#[derive(Clone, Debug)]
pub struct GradebookConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

impl GradebookConfig {
    /// Read `TUTOR_GRADEBOOK_URL` and `TUTOR_GRADEBOOK_TOKEN`.
    ///
    /// Returns `Ok(None)` when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns `GradebookError::InvalidUrl` when the URL does not parse.
    pub fn from_env() -> Result<Option<Self>, GradebookError> {
        let Some(raw) = env::var("TUTOR_GRADEBOOK_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
        else {
            return Ok(None);
        };
        let token = env::var("TUTOR_GRADEBOOK_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::new(&raw, token).map(Some)
    }

    /// # Errors
    ///
    /// Returns `GradebookError::InvalidUrl` when `base_url` does not parse.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, GradebookError> {
        let base_url = Url::parse(base_url.trim())?;
        Ok(Self { base_url, token })
    }

    fn results_url(&self) -> Result<Url, GradebookError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/results"))?)
    }
}

/// Per-request limit of the HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Limit on one background submission, whatever the client does.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts results as JSON to `<base_url>/results`.
#[derive(Clone)]
pub struct HttpGradebookClient {
    client: Client,
    config: GradebookConfig,
}

impl HttpGradebookClient {
    /// # Errors
    ///
    /// Returns `GradebookError::Http` if the HTTP client cannot be built.
    pub fn new(config: GradebookConfig) -> Result<Self, GradebookError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl GradebookClient for HttpGradebookClient {
    async fn submit_result(
        &self,
        student_id: &str,
        result: &LessonResult,
    ) -> Result<(), GradebookError> {
        let payload = SubmitRequest {
            student_id,
            lesson_id: result.lesson_id.value(),
            score: result.score.value(),
            passed: result.passed,
            completed_at: result.completed_at,
            result_id: Uuid::new_v4(),
        };

        let mut request = self.client.post(self.config.results_url()?).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(GradebookError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

/// Hands results to the gradebook in the background.
///
/// `submit` returns at once; the lesson flow never waits on the gradebook.
/// Failures and timeouts are logged. `flush` waits for whatever is still in
/// flight, e.g. before the process exits.
#[derive(Clone)]
pub struct GradebookReporter {
    client: Option<Arc<dyn GradebookClient>>,
    timeout: Duration,
    pending: Arc<Mutex<JoinSet<bool>>>,
}

impl fmt::Debug for GradebookReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradebookReporter")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for GradebookReporter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GradebookReporter {
    #[must_use]
    pub fn new(client: Option<Arc<dyn GradebookClient>>) -> Self {
        Self {
            client,
            timeout: SUBMIT_TIMEOUT,
            pending: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Queue one submission. Returns `false` when nothing was queued: no
    /// client is configured or there is no runtime to run it on.
    pub fn submit(&self, student_id: &str, result: LessonResult) -> bool {
        let Some(client) = self.client.clone() else {
            return false;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!(lesson = %result.lesson_id, "no async runtime, gradebook submission skipped");
            return false;
        };

        let student_id = student_id.to_owned();
        let limit = self.timeout;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}
        pending.spawn_on(
            async move { deliver(client.as_ref(), &student_id, &result, limit).await },
            &handle,
        );
        true
    }

    /// Wait up to `limit` for queued submissions and return how many were
    /// accepted. Anything still running at the deadline is aborted.
    pub async fn flush(&self, limit: Duration) -> usize {
        let mut pending =
            std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        let mut accepted = 0;
        let drained = tokio::time::timeout(limit, async {
            while let Some(joined) = pending.join_next().await {
                if matches!(joined, Ok(true)) {
                    accepted += 1;
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(abandoned = pending.len(), "gradebook flush timed out");
        }
        accepted
    }
}

async fn deliver(
    client: &dyn GradebookClient,
    student_id: &str,
    result: &LessonResult,
    limit: Duration,
) -> bool {
    let outcome = match tokio::time::timeout(limit, client.submit_result(student_id, result)).await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(GradebookError::Unavailable(format!(
            "no response within {limit:?}"
        ))),
    };
    match outcome {
        Ok(()) => {
            debug!(lesson = %result.lesson_id, "gradebook submission accepted");
            true
        }
        Err(err) => {
            warn!(error = %err, lesson = %result.lesson_id, "gradebook submission failed");
            false
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    student_id: &'a str,
    lesson_id: u32,
    score: u8,
    passed: bool,
    completed_at: DateTime<Utc>,
    result_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::time::fixed_now;

    #[test]
    fn results_url_joins_path() {
        let config = GradebookConfig::new("https://grades.example.test/api/", None).unwrap();
        assert_eq!(
            config.results_url().unwrap().as_str(),
            "https://grades.example.test/api/results"
        );
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            GradebookConfig::new("not a url", None),
            Err(GradebookError::InvalidUrl(_))
        ));
    }

    struct Stalled;

    #[async_trait]
    impl GradebookClient for Stalled {
        async fn submit_result(
            &self,
            _student_id: &str,
            _result: &LessonResult,
        ) -> Result<(), GradebookError> {
            std::future::pending().await
        }
    }

    fn result() -> LessonResult {
        LessonResult {
            lesson_id: LessonId::new(3),
            score: Score::try_from(90).unwrap(),
            passed: true,
            completed_at: fixed_now(),
        }
    }

    #[test]
    fn disabled_reporter_queues_nothing() {
        let reporter = GradebookReporter::default();
        assert!(!reporter.is_enabled());
        assert!(!reporter.submit("s-1", result()));
    }

    #[tokio::test]
    async fn stalled_submission_times_out() {
        let reporter = GradebookReporter::new(Some(Arc::new(Stalled)))
            .with_timeout(Duration::from_millis(20));
        assert!(reporter.submit("s-1", result()));
        assert_eq!(reporter.flush(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn flush_gives_up_at_its_deadline() {
        let reporter = GradebookReporter::new(Some(Arc::new(Stalled)));
        assert!(reporter.submit("s-1", result()));
        let flushed = tokio::time::timeout(
            Duration::from_secs(2),
            reporter.flush(Duration::from_millis(20)),
        )
        .await;
        assert_eq!(flushed.ok(), Some(0));
    }

    #[test]
    fn payload_uses_camel_case() {
        let payload = SubmitRequest {
            student_id: "s-1",
            lesson_id: 999,
            score: 88,
            passed: true,
            completed_at: fixed_now(),
            result_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["studentId"], "s-1");
        assert_eq!(json["lessonId"], 999);
        assert_eq!(json["passed"], true);
        assert!(json.get("completedAt").is_some());
        assert!(json.get("resultId").is_some());
    }
}
