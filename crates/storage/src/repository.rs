use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{
    FactId, FactProgressDelta, LessonId, LessonProgress, LessonProgressPatch, Score, SyncFact,
    UserProgress,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable progress of a single learner.
///
/// Implementations are scoped to one learner context; every call reads or
/// writes that learner's records only.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch a lesson record, `None` before the first visit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read.
    async fn lesson_progress(&self, id: LessonId) -> Result<Option<LessonProgress>, StorageError>;

    /// Apply a partial update, creating the default record on first touch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn update_lesson_progress(
        &self,
        id: LessonId,
        patch: &LessonProgressPatch,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError>;

    /// Add `delta` to the fact's counters within the lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counters cannot be written.
    async fn update_fact_progress(
        &self,
        id: LessonId,
        fact_id: &FactId,
        delta: FactProgressDelta,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Mark the lesson completed with its final score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn complete_lesson(
        &self,
        id: LessonId,
        score: Score,
        passed: bool,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError>;

    /// Ids of lessons that are both completed and passed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn completed_lessons(&self) -> Result<Vec<LessonId>, StorageError>;

    /// Fact counters of passed lessons, keyed by fact.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn export_facts_for_sync(&self) -> Result<BTreeMap<FactId, SyncFact>, StorageError>;

    /// Every lesson record of the learner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn user_progress(&self) -> Result<UserProgress, StorageError>;
}

/// In-memory progress for tests and throwaway sessions.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<UserProgress>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_progress<T>(
        &self,
        f: impl FnOnce(&mut UserProgress) -> T,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn lesson_progress(&self, id: LessonId) -> Result<Option<LessonProgress>, StorageError> {
        self.with_progress(|p| p.lesson(id).cloned())
    }

    async fn update_lesson_progress(
        &self,
        id: LessonId,
        patch: &LessonProgressPatch,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        self.with_progress(|p| p.update_lesson(id, patch, now).clone())
    }

    async fn update_fact_progress(
        &self,
        id: LessonId,
        fact_id: &FactId,
        delta: FactProgressDelta,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_progress(|p| p.record_fact(id, fact_id.clone(), delta, now))
    }

    async fn complete_lesson(
        &self,
        id: LessonId,
        score: Score,
        passed: bool,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        self.with_progress(|p| {
            p.complete_lesson(id, score, passed, now);
            p.lesson_or_insert(id, now).clone()
        })
    }

    async fn completed_lessons(&self) -> Result<Vec<LessonId>, StorageError> {
        self.with_progress(|p| p.completed_lessons())
    }

    async fn export_facts_for_sync(&self) -> Result<BTreeMap<FactId, SyncFact>, StorageError> {
        self.with_progress(|p| p.facts_for_sync())
    }

    async fn user_progress(&self) -> Result<UserProgress, StorageError> {
        self.with_progress(|p| p.clone())
    }
}

/// Progress backend behind a trait object for easy swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
