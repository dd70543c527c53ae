//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::catalog::CatalogError;
use tutor_core::model::ScoreError;
use tutor_core::sequencer::SequencerError;

/// Errors emitted by `GradebookClient` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradebookError {
    #[error("invalid gradebook url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("gradebook request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("gradebook unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `LessonLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("step still has unanswered questions")]
    StepNotFinished,
    #[error("lesson is not finished with a failing score")]
    RetryUnavailable,
    #[error("lesson is already completed")]
    LessonCompleted,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AssessmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("assessment needs every lesson passed ({passed} of {total} so far)")]
    NotEligible { passed: usize, total: usize },
    #[error("assessment still has unanswered questions")]
    NotFinished,
    #[error("assessment attempt was already scored")]
    AlreadyScored,
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Gradebook(#[from] GradebookError),
}
