#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment_service;
pub mod error;
pub mod gradebook;
pub mod lessons;
pub mod questions;
pub mod rng;
pub mod run;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use assessment_service::{AssessmentOutcome, AssessmentService, AssessmentSession};
pub use error::{AppServicesError, AssessmentError, GradebookError, LessonServiceError};
pub use gradebook::{
    GradebookClient, GradebookConfig, GradebookReporter, HttpGradebookClient, LessonResult,
};
pub use lessons::{
    Activity, LessonLoopService, LessonOverview, LessonRun, LessonStatus, LessonSummary,
    StepSession, StepTicket, StepTransition,
};
pub use questions::QuestionGenerator;
pub use rng::RandomSource;
pub use run::{AnswerRecord, QuestionRun, RestartPolicy, SubmitOutcome};
