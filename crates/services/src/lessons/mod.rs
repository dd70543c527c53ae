//! Lesson loop: presenting steps, collecting answers, and moving progress on.

mod overview;
mod service;
mod step;

pub use overview::{LessonOverview, LessonStatus, LessonSummary};
pub use service::{LessonLoopService, StepTransition};
pub use step::{Activity, LessonRun, StepSession, StepTicket};
