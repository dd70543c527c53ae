use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use tracing::{debug, info};

use storage::repository::ProgressRepository;
use tutor_core::evaluator::RawAnswer;
use tutor_core::model::{LessonId, LessonProgressPatch, Score};
use tutor_core::sequencer::{RETRY_STEP, SequencerError, StepPlan, Transition};
use tutor_core::{Catalog, Clock};

use super::overview::{LessonOverview, LessonStatus};
use super::step::{Activity, LessonRun, StepSession};
use crate::error::LessonServiceError;
use crate::gradebook::{GradebookReporter, LessonResult};
use crate::questions::QuestionGenerator;
use crate::rng::RandomSource;
use crate::run::{QuestionRun, RestartPolicy, SubmitOutcome};

/// What completing a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Advanced { next: u8 },
    LessonCompleted {
        score: Score,
        passed: bool,
        /// A submission was queued with the gradebook reporter.
        gradebook_queued: bool,
    },
    /// The session was stale (an earlier presentation or an already
    /// completed step); nothing changed.
    Superseded,
}

/// Drives lessons step by step and keeps progress persisted.
#[derive(Clone)]
pub struct LessonLoopService {
    clock: Clock,
    catalog: Arc<Catalog>,
    progress: Arc<dyn ProgressRepository>,
    gradebook: GradebookReporter,
    student_id: String,
    rng: Arc<Mutex<StdRng>>,
}

impl fmt::Debug for LessonLoopService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonLoopService")
            .field("clock", &self.clock)
            .field("lessons", &self.catalog.len())
            .field("gradebook", &self.gradebook.is_enabled())
            .field("student_id", &self.student_id)
            .finish_non_exhaustive()
    }
}

impl LessonLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<Catalog>,
        progress: Arc<dyn ProgressRepository>,
        student_id: impl Into<String>,
    ) -> Self {
        Self {
            clock,
            catalog,
            progress,
            gradebook: GradebookReporter::default(),
            student_id: student_id.into(),
            rng: Arc::new(Mutex::new(RandomSource::Entropy.rng())),
        }
    }

    #[must_use]
    pub fn with_gradebook(mut self, gradebook: GradebookReporter) -> Self {
        self.gradebook = gradebook;
        self
    }

    #[must_use]
    pub fn with_random_source(mut self, source: RandomSource) -> Self {
        self.rng = Arc::new(Mutex::new(source.rng()));
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Open a lesson, resuming an unfinished one at its saved step.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Catalog` for unknown lesson ids, or storage
    /// errors while reading or creating the progress record.
    pub async fn open_lesson(&self, id: LessonId) -> Result<LessonRun, LessonServiceError> {
        let lesson = self.catalog.lesson(id)?.clone();
        let plan = StepPlan::for_lesson(&lesson);
        let saved = self.progress.lesson_progress(id).await?;
        let step = plan.resume_step(saved.as_ref());

        if saved.as_ref().is_none_or(|p| p.current_step != step) {
            self.progress
                .update_lesson_progress(id, &LessonProgressPatch::step(step), self.clock.now())
                .await?;
        }
        debug!(lesson = %id, step, resumed = saved.is_some(), "lesson opened");

        Ok(LessonRun::new(lesson, plan, step))
    }

    /// Build the current step and make it the only one that can complete.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::LessonCompleted` once the lesson is done, or
    /// a sequencer error when the run points outside the plan.
    pub fn present_step(&self, run: &mut LessonRun) -> Result<StepSession, LessonServiceError> {
        if run.is_finished() {
            return Err(LessonServiceError::LessonCompleted);
        }
        let step = run.current_step();
        let kind = run
            .plan()
            .kind_at(step)
            .ok_or(SequencerError::StepOutOfRange {
                lesson: run.lesson().id(),
                step,
            })?;

        let questions = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            QuestionGenerator::new(&self.catalog).for_step(run.lesson(), kind, &mut *rng)
        };
        let policy = if kind.restarts_on_error() {
            RestartPolicy::RestartOnError
        } else {
            RestartPolicy::Continue
        };

        Ok(StepSession {
            ticket: run.issue_ticket(),
            lesson_id: run.lesson().id(),
            step,
            kind,
            label: run.plan().display_label(step).unwrap_or_default(),
            activity: Activity::for_step(run.lesson(), kind),
            run: QuestionRun::new(questions, policy, self.clock.now()),
        })
    }

    /// Evaluate an answer and add it to the fact's progress.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if the fact update fails.
    pub async fn submit_answer(
        &self,
        session: &mut StepSession,
        raw: &RawAnswer,
    ) -> Result<SubmitOutcome, LessonServiceError> {
        let now = self.clock.now();
        let outcome = session.run.submit(raw, now);
        if let SubmitOutcome::Answered { record, restarted } = &outcome {
            self.progress
                .update_fact_progress(record.lesson_id, &record.fact_id, record.delta(), now)
                .await?;
            if *restarted {
                debug!(lesson = %session.lesson_id, step = session.step, "step restarted after a miss");
            }
        }
        Ok(outcome)
    }

    /// Finish the presented step and move the lesson on.
    ///
    /// Stale sessions return `StepTransition::Superseded`. Completing the
    /// terminal step scores it, records completion, and queues a pass for the
    /// gradebook without waiting on it.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::StepNotFinished` while questions remain, or
    /// storage and scoring errors.
    pub async fn complete_step(
        &self,
        run: &mut LessonRun,
        session: &StepSession,
    ) -> Result<StepTransition, LessonServiceError> {
        if !run.accepts(session) {
            debug!(
                lesson = %session.lesson_id,
                step = session.step,
                current = run.current_step(),
                "ignoring superseded step completion"
            );
            return Ok(StepTransition::Superseded);
        }
        if !session.is_finished() {
            return Err(LessonServiceError::StepNotFinished);
        }

        let id = run.lesson().id();
        let now = self.clock.now();
        let transition = run.plan().transition(session.step)?;
        match transition {
            Transition::Advance { next } => {
                self.progress
                    .update_lesson_progress(id, &LessonProgressPatch::step(next), now)
                    .await?;
                run.move_to(next);
                debug!(lesson = %id, next, "step advanced");
                Ok(StepTransition::Advanced { next })
            }
            Transition::CompleteLesson => {
                let score = session.run.score()?;
                let passed = score.passed();
                self.progress.complete_lesson(id, score, passed, now).await?;
                run.finish(passed);
                info!(lesson = %id, %score, passed, "lesson completed");

                let gradebook_queued = passed
                    && self.gradebook.submit(
                        &self.student_id,
                        LessonResult {
                            lesson_id: id,
                            score,
                            passed,
                            completed_at: now,
                        },
                    );
                Ok(StepTransition::LessonCompleted {
                    score,
                    passed,
                    gradebook_queued,
                })
            }
        }
    }

    /// Start a failed lesson over from step 1. Fact progress is kept.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::RetryUnavailable` unless the run ended in
    /// a fail, or storage errors.
    pub async fn retry(&self, run: &mut LessonRun) -> Result<(), LessonServiceError> {
        if run.outcome() != Some(false) {
            return Err(LessonServiceError::RetryUnavailable);
        }
        self.progress
            .update_lesson_progress(
                run.lesson().id(),
                &LessonProgressPatch::restart_at(RETRY_STEP),
                self.clock.now(),
            )
            .await?;
        run.restart(RETRY_STEP);
        debug!(lesson = %run.lesson().id(), "lesson retry");
        Ok(())
    }

    /// Every catalog lesson with its persisted status.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if progress cannot be read.
    pub async fn lesson_overview(&self) -> Result<LessonOverview, LessonServiceError> {
        let progress = self.progress.user_progress().await?;
        let lessons = self
            .catalog
            .lessons()
            .iter()
            .map(|lesson| {
                let plan = StepPlan::for_lesson(lesson);
                LessonStatus::from_progress(&plan, progress.lesson(lesson.id()))
                    .into_summary(lesson)
            })
            .collect();
        Ok(LessonOverview::new(lessons))
    }
}
