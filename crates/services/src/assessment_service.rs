use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use tracing::{debug, info};

use storage::repository::ProgressRepository;
use tutor_core::catalog::ASSESSMENT_RESULT_ID;
use tutor_core::evaluator::RawAnswer;
use tutor_core::model::{LessonId, Score};
use tutor_core::{Catalog, Clock};

use crate::error::AssessmentError;
use crate::gradebook::{GradebookReporter, LessonResult};
use crate::questions::QuestionGenerator;
use crate::rng::RandomSource;
use crate::run::{QuestionRun, RestartPolicy, SubmitOutcome};

/// A comprehensive assessment in progress: one question per lesson.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    run: QuestionRun,
    scored: bool,
}

impl AssessmentSession {
    #[must_use]
    pub fn run(&self) -> &QuestionRun {
        &self.run
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.run.is_finished()
    }

    /// Whether `AssessmentService::finish` already scored this attempt.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.scored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentOutcome {
    pub score: Score,
    pub passed: bool,
    pub gradebook_queued: bool,
}

/// Runs the final assessment once every lesson is passed.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    catalog: Arc<Catalog>,
    progress: Arc<dyn ProgressRepository>,
    gradebook: GradebookReporter,
    student_id: String,
    rng: Arc<Mutex<StdRng>>,
}

impl AssessmentService {
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

    /// Number of catalog lessons passed so far, and the catalog size.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Storage` if progress cannot be read.
    pub async fn eligibility(&self) -> Result<(usize, usize), AssessmentError> {
        let passed: Vec<LessonId> = self.progress.completed_lessons().await?;
        let count = self
            .catalog
            .lessons()
            .iter()
            .filter(|lesson| passed.contains(&lesson.id()))
            .count();
        Ok((count, self.catalog.len()))
    }

    /// Generate the assessment.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotEligible` until every lesson is passed.
    pub async fn start(&self) -> Result<AssessmentSession, AssessmentError> {
        let (passed, total) = self.eligibility().await?;
        if passed < total || total == 0 {
            return Err(AssessmentError::NotEligible { passed, total });
        }

        let questions = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            QuestionGenerator::new(&self.catalog).comprehensive_assessment(&mut *rng)
        };
        debug!(questions = questions.len(), "assessment started");
        Ok(AssessmentSession {
            run: QuestionRun::new(questions, RestartPolicy::Continue, self.clock.now()),
            scored: false,
        })
    }

    /// Evaluate an answer and add it to the source lesson's fact progress.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Storage` if the fact update fails.
    pub async fn submit_answer(
        &self,
        session: &mut AssessmentSession,
        raw: &RawAnswer,
    ) -> Result<SubmitOutcome, AssessmentError> {
        let now = self.clock.now();
        let outcome = session.run.submit(raw, now);
        if let SubmitOutcome::Answered { record, .. } = &outcome {
            self.progress
                .update_fact_progress(record.lesson_id, &record.fact_id, record.delta(), now)
                .await?;
        }
        Ok(outcome)
    }

    /// Score the assessment and queue it for the gradebook. Each session is
    /// scored once.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotFinished` while questions remain and
    /// `AssessmentError::AlreadyScored` on a second call.
    pub fn finish(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<AssessmentOutcome, AssessmentError> {
        if session.scored {
            return Err(AssessmentError::AlreadyScored);
        }
        if !session.is_finished() {
            return Err(AssessmentError::NotFinished);
        }
        let score = session.run.score()?;
        let passed = score.passed();
        session.scored = true;
        info!(%score, passed, "assessment finished");

        let result = LessonResult {
            lesson_id: LessonId::new(ASSESSMENT_RESULT_ID),
            score,
            passed,
            completed_at: self.clock.now(),
        };
        let gradebook_queued = self.gradebook.submit(&self.student_id, result);

        Ok(AssessmentOutcome {
            score,
            passed,
            gradebook_queued,
        })
    }
}
