use tutor_core::model::{LessonFormat, LessonId, LessonProgress, Score};
use tutor_core::sequencer::StepPlan;

use tutor_core::model::Lesson;

/// Where a learner stands on one lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonStatus {
    NotStarted,
    InProgress { step: u8, label: String },
    Passed { score: Option<Score> },
    Failed { score: Option<Score> },
}

impl LessonStatus {
    #[must_use]
    pub fn from_progress(plan: &StepPlan, progress: Option<&LessonProgress>) -> Self {
        match progress {
            None => LessonStatus::NotStarted,
            Some(p) if p.completed && p.passed => LessonStatus::Passed {
                score: p.quiz_score,
            },
            Some(p) if p.completed => LessonStatus::Failed {
                score: p.quiz_score,
            },
            Some(p) => {
                let step = plan.resume_step(Some(p));
                LessonStatus::InProgress {
                    step,
                    label: plan.display_label(step).unwrap_or_default(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, LessonStatus::Passed { .. })
    }

    pub(crate) fn into_summary(self, lesson: &Lesson) -> LessonSummary {
        LessonSummary {
            lesson_id: lesson.id(),
            set: lesson.set(),
            format: lesson.format(),
            status: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSummary {
    pub lesson_id: LessonId,
    pub set: char,
    pub format: LessonFormat,
    pub status: LessonStatus,
}

/// Lesson menu contents.
///
/// Lessons are offered two at a time: the pair that starts after the passed
/// lessons, rounded down to an even count. Other lessons stay openable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonOverview {
    lessons: Vec<LessonSummary>,
}

impl LessonOverview {
    pub(crate) fn new(lessons: Vec<LessonSummary>) -> Self {
        Self { lessons }
    }

    #[must_use]
    pub fn lessons(&self) -> &[LessonSummary] {
        &self.lessons
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.lessons.iter().filter(|l| l.status.is_passed()).count()
    }

    /// Ids of the lesson pair currently on offer. Empty once the whole
    /// catalog is passed.
    #[must_use]
    pub fn current_pair(&self) -> Vec<LessonId> {
        let start = (self.passed_count() / 2) * 2 + 1;
        self.lessons
            .iter()
            .map(|l| l.lesson_id)
            .filter(|id| (start..start + 2).contains(&(id.value() as usize)))
            .collect()
    }

    #[must_use]
    pub fn is_offered(&self, id: LessonId) -> bool {
        self.current_pair().contains(&id)
    }

    /// The comprehensive assessment opens once every lesson is passed.
    #[must_use]
    pub fn assessment_ready(&self) -> bool {
        !self.lessons.is_empty() && self.passed_count() == self.lessons.len()
    }
}
