//! Step plans for lessons.
//!
//! A plan is a pure function of lesson metadata: format, optional rule
//! introduction, and family intro variant. The lesson loop in `services`
//! drives it and persists the current step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{IntroVariant, Lesson, LessonFormat, LessonId, LessonProgress, RuleIntro};

/// Step a failed lesson restarts from.
pub const RETRY_STEP: u8 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequencerError {
    #[error("lesson {lesson} has no step {step}")]
    StepOutOfRange { lesson: LessonId, step: u8 },
}

/// Activity shown at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "variant", rename_all = "snake_case")]
pub enum StepKind {
    // series saying
    Modeled,
    RuleIntroduction(RuleIntro),
    ReadTogether,
    TypeSums,
    GuidedB,
    GuidedC,
    Quiz,
    // fact families
    FamilyIntroduction(IntroVariant),
    Introduce,
    Review,
    Turnarounds,
    TurnaroundPractice,
    TurnaroundQuiz,
    MixedReview,
}

impl StepKind {
    /// Whether the step collects answers from the learner.
    #[must_use]
    pub fn takes_answers(self) -> bool {
        !matches!(
            self,
            StepKind::Modeled
                | StepKind::RuleIntroduction(_)
                | StepKind::ReadTogether
                | StepKind::FamilyIntroduction(_)
                | StepKind::Introduce
        )
    }

    /// A single wrong answer sends the learner back to the first question.
    #[must_use]
    pub fn restarts_on_error(self) -> bool {
        matches!(self, StepKind::TypeSums)
    }

    /// Whether the step produces a percentage score.
    #[must_use]
    pub fn is_scored(self) -> bool {
        matches!(
            self,
            StepKind::Quiz | StepKind::TurnaroundQuiz | StepKind::MixedReview
        )
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            StepKind::Modeled => "Listen and watch",
            StepKind::RuleIntroduction(_) => "Learn the rule",
            StepKind::ReadTogether => "Read together",
            StepKind::TypeSums => "Type the sums",
            StepKind::GuidedB => "Say and type",
            StepKind::GuidedC => "From memory",
            StepKind::Quiz => "Quiz",
            StepKind::FamilyIntroduction(_) => "Fact families",
            StepKind::Introduce => "Meet the fact families",
            StepKind::Review => "Complete the turnaround",
            StepKind::Turnarounds => "Turnarounds",
            StepKind::TurnaroundPractice => "Turnaround practice",
            StepKind::TurnaroundQuiz => "Turnaround quiz",
            StepKind::MixedReview => "Mixed review",
        }
    }
}

/// What completing a step leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance { next: u8 },
    CompleteLesson,
}

/// Ordered steps of one lesson, numbered from `first`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    lesson_id: LessonId,
    first: u8,
    kinds: Vec<StepKind>,
}

impl StepPlan {
    #[must_use]
    pub fn for_lesson(lesson: &Lesson) -> Self {
        match lesson.format() {
            LessonFormat::SeriesSaying => {
                let mut kinds = vec![StepKind::Modeled];
                if let Some(rule) = lesson.rule_intro() {
                    kinds.push(StepKind::RuleIntroduction(rule));
                }
                kinds.extend([
                    StepKind::ReadTogether,
                    StepKind::TypeSums,
                    StepKind::GuidedB,
                    StepKind::GuidedC,
                    StepKind::Quiz,
                ]);
                Self {
                    lesson_id: lesson.id(),
                    first: 1,
                    kinds,
                }
            }
            LessonFormat::FactFamilies => {
                let (first, mut kinds) = match lesson.intro() {
                    IntroVariant::None => (1, Vec::new()),
                    variant => (0, vec![StepKind::FamilyIntroduction(variant)]),
                };
                kinds.extend([
                    StepKind::Introduce,
                    StepKind::Review,
                    StepKind::Turnarounds,
                    StepKind::TurnaroundPractice,
                    StepKind::TurnaroundQuiz,
                    StepKind::MixedReview,
                ]);
                Self {
                    lesson_id: lesson.id(),
                    first,
                    kinds,
                }
            }
        }
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn initial_step(&self) -> u8 {
        self.first
    }

    #[must_use]
    pub fn terminal_step(&self) -> u8 {
        self.first + self.last_offset()
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn contains(&self, step: u8) -> bool {
        self.kind_at(step).is_some()
    }

    #[must_use]
    pub fn kind_at(&self, step: u8) -> Option<StepKind> {
        let offset = step.checked_sub(self.first)?;
        self.kinds.get(usize::from(offset)).copied()
    }

    /// `(step, kind)` pairs in order.
    pub fn steps(&self) -> impl Iterator<Item = (u8, StepKind)> + '_ {
        (self.first..).zip(self.kinds.iter().copied())
    }

    /// # Errors
    ///
    /// Returns `SequencerError::StepOutOfRange` for steps outside the plan.
    pub fn transition(&self, step: u8) -> Result<Transition, SequencerError> {
        if !self.contains(step) {
            return Err(SequencerError::StepOutOfRange {
                lesson: self.lesson_id,
                step,
            });
        }
        if step == self.terminal_step() {
            Ok(Transition::CompleteLesson)
        } else {
            Ok(Transition::Advance { next: step + 1 })
        }
    }

    /// Step to open given persisted progress: the saved step of an unfinished
    /// lesson, otherwise the initial step.
    #[must_use]
    pub fn resume_step(&self, progress: Option<&LessonProgress>) -> u8 {
        progress
            .filter(|p| p.is_resumable() && self.contains(p.current_step))
            .map_or(self.first, |p| p.current_step)
    }

    /// Label shown in the progress header. The rule step reads "R" and the
    /// steps after it keep their unshifted numbers.
    #[must_use]
    pub fn display_label(&self, step: u8) -> Option<String> {
        let kind = self.kind_at(step)?;
        let label = match kind {
            StepKind::RuleIntroduction(_) => "R".to_string(),
            StepKind::FamilyIntroduction(_) => "Intro".to_string(),
            _ => {
                let shifted = self.rule_step().is_some_and(|rule| step > rule);
                let shown = if shifted { step - 1 } else { step };
                shown.to_string()
            }
        };
        Some(label)
    }

    fn rule_step(&self) -> Option<u8> {
        self.steps()
            .find(|(_, kind)| matches!(kind, StepKind::RuleIntroduction(_)))
            .map(|(step, _)| step)
    }

    fn last_offset(&self) -> u8 {
        u8::try_from(self.kinds.len().saturating_sub(1)).unwrap_or(u8::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::time::fixed_now;

    fn plan(id: u32) -> StepPlan {
        let catalog = Catalog::standard().unwrap();
        StepPlan::for_lesson(catalog.lesson(LessonId::new(id)).unwrap())
    }

    #[test]
    fn plus_one_lesson_has_rule_step() {
        let plan = plan(1);
        assert_eq!(plan.step_count(), 7);
        assert_eq!(
            plan.kind_at(2),
            Some(StepKind::RuleIntroduction(RuleIntro::PlusOne))
        );
        assert_eq!(plan.kind_at(7), Some(StepKind::Quiz));
        assert_eq!(plan.terminal_step(), 7);
    }

    #[test]
    fn plain_series_lesson_has_six_steps() {
        let plan = plan(5);
        assert_eq!(plan.step_count(), 6);
        assert!(
            plan.steps()
                .all(|(_, kind)| !matches!(kind, StepKind::RuleIntroduction(_)))
        );
        assert_eq!(plan.kind_at(6), Some(StepKind::Quiz));
    }

    #[test]
    fn plus_zero_lesson() {
        assert_eq!(
            plan(15).kind_at(2),
            Some(StepKind::RuleIntroduction(RuleIntro::PlusZero))
        );
    }

    #[test]
    fn early_family_lessons_start_at_intro() {
        let full = plan(2);
        assert_eq!(full.initial_step(), 0);
        assert_eq!(
            full.kind_at(0),
            Some(StepKind::FamilyIntroduction(IntroVariant::Full))
        );
        assert_eq!(
            plan(10).kind_at(0),
            Some(StepKind::FamilyIntroduction(IntroVariant::Short))
        );

        let late = plan(12);
        assert_eq!(late.initial_step(), 1);
        assert_eq!(late.kind_at(0), None);
        assert_eq!(late.step_count(), 6);
    }

    #[test]
    fn family_lesson_completes_after_mixed_review() {
        let plan = plan(4);
        assert_eq!(plan.transition(5), Ok(Transition::Advance { next: 6 }));
        assert_eq!(plan.kind_at(6), Some(StepKind::MixedReview));
        assert_eq!(plan.transition(6), Ok(Transition::CompleteLesson));
        assert!(plan.transition(7).is_err());
    }

    #[test]
    fn resume_uses_saved_step_of_unfinished_lesson() {
        let plan = plan(2);
        assert_eq!(plan.resume_step(None), 0);

        let mut progress = LessonProgress::new(LessonId::new(2), fixed_now());
        progress.current_step = 4;
        assert_eq!(plan.resume_step(Some(&progress)), 4);

        progress.current_step = 40;
        assert_eq!(plan.resume_step(Some(&progress)), 0);

        progress.current_step = 4;
        progress.completed = true;
        assert_eq!(plan.resume_step(Some(&progress)), 0);
    }

    #[test]
    fn labels_hide_rule_shift() {
        let plan = plan(1);
        assert_eq!(plan.display_label(1).as_deref(), Some("1"));
        assert_eq!(plan.display_label(2).as_deref(), Some("R"));
        assert_eq!(plan.display_label(3).as_deref(), Some("2"));
        assert_eq!(plan.display_label(7).as_deref(), Some("6"));
    }
}
