//! Question generation for lesson steps, mixed reviews and the final
//! assessment.

mod assessment;
mod drill;
mod mixed_review;
pub mod weighting;

use rand::Rng;

use tutor_core::Catalog;
use tutor_core::model::{Lesson, ReviewQuestion};
use tutor_core::sequencer::StepKind;

pub use drill::PairDrill;

/// Copies of a high-operand fact in general review pools.
pub const GENERAL_REVIEW_WEIGHT: usize = 3;
/// Copies of a high-operand fact in mixed review pools.
pub const MIXED_REVIEW_WEIGHT: usize = 5;
pub const MIXED_REVIEW_MIN: usize = 6;
pub const MIXED_REVIEW_MAX: usize = 10;
/// Earlier lessons contribute at most this many questions each.
pub const PREVIOUS_PER_LESSON: usize = 2;

/// Builds question lists from the catalog.
#[derive(Debug, Clone, Copy)]
pub struct QuestionGenerator<'a> {
    catalog: &'a Catalog,
}

impl<'a> QuestionGenerator<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Questions for one lesson step. Steps without answers get none.
    pub fn for_step<R: Rng + ?Sized>(
        &self,
        lesson: &Lesson,
        kind: StepKind,
        rng: &mut R,
    ) -> Vec<ReviewQuestion> {
        match kind {
            StepKind::Modeled
            | StepKind::RuleIntroduction(_)
            | StepKind::ReadTogether
            | StepKind::FamilyIntroduction(_)
            | StepKind::Introduce => Vec::new(),
            StepKind::TypeSums | StepKind::GuidedB | StepKind::GuidedC => {
                drill::facts_in_order(lesson)
            }
            StepKind::Quiz => drill::quiz_in_order(lesson),
            StepKind::Review => drill::pairs_in_order(lesson, PairDrill::Complete),
            StepKind::Turnarounds | StepKind::TurnaroundQuiz => {
                drill::pairs_in_order(lesson, PairDrill::Operands)
            }
            StepKind::TurnaroundPractice => {
                drill::pairs_in_order(lesson, PairDrill::OperandsThenSum)
            }
            StepKind::MixedReview => self.mixed_review(lesson, rng),
        }
    }

    pub fn mixed_review<R: Rng + ?Sized>(&self, lesson: &Lesson, rng: &mut R) -> Vec<ReviewQuestion> {
        mixed_review::mixed_review(self.catalog, lesson, rng)
    }

    pub fn comprehensive_assessment<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ReviewQuestion> {
        assessment::comprehensive_assessment(self.catalog, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomSource;
    use std::collections::HashSet;
    use tutor_core::model::{Ask, Fact, LessonFormat, LessonId};

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn assessment_has_one_question_per_lesson() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        for seed in 0..20 {
            let mut rng = RandomSource::Seeded(seed).rng();
            let questions = generator.comprehensive_assessment(&mut rng);
            assert_eq!(questions.len(), 26);

            let direct: Vec<_> = questions.iter().filter(|q| !q.ask_as_turnaround()).collect();
            let turned: Vec<_> = questions.iter().filter(|q| q.ask_as_turnaround()).collect();
            assert_eq!(direct.len(), 13);
            assert_eq!(turned.len(), 13);
            assert!(direct.iter().all(|q| q.source_lesson_id.value() % 2 == 1));
            assert!(turned.iter().all(|q| q.source_lesson_id.value() % 2 == 0));

            let ids: Vec<u32> = questions.iter().map(|q| q.source_lesson_id.value()).collect();
            assert_eq!(ids, (1..=26).collect::<Vec<_>>());
        }
    }

    #[test]
    fn assessment_turnarounds_come_from_catalog_pairs() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let mut rng = RandomSource::Seeded(5).rng();
        for q in generator.comprehensive_assessment(&mut rng) {
            let Ask::Turnaround { turnaround, then_sum } = &q.ask else {
                continue;
            };
            assert!(!then_sum);
            let lesson = catalog.lesson(q.source_lesson_id).unwrap();
            assert_eq!(lesson.turnaround_of(q.fact.id()), Some(turnaround));
            assert_eq!(turnaround.result(), q.fact.result());
        }
    }

    #[test]
    fn mixed_review_size_and_split() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(12)).unwrap();
        for seed in 0..40 {
            let mut rng = RandomSource::Seeded(seed).rng();
            let questions = generator.mixed_review(lesson, &mut rng);
            assert!((MIXED_REVIEW_MIN..=MIXED_REVIEW_MAX).contains(&questions.len()));

            let current: Vec<_> = questions.iter().filter(|q| q.is_from_current_lesson).collect();
            assert!(current.len() >= questions.len().div_ceil(2));
            assert!(current.iter().all(|q| q.source_lesson_id == lesson.id()));

            let current_turnarounds = current.iter().filter(|q| q.ask_as_turnaround()).count();
            assert!(current_turnarounds >= current.len() / 2);

            for q in questions.iter().filter(|q| !q.is_from_current_lesson) {
                let source = catalog.lesson(q.source_lesson_id).unwrap();
                assert!(source.id() < lesson.id());
                assert_eq!(source.format(), LessonFormat::FactFamilies);
                assert!(q.ask_as_turnaround());
            }
        }
    }

    #[test]
    fn mixed_review_caps_each_earlier_lesson_at_two() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(26)).unwrap();
        for seed in 0..40 {
            let mut rng = RandomSource::Seeded(seed).rng();
            let questions = generator.mixed_review(lesson, &mut rng);
            for earlier in catalog.lessons_before(lesson.id()) {
                let from = questions
                    .iter()
                    .filter(|q| !q.is_from_current_lesson && q.source_lesson_id == earlier.id())
                    .count();
                assert!(from <= PREVIOUS_PER_LESSON);
            }
        }
    }

    #[test]
    fn mixed_review_does_not_repeat_facts_across_halves() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        for id in [12, 13, 26] {
            let lesson = catalog.lesson(LessonId::new(id)).unwrap();
            for seed in 0..500 {
                let mut rng = RandomSource::Seeded(seed).rng();
                let questions = generator.mixed_review(lesson, &mut rng);
                let current = questions.iter().filter(|q| q.is_from_current_lesson).count();
                if current > lesson.facts().len() {
                    continue;
                }
                let distinct: HashSet<_> = questions.iter().map(|q| q.fact.id().clone()).collect();
                assert_eq!(
                    distinct.len(),
                    questions.len(),
                    "lesson {id} seed {seed} repeated a fact"
                );
            }
        }
    }

    #[test]
    fn series_mixed_review_looks_back_at_other_format() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(13)).unwrap();
        let mut rng = RandomSource::Seeded(9).rng();
        let questions = generator.mixed_review(lesson, &mut rng);
        for q in &questions {
            assert!(!q.ask_as_turnaround());
            if !q.is_from_current_lesson {
                let source = catalog.lesson(q.source_lesson_id).unwrap();
                assert_eq!(source.format(), LessonFormat::FactFamilies);
            }
        }
    }

    #[test]
    fn first_lesson_review_uses_only_current_facts() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(2)).unwrap();
        let mut rng = RandomSource::Seeded(17).rng();
        let questions = generator.mixed_review(lesson, &mut rng);
        assert!(questions.iter().all(|q| q.is_from_current_lesson));
        let distinct: HashSet<_> = questions.iter().map(|q| q.fact.id().clone()).collect();
        assert_eq!(distinct.len(), lesson.facts().len().min(questions.len()));
    }

    #[test]
    fn turnaround_practice_keeps_catalog_order() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(2)).unwrap();
        let mut rng = RandomSource::Seeded(1).rng();
        let questions = generator.for_step(lesson, StepKind::TurnaroundPractice, &mut rng);
        let bases: Vec<_> = questions.iter().map(|q| q.fact.id().to_string()).collect();
        assert_eq!(bases, vec!["1+2", "1+3", "1+4", "1+5"]);
        assert_eq!(
            questions[0].ask,
            Ask::Turnaround {
                turnaround: Fact::new(2, 1).unwrap(),
                then_sum: true
            }
        );
    }

    #[test]
    fn quiz_follows_quiz_order_and_intro_steps_are_empty() {
        let catalog = catalog();
        let generator = QuestionGenerator::new(&catalog);
        let lesson = catalog.lesson(LessonId::new(1)).unwrap();
        let mut rng = RandomSource::Seeded(1).rng();
        let quiz: Vec<_> = generator
            .for_step(lesson, StepKind::Quiz, &mut rng)
            .iter()
            .map(|q| q.fact.id().to_string())
            .collect();
        assert_eq!(quiz, vec!["3+1", "5+1", "2+1", "4+1"]);
        assert!(generator.for_step(lesson, StepKind::Modeled, &mut rng).is_empty());
    }
}
