use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use tutor_core::Catalog;
use tutor_core::model::{Fact, FactId, Lesson, LessonFormat, ReviewQuestion};

use super::weighting::{select_excluding, select_unique_random, weighted_pool};
use super::{MIXED_REVIEW_MAX, MIXED_REVIEW_MIN, MIXED_REVIEW_WEIGHT, PREVIOUS_PER_LESSON};

/// Blend of current-lesson and earlier-lesson questions, in random order.
///
/// About half the questions come from earlier lessons. When there are not
/// enough earlier questions the current lesson makes up the difference.
/// Fact ids are never repeated while unused ones remain.
pub fn mixed_review<R: Rng + ?Sized>(
    catalog: &Catalog,
    lesson: &Lesson,
    rng: &mut R,
) -> Vec<ReviewQuestion> {
    let target = rng.random_range(MIXED_REVIEW_MIN..=MIXED_REVIEW_MAX);
    let current_wanted = target.div_ceil(2);
    let previous_wanted = target - current_wanted;

    let mut used: HashSet<FactId> = HashSet::new();
    let current_pool = weighted_pool(lesson.facts(), MIXED_REVIEW_WEIGHT);
    let mut current_facts = select_excluding(&current_pool, current_wanted, &mut used, rng);

    let mut candidates = previous_pool(catalog, lesson, rng);
    candidates.shuffle(rng);
    let mut previous = Vec::with_capacity(previous_wanted);
    for question in candidates {
        if previous.len() >= previous_wanted {
            break;
        }
        if used.insert(question.fact.id().clone()) {
            previous.push(question);
        }
    }

    let shortfall = previous_wanted - previous.len();
    if shortfall > 0 {
        current_facts.extend(select_excluding(&current_pool, shortfall, &mut used, rng));
    }

    let mut questions = current_questions(lesson, current_facts);
    questions.extend(previous);
    questions.shuffle(rng);
    questions
}

/// Current-lesson half. Family lessons alternate: even positions ask for the
/// turnaround, odd positions for the sum.
fn current_questions(lesson: &Lesson, facts: Vec<Fact>) -> Vec<ReviewQuestion> {
    facts
        .into_iter()
        .enumerate()
        .map(|(idx, fact)| {
            let turnaround = match lesson.format() {
                LessonFormat::FactFamilies if idx % 2 == 0 => {
                    lesson.turnaround_of(fact.id()).cloned()
                }
                _ => None,
            };
            match turnaround {
                Some(turnaround) => ReviewQuestion::turnaround(fact, turnaround, lesson.id(), true),
                None => ReviewQuestion::sum(fact, lesson.id(), true),
            }
        })
        .collect()
}

/// Candidates from earlier lessons, at most two per lesson.
///
/// Family lessons look back at earlier family lessons and ask turnarounds;
/// series lessons look back at lessons of the other format and ask sums.
fn previous_pool<R: Rng + ?Sized>(
    catalog: &Catalog,
    lesson: &Lesson,
    rng: &mut R,
) -> Vec<ReviewQuestion> {
    let wanted_format = match lesson.format() {
        LessonFormat::FactFamilies => LessonFormat::FactFamilies,
        series @ LessonFormat::SeriesSaying => series.opposite(),
    };
    let mut out = Vec::new();
    for earlier in catalog
        .lessons_before(lesson.id())
        .filter(|earlier| earlier.format() == wanted_format)
    {
        let pool = weighted_pool(earlier.facts(), MIXED_REVIEW_WEIGHT);
        for fact in select_unique_random(&pool, PREVIOUS_PER_LESSON, rng) {
            let question = match lesson.format() {
                LessonFormat::FactFamilies => match earlier.turnaround_of(fact.id()) {
                    Some(turnaround) => {
                        ReviewQuestion::turnaround(fact, turnaround.clone(), earlier.id(), false)
                    }
                    None => continue,
                },
                LessonFormat::SeriesSaying => ReviewQuestion::sum(fact, earlier.id(), false),
            };
            out.push(question);
        }
    }
    out
}
