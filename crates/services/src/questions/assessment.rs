use rand::Rng;

use tutor_core::Catalog;
use tutor_core::model::{LessonFormat, ReviewQuestion};

use super::GENERAL_REVIEW_WEIGHT;
use super::weighting::draw_weighted;

/// One question per lesson, in lesson order.
///
/// Series lessons ask a weighted-random fact as a sum. Family lessons pick a
/// weighted-random base fact and ask for both operands of its catalog
/// turnaround.
pub fn comprehensive_assessment<R: Rng + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<ReviewQuestion> {
    catalog
        .lessons()
        .iter()
        .filter_map(|lesson| {
            let fact = draw_weighted(lesson.facts(), GENERAL_REVIEW_WEIGHT, rng)?;
            match lesson.format() {
                LessonFormat::SeriesSaying => Some(ReviewQuestion::sum(fact, lesson.id(), false)),
                LessonFormat::FactFamilies => {
                    let turnaround = lesson.turnaround_of(fact.id())?.clone();
                    Some(ReviewQuestion::turnaround(fact, turnaround, lesson.id(), false))
                }
            }
        })
        .collect()
}
