use tutor_core::model::{Ask, Lesson, ReviewQuestion};

/// Lesson facts in catalog order, asked as sums.
pub fn facts_in_order(lesson: &Lesson) -> Vec<ReviewQuestion> {
    lesson
        .facts()
        .iter()
        .map(|fact| ReviewQuestion::sum(fact.clone(), lesson.id(), true))
        .collect()
}

/// The lesson's deliberate quiz order, asked as sums.
pub fn quiz_in_order(lesson: &Lesson) -> Vec<ReviewQuestion> {
    lesson
        .quiz_facts()
        .into_iter()
        .map(|fact| ReviewQuestion::sum(fact, lesson.id(), true))
        .collect()
}

/// How a turnaround drill asks for the swapped fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairDrill {
    /// Only the second operand.
    Complete,
    /// Both operands.
    Operands,
    /// Both operands, then the sum.
    OperandsThenSum,
}

/// One question per commutative pair, in catalog order (never shuffled).
pub fn pairs_in_order(lesson: &Lesson, drill: PairDrill) -> Vec<ReviewQuestion> {
    lesson
        .commutative_pairs()
        .iter()
        .map(|pair| {
            let turnaround = pair.turnaround().clone();
            let ask = match drill {
                PairDrill::Complete => Ask::CompleteTurnaround { turnaround },
                PairDrill::Operands => Ask::Turnaround {
                    turnaround,
                    then_sum: false,
                },
                PairDrill::OperandsThenSum => Ask::Turnaround {
                    turnaround,
                    then_sum: true,
                },
            };
            ReviewQuestion {
                fact: pair.base().clone(),
                is_from_current_lesson: true,
                source_lesson_id: lesson.id(),
                ask,
            }
        })
        .collect()
}
