use serde::{Deserialize, Serialize};

use crate::model::fact::{Fact, expected_digits};
use crate::model::ids::LessonId;

/// What the learner must produce for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ask {
    /// Type the sum of the presented fact.
    Sum,
    /// Enter both operands of the turnaround, in order. With `then_sum` a
    /// correct pair unlocks a second phase asking for the sum.
    Turnaround { turnaround: Fact, then_sum: bool },
    /// Only the missing second operand of the turnaround is entered.
    CompleteTurnaround { turnaround: Fact },
}

/// One generated question. Lives only for the duration of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuestion {
    pub fact: Fact,
    pub is_from_current_lesson: bool,
    pub source_lesson_id: LessonId,
    pub ask: Ask,
}

impl ReviewQuestion {
    #[must_use]
    pub fn sum(fact: Fact, source_lesson_id: LessonId, is_from_current_lesson: bool) -> Self {
        Self {
            fact,
            is_from_current_lesson,
            source_lesson_id,
            ask: Ask::Sum,
        }
    }

    #[must_use]
    pub fn turnaround(
        fact: Fact,
        turnaround: Fact,
        source_lesson_id: LessonId,
        is_from_current_lesson: bool,
    ) -> Self {
        Self {
            fact,
            is_from_current_lesson,
            source_lesson_id,
            ask: Ask::Turnaround {
                turnaround,
                then_sum: false,
            },
        }
    }

    #[must_use]
    pub fn ask_as_turnaround(&self) -> bool {
        !matches!(self.ask, Ask::Sum)
    }

    #[must_use]
    pub fn turnaround_of_fact(&self) -> Option<&Fact> {
        match &self.ask {
            Ask::Sum => None,
            Ask::Turnaround { turnaround, .. } | Ask::CompleteTurnaround { turnaround } => {
                Some(turnaround)
            }
        }
    }

    /// Digits expected in the sum entry, used for auto-submission.
    #[must_use]
    pub fn expected_digits(&self) -> usize {
        expected_digits(self.fact.result())
    }
}
