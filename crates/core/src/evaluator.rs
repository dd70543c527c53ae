//! Answer evaluation, including the two-phase turnaround entry.

use serde::{Deserialize, Serialize};

use crate::model::{Ask, Fact, ReviewQuestion, expected_digits};

/// Raw input captured by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawAnswer {
    /// A single entry box (sum, or the missing operand).
    Value(String),
    /// Two operand boxes, in display order.
    Pair(String, String),
}

impl RawAnswer {
    #[must_use]
    pub fn value(v: impl Into<String>) -> Self {
        Self::Value(v.into())
    }

    #[must_use]
    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::Pair(first.into(), second.into())
    }
}

/// Where a question currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPhase {
    AwaitingValue,
    AwaitingOperands,
    /// Operands were right; the sum is still owed.
    AwaitingSum,
    Answered { correct: bool },
}

/// Outcome of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Missing field or wrong entry shape; nothing changed.
    Rejected,
    SumUnlocked,
    Correct,
    Incorrect,
}

impl Evaluation {
    /// True when the question has received its verdict.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, Evaluation::Correct | Evaluation::Incorrect)
    }

    fn verdict(correct: bool) -> Self {
        if correct {
            Evaluation::Correct
        } else {
            Evaluation::Incorrect
        }
    }
}

/// Order-sensitive check of a turnaround operand entry.
#[must_use]
pub fn is_turnaround_entry(turnaround: &Fact, operand1: u8, operand2: u8) -> bool {
    (operand1, operand2) == (turnaround.operand1(), turnaround.operand2())
}

/// State of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    question: ReviewQuestion,
    phase: AnswerPhase,
}

impl QuestionAttempt {
    #[must_use]
    pub fn new(question: ReviewQuestion) -> Self {
        let phase = match question.ask {
            Ask::Sum | Ask::CompleteTurnaround { .. } => AnswerPhase::AwaitingValue,
            Ask::Turnaround { .. } => AnswerPhase::AwaitingOperands,
        };
        Self { question, phase }
    }

    #[must_use]
    pub fn question(&self) -> &ReviewQuestion {
        &self.question
    }

    #[must_use]
    pub fn phase(&self) -> AnswerPhase {
        self.phase
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.phase, AnswerPhase::Answered { .. })
    }

    /// Digits the current entry needs before it auto-submits.
    #[must_use]
    pub fn expected_digits(&self) -> usize {
        match (&self.question.ask, self.phase) {
            (Ask::CompleteTurnaround { turnaround }, AnswerPhase::AwaitingValue) => {
                expected_digits(turnaround.operand2())
            }
            (_, AnswerPhase::AwaitingOperands) => 1,
            _ => self.question.expected_digits(),
        }
    }

    /// Evaluate `raw` against the current phase.
    pub fn submit(&mut self, raw: &RawAnswer) -> Evaluation {
        let evaluation = match (self.phase, raw) {
            (AnswerPhase::AwaitingValue, RawAnswer::Value(entry)) => {
                let Some(entry) = non_empty(entry) else {
                    return Evaluation::Rejected;
                };
                let expected = match &self.question.ask {
                    Ask::CompleteTurnaround { turnaround } => turnaround.operand2(),
                    Ask::Sum | Ask::Turnaround { .. } => self.question.fact.result(),
                };
                Evaluation::verdict(parse_number(entry) == Some(expected))
            }
            (AnswerPhase::AwaitingOperands, RawAnswer::Pair(first, second)) => {
                let (Some(first), Some(second)) = (non_empty(first), non_empty(second)) else {
                    return Evaluation::Rejected;
                };
                let Ask::Turnaround {
                    turnaround,
                    then_sum,
                } = &self.question.ask
                else {
                    return Evaluation::Rejected;
                };
                let correct = match (parse_number(first), parse_number(second)) {
                    (Some(a), Some(b)) => is_turnaround_entry(turnaround, a, b),
                    _ => false,
                };
                if correct && *then_sum {
                    Evaluation::SumUnlocked
                } else {
                    Evaluation::verdict(correct)
                }
            }
            (AnswerPhase::AwaitingSum, RawAnswer::Value(entry)) => {
                let Some(entry) = non_empty(entry) else {
                    return Evaluation::Rejected;
                };
                Evaluation::verdict(parse_number(entry) == Some(self.question.fact.result()))
            }
            _ => return Evaluation::Rejected,
        };

        self.phase = match evaluation {
            Evaluation::SumUnlocked => AnswerPhase::AwaitingSum,
            Evaluation::Correct => AnswerPhase::Answered { correct: true },
            Evaluation::Incorrect => AnswerPhase::Answered { correct: false },
            Evaluation::Rejected => self.phase,
        };
        evaluation
    }
}

fn non_empty(entry: &str) -> Option<&str> {
    let trimmed = entry.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_number(entry: &str) -> Option<u8> {
    entry.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LessonId;

    fn turnaround_question(then_sum: bool) -> ReviewQuestion {
        let base = Fact::new(1, 2).unwrap();
        ReviewQuestion {
            ask: Ask::Turnaround {
                turnaround: base.swapped(),
                then_sum,
            },
            fact: base,
            is_from_current_lesson: true,
            source_lesson_id: LessonId::new(2),
        }
    }

    #[test]
    fn direct_sum_checks_result() {
        let q = ReviewQuestion::sum(Fact::new(7, 8).unwrap(), LessonId::new(23), true);
        let mut attempt = QuestionAttempt::new(q.clone());
        assert_eq!(attempt.expected_digits(), 2);
        assert_eq!(attempt.submit(&RawAnswer::value("15")), Evaluation::Correct);
        assert_eq!(attempt.phase(), AnswerPhase::Answered { correct: true });

        let mut wrong = QuestionAttempt::new(q);
        assert_eq!(wrong.submit(&RawAnswer::value("14")), Evaluation::Incorrect);
    }

    #[test]
    fn empty_or_misshaped_entries_are_rejected() {
        let q = ReviewQuestion::sum(Fact::new(2, 1).unwrap(), LessonId::new(1), true);
        let mut attempt = QuestionAttempt::new(q);
        assert_eq!(attempt.submit(&RawAnswer::value("  ")), Evaluation::Rejected);
        assert_eq!(attempt.submit(&RawAnswer::pair("1", "2")), Evaluation::Rejected);
        assert_eq!(attempt.phase(), AnswerPhase::AwaitingValue);

        let mut pair = QuestionAttempt::new(turnaround_question(false));
        assert_eq!(pair.submit(&RawAnswer::pair("2", "")), Evaluation::Rejected);
        assert_eq!(pair.phase(), AnswerPhase::AwaitingOperands);
    }

    #[test]
    fn unparsable_entry_is_wrong() {
        let q = ReviewQuestion::sum(Fact::new(2, 1).unwrap(), LessonId::new(1), true);
        let mut attempt = QuestionAttempt::new(q);
        assert_eq!(attempt.submit(&RawAnswer::value("three")), Evaluation::Incorrect);
    }

    #[test]
    fn turnaround_operands_are_order_sensitive() {
        let mut right = QuestionAttempt::new(turnaround_question(false));
        assert_eq!(right.submit(&RawAnswer::pair("2", "1")), Evaluation::Correct);

        let mut swapped = QuestionAttempt::new(turnaround_question(false));
        assert_eq!(swapped.submit(&RawAnswer::pair("1", "2")), Evaluation::Incorrect);
    }

    #[test]
    fn correct_operands_unlock_sum_phase() {
        let mut attempt = QuestionAttempt::new(turnaround_question(true));
        assert_eq!(attempt.submit(&RawAnswer::pair("2", "1")), Evaluation::SumUnlocked);
        assert_eq!(attempt.phase(), AnswerPhase::AwaitingSum);
        assert_eq!(attempt.submit(&RawAnswer::value("3")), Evaluation::Correct);
    }

    #[test]
    fn wrong_operands_end_question_without_sum_phase() {
        let mut attempt = QuestionAttempt::new(turnaround_question(true));
        assert_eq!(attempt.submit(&RawAnswer::pair("1", "2")), Evaluation::Incorrect);
        assert!(attempt.is_answered());
        assert_eq!(attempt.submit(&RawAnswer::value("3")), Evaluation::Rejected);
    }

    #[test]
    fn complete_turnaround_asks_for_second_operand() {
        let base = Fact::new(1, 4).unwrap();
        let q = ReviewQuestion {
            ask: Ask::CompleteTurnaround {
                turnaround: base.swapped(),
            },
            fact: base,
            is_from_current_lesson: true,
            source_lesson_id: LessonId::new(2),
        };
        let mut attempt = QuestionAttempt::new(q);
        assert_eq!(attempt.expected_digits(), 1);
        assert_eq!(attempt.submit(&RawAnswer::value("1")), Evaluation::Correct);
    }
}
