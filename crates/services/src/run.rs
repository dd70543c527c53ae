use chrono::{DateTime, Utc};

use tutor_core::evaluator::{Evaluation, QuestionAttempt, RawAnswer};
use tutor_core::model::{FactId, FactProgressDelta, LessonId, ReviewQuestion, Score, ScoreError};
use tutor_core::time::elapsed_ms;

/// What happens after a wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    #[default]
    Continue,
    /// Clear all results and go back to the first question.
    RestartOnError,
}

/// One evaluated answer, ready to be added to fact progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub lesson_id: LessonId,
    pub fact_id: FactId,
    pub correct: bool,
    pub elapsed_ms: u64,
}

impl AnswerRecord {
    #[must_use]
    pub fn delta(&self) -> FactProgressDelta {
        FactProgressDelta::answer(self.correct, self.elapsed_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to evaluate: empty field, wrong shape, or run finished.
    Rejected,
    /// Operands accepted; the same question now wants the sum.
    SumUnlocked,
    Answered {
        record: AnswerRecord,
        /// The run went back to its first question.
        restarted: bool,
    },
}

/// Steps through a question list one question at a time.
#[derive(Debug, Clone)]
pub struct QuestionRun {
    questions: Vec<ReviewQuestion>,
    index: usize,
    attempt: Option<QuestionAttempt>,
    presented_at: DateTime<Utc>,
    results: Vec<bool>,
    policy: RestartPolicy,
    restarts: u32,
}

impl QuestionRun {
    #[must_use]
    pub fn new(questions: Vec<ReviewQuestion>, policy: RestartPolicy, now: DateTime<Utc>) -> Self {
        let attempt = questions.first().cloned().map(QuestionAttempt::new);
        Self {
            questions,
            index: 0,
            attempt,
            presented_at: now,
            results: Vec::new(),
            policy,
            restarts: 0,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[ReviewQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionAttempt> {
        self.attempt.as_ref()
    }

    /// Zero-based index of the pending question.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.attempt.is_none()
    }

    #[must_use]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|correct| **correct).count()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.results.len()
    }

    /// Evaluate `raw` for the pending question.
    pub fn submit(&mut self, raw: &RawAnswer, now: DateTime<Utc>) -> SubmitOutcome {
        let Some(attempt) = self.attempt.as_mut() else {
            return SubmitOutcome::Rejected;
        };
        let correct = match attempt.submit(raw) {
            Evaluation::Rejected => return SubmitOutcome::Rejected,
            Evaluation::SumUnlocked => return SubmitOutcome::SumUnlocked,
            Evaluation::Correct => true,
            Evaluation::Incorrect => false,
        };

        let question = attempt.question();
        let record = AnswerRecord {
            lesson_id: question.source_lesson_id,
            fact_id: question.fact.id().clone(),
            correct,
            elapsed_ms: elapsed_ms(self.presented_at, now),
        };

        let restarted = !correct && self.policy == RestartPolicy::RestartOnError;
        if restarted {
            self.results.clear();
            self.index = 0;
            self.restarts += 1;
        } else {
            self.results.push(correct);
            self.index += 1;
        }
        self.attempt = self.questions.get(self.index).cloned().map(QuestionAttempt::new);
        self.presented_at = now;

        SubmitOutcome::Answered { record, restarted }
    }

    /// Percentage of correct answers recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` before any answer is recorded.
    pub fn score(&self) -> Result<Score, ScoreError> {
        let total = u32::try_from(self.results.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(self.correct_count()).unwrap_or(u32::MAX);
        Score::from_counts(correct, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tutor_core::model::Fact;
    use tutor_core::time::fixed_now;

    fn sums(keys: &[&str]) -> Vec<ReviewQuestion> {
        keys.iter()
            .map(|k| ReviewQuestion::sum(Fact::parse(k).unwrap(), LessonId::new(1), true))
            .collect()
    }

    #[test]
    fn records_elapsed_time_from_presentation() {
        let mut run = QuestionRun::new(sums(&["2+1", "3+1"]), RestartPolicy::Continue, fixed_now());
        let outcome = run.submit(&RawAnswer::value("3"), fixed_now() + Duration::milliseconds(1800));
        let SubmitOutcome::Answered { record, restarted } = outcome else {
            panic!("expected a verdict");
        };
        assert!(record.correct);
        assert!(!restarted);
        assert_eq!(record.elapsed_ms, 1800);
        assert_eq!(record.fact_id.as_str(), "2+1");

        let second = fixed_now() + Duration::milliseconds(2500);
        let SubmitOutcome::Answered { record, .. } = run.submit(&RawAnswer::value("9"), second)
        else {
            panic!("expected a verdict");
        };
        assert!(!record.correct);
        assert_eq!(record.elapsed_ms, 700);
        assert!(run.is_finished());
        assert_eq!(run.score().unwrap().value(), 50);
    }

    #[test]
    fn rejected_submissions_change_nothing() {
        let mut run = QuestionRun::new(sums(&["2+1"]), RestartPolicy::Continue, fixed_now());
        assert_eq!(run.submit(&RawAnswer::value(""), fixed_now()), SubmitOutcome::Rejected);
        assert_eq!(run.position(), 0);
        assert_eq!(run.answered_count(), 0);
        assert!(run.score().is_err());
    }

    #[test]
    fn restart_policy_goes_back_to_first_question() {
        let mut run = QuestionRun::new(
            sums(&["2+1", "3+1", "4+1"]),
            RestartPolicy::RestartOnError,
            fixed_now(),
        );
        run.submit(&RawAnswer::value("3"), fixed_now());
        run.submit(&RawAnswer::value("4"), fixed_now());
        let outcome = run.submit(&RawAnswer::value("1"), fixed_now());
        assert!(matches!(outcome, SubmitOutcome::Answered { restarted: true, .. }));
        assert_eq!(run.position(), 0);
        assert_eq!(run.answered_count(), 0);
        assert_eq!(run.restarts(), 1);
        assert!(!run.is_finished());
    }

    #[test]
    fn finished_run_rejects_input() {
        let mut run = QuestionRun::new(Vec::new(), RestartPolicy::Continue, fixed_now());
        assert!(run.is_finished());
        assert_eq!(run.submit(&RawAnswer::value("3"), fixed_now()), SubmitOutcome::Rejected);
    }
}
