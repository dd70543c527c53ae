use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{FactId, LessonId};
use crate::model::score::Score;

/// Step a freshly created lesson record points at.
pub const DEFAULT_STEP: u8 = 1;

//
// ─── FACT PROGRESS ─────────────────────────────────────────────────────────────
//

/// Accumulated answers for one fact within one lesson. Never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactProgress {
    pub attempts: u32,
    pub correct: u32,
    pub total_time_ms: u64,
    pub last_practiced_at: Option<DateTime<Utc>>,
}

/// Increment applied by a single evaluated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactProgressDelta {
    pub attempts: u32,
    pub correct: u32,
    pub time_ms: u64,
}

impl FactProgressDelta {
    #[must_use]
    pub fn answer(correct: bool, time_ms: u64) -> Self {
        Self {
            attempts: 1,
            correct: u32::from(correct),
            time_ms,
        }
    }
}

impl FactProgress {
    /// Additive merge; existing counters are never overwritten.
    pub fn apply(&mut self, delta: FactProgressDelta, at: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(delta.attempts);
        self.correct = self.correct.saturating_add(delta.correct);
        self.total_time_ms = self.total_time_ms.saturating_add(delta.time_ms);
        self.last_practiced_at = Some(at);
    }

    /// Share of correct answers, `None` before the first attempt.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(f64::from(self.correct) / f64::from(self.attempts))
        }
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    pub current_step: u8,
    pub completed: bool,
    pub passed: bool,
    pub quiz_score: Option<Score>,
    pub facts: BTreeMap<FactId, FactProgress>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    #[must_use]
    pub fn new(lesson_id: LessonId, started_at: DateTime<Utc>) -> Self {
        Self {
            lesson_id,
            current_step: DEFAULT_STEP,
            completed: false,
            passed: false,
            quiz_score: None,
            facts: BTreeMap::new(),
            started_at,
            completed_at: None,
        }
    }

    /// Unfinished lessons resume where the learner left off.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        !self.completed
    }

    /// Apply a partial update. Absent fields keep their value.
    pub fn apply(&mut self, patch: &LessonProgressPatch) {
        if let Some(step) = patch.current_step {
            self.current_step = step;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(passed) = patch.passed {
            self.passed = passed;
        }
        if let Some(score) = patch.quiz_score {
            self.quiz_score = score;
        }
        if let Some(at) = patch.completed_at {
            self.completed_at = at;
        }
    }

    pub fn record_fact(&mut self, fact_id: FactId, delta: FactProgressDelta, at: DateTime<Utc>) {
        self.facts.entry(fact_id).or_default().apply(delta, at);
    }

    pub fn complete(&mut self, score: Score, passed: bool, at: DateTime<Utc>) {
        self.completed = true;
        self.passed = passed;
        self.quiz_score = Some(score);
        self.completed_at = Some(at);
    }
}

/// Partial update for `LessonProgress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonProgressPatch {
    pub current_step: Option<u8>,
    pub completed: Option<bool>,
    pub passed: Option<bool>,
    pub quiz_score: Option<Option<Score>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl LessonProgressPatch {
    #[must_use]
    pub fn step(step: u8) -> Self {
        Self {
            current_step: Some(step),
            ..Self::default()
        }
    }

    /// Reset for a retry: back to `step`, completion flags cleared.
    #[must_use]
    pub fn restart_at(step: u8) -> Self {
        Self {
            current_step: Some(step),
            completed: Some(false),
            passed: Some(false),
            quiz_score: Some(None),
            completed_at: Some(None),
        }
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Counters exported for gradebook synchronisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFact {
    pub attempts: u32,
    pub correct: u32,
    pub time_spent: u64,
}

/// Every lesson record of one learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub lessons: BTreeMap<LessonId, LessonProgress>,
}

impl UserProgress {
    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&LessonProgress> {
        self.lessons.get(&id)
    }

    pub fn lesson_or_insert(&mut self, id: LessonId, now: DateTime<Utc>) -> &mut LessonProgress {
        self.lessons
            .entry(id)
            .or_insert_with(|| LessonProgress::new(id, now))
    }

    pub fn update_lesson(
        &mut self,
        id: LessonId,
        patch: &LessonProgressPatch,
        now: DateTime<Utc>,
    ) -> &LessonProgress {
        let lesson = self.lesson_or_insert(id, now);
        lesson.apply(patch);
        lesson
    }

    pub fn record_fact(
        &mut self,
        id: LessonId,
        fact_id: FactId,
        delta: FactProgressDelta,
        now: DateTime<Utc>,
    ) {
        self.lesson_or_insert(id, now)
            .record_fact(fact_id, delta, now);
    }

    pub fn complete_lesson(&mut self, id: LessonId, score: Score, passed: bool, now: DateTime<Utc>) {
        self.lesson_or_insert(id, now).complete(score, passed, now);
    }

    /// Lessons both completed and passed, in id order.
    #[must_use]
    pub fn completed_lessons(&self) -> Vec<LessonId> {
        self.lessons
            .values()
            .filter(|lesson| lesson.completed && lesson.passed)
            .map(|lesson| lesson.lesson_id)
            .collect()
    }

    /// Fact counters of passed lessons, summed when a fact appears in several.
    #[must_use]
    pub fn facts_for_sync(&self) -> BTreeMap<FactId, SyncFact> {
        let mut out: BTreeMap<FactId, SyncFact> = BTreeMap::new();
        for lesson in self.lessons.values().filter(|lesson| lesson.passed) {
            for (fact_id, progress) in &lesson.facts {
                let entry = out.entry(fact_id.clone()).or_default();
                entry.attempts = entry.attempts.saturating_add(progress.attempts);
                entry.correct = entry.correct.saturating_add(progress.correct);
                entry.time_spent = entry.time_spent.saturating_add(progress.total_time_ms);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn id(n: u32) -> LessonId {
        LessonId::new(n)
    }

    #[test]
    fn fact_progress_is_additive() {
        let mut progress = UserProgress::default();
        let fact = FactId::from_operands(2, 1);
        let delta = FactProgressDelta {
            attempts: 1,
            correct: 1,
            time_ms: 1200,
        };
        progress.record_fact(id(1), fact.clone(), delta, fixed_now());
        progress.record_fact(id(1), fact.clone(), delta, fixed_now());

        let stored = &progress.lesson(id(1)).unwrap().facts[&fact];
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.correct, 2);
        assert_eq!(stored.total_time_ms, 2400);
        assert_eq!(stored.accuracy(), Some(1.0));
    }

    #[test]
    fn first_touch_creates_default_record() {
        let mut progress = UserProgress::default();
        let lesson = progress.lesson_or_insert(id(4), fixed_now());
        assert_eq!(lesson.current_step, DEFAULT_STEP);
        assert!(!lesson.completed);
        assert!(lesson.facts.is_empty());
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut progress = UserProgress::default();
        progress.complete_lesson(id(3), Score::from_persisted(90).unwrap(), true, fixed_now());
        let lesson = progress.update_lesson(id(3), &LessonProgressPatch::step(5), fixed_now());
        assert_eq!(lesson.current_step, 5);
        assert!(lesson.completed);
        assert!(lesson.passed);

        let lesson = progress.update_lesson(id(3), &LessonProgressPatch::restart_at(1), fixed_now());
        assert!(!lesson.completed);
        assert!(lesson.quiz_score.is_none());
    }

    #[test]
    fn completed_lessons_require_pass() {
        let mut progress = UserProgress::default();
        progress.complete_lesson(id(1), Score::from_persisted(100).unwrap(), true, fixed_now());
        progress.complete_lesson(id(2), Score::from_persisted(50).unwrap(), false, fixed_now());
        progress.lesson_or_insert(id(3), fixed_now());
        assert_eq!(progress.completed_lessons(), vec![id(1)]);
    }

    #[test]
    fn sync_export_sums_passed_lessons_only() {
        let mut progress = UserProgress::default();
        let shared = FactId::from_operands(2, 1);
        let delta = FactProgressDelta::answer(true, 1000);
        progress.record_fact(id(1), shared.clone(), delta, fixed_now());
        progress.record_fact(id(2), shared.clone(), delta, fixed_now());
        progress.record_fact(id(3), FactId::from_operands(6, 1), delta, fixed_now());
        progress.complete_lesson(id(1), Score::from_persisted(100).unwrap(), true, fixed_now());
        progress.complete_lesson(id(2), Score::from_persisted(88).unwrap(), true, fixed_now());

        let export = progress.facts_for_sync();
        assert_eq!(export.len(), 1);
        assert_eq!(
            export[&shared],
            SyncFact {
                attempts: 2,
                correct: 2,
                time_spent: 2000
            }
        );
    }
}
