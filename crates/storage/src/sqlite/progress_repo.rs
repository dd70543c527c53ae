use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, Transaction};
use std::collections::BTreeMap;
use tutor_core::model::{
    DEFAULT_STEP, FactId, FactProgressDelta, LessonId, LessonProgress, LessonProgressPatch, Score,
    SyncFact, UserProgress,
};

use super::SqliteRepository;
use super::mapping::{
    conn, lesson_id_from_i64, lesson_id_to_i64, map_fact_row, map_lesson_row, map_sync_row, ser,
    u64_to_i64,
};
use crate::repository::{ProgressRepository, StorageError};

const LESSON_COLUMNS: &str = r"
    lesson_id, current_step, completed, passed, quiz_score, started_at, completed_at
";

impl SqliteRepository {
    /// Insert the default lesson record unless one exists.
    async fn ensure_lesson(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: LessonId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (
                learner_id, lesson_id, current_step, completed, passed, quiz_score, started_at, completed_at
            )
            VALUES (?1, ?2, ?3, 0, 0, NULL, ?4, NULL)
            ON CONFLICT(learner_id, lesson_id) DO NOTHING
            ",
        )
        .bind(&self.learner)
        .bind(lesson_id_to_i64(id))
        .bind(i64::from(DEFAULT_STEP))
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn load_lesson(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lesson_progress WHERE learner_id = ?1 AND lesson_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(&self.learner)
            .bind(lesson_id_to_i64(id))
            .fetch_optional(&mut **tx)
            .await
            .map_err(conn)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut lesson = map_lesson_row(&row)?;

        let facts = sqlx::query(
            r"
            SELECT fact_id, attempts, correct, total_time_ms, last_practiced_at
            FROM fact_progress
            WHERE learner_id = ?1 AND lesson_id = ?2
            ORDER BY fact_id
            ",
        )
        .bind(&self.learner)
        .bind(lesson_id_to_i64(id))
        .fetch_all(&mut **tx)
        .await
        .map_err(conn)?;
        for row in &facts {
            let (fact_id, progress) = map_fact_row(row)?;
            lesson.facts.insert(fact_id, progress);
        }
        Ok(Some(lesson))
    }

    async fn write_lesson(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        lesson: &LessonProgress,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            UPDATE lesson_progress
            SET current_step = ?3,
                completed = ?4,
                passed = ?5,
                quiz_score = ?6,
                completed_at = ?7
            WHERE learner_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(&self.learner)
        .bind(lesson_id_to_i64(lesson.lesson_id))
        .bind(i64::from(lesson.current_step))
        .bind(i64::from(lesson.completed))
        .bind(i64::from(lesson.passed))
        .bind(lesson.quiz_score.map(|s| i64::from(s.value())))
        .bind(lesson.completed_at)
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
        Ok(())
    }

    /// Read-modify-write of one lesson record inside a transaction.
    async fn modify_lesson(
        &self,
        id: LessonId,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut LessonProgress) + Send,
    ) -> Result<LessonProgress, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        self.ensure_lesson(&mut tx, id, now).await?;
        let mut lesson = self
            .load_lesson(&mut tx, id)
            .await?
            .ok_or(StorageError::NotFound)?;
        f(&mut lesson);
        self.write_lesson(&mut tx, &lesson).await?;
        tx.commit().await.map_err(conn)?;
        Ok(lesson)
    }
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn lesson_progress(&self, id: LessonId) -> Result<Option<LessonProgress>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let lesson = self.load_lesson(&mut tx, id).await?;
        tx.commit().await.map_err(conn)?;
        Ok(lesson)
    }

    async fn update_lesson_progress(
        &self,
        id: LessonId,
        patch: &LessonProgressPatch,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        let patch = patch.clone();
        self.modify_lesson(id, now, move |lesson| lesson.apply(&patch))
            .await
    }

    async fn update_fact_progress(
        &self,
        id: LessonId,
        fact_id: &FactId,
        delta: FactProgressDelta,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        self.ensure_lesson(&mut tx, id, now).await?;
        sqlx::query(
            r"
            INSERT INTO fact_progress (
                learner_id, lesson_id, fact_id, attempts, correct, total_time_ms, last_practiced_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(learner_id, lesson_id, fact_id) DO UPDATE SET
                attempts = fact_progress.attempts + excluded.attempts,
                correct = fact_progress.correct + excluded.correct,
                total_time_ms = fact_progress.total_time_ms + excluded.total_time_ms,
                last_practiced_at = excluded.last_practiced_at
            ",
        )
        .bind(&self.learner)
        .bind(lesson_id_to_i64(id))
        .bind(fact_id.as_str())
        .bind(i64::from(delta.attempts))
        .bind(i64::from(delta.correct))
        .bind(u64_to_i64("time_ms", delta.time_ms)?)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn complete_lesson(
        &self,
        id: LessonId,
        score: Score,
        passed: bool,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        self.modify_lesson(id, now, move |lesson| lesson.complete(score, passed, now))
            .await
    }

    async fn completed_lessons(&self) -> Result<Vec<LessonId>, StorageError> {
        let rows: Vec<i64> = sqlx::query_scalar(
            r"
            SELECT lesson_id
            FROM lesson_progress
            WHERE learner_id = ?1 AND completed = 1 AND passed = 1
            ORDER BY lesson_id
            ",
        )
        .bind(&self.learner)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.into_iter()
            .map(lesson_id_from_i64)
            .collect()
    }

    async fn export_facts_for_sync(&self) -> Result<BTreeMap<FactId, SyncFact>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT f.fact_id AS fact_id,
                   SUM(f.attempts) AS attempts,
                   SUM(f.correct) AS correct,
                   SUM(f.total_time_ms) AS time_spent
            FROM fact_progress f
            JOIN lesson_progress l
              ON l.learner_id = f.learner_id AND l.lesson_id = f.lesson_id
            WHERE f.learner_id = ?1 AND l.passed = 1
            GROUP BY f.fact_id
            ORDER BY f.fact_id
            ",
        )
        .bind(&self.learner)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_sync_row).collect()
    }

    async fn user_progress(&self) -> Result<UserProgress, StorageError> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lesson_progress WHERE learner_id = ?1 ORDER BY lesson_id"
        );
        let lesson_rows = sqlx::query(&sql)
            .bind(&self.learner)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        let mut progress = UserProgress::default();
        for row in &lesson_rows {
            let lesson = map_lesson_row(row)?;
            progress.lessons.insert(lesson.lesson_id, lesson);
        }

        let fact_rows = sqlx::query(
            r"
            SELECT lesson_id, fact_id, attempts, correct, total_time_ms, last_practiced_at
            FROM fact_progress
            WHERE learner_id = ?1
            ",
        )
        .bind(&self.learner)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        for row in &fact_rows {
            let lesson_id = lesson_id_from_i64(row.try_get("lesson_id").map_err(ser)?)?;
            let (fact_id, fact) = map_fact_row(row)?;
            let lesson = progress
                .lessons
                .get_mut(&lesson_id)
                .ok_or(StorageError::Conflict)?;
            lesson.facts.insert(fact_id, fact);
        }
        Ok(progress)
    }
}
