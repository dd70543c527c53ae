use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Apply pending schema versions.
///
/// Version 1 holds per-learner lesson records and their additive fact counters.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lesson_progress (
                    learner_id TEXT NOT NULL,
                    lesson_id INTEGER NOT NULL CHECK (lesson_id > 0),
                    current_step INTEGER NOT NULL CHECK (current_step >= 0),
                    completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
                    passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
                    quiz_score INTEGER CHECK (quiz_score BETWEEN 0 AND 100),
                    started_at TEXT NOT NULL,
                    completed_at TEXT,
                    PRIMARY KEY (learner_id, lesson_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS fact_progress (
                    learner_id TEXT NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    fact_id TEXT NOT NULL,
                    attempts INTEGER NOT NULL CHECK (attempts >= 0),
                    correct INTEGER NOT NULL CHECK (correct >= 0),
                    total_time_ms INTEGER NOT NULL CHECK (total_time_ms >= 0),
                    last_practiced_at TEXT,
                    PRIMARY KEY (learner_id, lesson_id, fact_id),
                    FOREIGN KEY (learner_id, lesson_id)
                        REFERENCES lesson_progress(learner_id, lesson_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_fact_progress_learner_fact
                    ON fact_progress (learner_id, fact_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
