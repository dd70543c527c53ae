use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::collections::BTreeMap;
use tutor_core::model::{FactId, FactProgress, LessonId, LessonProgress, Score, SyncFact};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> i64 {
    i64::from(id.value())
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u32("lesson_id", v)?))
}

fn flag(row: &SqliteRow, column: &'static str) -> Result<bool, StorageError> {
    let raw: i64 = row.try_get(column).map_err(ser)?;
    Ok(raw != 0)
}

/// Map a `lesson_progress` row; fact counters are attached separately.
pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    let step: i64 = row.try_get("current_step").map_err(ser)?;
    let current_step = u8::try_from(step)
        .map_err(|_| StorageError::Serialization(format!("invalid current_step: {step}")))?;
    let quiz_score = row
        .try_get::<Option<i64>, _>("quiz_score")
        .map_err(ser)?
        .map(Score::from_persisted)
        .transpose()
        .map_err(ser)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;

    Ok(LessonProgress {
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        current_step,
        completed: flag(row, "completed")?,
        passed: flag(row, "passed")?,
        quiz_score,
        facts: BTreeMap::new(),
        started_at,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_fact_row(row: &SqliteRow) -> Result<(FactId, FactProgress), StorageError> {
    let raw_id: String = row.try_get("fact_id").map_err(ser)?;
    let fact_id: FactId = raw_id.parse().map_err(ser)?;
    let progress = FactProgress {
        attempts: i64_to_u32("attempts", row.try_get("attempts").map_err(ser)?)?,
        correct: i64_to_u32("correct", row.try_get("correct").map_err(ser)?)?,
        total_time_ms: i64_to_u64("total_time_ms", row.try_get("total_time_ms").map_err(ser)?)?,
        last_practiced_at: row.try_get("last_practiced_at").map_err(ser)?,
    };
    Ok((fact_id, progress))
}

pub(crate) fn map_sync_row(row: &SqliteRow) -> Result<(FactId, SyncFact), StorageError> {
    let raw_id: String = row.try_get("fact_id").map_err(ser)?;
    let fact_id: FactId = raw_id.parse().map_err(ser)?;
    let sync = SyncFact {
        attempts: i64_to_u32("attempts", row.try_get("attempts").map_err(ser)?)?,
        correct: i64_to_u32("correct", row.try_get("correct").map_err(ser)?)?,
        time_spent: i64_to_u64("time_spent", row.try_get("time_spent").map_err(ser)?)?,
    };
    Ok((fact_id, sync))
}
