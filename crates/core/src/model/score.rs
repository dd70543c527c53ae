use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum percentage required to pass a quiz or assessment.
pub const MASTERY_THRESHOLD: u8 = 85;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("cannot score an empty question set")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total ({total})")]
    TooManyCorrect { correct: u32, total: u32 },

    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(i64),
}

/// Whole-number percentage of correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Percentage of `correct` out of `total`, rounded half up.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` when `total` is zero and
    /// `ScoreError::TooManyCorrect` when `correct > total`.
    pub fn from_counts(correct: u32, total: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if correct > total {
            return Err(ScoreError::TooManyCorrect { correct, total });
        }
        let correct = u64::from(correct);
        let total = u64::from(total);
        let rounded = (200 * correct + total) / (2 * total);
        // correct <= total keeps this within 0..=100
        let value = u8::try_from(rounded).unwrap_or(100);
        Ok(Self(value))
    }

    /// Rehydrate a persisted percentage.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` when `value > 100` or negative.
    pub fn from_persisted(value: i64) -> Result<Self, ScoreError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(ScoreError::OutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn passed(self) -> bool {
        self.0 >= MASTERY_THRESHOLD
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_persisted(i64::from(value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
