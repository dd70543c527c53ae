use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a lesson in the catalog (1..=26 for the addition track).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(u32);

impl LessonId {
    /// Creates a new `LessonId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Canonical `"a+b"` key of an addition fact.
///
/// Keys identify ordered pairs: `"2+1"` and `"1+2"` are different facts.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(String);

impl FactId {
    /// Builds the canonical key for the ordered pair `(operand1, operand2)`.
    #[must_use]
    pub fn from_operands(operand1: u8, operand2: u8) -> Self {
        Self(format!("{operand1}+{operand2}"))
    }

    /// Splits the key back into its two operands.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the key is not of the form `a+b`.
    pub fn operands(&self) -> Result<(u8, u8), ParseIdError> {
        split_operands(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn split_operands(raw: &str) -> Result<(u8, u8), ParseIdError> {
    let err = || ParseIdError {
        kind: "FactId".to_string(),
    };
    let (left, right) = raw.split_once('+').ok_or_else(err)?;
    let left = left.trim().parse::<u8>().map_err(|_| err())?;
    let right = right.trim().parse::<u8>().map_err(|_| err())?;
    Ok((left, right))
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for LessonId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(LessonId::new)
            .map_err(|_| ParseIdError {
                kind: "LessonId".to_string(),
            })
    }
}

impl FromStr for FactId {
    type Err = ParseIdError;

    /// Parses and normalizes a key such as `"2+1"` or `" 2 + 1 "`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = split_operands(s)?;
        Ok(Self::from_operands(left, right))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_id_display() {
        let id = LessonId::new(12);
        assert_eq!(id.to_string(), "12");
    }

    #[test]
    fn test_lesson_id_from_str() {
        let id: LessonId = "26".parse().unwrap();
        assert_eq!(id, LessonId::new(26));
    }

    #[test]
    fn test_lesson_id_from_str_invalid() {
        assert!("lesson-one".parse::<LessonId>().is_err());
    }

    #[test]
    fn test_fact_id_normalizes_whitespace() {
        let id: FactId = " 2 + 1 ".parse().unwrap();
        assert_eq!(id.as_str(), "2+1");
        assert_eq!(id.operands().unwrap(), (2, 1));
    }

    #[test]
    fn test_fact_id_is_order_sensitive() {
        assert_ne!(FactId::from_operands(2, 1), FactId::from_operands(1, 2));
    }

    #[test]
    fn test_fact_id_from_str_invalid() {
        assert!("2-1".parse::<FactId>().is_err());
        assert!("2+".parse::<FactId>().is_err());
        assert!("+1".parse::<FactId>().is_err());
    }
}
