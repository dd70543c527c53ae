use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::FactId;

/// Facts whose larger operand reaches this value are weighted up in reviews.
pub const HIGH_OPERAND_THRESHOLD: u8 = 6;
/// Addition facts are single-digit on both sides.
pub const MAX_OPERAND: u8 = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FactError {
    #[error("fact key must look like `a+b`: {0}")]
    Malformed(String),
    #[error("operand {0} is larger than {MAX_OPERAND}")]
    OperandOutOfRange(u8),
}

/// An ordered addition pair and its sum, e.g. `2 + 1 = 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    id: FactId,
    operand1: u8,
    operand2: u8,
    result: u8,
}

impl Fact {
    /// # Errors
    ///
    /// Returns `FactError::OperandOutOfRange` if either operand exceeds
    /// `MAX_OPERAND`.
    pub fn new(operand1: u8, operand2: u8) -> Result<Self, FactError> {
        if let Some(big) = [operand1, operand2].into_iter().find(|&o| o > MAX_OPERAND) {
            return Err(FactError::OperandOutOfRange(big));
        }
        Ok(Self {
            id: FactId::from_operands(operand1, operand2),
            operand1,
            operand2,
            result: operand1 + operand2,
        })
    }

    /// Build a fact from its canonical key.
    ///
    /// # Errors
    ///
    /// Returns `FactError::Malformed` if the key is not `a+b`, or
    /// `FactError::OperandOutOfRange` for operands above `MAX_OPERAND`.
    pub fn parse(key: &str) -> Result<Self, FactError> {
        let id: FactId = key
            .parse()
            .map_err(|_| FactError::Malformed(key.to_string()))?;
        let (operand1, operand2) = id
            .operands()
            .map_err(|_| FactError::Malformed(key.to_string()))?;
        Self::new(operand1, operand2)
    }

    #[must_use]
    pub fn id(&self) -> &FactId {
        &self.id
    }

    #[must_use]
    pub fn operand1(&self) -> u8 {
        self.operand1
    }

    #[must_use]
    pub fn operand2(&self) -> u8 {
        self.operand2
    }

    #[must_use]
    pub fn result(&self) -> u8 {
        self.result
    }

    /// The operand-swapped fact: same result, different key (unless a double).
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            id: FactId::from_operands(self.operand2, self.operand1),
            operand1: self.operand2,
            operand2: self.operand1,
            result: self.result,
        }
    }

    #[must_use]
    pub fn larger_operand(&self) -> u8 {
        self.operand1.max(self.operand2)
    }

    /// True when the fact deserves extra repetitions in review pools.
    #[must_use]
    pub fn has_high_operand(&self) -> bool {
        self.larger_operand() >= HIGH_OPERAND_THRESHOLD
    }

    /// Human-readable form without the sum, e.g. `"2 + 1"`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} + {}", self.operand1, self.operand2)
    }
}

/// Number of digits a learner must type before an entry auto-submits.
#[must_use]
pub fn expected_digits(value: u8) -> usize {
    if value < 10 { 1 } else { 2 }
}
