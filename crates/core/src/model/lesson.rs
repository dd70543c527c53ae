use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::fact::{Fact, FactError};
use crate::model::ids::{FactId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A lesson definition violated one of the catalog invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson id must be positive")]
    InvalidId,

    #[error("lesson {0} has no facts")]
    NoFacts(LessonId),

    #[error(transparent)]
    Fact(#[from] FactError),

    #[error("lesson {lesson}: quiz fact {fact} does not resolve to a lesson fact or its swap")]
    UnresolvedQuizFact { lesson: LessonId, fact: FactId },

    #[error("lesson {lesson}: pair base {fact} is not a lesson fact")]
    UnknownPairBase { lesson: LessonId, fact: FactId },

    #[error("lesson {lesson}: {turnaround} is not the turnaround of {base}")]
    NotATurnaround {
        lesson: LessonId,
        base: FactId,
        turnaround: FactId,
    },

    #[error("lesson {lesson}: fact {fact} has no commutative pair")]
    MissingPair { lesson: LessonId, fact: FactId },

    #[error("lesson {0}: commutative pairs are only valid for fact families lessons")]
    UnexpectedPairs(LessonId),

    #[error("lesson {0}: rule introductions are only valid for series saying lessons")]
    UnexpectedRuleIntro(LessonId),

    #[error("lesson {0}: family introductions are only valid for fact families lessons")]
    UnexpectedFamilyIntro(LessonId),
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Instructional format of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonFormat {
    /// Facts recited as an ordered series, no turnaround emphasis.
    SeriesSaying,
    /// Facts taught together with their turnarounds.
    FactFamilies,
}

impl LessonFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonFormat::SeriesSaying => "series_saying",
            LessonFormat::FactFamilies => "fact_families",
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            LessonFormat::SeriesSaying => LessonFormat::FactFamilies,
            LessonFormat::FactFamilies => LessonFormat::SeriesSaying,
        }
    }
}

/// Pattern rule taught right after the modeled step of a series saying lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleIntro {
    PlusOne,
    PlusZero,
}

impl RuleIntro {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuleIntro::PlusOne => "plus-one",
            RuleIntro::PlusZero => "plus-zero",
        }
    }

    /// Script read to the learner.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            RuleIntro::PlusOne => {
                "Here's a trick for plus one facts: Just say the next number! \
                 Five plus one? Six. Seven plus one? Eight. Easy!"
            }
            RuleIntro::PlusZero => {
                "Here's a trick for plus zero facts: Just say the same number! \
                 Five plus zero? Five. Seven plus zero? Seven. Easy!"
            }
        }
    }
}

/// Fact families explanation shown before the first step of early lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroVariant {
    #[default]
    None,
    Full,
    Short,
}

//
// ─── COMMUTATIVE PAIR ──────────────────────────────────────────────────────────
//

/// A fact and its declared turnaround. Doubles are their own turnaround.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommutativePair {
    base: Fact,
    turnaround: Fact,
}

impl CommutativePair {
    #[must_use]
    pub fn base(&self) -> &Fact {
        &self.base
    }

    #[must_use]
    pub fn turnaround(&self) -> &Fact {
        &self.turnaround
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Unvalidated lesson definition, as written in the static catalog table.
#[derive(Debug, Clone, Copy)]
pub struct LessonDraft {
    pub id: u32,
    pub set: char,
    pub format: LessonFormat,
    pub facts: &'static [&'static str],
    pub quiz_order: &'static [&'static str],
    pub commutative_pairs: &'static [(&'static str, &'static str)],
    pub rule_intro: Option<RuleIntro>,
    pub intro: IntroVariant,
}

/// An immutable lesson of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    id: LessonId,
    set: char,
    format: LessonFormat,
    facts: Vec<Fact>,
    quiz_order: Vec<FactId>,
    commutative_pairs: Vec<CommutativePair>,
    rule_intro: Option<RuleIntro>,
    intro: IntroVariant,
}

impl LessonDraft {
    /// Parse fact keys and check every lesson invariant.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` describing the first violated invariant.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        if self.id == 0 {
            return Err(LessonError::InvalidId);
        }
        let id = LessonId::new(self.id);

        let facts = self
            .facts
            .iter()
            .map(|key| Fact::parse(key))
            .collect::<Result<Vec<_>, _>>()?;
        if facts.is_empty() {
            return Err(LessonError::NoFacts(id));
        }

        let mut lesson = Lesson {
            id,
            set: self.set,
            format: self.format,
            facts,
            quiz_order: Vec::with_capacity(self.quiz_order.len()),
            commutative_pairs: Vec::with_capacity(self.commutative_pairs.len()),
            rule_intro: self.rule_intro,
            intro: self.intro,
        };

        for key in self.quiz_order {
            let fact = Fact::parse(key)?;
            if lesson.resolve(fact.id()).is_none() {
                return Err(LessonError::UnresolvedQuizFact {
                    lesson: id,
                    fact: fact.id().clone(),
                });
            }
            lesson.quiz_order.push(fact.id().clone());
        }

        for (base_key, turnaround_key) in self.commutative_pairs {
            let base = Fact::parse(base_key)?;
            let turnaround = Fact::parse(turnaround_key)?;
            if lesson.fact(base.id()).is_none() {
                return Err(LessonError::UnknownPairBase {
                    lesson: id,
                    fact: base.id().clone(),
                });
            }
            if base.swapped() != turnaround {
                return Err(LessonError::NotATurnaround {
                    lesson: id,
                    base: base.id().clone(),
                    turnaround: turnaround.id().clone(),
                });
            }
            lesson
                .commutative_pairs
                .push(CommutativePair { base, turnaround });
        }

        match lesson.format {
            LessonFormat::SeriesSaying => {
                if !lesson.commutative_pairs.is_empty() {
                    return Err(LessonError::UnexpectedPairs(id));
                }
                if lesson.intro != IntroVariant::None {
                    return Err(LessonError::UnexpectedFamilyIntro(id));
                }
            }
            LessonFormat::FactFamilies => {
                if lesson.rule_intro.is_some() {
                    return Err(LessonError::UnexpectedRuleIntro(id));
                }
                if let Some(orphan) = lesson
                    .facts
                    .iter()
                    .find(|fact| lesson.pair_for(fact.id()).is_none())
                {
                    return Err(LessonError::MissingPair {
                        lesson: id,
                        fact: orphan.id().clone(),
                    });
                }
            }
        }

        Ok(lesson)
    }
}

impl Lesson {
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    /// Letter of the fact set (A for lesson 1 through Z for lesson 26).
    #[must_use]
    pub fn set(&self) -> char {
        self.set
    }

    #[must_use]
    pub fn format(&self) -> LessonFormat {
        self.format
    }

    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    #[must_use]
    pub fn quiz_order(&self) -> &[FactId] {
        &self.quiz_order
    }

    #[must_use]
    pub fn commutative_pairs(&self) -> &[CommutativePair] {
        &self.commutative_pairs
    }

    #[must_use]
    pub fn rule_intro(&self) -> Option<RuleIntro> {
        self.rule_intro
    }

    #[must_use]
    pub fn intro(&self) -> IntroVariant {
        self.intro
    }

    #[must_use]
    pub fn fact(&self, id: &FactId) -> Option<&Fact> {
        self.facts.iter().find(|fact| fact.id() == id)
    }

    /// Resolve a key to a lesson fact, or to the swap of one.
    #[must_use]
    pub fn resolve(&self, id: &FactId) -> Option<Fact> {
        if let Some(fact) = self.fact(id) {
            return Some(fact.clone());
        }
        self.facts
            .iter()
            .map(Fact::swapped)
            .find(|swapped| swapped.id() == id)
    }

    /// Facts in the deliberate quiz order.
    #[must_use]
    pub fn quiz_facts(&self) -> Vec<Fact> {
        self.quiz_order
            .iter()
            .filter_map(|id| self.resolve(id))
            .collect()
    }

    #[must_use]
    pub fn pair_for(&self, base: &FactId) -> Option<&CommutativePair> {
        self.commutative_pairs
            .iter()
            .find(|pair| pair.base.id() == base)
    }

    /// Turnaround declared for `base` by the catalog pairing.
    #[must_use]
    pub fn turnaround_of(&self, base: &FactId) -> Option<&Fact> {
        self.pair_for(base).map(CommutativePair::turnaround)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LessonDraft {
        LessonDraft {
            id: 2,
            set: 'B',
            format: LessonFormat::FactFamilies,
            facts: &["1+2", "1+3"],
            quiz_order: &["1+3", "2+1", "1+2", "3+1"],
            commutative_pairs: &[("1+2", "2+1"), ("1+3", "3+1")],
            rule_intro: None,
            intro: IntroVariant::Full,
        }
    }

    #[test]
    fn validate_resolves_quiz_swaps() {
        let lesson = draft().validate().unwrap();
        let quiz: Vec<_> = lesson
            .quiz_facts()
            .iter()
            .map(|f| f.id().to_string())
            .collect();
        assert_eq!(quiz, vec!["1+3", "2+1", "1+2", "3+1"]);
        assert_eq!(
            lesson.turnaround_of(&FactId::from_operands(1, 2)),
            Some(&Fact::new(2, 1).unwrap())
        );
    }

    #[test]
    fn validate_rejects_non_swap_pair() {
        let mut bad = draft();
        bad.commutative_pairs = &[("1+2", "2+1"), ("1+3", "1+3")];
        assert!(matches!(
            bad.validate(),
            Err(LessonError::NotATurnaround { .. })
        ));
    }

    #[test]
    fn validate_requires_pair_for_every_family_fact() {
        let mut bad = draft();
        bad.commutative_pairs = &[("1+2", "2+1")];
        assert!(matches!(bad.validate(), Err(LessonError::MissingPair { .. })));
    }

    #[test]
    fn validate_rejects_unknown_quiz_fact() {
        let mut bad = draft();
        bad.quiz_order = &["4+4"];
        assert!(matches!(
            bad.validate(),
            Err(LessonError::UnresolvedQuizFact { .. })
        ));
    }

    #[test]
    fn series_saying_rejects_pairs_and_family_intro() {
        let mut bad = draft();
        bad.format = LessonFormat::SeriesSaying;
        assert!(matches!(bad.validate(), Err(LessonError::UnexpectedPairs(_))));

        bad.commutative_pairs = &[];
        assert!(matches!(
            bad.validate(),
            Err(LessonError::UnexpectedFamilyIntro(_))
        ));
    }

    #[test]
    fn doubles_are_their_own_turnaround() {
        let lesson = LessonDraft {
            id: 10,
            set: 'J',
            format: LessonFormat::FactFamilies,
            facts: &["3+3"],
            quiz_order: &["3+3", "3+3"],
            commutative_pairs: &[("3+3", "3+3")],
            rule_intro: None,
            intro: IntroVariant::Short,
        }
        .validate()
        .unwrap();
        let pair = &lesson.commutative_pairs()[0];
        assert_eq!(pair.base(), pair.turnaround());
    }
}
