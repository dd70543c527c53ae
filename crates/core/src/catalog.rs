//! The compiled-in addition track: 26 lessons alternating between series
//! saying (odd ids) and fact families (even ids).

use thiserror::Error;

use crate::model::{
    Fact, IntroVariant, Lesson, LessonDraft, LessonError, LessonFormat, LessonId,
    RuleIntro,
};

/// Id under which the comprehensive assessment reports to the gradebook.
pub const ASSESSMENT_RESULT_ID: u32 = 999;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("lesson not found: {0}")]
    LessonNotFound(LessonId),

    #[error("duplicate lesson id {0}")]
    DuplicateLesson(LessonId),

    #[error(transparent)]
    Lesson(#[from] LessonError),
}

/// Validated, immutable lesson corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    /// Load the standard 26-lesson addition catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Lesson` if a compiled-in definition is invalid.
    pub fn standard() -> Result<Self, CatalogError> {
        let lessons = LESSONS
            .iter()
            .map(|draft| draft.validate())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_lessons(lessons)
    }

    /// Build a catalog from already validated lessons, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateLesson` when two lessons share an id.
    pub fn from_lessons(mut lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        lessons.sort_by_key(Lesson::id);
        if let Some(dup) = lessons.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(CatalogError::DuplicateLesson(dup[0].id()));
        }
        Ok(Self { lessons })
    }

    /// # Errors
    ///
    /// Returns `CatalogError::LessonNotFound` for ids outside the catalog.
    pub fn lesson(&self, id: LessonId) -> Result<&Lesson, CatalogError> {
        self.get(id).ok_or(CatalogError::LessonNotFound(id))
    }

    #[must_use]
    pub fn get(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons
            .binary_search_by_key(&id, Lesson::id)
            .ok()
            .map(|idx| &self.lessons[idx])
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Lessons strictly before `id`, in catalog order.
    pub fn lessons_before(&self, id: LessonId) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter().take_while(move |lesson| lesson.id() < id)
    }

    /// Every lesson fact, flattened in catalog order.
    #[must_use]
    pub fn all_facts(&self) -> Vec<&Fact> {
        self.lessons.iter().flat_map(Lesson::facts).collect()
    }
}

//
// ─── LESSON TABLE ──────────────────────────────────────────────────────────────
//

const fn series(
    id: u32,
    set: char,
    facts: &'static [&'static str],
    quiz_order: &'static [&'static str],
    rule_intro: Option<RuleIntro>,
) -> LessonDraft {
    LessonDraft {
        id,
        set,
        format: LessonFormat::SeriesSaying,
        facts,
        quiz_order,
        commutative_pairs: &[],
        rule_intro,
        intro: IntroVariant::None,
    }
}

const fn families(
    id: u32,
    set: char,
    facts: &'static [&'static str],
    quiz_order: &'static [&'static str],
    commutative_pairs: &'static [(&'static str, &'static str)],
    intro: IntroVariant,
) -> LessonDraft {
    LessonDraft {
        id,
        set,
        format: LessonFormat::FactFamilies,
        facts,
        quiz_order,
        commutative_pairs,
        rule_intro: None,
        intro,
    }
}

static LESSONS: [LessonDraft; 26] = [
    series(
        1,
        'A',
        &["2+1", "3+1", "4+1", "5+1"],
        &["3+1", "5+1", "2+1", "4+1"],
        Some(RuleIntro::PlusOne),
    ),
    families(
        2,
        'B',
        &["1+2", "1+3", "1+4", "1+5"],
        &["1+3", "2+1", "1+5", "4+1", "1+2", "3+1", "1+4", "5+1"],
        &[("1+2", "2+1"), ("1+3", "3+1"), ("1+4", "4+1"), ("1+5", "5+1")],
        IntroVariant::Full,
    ),
    series(
        3,
        'C',
        &["6+1", "7+1", "8+1", "9+1"],
        &["7+1", "9+1", "6+1", "8+1"],
        Some(RuleIntro::PlusOne),
    ),
    families(
        4,
        'D',
        &["1+6", "1+7", "1+8", "1+9"],
        &["1+7", "6+1", "1+9", "8+1", "1+6", "7+1", "1+8", "9+1"],
        &[("1+6", "6+1"), ("1+7", "7+1"), ("1+8", "8+1"), ("1+9", "9+1")],
        IntroVariant::Full,
    ),
    series(
        5,
        'E',
        &["2+2", "3+2", "4+2", "5+2"],
        &["3+2", "5+2", "2+2", "4+2"],
        None,
    ),
    families(
        6,
        'F',
        &["2+2", "2+3", "2+4", "2+5"],
        &["2+2", "2+2", "2+3", "3+2", "2+4", "4+2", "2+5", "5+2"],
        &[("2+2", "2+2"), ("2+3", "3+2"), ("2+4", "4+2"), ("2+5", "5+2")],
        IntroVariant::Short,
    ),
    series(
        7,
        'G',
        &["6+2", "7+2", "8+2", "9+2"],
        &["7+2", "9+2", "6+2", "8+2"],
        None,
    ),
    families(
        8,
        'H',
        &["2+6", "2+7", "2+8", "2+9"],
        &["2+6", "6+2", "2+7", "7+2", "2+8", "8+2", "2+9", "9+2"],
        &[("2+6", "6+2"), ("2+7", "7+2"), ("2+8", "8+2"), ("2+9", "9+2")],
        IntroVariant::Short,
    ),
    series(
        9,
        'I',
        &["3+3", "4+4", "5+5", "6+6"],
        &["4+4", "6+6", "3+3", "5+5"],
        None,
    ),
    families(
        10,
        'J',
        &["3+3", "4+4", "5+5", "6+6"],
        &["3+3", "3+3", "4+4", "4+4", "5+5", "5+5", "6+6", "6+6"],
        &[("3+3", "3+3"), ("4+4", "4+4"), ("5+5", "5+5"), ("6+6", "6+6")],
        IntroVariant::Short,
    ),
    series(
        11,
        'K',
        &["2+3", "3+3", "4+3", "5+3"],
        &["3+3", "5+3", "2+3", "4+3"],
        None,
    ),
    families(
        12,
        'L',
        &["3+2", "3+3", "3+4", "3+5"],
        &["3+2", "2+3", "3+3", "3+3", "3+4", "4+3", "3+5", "5+3"],
        &[("3+2", "2+3"), ("3+3", "3+3"), ("3+4", "4+3"), ("3+5", "5+3")],
        IntroVariant::None,
    ),
    series(
        13,
        'M',
        &["6+3", "7+3", "8+3", "9+3"],
        &["7+3", "9+3", "6+3", "8+3"],
        None,
    ),
    families(
        14,
        'N',
        &["3+6", "3+7", "3+8", "3+9"],
        &["3+6", "6+3", "3+7", "7+3", "3+8", "8+3", "3+9", "9+3"],
        &[("3+6", "6+3"), ("3+7", "7+3"), ("3+8", "8+3"), ("3+9", "9+3")],
        IntroVariant::None,
    ),
    series(
        15,
        'O',
        &[
            "1+0", "2+0", "3+0", "4+0", "5+0", "6+0", "7+0", "8+0", "9+0",
        ],
        &[
            "3+0", "6+0", "1+0", "8+0", "5+0", "9+0", "2+0", "7+0", "4+0",
        ],
        Some(RuleIntro::PlusZero),
    ),
    families(
        16,
        'P',
        &[
            "0+1", "0+2", "0+3", "0+4", "0+5", "0+6", "0+7", "0+8", "0+9",
        ],
        &["0+3", "3+0", "0+6", "6+0", "0+1", "1+0", "0+8", "8+0"],
        &[
            ("0+1", "1+0"),
            ("0+2", "2+0"),
            ("0+3", "3+0"),
            ("0+4", "4+0"),
            ("0+5", "5+0"),
            ("0+6", "6+0"),
            ("0+7", "7+0"),
            ("0+8", "8+0"),
            ("0+9", "9+0"),
        ],
        IntroVariant::None,
    ),
    series(
        17,
        'Q',
        &["5+4", "6+4", "7+4"],
        &["6+4", "5+4", "7+4"],
        None,
    ),
    families(
        18,
        'R',
        &["4+5", "4+6", "4+7"],
        &["4+6", "5+4", "4+7", "7+4", "4+5", "6+4"],
        &[("4+5", "5+4"), ("4+6", "6+4"), ("4+7", "7+4")],
        IntroVariant::None,
    ),
    series(
        19,
        'S',
        &["7+6", "8+6", "9+6"],
        &["8+6", "7+6", "9+6"],
        None,
    ),
    families(
        20,
        'T',
        &["6+7", "6+8", "6+9"],
        &["6+8", "7+6", "6+9", "9+6", "6+7", "8+6"],
        &[("6+7", "7+6"), ("6+8", "8+6"), ("6+9", "9+6")],
        IntroVariant::None,
    ),
    series(
        21,
        'U',
        &["7+4", "8+4", "9+4"],
        &["8+4", "7+4", "9+4"],
        None,
    ),
    families(
        22,
        'V',
        &["4+7", "4+8", "4+9"],
        &["4+7", "7+4", "4+8", "8+4", "4+9", "9+4"],
        &[("4+7", "7+4"), ("4+8", "8+4"), ("4+9", "9+4")],
        IntroVariant::None,
    ),
    series(
        23,
        'W',
        &["7+7", "8+7", "9+7"],
        &["8+7", "7+7", "9+7"],
        None,
    ),
    families(
        24,
        'X',
        &["7+7", "7+8", "7+9"],
        &["7+7", "7+7", "7+8", "8+7", "7+9", "9+7"],
        &[("7+7", "7+7"), ("7+8", "8+7"), ("7+9", "9+7")],
        IntroVariant::None,
    ),
    series(
        25,
        'Y',
        &["6+5", "7+5", "8+5", "9+5"],
        &["7+5", "9+5", "6+5", "8+5"],
        None,
    ),
    families(
        26,
        'Z',
        &["5+6", "5+7", "5+8", "5+9"],
        &["5+7", "6+5", "5+9", "9+5", "5+6", "7+5", "5+8", "8+5"],
        &[("5+6", "6+5"), ("5+7", "7+5"), ("5+8", "8+5"), ("5+9", "9+5")],
        IntroVariant::None,
    ),
];
