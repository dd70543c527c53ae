mod fact;
mod ids;
mod lesson;
mod progress;
mod question;
mod score;

pub use ids::{FactId, LessonId, ParseIdError};

pub use fact::{Fact, FactError, HIGH_OPERAND_THRESHOLD, MAX_OPERAND, expected_digits};
pub use lesson::{
    CommutativePair, IntroVariant, Lesson, LessonDraft, LessonError, LessonFormat, RuleIntro,
};
pub use progress::{
    DEFAULT_STEP, FactProgress, FactProgressDelta, LessonProgress, LessonProgressPatch, SyncFact,
    UserProgress,
};
pub use question::{Ask, ReviewQuestion};
pub use score::{MASTERY_THRESHOLD, Score, ScoreError};
