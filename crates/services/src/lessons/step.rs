use std::fmt;

use tutor_core::model::{CommutativePair, Fact, IntroVariant, Lesson, LessonId, RuleIntro};
use tutor_core::sequencer::{StepKind, StepPlan};

use crate::run::QuestionRun;

/// Identifies one presentation of a step. Completing a step with a ticket
/// that is no longer current is ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepTicket(u64);

impl fmt::Debug for StepTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepTicket({})", self.0)
    }
}

/// Content handed to the presentation layer for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    /// Facts read or shown to the learner, in catalog order.
    ShowFacts { facts: Vec<Fact> },
    Rule { rule: RuleIntro, script: &'static str },
    FamilyIntro { variant: IntroVariant },
    /// Each fact next to its turnaround.
    ShowFamilies { pairs: Vec<CommutativePair> },
    /// Answer the questions of the step's run.
    Answer {
        scored: bool,
        restarts_on_error: bool,
    },
}

impl Activity {
    #[must_use]
    pub fn for_step(lesson: &Lesson, kind: StepKind) -> Self {
        match kind {
            StepKind::Modeled | StepKind::ReadTogether => Activity::ShowFacts {
                facts: lesson.facts().to_vec(),
            },
            StepKind::RuleIntroduction(rule) => Activity::Rule {
                rule,
                script: rule.text(),
            },
            StepKind::FamilyIntroduction(variant) => Activity::FamilyIntro { variant },
            StepKind::Introduce => Activity::ShowFamilies {
                pairs: lesson.commutative_pairs().to_vec(),
            },
            kind => Activity::Answer {
                scored: kind.is_scored(),
                restarts_on_error: kind.restarts_on_error(),
            },
        }
    }
}

/// One presented step: descriptor plus the question run that backs it.
#[derive(Debug, Clone)]
pub struct StepSession {
    pub(crate) ticket: StepTicket,
    pub(crate) lesson_id: LessonId,
    pub(crate) step: u8,
    pub(crate) kind: StepKind,
    pub(crate) label: String,
    pub(crate) activity: Activity,
    pub(crate) run: QuestionRun,
}

impl StepSession {
    #[must_use]
    pub fn ticket(&self) -> StepTicket {
        self.ticket
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn step(&self) -> u8 {
        self.step
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Header label, e.g. "3" or "R".
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    #[must_use]
    pub fn run(&self) -> &QuestionRun {
        &self.run
    }

    /// Steps without questions are finished once shown.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.run.is_finished()
    }
}

/// A lesson being worked through.
#[derive(Debug, Clone)]
pub struct LessonRun {
    lesson: Lesson,
    plan: StepPlan,
    current_step: u8,
    next_ticket: u64,
    active: Option<StepTicket>,
    finished: Option<bool>,
}

impl LessonRun {
    pub(crate) fn new(lesson: Lesson, plan: StepPlan, current_step: u8) -> Self {
        Self {
            lesson,
            plan,
            current_step,
            next_ticket: 0,
            active: None,
            finished: None,
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    #[must_use]
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// `Some(passed)` once the terminal step has been completed.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        self.finished
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub(crate) fn issue_ticket(&mut self) -> StepTicket {
        self.next_ticket += 1;
        let ticket = StepTicket(self.next_ticket);
        self.active = Some(ticket);
        ticket
    }

    pub(crate) fn accepts(&self, session: &StepSession) -> bool {
        self.finished.is_none()
            && self.active == Some(session.ticket)
            && session.step == self.current_step
            && session.lesson_id == self.lesson.id()
    }

    pub(crate) fn move_to(&mut self, step: u8) {
        self.current_step = step;
        self.active = None;
    }

    pub(crate) fn finish(&mut self, passed: bool) {
        self.finished = Some(passed);
        self.active = None;
    }

    pub(crate) fn restart(&mut self, step: u8) {
        self.move_to(step);
        self.finished = None;
    }
}
