//! Text-mode presentation: renders step activities and feeds typed answers
//! back to the services.

use std::error::Error;
use std::io::{self, BufRead, StdinLock, Write};

use services::{Activity, AppServices, LessonStatus, StepTransition, SubmitOutcome};
use tutor_core::evaluator::{AnswerPhase, QuestionAttempt, RawAnswer};
use tutor_core::model::{Ask, IntroVariant, LessonId};

const FULL_FAMILY_INTRO: &str = "Facts come in families! When you add two numbers, you can \
switch them around and still get the same answer. 1 + 2 = 3 and 2 + 1 = 3. We call the \
switched fact the turnaround.";
const SHORT_FAMILY_INTRO: &str =
    "Remember: every fact has a turnaround. Switch the numbers and the sum stays the same.";

pub struct Terminal {
    input: StdinLock<'static>,
}

impl Terminal {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }

    /// `None` on end of input or when the learner types `q`.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        print!("{text}");
        io::stdout().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim().to_string();
        Ok((line != "q").then_some(line))
    }
}

pub async fn print_overview(app: &AppServices) -> Result<(), Box<dyn Error>> {
    let overview = app.lessons().lesson_overview().await?;
    let offered = overview.current_pair();
    for summary in overview.lessons() {
        let status = match &summary.status {
            LessonStatus::NotStarted => "not started".to_string(),
            LessonStatus::InProgress { label, .. } => format!("in progress (step {label})"),
            LessonStatus::Passed { score } => format!("passed {}", score_text(*score)),
            LessonStatus::Failed { score } => format!("try again ({})", score_text(*score)),
        };
        let marker = if offered.contains(&summary.lesson_id) { '>' } else { ' ' };
        println!(
            "{marker}{:>2}  {}  {:<14} {status}",
            summary.lesson_id.value(),
            summary.set,
            summary.format.as_str()
        );
    }
    if !offered.is_empty() {
        let ids: Vec<String> = offered.iter().map(|id| id.value().to_string()).collect();
        println!("\nUp next: {}.", ids.join(" and "));
    }
    if overview.assessment_ready() {
        println!("\nAll lessons passed. The final assessment is open.");
    } else {
        println!(
            "\n{} of {} lessons passed.",
            overview.passed_count(),
            overview.lessons().len()
        );
    }
    Ok(())
}

fn score_text(score: Option<tutor_core::model::Score>) -> String {
    score.map_or_else(|| "-".to_string(), |s| s.to_string())
}

pub async fn run_lesson(
    app: &AppServices,
    id: LessonId,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn Error>> {
    let lessons = app.lessons();
    let mut run = lessons.open_lesson(id).await?;
    println!("Lesson {} (set {})", run.lesson().id(), run.lesson().set());

    while !run.is_finished() {
        let mut session = lessons.present_step(&mut run)?;
        println!("\n[{}] {}", session.label(), session.kind().title());
        render_activity(session.activity());

        if session.run().is_empty() && terminal.prompt("(Enter to continue) ")?.is_none() {
            println!("Progress saved.");
            return Ok(());
        }

        while let Some(attempt) = session.run().current() {
            let text = question_prompt(attempt);
            let expected = expected_text(attempt);
            let wants_pair = attempt.phase() == AnswerPhase::AwaitingOperands;
            let Some(line) = terminal.prompt(&text)? else {
                println!("Progress saved.");
                return Ok(());
            };
            let raw = to_raw(&line, wants_pair);
            match lessons.submit_answer(&mut session, &raw).await? {
                SubmitOutcome::Rejected => println!("Type an answer first."),
                SubmitOutcome::SumUnlocked => println!("Yes! Now the sum."),
                SubmitOutcome::Answered { record, restarted } => {
                    if record.correct {
                        println!("Correct!");
                    } else {
                        println!("Not quite. It was {expected}.");
                    }
                    if restarted {
                        println!("Let's start this one over.");
                    }
                }
            }
        }

        if let StepTransition::LessonCompleted { score, passed, .. } =
            lessons.complete_step(&mut run, &session).await?
        {
            if passed {
                println!("\nYou scored {score}. Lesson passed!");
            } else {
                println!("\nYou scored {score}. You need 85% to pass.");
                let again = terminal.prompt("Try again? (y/n) ")?;
                if again.is_some_and(|a| a.eq_ignore_ascii_case("y")) {
                    lessons.retry(&mut run).await?;
                }
            }
        }
    }
    Ok(())
}

pub async fn run_assessment(
    app: &AppServices,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn Error>> {
    let assessment = app.assessment();
    let mut session = assessment.start().await?;
    println!("Final assessment: {} questions.", session.run().len());

    while let Some(attempt) = session.run().current() {
        let text = question_prompt(attempt);
        let wants_pair = attempt.phase() == AnswerPhase::AwaitingOperands;
        let Some(line) = terminal.prompt(&text)? else {
            println!("Assessment abandoned.");
            return Ok(());
        };
        if assessment
            .submit_answer(&mut session, &to_raw(&line, wants_pair))
            .await?
            == SubmitOutcome::Rejected
        {
            println!("Type an answer first.");
        }
    }

    let outcome = assessment.finish(&mut session)?;
    let verdict = if outcome.passed { "passed" } else { "not passed" };
    println!("\nAssessment score: {} ({verdict}).", outcome.score);
    Ok(())
}

fn render_activity(activity: &Activity) {
    match activity {
        Activity::ShowFacts { facts } => {
            for fact in facts {
                println!("  {} = {}", fact.display(), fact.result());
            }
        }
        Activity::Rule { script, .. } => println!("{script}"),
        Activity::FamilyIntro { variant } => match variant {
            IntroVariant::Full => println!("{FULL_FAMILY_INTRO}"),
            IntroVariant::Short => println!("{SHORT_FAMILY_INTRO}"),
            IntroVariant::None => {}
        },
        Activity::ShowFamilies { pairs } => {
            for pair in pairs {
                let (base, turnaround) = (pair.base(), pair.turnaround());
                println!(
                    "  {} = {}    {} = {}",
                    base.display(),
                    base.result(),
                    turnaround.display(),
                    turnaround.result()
                );
            }
        }
        Activity::Answer {
            scored,
            restarts_on_error,
        } => {
            if *scored {
                println!("This one counts toward your score.");
            }
            if *restarts_on_error {
                println!("Get them all right in a row.");
            }
        }
    }
}

fn question_prompt(attempt: &QuestionAttempt) -> String {
    let question = attempt.question();
    let fact = &question.fact;
    match (&question.ask, attempt.phase()) {
        (Ask::CompleteTurnaround { turnaround }, _) => format!(
            "{} = {}, so {} + ? = {}: ",
            fact.display(),
            fact.result(),
            turnaround.operand1(),
            turnaround.result()
        ),
        (Ask::Turnaround { .. }, AnswerPhase::AwaitingOperands) => format!(
            "{} = {}. Its turnaround (two numbers): ",
            fact.display(),
            fact.result()
        ),
        (Ask::Turnaround { turnaround, .. }, _) => format!("{} = ", turnaround.display()),
        (Ask::Sum, _) => format!("{} = ", fact.display()),
    }
}

fn expected_text(attempt: &QuestionAttempt) -> String {
    let question = attempt.question();
    match (&question.ask, attempt.phase()) {
        (Ask::CompleteTurnaround { turnaround }, _) => turnaround.operand2().to_string(),
        (Ask::Turnaround { turnaround, .. }, AnswerPhase::AwaitingOperands) => {
            turnaround.display()
        }
        _ => question.fact.result().to_string(),
    }
}

/// Operand pairs may be typed as "2 1", "2,1" or "2+1".
fn to_raw(line: &str, wants_pair: bool) -> RawAnswer {
    if !wants_pair {
        return RawAnswer::value(line);
    }
    let mut parts = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty());
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();
    RawAnswer::pair(first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::{Fact, ReviewQuestion};

    #[test]
    fn pairs_accept_common_separators() {
        for line in ["2 1", "2,1", "2+1", " 2 , 1 "] {
            assert_eq!(to_raw(line, true), RawAnswer::pair("2", "1"));
        }
        assert_eq!(to_raw("3", true), RawAnswer::pair("3", ""));
        assert_eq!(to_raw("3", false), RawAnswer::value("3"));
    }

    #[test]
    fn prompts_follow_answer_phase() {
        let base = Fact::new(1, 2).unwrap();
        let question =
            ReviewQuestion::turnaround(base.clone(), base.swapped(), LessonId::new(2), true);
        let attempt = QuestionAttempt::new(question);
        assert_eq!(question_prompt(&attempt), "1 + 2 = 3. Its turnaround (two numbers): ");
        assert_eq!(expected_text(&attempt), "2 + 1");
    }
}
