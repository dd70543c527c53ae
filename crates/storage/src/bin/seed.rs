use std::fmt;

use chrono::{DateTime, Duration, Utc};
use storage::repository::Storage;
use tutor_core::Catalog;
use tutor_core::model::{FactProgressDelta, LessonProgressPatch, Score};

const TRACK_LENGTH: u32 = 26;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    student: String,
    lessons: u32,
    score: Score,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidStudent { raw: String },
    InvalidLessons { raw: String },
    InvalidScore { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidStudent { raw } => write!(f, "invalid --student value: {raw:?}"),
            ArgsError::InvalidLessons { raw } => {
                write!(f, "invalid --lessons value (expected 0..={TRACK_LENGTH}): {raw}")
            }
            ArgsError::InvalidScore { raw } => {
                write!(f, "invalid --score value (expected 85..=100): {raw}")
            }
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_lessons(raw: String) -> Result<u32, ArgsError> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n <= TRACK_LENGTH)
        .ok_or(ArgsError::InvalidLessons { raw })
}

fn parse_score(raw: String) -> Result<Score, ArgsError> {
    raw.parse::<i64>()
        .ok()
        .and_then(|v| Score::from_persisted(v).ok())
        .filter(|s| s.passed())
        .ok_or(ArgsError::InvalidScore { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TUTOR_DB_URL")
            .unwrap_or_else(|_| "sqlite://tutor.sqlite3?mode=rwc".into());
        let mut student =
            std::env::var("TUTOR_STUDENT_ID").unwrap_or_else(|_| "demo-student".into());
        let mut lessons = TRACK_LENGTH;
        let mut score = Score::from_persisted(100).map_err(|_| ArgsError::InvalidScore {
            raw: "100".into(),
        })?;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--student" => {
                    let value = require_value(&mut args, "--student")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidStudent { raw: value });
                    }
                    student = value;
                }
                "--lessons" => {
                    lessons = parse_lessons(require_value(&mut args, "--lessons")?)?;
                }
                "--score" => {
                    score = parse_score(require_value(&mut args, "--score")?)?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            student,
            lessons,
            score,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Marks the first N lessons as completed and passed (demo progress).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://tutor.sqlite3?mode=rwc)");
    eprintln!("  --student <id>            Learner to seed (default: demo-student)");
    eprintln!("  --lessons <n>             Lessons to mark passed (default: 26)");
    eprintln!("  --score <percent>         Score recorded per lesson, 85..=100 (default: 100)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TUTOR_DB_URL, TUTOR_STUDENT_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url, &args.student).await?;
    let catalog = Catalog::standard()?;
    let now = args.now.unwrap_or_else(Utc::now);

    for lesson in catalog.lessons().iter().take(args.lessons as usize) {
        let completed_at = now - Duration::days(i64::from(args.lessons - lesson.id().value()));
        storage
            .progress
            .update_lesson_progress(
                lesson.id(),
                &LessonProgressPatch::step(1),
                completed_at - Duration::minutes(20),
            )
            .await?;
        for fact in lesson.facts() {
            storage
                .progress
                .update_fact_progress(
                    lesson.id(),
                    fact.id(),
                    FactProgressDelta::answer(true, 2_500),
                    completed_at,
                )
                .await?;
        }
        storage
            .progress
            .complete_lesson(lesson.id(), args.score, true, completed_at)
            .await?;
    }

    println!(
        "Seeded {} passed lessons at {} for {} into {}",
        args.lessons, args.score, args.student, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
