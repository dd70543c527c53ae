use std::fmt;
use std::time::Duration;

use services::{AppServices, Clock, RandomSource};
use tracing_subscriber::EnvFilter;
use tutor_core::model::LessonId;

mod driver;

const GRADEBOOK_FLUSH_LIMIT: Duration = Duration::from_secs(20);

use driver::Terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidStudent { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid lesson id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidStudent { raw } => write!(f, "invalid --student value: {raw:?}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
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

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- lessons      [options]");
    eprintln!("  cargo run -p app -- lesson <id>  [options]");
    eprintln!("  cargo run -p app -- assessment   [options]");
    eprintln!("  cargo run -p app -- export       [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   default sqlite://tutor.sqlite3");
    eprintln!("  --student <id>      default demo-student");
    eprintln!("  --seed <u64>        repeatable question order");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_STUDENT_ID, TUTOR_SEED");
    eprintln!("  TUTOR_GRADEBOOK_URL, TUTOR_GRADEBOOK_TOKEN");
    eprintln!("  RUST_LOG (default info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Lessons,
    Lesson(LessonId),
    Assessment,
    Export,
}

impl Command {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(first) = args.next() else {
            return Ok(None);
        };
        let command = match first.as_str() {
            "lessons" => Self::Lessons,
            "lesson" => {
                let raw = require_value(args, "lesson")?;
                let id = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ArgsError::InvalidLessonId { raw: raw.clone() })?;
                Self::Lesson(LessonId::new(id))
            }
            "assessment" => Self::Assessment,
            "export" => Self::Export,
            _ => return Err(ArgsError::UnknownArg(first)),
        };
        Ok(Some(command))
    }
}

struct Args {
    db_url: String,
    student: String,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TUTOR_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://tutor.sqlite3".into(), normalize_sqlite_url);
        let mut student =
            std::env::var("TUTOR_STUDENT_ID").unwrap_or_else(|_| "demo-student".into());
        let mut seed = match std::env::var("TUTOR_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_seed(raw)?),
            _ => None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--student" => {
                    let value = require_value(args, "--student")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidStudent { raw: value });
                    }
                    student = value;
                }
                "--seed" => {
                    seed = Some(parse_seed(require_value(args, "--seed")?)?);
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
            seed,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();
    if matches!(argv.peek().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let parsed = Command::parse(&mut argv).and_then(|command| {
        let args = Args::parse(&mut argv)?;
        Ok((command, args))
    });
    let (command, args) = match parsed {
        Ok((Some(command), args)) => (command, args),
        Ok((None, _)) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Open + migrate SQLite here so core and services never touch the filesystem.
    prepare_sqlite_file(&args.db_url)?;
    let app = AppServices::new_sqlite(
        &args.db_url,
        &args.student,
        Clock::System,
        RandomSource::from_seed(args.seed),
    )
    .await?;
    tracing::debug!(student = %args.student, db = %args.db_url, "services ready");

    let mut terminal = Terminal::stdin();
    match command {
        Command::Lessons => driver::print_overview(&app).await?,
        Command::Lesson(id) => driver::run_lesson(&app, id, &mut terminal).await?,
        Command::Assessment => driver::run_assessment(&app, &mut terminal).await?,
        Command::Export => {
            let facts = app.storage().progress.export_facts_for_sync().await?;
            println!("{}", serde_json::to_string_pretty(&facts)?);
        }
    }

    let delivered = app.gradebook().flush(GRADEBOOK_FLUSH_LIMIT).await;
    tracing::debug!(delivered, "gradebook flushed");
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
