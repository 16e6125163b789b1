use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use services::{AppServices, Clock, PODIUM_SIZE, QuizConfig};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod play;

use play::Terminal;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTop { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTop { raw } => write!(f, "invalid --top value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [play]            [--db <sqlite_url>] [--base-url <url>]");
    eprintln!("  quiz leaderboard       [--db <sqlite_url>] [--top <n>]");
    eprintln!("  quiz clear-leaderboard [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --top {PODIUM_SIZE}");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_URL, QUIZ_FETCH_TIMEOUT_SECS, QUIZ_THROTTLE_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Leaderboard,
    ClearLeaderboard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "leaderboard" => Some(Self::Leaderboard),
            "clear-leaderboard" => Some(Self::ClearLeaderboard),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    base_url: Option<String>,
    top: usize,
}

impl Args {
    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = match env_db_url.filter(|value| !value.trim().is_empty()) {
            Some(value) => resolve_db_url(&value)?,
            None => DEFAULT_DB_URL.to_owned(),
        };
        let mut base_url = None;
        let mut top = PODIUM_SIZE;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    db_url = resolve_db_url(&require_value(args, "--db")?)?;
                }
                "--base-url" if cmd == Command::Play => {
                    base_url = Some(require_value(args, "--base-url")?);
                }
                "--top" if cmd == Command::Leaderboard => {
                    let value = require_value(args, "--top")?;
                    top = match value.parse::<usize>() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(ArgsError::InvalidTop { raw: value }),
                    };
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
            base_url,
            top,
        })
    }
}

/// Turn a `--db` / `QUIZ_DB_URL` value (a bare path or a `sqlite:` URL) into an
/// absolute `sqlite://` URL.
fn resolve_db_url(raw: &str) -> Result<String, ArgsError> {
    let trimmed = raw.trim();
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: raw.to_owned(),
        });
    }

    let path = Path::new(path);
    if path.is_absolute() {
        return Ok(format!("sqlite://{}", path.display()));
    }
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(format!("sqlite://{}", base.join(path).display()))
}

/// Create the directory holding the database file; the file itself is
/// created on connect.
fn ensure_db_dir(db_url: &str) -> io::Result<()> {
    let path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
    let path = Path::new(path.split('?').next().unwrap_or(path));
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Log to stderr so quiz output on stdout stays clean. `RUST_LOG` overrides `warn`.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter, std::env::var("QUIZ_DB_URL").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = QuizConfig::from_env()?;
    if let Some(base_url) = parsed.base_url {
        config = config.with_api_url(base_url)?;
    }
    debug!(db = %parsed.db_url, api = %config.api_url, "configuration loaded");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    ensure_db_dir(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, config, Clock::system()).await?;

    let stdin = io::stdin();
    let mut term = Terminal::new(stdin.lock(), io::stdout());

    match cmd {
        Command::Play => play::play(&services, &mut term).await?,
        Command::Leaderboard => {
            play::show_leaderboard(&services.leaderboard(), parsed.top, &mut term).await?;
        }
        Command::ClearLeaderboard => {
            if term.confirm("Clear the leaderboard? This cannot be undone. [y/N] ")? {
                services.leaderboard().clear().await?;
                info!("leaderboard cleared");
                term.say("Leaderboard cleared.")?;
            } else {
                term.say("Leaderboard kept.")?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(cmd, &mut iter, None)
    }

    #[test]
    fn defaults_apply_without_flags() {
        let args = parse(Command::Play, &[]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.base_url, None);
        assert_eq!(args.top, PODIUM_SIZE);
    }

    #[test]
    fn flags_are_scoped_to_their_command() {
        let args = parse(Command::Leaderboard, &["--top", "10", "--db", "/var/quiz.db"]).unwrap();
        assert_eq!(args.top, 10);
        assert_eq!(args.db_url, "sqlite:///var/quiz.db");

        assert!(matches!(
            parse(Command::Play, &["--top", "10"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(Command::Leaderboard, &["--top", "0"]),
            Err(ArgsError::InvalidTop { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--base-url"]),
            Err(ArgsError::MissingValue { flag: "--base-url" })
        ));
    }

    #[test]
    fn env_db_url_is_normalized() {
        let mut iter = std::iter::empty();
        let args = Args::parse(Command::Play, &mut iter, Some("/tmp/q.sqlite3".into())).unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/q.sqlite3");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = resolve_db_url("sqlite:data/quiz.sqlite3").unwrap();
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));

        assert_eq!(
            resolve_db_url("sqlite:///srv/quiz.sqlite3").unwrap(),
            "sqlite:///srv/quiz.sqlite3"
        );
        assert!(matches!(
            resolve_db_url("  "),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--db", "sqlite://"]),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
    }
}
