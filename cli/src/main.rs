//! Transcript CLI - binary entry point.
//!
//! Each invocation is one step of a session:
//!
//! ```text
//! main() -> startup checks -> load session -> Reconciler::open -> command -> save -> cleanup
//! ```
//!
//! Exit codes: 0 success, 1 recoverable error (message on stderr), 2 fatal
//! environment failure, 3 verification refused.

mod render;
mod session_file;
mod startup;
mod verifier;

use std::{
    fs::{self, OpenOptions},
    io::{self, BufRead, IsTerminal, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use transcript_engine::{
    ActionOutcome, AuthFailure, CourseField, CourseRecord, DisplayMode, FilterSpec, PollOutcome,
    ReconcileError, Reconciler, SessionAction, TranscriptConfig, VerificationFlow,
    available_filter_values, drive, replay,
};

use crate::startup::StartupChecklist;
use crate::verifier::CommandVerifier;

const PASSWORD_ENV: &str = "TRANSCRIPT_PASSWORD";
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Parser, Debug)]
#[command(name = "transcript")]
#[command(about = "Edit a transcript's course list against its baseline and compare GPA")]
#[command(version)]
struct Cli {
    /// Session document (JSON) to operate on
    #[arg(short, long, env = "TRANSCRIPT_SESSION")]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the working list and performance metrics
    Show {
        /// Show only the modified metric values
        #[arg(long)]
        modified_only: bool,
    },

    /// Add a course
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        lang: String,
        #[arg(long)]
        credit: i64,
        #[arg(long)]
        grade: String,
    },

    /// Remove a course by code
    Remove { code: Option<String> },

    /// Change fields of a course; unspecified fields keep their value
    Update {
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        credit: Option<i64>,
        #[arg(long)]
        grade: Option<String>,
    },

    /// Narrow the list to courses whose FIELD is one of VALUES
    Filter {
        #[arg(required_unless_present = "clear")]
        field: Option<String>,
        values: Vec<String>,
        /// Remove all active filters
        #[arg(long, conflicts_with = "field")]
        clear: bool,
    },

    /// List active filters and the values available to filter on
    Filters,

    /// Sort by a column; repeating the same column flips direction
    Sort { field: String },

    /// Re-derive the working list from the baseline and edit log
    Rebuild,

    /// Check credentials with the configured verifier
    Verify {
        #[arg(long)]
        match_id: String,
        #[arg(long)]
        username: String,
    },
}

enum Outcome {
    Done,
    Refused,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Stdout carries command output; without a log file, log nowhere.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.transcript/logs/transcript.log
    if let Some(config_path) = TranscriptConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("transcript.log"));
    }

    // Fallback: ./.transcript/logs/transcript.log
    candidates.push(PathBuf::from(".transcript").join("logs").join("transcript.log"));

    candidates
}

fn load_config() -> TranscriptConfig {
    match TranscriptConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("warning: {err}; using defaults");
            TranscriptConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config();
    let checklist = StartupChecklist::new(config.startup.clone().unwrap_or_default());
    if let Err(failure) = checklist.prepare() {
        tracing::error!("Startup failed: {failure}");
        eprintln!("fatal: {failure}");
        return ExitCode::from(2);
    }

    let result = run(cli, &config).await;
    checklist.clean_scratch();

    match result {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Refused) => ExitCode::from(3),
        Err(err) => {
            tracing::warn!("Command failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, config: &TranscriptConfig) -> Result<Outcome> {
    match cli.command {
        Commands::Verify { match_id, username } => verify(config, match_id, username).await,
        command => {
            let Some(path) = cli.session else {
                bail!("no session file given; pass --session or set TRANSCRIPT_SESSION");
            };
            run_session(&path, command, config)
        }
    }
}

fn run_session(path: &Path, command: Commands, config: &TranscriptConfig) -> Result<Outcome> {
    let scale = config
        .grading_scale()
        .context("invalid [grading] section in config")?;
    let document = session_file::load(path, &scale)?;
    let mut engine = Reconciler::open(document, scale.clone());

    let mut mode = DisplayMode::Both;
    let changed = match command {
        Commands::Show { modified_only } => {
            if modified_only {
                mode = mode.toggle();
            }
            false
        }
        Commands::Add {
            code,
            name,
            lang,
            credit,
            grade,
        } => {
            let record = CourseRecord::new(code, name, lang, credit, &grade, &scale)?;
            apply(&mut engine, SessionAction::Add(Some(record)))?
        }
        Commands::Remove { code } => apply(&mut engine, SessionAction::Remove(code))?,
        Commands::Update {
            code,
            name,
            lang,
            credit,
            grade,
        } => {
            let record = match code {
                Some(code) => {
                    let current = engine
                        .record(&code)
                        .ok_or(ReconcileError::NotFound { code: code.clone() })?;
                    let mut draft = current.to_draft();
                    if let Some(name) = name {
                        draft.name = name;
                    }
                    if let Some(lang) = lang {
                        draft.language = lang;
                    }
                    if let Some(credit) = credit {
                        draft.credit = credit;
                    }
                    if let Some(grade) = grade {
                        draft.grade = grade;
                    }
                    Some(draft.build(&scale)?)
                }
                None => None,
            };
            apply(&mut engine, SessionAction::Update(record))?
        }
        Commands::Filter {
            field,
            values,
            clear,
        } => {
            let action = match field {
                Some(field) if !clear => {
                    let field: CourseField = field.parse()?;
                    let spec = FilterSpec::parse(field, values.iter().map(String::as_str))?;
                    SessionAction::PushFilter(spec)
                }
                _ => SessionAction::ClearFilters,
            };
            apply(&mut engine, action)?
        }
        Commands::Filters => {
            let unfiltered = replay(engine.baseline(), engine.log(), engine.sort_spec(), &[]);
            print!(
                "{}",
                render::filter_values(&available_filter_values(&unfiltered), engine.filters())
            );
            return Ok(Outcome::Done);
        }
        Commands::Sort { field } => {
            let field: CourseField = field.parse()?;
            apply(&mut engine, SessionAction::SortColumn(field))?
        }
        Commands::Rebuild => apply(&mut engine, SessionAction::Rebuild)?,
        Commands::Verify { .. } => bail!("verify does not operate on a session"),
    };

    print!("{}", render::course_table(&engine));
    println!();
    print!("{}", render::performance_panel(&engine.performance(), mode));

    if changed {
        session_file::save(path, engine.document())?;
    }
    Ok(Outcome::Done)
}

/// Applies `action`, reporting whether the session needs saving.
fn apply(engine: &mut Reconciler, action: SessionAction) -> Result<bool> {
    match engine.apply(action)? {
        ActionOutcome::Applied => Ok(true),
        ActionOutcome::Unchanged => {
            eprintln!("nothing changed");
            Ok(false)
        }
        ActionOutcome::Cancelled => {
            eprintln!("no course selected");
            Ok(false)
        }
    }
}

async fn verify(config: &TranscriptConfig, match_id: String, username: String) -> Result<Outcome> {
    let Some(settings) = config.verification.as_ref() else {
        bail!("no [verification] section in config");
    };
    let Some(command) = settings.command.as_deref() else {
        bail!("no verification command configured");
    };
    let password = read_password()?;

    let verifier = Arc::new(CommandVerifier::new(command, settings.args.clone()));
    let mut flow = VerificationFlow::new(
        tokio::runtime::Handle::current(),
        verifier,
        match_id,
        config.animation_frames(),
    );
    flow.set_username(username);
    flow.set_password(password);
    if let Err(failure) = flow.submit() {
        return Err(failure.into());
    }

    let show_spinner = io::stderr().is_terminal();
    let outcome = drive(&mut flow, config.poll_interval(), |frame| {
        if show_spinner {
            eprint!("\r{} verifying...", SPINNER[frame % SPINNER.len()]);
            let _ = io::stderr().flush();
        }
    })
    .await;
    if show_spinner {
        eprint!("\r\x1b[K");
    }

    match outcome {
        PollOutcome::Authorized => {
            println!("verified");
            Ok(Outcome::Done)
        }
        PollOutcome::Failed(AuthFailure::NotPermitted) => {
            eprintln!("{}", AuthFailure::NotPermitted);
            Ok(Outcome::Refused)
        }
        PollOutcome::Failed(failure) => Err(failure.into()),
        PollOutcome::Idle | PollOutcome::Pending { .. } => {
            bail!("verification did not run")
        }
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        return Ok(password);
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
