//! Top-level CLI definition and command dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use academy_calendar::core::config::Config;
use academy_calendar::core::errors::CalError;
use academy_calendar::layout::capacity::{CapacityStatus, classify_with};
use academy_calendar::layout::columns::ClusterMode;
use academy_calendar::layout::overlap::detect_overlaps;
use academy_calendar::layout::pipeline::{PositionedEvent, RenderedWeek, render_normalized};
use academy_calendar::layout::view::{RenderSettings, ViewContext};
use academy_calendar::layout::week::EventFilters;
use academy_calendar::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use academy_calendar::model::record::Normalized;
use academy_calendar::model::source::{EventSource, FetchError, JsonFileSource};

/// Academy calendar layout engine.
#[derive(Debug, Parser)]
#[command(
    name = "acal",
    author,
    version,
    about = "Academy Calendar - session layout for day and week grids",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Lay out a day or week of sessions from an events file.
    Render(RenderArgs),
    /// Show which sessions intersect on one day.
    Overlaps(OverlapsArgs),
    /// Classify enrollment against a minimum viable class size.
    Classify(ClassifyArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// JSON file with session records (array or `{"events": [...]}`).
    #[arg(long, value_name = "FILE")]
    events: PathBuf,
    /// Any date inside the week to show (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,
    /// Show only the given date instead of the whole week.
    #[arg(long)]
    day: bool,
    /// Restrict to one program id.
    #[arg(long, value_name = "ID")]
    program: Option<String>,
    /// Restrict to one coach id.
    #[arg(long, value_name = "ID")]
    coach: Option<String>,
    /// Restrict to one location id.
    #[arg(long, value_name = "ID")]
    location: Option<String>,
    /// Override `layout.cluster_mode` (pairwise|connected).
    #[arg(long, value_name = "MODE")]
    cluster_mode: Option<ClusterMode>,
    /// Exit with a partial-failure code if any record was rejected.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Args)]
struct OverlapsArgs {
    /// JSON file with session records.
    #[arg(long, value_name = "FILE")]
    events: PathBuf,
    /// Day to inspect.
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: NaiveDate,
}

#[derive(Debug, Clone, Args)]
struct ClassifyArgs {
    /// Current enrollment.
    enrolled: u32,
    /// Minimum viable class size.
    min_viable: u32,
    /// Override `capacity.at_risk_percent`.
    #[arg(long, value_name = "PCT")]
    at_risk_percent: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Rendered, but some records were rejected under `--strict`.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) | Self::Json(_) => 2,
            Self::Partial(_) => 3,
        }
    }
}

impl From<CalError> for CliError {
    fn from(err: CalError) -> Self {
        match err {
            CalError::Io { .. } | CalError::Serialization { .. } => Self::Runtime(err.to_string()),
            _ => Self::User(err.to_string()),
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Io { .. } => Self::Runtime(err.to_string()),
            FetchError::NotFound { .. } | FetchError::Malformed { .. } => {
                Self::User(err.to_string())
            }
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Render(args) => run_render(cli, args),
        Command::Overlaps(args) => run_overlaps(cli, args),
        Command::Classify(args) => run_classify(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let config = Config::load(cli.config.as_deref())?;
    let mut activity = open_activity_log(&config)?;

    let mut settings = RenderSettings::from_config(&config)?;
    if let Some(mode) = args.cluster_mode {
        settings.cluster_mode = mode;
    }

    let anchor = args.date.unwrap_or_else(|| Local::now().date_naive());
    let base = if args.day {
        ViewContext::day_of(anchor)
    } else {
        ViewContext::week_of(anchor)
    };
    let ctx = base.with_filters(EventFilters {
        program: args.program.clone(),
        coach: args.coach.clone(),
        location: args.location.clone(),
    });

    let normalized = fetch(
        &args.events,
        ctx.week_start(settings.week_starts_on),
        activity.as_mut(),
    )?;
    let week = render_normalized(&normalized, &ctx, &settings);

    if let Some(writer) = activity.as_mut() {
        for rejected in &week.rejected {
            writer.write_entry(&LogEntry::rejected(rejected));
        }
        let mut entry = LogEntry::new(EventType::RenderComplete, Severity::Info);
        entry.week_start = Some(week.week_start);
        entry.event_count = Some(week.event_count());
        entry.rejected_count = Some(week.rejected.len());
        entry.fingerprint = normalized.events.fingerprint().ok();
        entry.duration_ms = u64::try_from(started.elapsed().as_millis()).ok();
        writer.write_entry(&entry);
    }

    match output_mode(cli) {
        OutputMode::Human => print_week_human(&week),
        OutputMode::Json => {
            let payload = json!({
                "command": "render",
                "cluster_mode": settings.cluster_mode,
                "activity_log": activity.as_ref().map_or("disabled", JsonlWriter::state),
                "week": serde_json::to_value(&week)?,
            });
            write_json_line(&payload)?;
        }
    }

    if args.strict && !week.rejected.is_empty() {
        return Err(CliError::Partial(format!(
            "{} record(s) rejected; rendered {} session(s)",
            week.rejected.len(),
            week.event_count()
        )));
    }
    Ok(())
}

fn fetch(
    events: &std::path::Path,
    week_start: NaiveDate,
    activity: Option<&mut JsonlWriter>,
) -> Result<Normalized, CliError> {
    match JsonFileSource::new(events).fetch_normalized(week_start) {
        Ok(normalized) => Ok(normalized),
        Err(err) => {
            if let Some(writer) = activity {
                let mut entry = LogEntry::new(EventType::FetchFailed, Severity::Critical);
                entry.week_start = Some(week_start);
                entry.error_code = Some(err.code().to_string());
                entry.error_message = Some(err.to_string());
                writer.write_entry(&entry);
            }
            Err(err.into())
        }
    }
}

fn print_week_human(week: &RenderedWeek) {
    println!(
        "{} {} ({} sessions)",
        "Week of".bold(),
        week.week_start.format("%Y-%m-%d"),
        week.event_count()
    );
    for day in &week.days {
        println!();
        println!("{}", day.date.format("%a %Y-%m-%d").to_string().bold());
        if day.events.is_empty() {
            println!("  {}", "(no sessions)".dimmed());
        }
        for event in &day.events {
            print_event_human(event);
        }
    }

    if !week.status_counts.is_empty() {
        println!();
        let summary: Vec<String> = week
            .status_counts
            .iter()
            .map(|(status, count)| format!("{}: {count}", status_label(*status)))
            .collect();
        println!("{}", summary.join("  "));
    }
    if !week.rejected.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} record(s) skipped:", week.rejected.len()).yellow()
        );
        for rejected in &week.rejected {
            let id = rejected.event_id.as_deref().unwrap_or("<no id>");
            println!(
                "  #{} {id}: [{}] {}",
                rejected.index, rejected.code, rejected.reason
            );
        }
    }
}

fn print_event_human(event: &PositionedEvent) {
    println!(
        "  {}-{}  {:<28} col {}/{}  {:<10} {}/{}  {} · {}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M"),
        truncate(&event.title, 28),
        event.layout.column + 1,
        event.layout.concurrency,
        status_label(event.capacity_status),
        event.enrollment_count,
        event.capacity,
        event.location_label,
        event.primary_assignee_label,
    );
}

fn status_label(status: CapacityStatus) -> String {
    match status {
        CapacityStatus::Healthy => status.label().green().to_string(),
        CapacityStatus::AtRisk => status.label().yellow().to_string(),
        CapacityStatus::Critical => status.label().red().bold().to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn open_activity_log(config: &Config) -> Result<Option<JsonlWriter>, CliError> {
    if !config.telemetry.enabled {
        return Ok(None);
    }
    let mut writer = JsonlWriter::open(JsonlConfig::from_config(config));
    let mut entry = LogEntry::new(EventType::ConfigLoaded, Severity::Info);
    entry.fingerprint = Some(config.stable_hash()?);
    entry.details = Some(config.paths.config_file.display().to_string());
    writer.write_entry(&entry);
    Ok(Some(writer))
}

// ---------------------------------------------------------------------------
// overlaps
// ---------------------------------------------------------------------------

fn run_overlaps(cli: &Cli, args: &OverlapsArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let mut activity = open_activity_log(&config)?;
    let normalized = fetch(&args.events, args.date, activity.as_mut())?;

    let day: Vec<_> = normalized
        .events
        .events()
        .iter()
        .filter(|e| e.interval.start_date() == args.date)
        .cloned()
        .collect();
    let overlaps = detect_overlaps(&day);

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{} {}", "Overlaps on".bold(), args.date.format("%a %Y-%m-%d"));
            if overlaps.is_empty() {
                println!("  {}", "(no sessions)".dimmed());
            }
            for (id, others) in &overlaps {
                let ids: Vec<&str> = others.iter().map(|e| e.id.as_str()).collect();
                if ids.is_empty() {
                    println!("  {id}: {}", "none".dimmed());
                } else {
                    println!("  {id}: {}", ids.join(", ").yellow());
                }
            }
        }
        OutputMode::Json => {
            let map: serde_json::Map<String, Value> = overlaps
                .iter()
                .map(|(id, others)| {
                    let ids: Vec<Value> = others.iter().map(|e| json!(e.id)).collect();
                    (id.clone(), Value::Array(ids))
                })
                .collect();
            let payload = json!({
                "command": "overlaps",
                "date": args.date,
                "overlaps": map,
                "rejected": normalized.rejected.len(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

fn run_classify(cli: &Cli, args: &ClassifyArgs) -> Result<(), CliError> {
    let percent = match args.at_risk_percent {
        Some(p) if p > 100 => {
            return Err(CliError::User(format!(
                "--at-risk-percent must be in [0, 100], got {p}"
            )));
        }
        Some(p) => p,
        None => Config::load(cli.config.as_deref())?.capacity.at_risk_percent,
    };
    let status = classify_with(args.enrolled, args.min_viable, percent);

    match output_mode(cli) {
        OutputMode::Human => println!("{}", status_label(status)),
        OutputMode::Json => {
            let payload = json!({
                "command": "classify",
                "enrolled": args.enrolled,
                "min_viable": args.min_viable,
                "at_risk_percent": percent,
                "status": status,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ---------------------------------------------------------------------------
// output helpers
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("ACAL_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
