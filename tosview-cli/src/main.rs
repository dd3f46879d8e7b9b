//! tosview - scheduler and timer inspector
//!
//! Decodes the task trace, ready queue, timer trace and timer table from a
//! captured target snapshot.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tosview_core::config::parse_override;
use tosview_core::{CommandRegistry, InspectorConfig, MemoryReader, RunTiming, Snapshot};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Inspect TinyOS scheduler and virtual timer state
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target snapshot (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Inspector configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Label a task id, as ID=LABEL (repeatable)
    #[arg(long = "task-name", value_name = "ID=LABEL")]
    task_names: Vec<String>,

    /// Label a timer id, as ID=LABEL (repeatable)
    #[arg(long = "timer-name", value_name = "ID=LABEL")]
    timer_names: Vec<String>,

    /// Measure END durations against each task's own RUN
    #[arg(long)]
    per_task_timing: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Cmd {
    /// Display the scheduler task trace
    TaskTrace,
    /// Display the scheduler ready queue
    TaskQueue,
    /// Display the virtual timer trace
    TimerTrace,
    /// Display the virtual timer descriptors
    TimerDump,
    /// List the available commands
    List,
    /// Read command names from stdin
    Repl,
}

impl Cmd {
    fn registry_name(&self) -> Option<&'static str> {
        match self {
            Cmd::TaskTrace => Some("task-trace"),
            Cmd::TaskQueue => Some("task-queue"),
            Cmd::TimerTrace => Some("timer-trace"),
            Cmd::TimerDump => Some("timer-dump"),
            Cmd::List | Cmd::Repl => None,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Merge the config file with command-line overrides
fn build_config(args: &Args) -> Result<InspectorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => InspectorConfig::load(path)?,
        None => InspectorConfig::new(),
    };
    for text in &args.task_names {
        let (id, label) = parse_override(text)?;
        config.tasks.insert(id, label);
    }
    for text in &args.timer_names {
        let (id, label) = parse_override(text)?;
        config.timers.insert(id, label);
    }
    if args.per_task_timing {
        config.run_timing = RunTiming::PerTask;
    }
    Ok(config)
}

/// Run one command and print its output.
///
/// Returns whether the command succeeded. Output write errors are returned.
fn run_command(
    registry: &CommandRegistry,
    name: &str,
    target: &dyn MemoryReader,
    out: &mut impl Write,
) -> io::Result<bool> {
    match registry.invoke(name, target) {
        Ok(lines) => {
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            Ok(true)
        }
        Err(e) => {
            for line in e.partial_lines() {
                writeln!(out, "{}", line)?;
            }
            if e.is_partial() {
                writeln!(out, "*** incomplete: {}", e)?;
            }
            error!("{}", e);
            Ok(false)
        }
    }
}

fn list(registry: &CommandRegistry, out: &mut impl Write) -> io::Result<()> {
    for command in registry.iter() {
        writeln!(out, "  {:12} {}", command.name(), command.description())?;
    }
    Ok(())
}

/// Run command names read from `input` until end of input or `quit`.
///
/// Returns false if any command failed.
fn repl(
    registry: &CommandRegistry,
    target: &dyn MemoryReader,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<bool> {
    writeln!(out, "\nCommands:")?;
    list(registry, out)?;
    writeln!(out, "  {:12} Exit\n", "quit")?;

    let mut ok = true;
    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "list" | "help" => list(registry, out)?,
            name => ok &= run_command(registry, name, target, out)?,
        }
        out.flush()?;
    }
    Ok(ok)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level))
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set up logging: {}", e);
    }

    info!("tosview {} starting", tosview_core::VERSION);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let snapshot = match Snapshot::load(&args.snapshot) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("snapshot {}: {}", args.snapshot.display(), e);
            return ExitCode::FAILURE;
        }
    };
    debug!("run timing: {:?}", config.run_timing);

    let registry = CommandRegistry::with_standard_commands(config);
    let mut out = io::stdout().lock();
    let result = match (&args.command, args.command.registry_name()) {
        (_, Some(name)) => run_command(&registry, name, &snapshot, &mut out),
        (Cmd::List, None) => list(&registry, &mut out).map(|()| true),
        (_, None) => repl(&registry, &snapshot, io::stdin().lock(), &mut out),
    };

    match result.and_then(|ok| out.flush().map(|()| ok)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("writing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
