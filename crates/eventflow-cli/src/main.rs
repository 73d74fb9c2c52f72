//! Command-line entry point for Eventflow.
//!
//! Unlike the async entry points elsewhere in this framework, this
//! binary is plain synchronous `fn main`: the aggregator core has no
//! suspension points (§5), and the only I/O here is ordinary file reads
//! and writes performed by discovery and the reporter.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use eventflow_aggregator::EventAggregator;
use eventflow_discovery::{discover_bundles, TASKS_DIRECTORY_ENV_VAR};
use eventflow_reporter::{write_completion_report, CompletionRunReport};
use eventflow_store_memory::InMemoryTaskStore;
use eventflow_types::{RawEvent, ValueMap};

/// Eventflow: fold lifecycle events into task records.
#[derive(Debug, Parser)]
#[command(name = "eventflow", version, about)]
struct Cli {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover task bundles under one or more search directories.
    Discover {
        /// Directories to scan for `bundle.json` manifests.
        #[arg(long = "search-dir")]
        search_dirs: Vec<PathBuf>,
    },
    /// Fold an NDJSON event stream through a fresh aggregator.
    Run {
        /// Path to an NDJSON event file, or `-` to read stdin.
        #[arg(long)]
        events: String,
        /// Directory to write the run report into.
        #[arg(long = "report-dir")]
        report_dir: PathBuf,
        /// After the input is exhausted, synthesize terminal events for
        /// any task still incomplete and fold those in too.
        #[arg(long)]
        synthesize_incomplete: bool,
    },
    /// Load and pretty-print a completion report.
    ShowReport {
        /// Path to a `completion_report.json` or `run.json`.
        path: PathBuf,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Discover { search_dirs } => run_discover(&search_dirs),
        Command::Run { events, report_dir, synthesize_incomplete } => {
            run_events(&events, &report_dir, synthesize_incomplete)
        }
        Command::ShowReport { path } => run_show_report(&path),
    }
}

fn run_discover(search_dirs: &[PathBuf]) -> Result<()> {
    if std::env::var(TASKS_DIRECTORY_ENV_VAR).is_err() {
        info!(env_var = TASKS_DIRECTORY_ENV_VAR, "no extra tasks directory configured");
    }
    let bundles = discover_bundles(search_dirs);
    info!(count = bundles.len(), "discovered task bundles");
    for bundle in &bundles {
        println!("{}\t{}", bundle.name, bundle.path.display());
    }
    Ok(())
}

fn read_events(source: &str) -> Result<Vec<RawEvent>> {
    let reader: Box<dyn BufRead> = if source == "-" {
        Box::new(std::io::BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(source).with_context(|| format!("opening event source {source}"))?;
        Box::new(std::io::BufReader::new(file))
    };

    let mut events = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {} of {source}", line_num + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: ValueMap = serde_json::from_str(&line)
            .with_context(|| format!("parsing event on line {} of {source}", line_num + 1))?;
        events.push(RawEvent(fields));
    }
    Ok(events)
}

fn run_events(events_source: &str, report_dir: &PathBuf, synthesize_incomplete: bool) -> Result<()> {
    let events = read_events(events_source)?;
    info!(count = events.len(), "loaded events");

    let mut aggregator = EventAggregator::new(InMemoryTaskStore::new());
    aggregator
        .aggregate_events(&events)
        .with_context(|| format!("aggregating events from {events_source}"))?;

    if synthesize_incomplete {
        let synthetic = aggregator.generate_incomplete_events();
        if !synthetic.is_empty() {
            info!(count = synthetic.len(), "synthesizing terminal events for incomplete tasks");
            aggregator
                .aggregate_events(&synthetic)
                .context("aggregating synthesized incomplete events")?;
        }
    }

    let root_uuid = aggregator.root_uuid().unwrap_or("unknown").to_string();
    let report = CompletionRunReport {
        uuid: root_uuid,
        chain: events_source.to_string(),
        submission_time: chrono::Utc::now(),
        completed: aggregator.is_root_complete(),
        revoked: aggregator
            .root_uuid()
            .and_then(|uuid| aggregator.store().get(uuid))
            .and_then(|task| task.state().map(str::to_string))
            .as_deref()
            == Some(eventflow_types::REVOKED_EVENT_TYPE),
        results: None,
    };

    let path = write_completion_report(report_dir, &report)?;
    info!(path = %path.display(), complete = aggregator.are_all_tasks_complete(), "wrote completion report");

    if !aggregator.are_all_tasks_complete() {
        warn!("run finished with incomplete tasks still in the store");
    }

    Ok(())
}

fn run_show_report(path: &PathBuf) -> Result<()> {
    let report = eventflow_reporter::load_completion_report(path)
        .with_context(|| format!("loading report from {}", path.display()))?;
    let pretty = serde_json::to_string_pretty(&report)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{pretty}")?;
    Ok(())
}
