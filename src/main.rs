//! tree-walker - Asynchronous Recursive Directory Walker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tree_walker::config::{CliArgs, OutputFormat, WalkConfig};
use tree_walker::progress::{print_header, print_summary, ProgressReporter};
use tree_walker::{WalkBuilder, WalkEvent, WalkSummary, WalkerError};

/// Refresh the spinner every this many events
const PROGRESS_INTERVAL: u64 = 512;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run_walk(config))
}

async fn run_walk(config: WalkConfig) -> Result<()> {
    let config = Arc::new(config);

    if config.show_progress {
        print_header(&config.roots, config.max_in_flight);
    }

    let filter_config = Arc::clone(&config);
    let mut builder =
        WalkBuilder::new().directory_filter(move |path, _| filter_config.should_descend(path));
    if let Some(limit) = config.max_in_flight {
        builder = builder.max_in_flight(limit);
    }
    let mut events = builder.subscribe();
    let walker = builder.build();

    info!(roots = config.roots.len(), "Starting walk");
    for root in &config.roots {
        walker.walk(root.clone());
    }

    let progress = config.show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Walking...");
    }

    let start = Instant::now();
    let mut summary = WalkSummary::new();
    let mut seen: u64 = 0;
    let mut out = BufWriter::new(io::stdout().lock());

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let outcome: std::result::Result<(), WalkerError> = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break Ok(());
                };
                summary.record(&event);
                if event.is_end() {
                    break Ok(());
                }
                if config.verbose {
                    log_failure(&event);
                }
                if config.print_entries {
                    if let Err(e) = write_event(&mut out, &event, config.output_format) {
                        break Err(e.into());
                    }
                }
                seen += 1;
                if seen % PROGRESS_INTERVAL == 0 {
                    if let Some(ref p) = progress {
                        p.update(&summary, start.elapsed());
                    }
                }
            }
            _ = &mut interrupt => {
                eprintln!("\nInterrupt received, shutting down...");
                break Err(WalkerError::Interrupted);
            }
        }
    };

    // A closed pipe (e.g. `| head`) is not worth reporting
    if let Err(e) = out.flush() {
        debug!(error = %e, "Failed to flush output");
    }
    drop(out);

    let duration = start.elapsed();

    if let Some(ref p) = progress {
        if summary.completed {
            p.finish("Walk completed");
        } else {
            p.finish("Walk interrupted");
        }
    }

    if config.show_summary {
        print_summary(&summary, duration);
    }

    info!(
        entries = summary.entries(),
        errors = summary.errors(),
        pending = walker.pending(),
        duration_secs = duration.as_secs(),
        "Walk finished"
    );

    if summary.errors() > 0 {
        info!(errors = summary.errors(), "Walk completed with errors");
    }

    match outcome {
        Err(WalkerError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("Walk failed"),
    }
}

fn write_event(out: &mut impl Write, event: &WalkEvent, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => match event {
            WalkEvent::Error { error, path, .. } => {
                writeln!(out, "{:<13}{}: {}", event.label(), path.display(), error)
            }
            _ => match event.entry() {
                Some(entry) => writeln!(out, "{:<13}{}", event.label(), entry.path.display()),
                None => Ok(()),
            },
        },
        OutputFormat::Json => {
            let value = match event {
                WalkEvent::Error { error, path, stat } => json!({
                    "event": event.label(),
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                    "stat": stat,
                }),
                _ => match event.entry() {
                    Some(entry) => json!({
                        "event": event.label(),
                        "path": entry.path.to_string_lossy(),
                        "stat": entry.stat,
                    }),
                    None => return Ok(()),
                },
            };
            writeln!(out, "{}", value)
        }
    }
}

fn log_failure(event: &WalkEvent) {
    if let WalkEvent::Error { error, path, .. } = event {
        warn!(path = %path.display(), error = %error, "Entry failed");
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("tree_walker=debug,warn")
    } else {
        EnvFilter::new("tree_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
