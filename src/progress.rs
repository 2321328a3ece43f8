//! Progress reporting for the directory walker
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::WalkSummary;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Progress reporter that displays walk status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, summary: &WalkSummary, elapsed: Duration) {
        let msg = format!(
            "Dirs: {} | Files: {} | Other: {} | Size: {} | Rate: {:.0}/s | Errors: {}",
            format_number(summary.dirs),
            format_number(summary.files),
            format_number(summary.symlinks + summary.specials()),
            format_size(summary.bytes, BINARY),
            summary.entries_per_second(elapsed),
            format_number(summary.errors()),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the walk results
///
/// Goes to stderr so stdout stays a clean entry stream.
pub fn print_summary(summary: &WalkSummary, duration: Duration) {
    let duration_secs = duration.as_secs_f64();
    let title = if summary.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Interrupted").yellow().bold()
    };

    eprintln!();
    eprintln!("{}", title);
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(summary.dirs)
    );
    eprintln!("  {} {}", style("Files:").bold(), format_number(summary.files));
    if summary.symlinks > 0 {
        eprintln!(
            "  {} {}",
            style("Symlinks:").bold(),
            format_number(summary.symlinks)
        );
    }
    if summary.specials() > 0 {
        eprintln!(
            "  {} {} (block {}, char {}, fifo {}, socket {})",
            style("Special:").bold(),
            format_number(summary.specials()),
            summary.block_devices,
            summary.char_devices,
            summary.fifos,
            summary.sockets,
        );
    }
    eprintln!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(summary.bytes, BINARY)
    );
    eprintln!(
        "  {} {:.1}s ({:.0} entries/sec)",
        style("Duration:").bold(),
        duration_secs,
        summary.entries_per_second(duration)
    );
    if summary.errors() > 0 {
        eprintln!(
            "  {} {} (unreadable {}, unlistable {}, unknown type {})",
            style("Errors:").yellow().bold(),
            format_number(summary.errors()),
            summary.probe_errors,
            summary.list_errors,
            summary.unknown_types,
        );
    }
    eprintln!();
}

/// Print a header at the start of the walk
pub fn print_header(roots: &[PathBuf], max_in_flight: Option<usize>) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("tree-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    for root in roots {
        eprintln!("  {} {}", style("Root:").bold(), root.display());
    }
    match max_in_flight {
        Some(limit) => eprintln!("  {} {}", style("In flight:").bold(), limit),
        None => eprintln!("  {} unbounded", style("In flight:").bold()),
    }
    eprintln!();
}
