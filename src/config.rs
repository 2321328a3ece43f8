//! Configuration types for tree-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - The directory filter the CLI installs on the walker

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Maximum in-flight probe bound accepted on the command line
const MAX_IN_FLIGHT: usize = 65_536;

/// Asynchronous recursive directory walker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tree-walker",
    version,
    about = "Walk directory trees and report every entry by type",
    long_about = "Walks one or more directory trees concurrently, classifying each entry \
                  (directory, file, symlink, block/character device, fifo, socket) without \
                  following symbolic links.\n\n\
                  Every root is walked by the same walker; the walk ends once all of them \
                  have drained.",
    after_help = "EXAMPLES:\n    \
        tree-walker /srv/data\n    \
        tree-walker src tests --exclude '/target$' --exclude '/\\.git$'\n    \
        tree-walker /var -d 2 --summary-only\n    \
        tree-walker . --format json --max-in-flight 64"
)]
pub struct CliArgs {
    /// Directories (or files) to walk
    #[arg(value_name = "PATH", default_value = ".")]
    pub roots: Vec<PathBuf>,

    /// Do not descend into directories whose path matches PATTERN (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Do not descend into directories more than NUM levels below a root
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Limit concurrent filesystem operations (unlimited if not set)
    #[arg(long, value_name = "NUM")]
    pub max_in_flight: Option<usize>,

    /// Output format for entries
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only print the summary, not every entry
    #[arg(short = 's', long)]
    pub summary_only: bool,

    /// Quiet mode - suppress progress and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (log every failed path)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// How entries are printed
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `<kind> <path>` per line
    Text,
    /// One JSON object per line
    Json,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Paths to walk
    pub roots: Vec<PathBuf>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Maximum directory depth below a root
    pub max_depth: Option<usize>,

    /// Concurrent I/O bound
    pub max_in_flight: Option<usize>,

    /// Entry output format
    pub output_format: OutputFormat,

    /// Print every entry
    pub print_entries: bool,

    /// Show progress spinner
    pub show_progress: bool,

    /// Print the final summary
    pub show_summary: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }

        if let Some(limit) = args.max_in_flight {
            if limit == 0 || limit > MAX_IN_FLIGHT {
                return Err(ConfigError::InvalidInFlightLimit {
                    limit,
                    max: MAX_IN_FLIGHT,
                });
            }
        }

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            roots: args.roots,
            exclude_patterns,
            max_depth: args.max_depth,
            max_in_flight: args.max_in_flight,
            output_format: args.format,
            print_entries: !args.summary_only,
            // The spinner would fight with entries streamed to the terminal
            show_progress: !args.quiet && args.summary_only,
            show_summary: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }

    /// Depth of `path` below the closest root that contains it
    pub fn depth_of(&self, path: &Path) -> Option<usize> {
        self.roots
            .iter()
            .filter_map(|root| path.strip_prefix(root).ok())
            .map(|rel| rel.components().count())
            .min()
    }

    /// Directory filter: descend unless excluded or too deep
    pub fn should_descend(&self, path: &Path) -> bool {
        if self.is_excluded(path) {
            return false;
        }
        match (self.max_depth, self.depth_of(path)) {
            (Some(max), Some(depth)) => depth <= max,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(roots: &[&str], excludes: &[&str], max_depth: Option<usize>) -> WalkConfig {
        WalkConfig {
            roots: roots.iter().map(PathBuf::from).collect(),
            exclude_patterns: excludes.iter().map(|p| Regex::new(p).unwrap()).collect(),
            max_depth,
            max_in_flight: None,
            output_format: OutputFormat::Text,
            print_entries: true,
            show_progress: false,
            show_summary: true,
            verbose: false,
        }
    }

    #[test]
    fn test_exclude_pattern() {
        let config = config(&["/data"], &[r"\.snapshot", r"/target$"], None);

        assert!(config.is_excluded(Path::new("/data/.snapshot/hourly.0")));
        assert!(config.is_excluded(Path::new("/data/proj/target")));
        assert!(!config.is_excluded(Path::new("/data/proj/target-dir")));
        assert!(!config.should_descend(Path::new("/data/.snapshot")));
        assert!(config.should_descend(Path::new("/data/myfiles")));
    }

    #[test]
    fn test_depth_limit() {
        let config = config(&["/data", "/data/deep/er"], &[], Some(1));

        assert_eq!(config.depth_of(Path::new("/data")), Some(0));
        assert_eq!(config.depth_of(Path::new("/data/a/b")), Some(2));
        // Closest containing root wins
        assert_eq!(config.depth_of(Path::new("/data/deep/er/x")), Some(1));
        assert_eq!(config.depth_of(Path::new("/elsewhere")), None);

        assert!(config.should_descend(Path::new("/data")));
        assert!(config.should_descend(Path::new("/data/a")));
        assert!(!config.should_descend(Path::new("/data/a/b")));
        assert!(config.should_descend(Path::new("/elsewhere/x/y/z")));
    }

    #[test]
    fn test_from_args_defaults() {
        let args = CliArgs::parse_from(["tree-walker"]);
        let config = WalkConfig::from_args(args).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from(".")]);
        assert!(config.print_entries);
        assert!(!config.show_progress);
        assert!(config.show_summary);
        assert_eq!(config.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_from_args_summary_only() {
        let args = CliArgs::parse_from(["tree-walker", "/a", "/b", "-s", "-f", "json"]);
        let config = WalkConfig::from_args(args).unwrap();
        assert_eq!(config.roots.len(), 2);
        assert!(!config.print_entries);
        assert!(config.show_progress);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_pattern() {
        let args = CliArgs::parse_from(["tree-walker", "--exclude", "("]);
        assert!(matches!(
            WalkConfig::from_args(args),
            Err(ConfigError::InvalidExcludePattern { .. })
        ));
    }

    #[test]
    fn test_invalid_in_flight() {
        let args = CliArgs::parse_from(["tree-walker", "--max-in-flight", "0"]);
        assert!(matches!(
            WalkConfig::from_args(args),
            Err(ConfigError::InvalidInFlightLimit { limit: 0, .. })
        ));
    }
}
