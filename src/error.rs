//! Error types for tree-walker
//!
//! Two layers of errors live here:
//! - `EntryError` is what the traversal engine reports for a single path.
//!   It never aborts a walk, it travels inside a `WalkEvent::Error`.
//! - `WalkerError` and `ConfigError` cover the application around the
//!   engine (argument validation, output, interruption).

use std::io;
use thiserror::Error;

/// Top-level error type for the tree-walker application
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors (writing output, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No root path to walk
    #[error("At least one root path is required")]
    NoRoots,

    /// Invalid in-flight bound
    #[error("Invalid in-flight limit {limit}: must be between 1 and {max}")]
    InvalidInFlightLimit { limit: usize, max: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Failure attached to a single path during a walk
///
/// Every variant is terminal for its branch only; siblings keep going and the
/// walk still ends.
#[derive(Error, Debug)]
pub enum EntryError {
    /// Metadata could not be read (vanished path, permission denied, ...)
    #[error("failed to read metadata: {source}")]
    ProbeFailed {
        #[source]
        source: io::Error,
    },

    /// A directory was found but its children could not be listed
    #[error("failed to list directory: {source}")]
    ListFailed {
        #[source]
        source: io::Error,
    },

    /// Metadata matched none of the known entry types
    #[error("the type of this file could not be determined")]
    UnknownFileType,
}

impl EntryError {
    /// The underlying I/O error, if the failure came from the filesystem
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            EntryError::ProbeFailed { source } | EntryError::ListFailed { source } => Some(source),
            EntryError::UnknownFileType => None,
        }
    }

    /// Check if the path disappeared before it could be read
    pub fn is_not_found(&self) -> bool {
        self.io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    }

    /// Check if the failure was an access check
    pub fn is_permission_denied(&self) -> bool {
        self.io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
    }
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;
