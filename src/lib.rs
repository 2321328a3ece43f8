//! tree-walker - Asynchronous Recursive Directory Walker
//!
//! Walks a directory tree without blocking the caller, classifies every entry
//! it meets and reports each one as a typed event the moment it is found.
//! Nothing is buffered into an in-memory tree.
//!
//! # Features
//!
//! - **Fan-out Probing**: Every path is probed by its own task, so wide
//!   directories are read with as much concurrency as the filesystem allows.
//!   An optional bound caps concurrent I/O.
//!
//! - **Exact Completion**: A single in-flight counter detects when the walk
//!   has drained; `WalkEvent::End` is sent exactly once, after every other
//!   event.
//!
//! - **Pruning**: A directory filter decides which subtrees to enter. It is
//!   also the only protection against loops, since symlinks are reported as
//!   leaves and never followed.
//!
//! - **Local Failures**: Unreadable entries, unlistable directories and
//!   unknown entry types become `WalkEvent::Error` and never stop the walk.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Walker                                 │
//! │   walk(root) ──► pending += 1 ──► spawn probe                  │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 FileSystem (LocalFs / MemoryFs)                │
//! │        symlink_metadata(path)        read_dir(path)            │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                EventSink ──► WalkEvents (per subscriber)       │
//! │   Dir | File | Symlink | BlockDevice | CharDevice | Fifo |     │
//! │   Socket | Error | End                                         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tree_walker::{WalkEvent, Walker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (_walker, mut events) = Walker::new("/srv/data");
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             WalkEvent::File(entry) => println!("{} ({} bytes)", entry.path.display(), entry.stat.size),
//!             WalkEvent::Error { error, path, .. } => eprintln!("{}: {}", path.display(), error),
//!             WalkEvent::End => break,
//!             _ => {}
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, OutputFormat, WalkConfig};
pub use error::{ConfigError, EntryError, Result, WalkerError};
pub use walker::{
    Entry, EntryStat, EntryType, FileSystem, LocalFs, MemoryFs, WalkBuilder, WalkEvent,
    WalkEvents, WalkSummary, Walker,
};
