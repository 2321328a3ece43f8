//! Asynchronous directory walker
//!
//! This module implements a fan-out recursive walk where every path is an
//! independent probe task and completion is detected by counting probes in
//! flight.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │         Walker          │
//!                     │  - pending probe count  │
//!                     │  - directory filter     │
//!                     └───────────┬─────────────┘
//!                                 │ spawn per path
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Probe 1  │             │  Probe 2  │             │  Probe N  │
//! │  lstat    │             │  lstat    │             │  lstat    │
//! │  readdir  │             │  readdir  │             │  readdir  │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │  EventSink → WalkEvents │
//!                     └─────────────────────────┘
//! ```

pub mod engine;
pub mod events;
pub mod fs;
pub mod memory;
pub mod summary;
pub mod types;

pub use engine::{DirectoryFilter, WalkBuilder, Walker};
pub use events::{WalkEvent, WalkEvents};
pub use fs::{FileSystem, LocalFs};
pub use memory::MemoryFs;
pub use summary::WalkSummary;
pub use types::{Entry, EntryStat, EntryType};
