//! Per-walk counters folded from events

use super::events::WalkEvent;
use super::types::EntryType;
use crate::error::EntryError;
use serde::Serialize;
use std::time::Duration;

/// Totals for a walk, built by feeding it every event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    pub dirs: u64,
    pub files: u64,
    pub symlinks: u64,
    pub block_devices: u64,
    pub char_devices: u64,
    pub fifos: u64,
    pub sockets: u64,

    /// Sum of regular file sizes
    pub bytes: u64,

    pub probe_errors: u64,
    pub list_errors: u64,
    pub unknown_types: u64,

    /// Set once `End` has been seen
    pub completed: bool,
}

impl WalkSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a sequence of events
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a WalkEvent>) -> Self {
        let mut summary = Self::new();
        for event in events {
            summary.record(event);
        }
        summary
    }

    pub fn record(&mut self, event: &WalkEvent) {
        match event {
            WalkEvent::End => self.completed = true,
            WalkEvent::Error { error, .. } => match **error {
                EntryError::ProbeFailed { .. } => self.probe_errors += 1,
                EntryError::ListFailed { .. } => self.list_errors += 1,
                EntryError::UnknownFileType => self.unknown_types += 1,
            },
            _ => {
                if let Some(entry) = event.entry() {
                    *self.counter(entry.kind) += 1;
                    if entry.kind == EntryType::File {
                        self.bytes += entry.stat.size;
                    }
                }
            }
        }
    }

    fn counter(&mut self, kind: EntryType) -> &mut u64 {
        match kind {
            EntryType::Directory => &mut self.dirs,
            EntryType::File => &mut self.files,
            EntryType::Symlink => &mut self.symlinks,
            EntryType::BlockDevice => &mut self.block_devices,
            EntryType::CharDevice => &mut self.char_devices,
            EntryType::Fifo => &mut self.fifos,
            EntryType::Socket => &mut self.sockets,
        }
    }

    /// Count for one entry type
    pub fn count(&self, kind: EntryType) -> u64 {
        match kind {
            EntryType::Directory => self.dirs,
            EntryType::File => self.files,
            EntryType::Symlink => self.symlinks,
            EntryType::BlockDevice => self.block_devices,
            EntryType::CharDevice => self.char_devices,
            EntryType::Fifo => self.fifos,
            EntryType::Socket => self.sockets,
        }
    }

    /// Devices, pipes and sockets
    pub fn specials(&self) -> u64 {
        self.block_devices + self.char_devices + self.fifos + self.sockets
    }

    /// Every classified entry
    pub fn entries(&self) -> u64 {
        self.dirs + self.files + self.symlinks + self.specials()
    }

    pub fn errors(&self) -> u64 {
        self.probe_errors + self.list_errors + self.unknown_types
    }

    pub fn entries_per_second(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.entries() as f64 / secs
        } else {
            0.0
        }
    }
}
