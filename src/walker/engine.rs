//! Traversal engine
//!
//! Every path handed to [`Walker::walk`] becomes one probe task:
//!
//! ```text
//! walk(path) ── pending += 1 ── spawn ──► symlink_metadata(path)
//!                                              │
//!              ┌───────────────┬───────────────┼──────────────────┐
//!              ▼               ▼               ▼                  ▼
//!          probe error     leaf type      directory            unknown
//!          emit Error      emit File..    filter? ──no──► (pruned)
//!              │               │               │yes                │
//!              │               │          read_dir ──err──► emit Error
//!              │               │               │ok                 │
//!              │               │          emit Dir                 │
//!              │               │          walk(child) for each     │
//!              ▼               ▼               ▼                   ▼
//!              └──────────── pending -= 1 (End when it hits 0) ───┘
//! ```
//!
//! Completion: children are issued (and counted) before the parent's own
//! slot is released, so `pending` cannot reach zero while a directory is
//! still fanning out. The task that takes `pending` from 1 to 0 sends `End`
//! and latches the counter, after which no walk is counted. A probe's slot is
//! held by a guard and released even if the task unwinds.

use super::events::{EventSink, WalkEvent, WalkEvents};
use super::fs::{FileSystem, LocalFs};
use super::types::{Entry, EntryStat, EntryType};
use crate::error::EntryError;
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace, warn};

/// Predicate deciding whether to descend into a directory
pub type DirectoryFilter = Arc<dyn Fn(&Path, &EntryStat) -> bool + Send + Sync>;

/// `pending` value once `End` has been sent; no probe can be counted after it
const DRAINED: usize = usize::MAX;

fn descend_everywhere() -> DirectoryFilter {
    Arc::new(|_: &Path, _: &EntryStat| true)
}

/// Configures a [`Walker`] before any probe is issued
///
/// Subscriptions taken on the builder are registered before the first walk
/// starts, so they cannot miss early events.
pub struct WalkBuilder<F: FileSystem = LocalFs> {
    fs: F,
    filter: DirectoryFilter,
    max_in_flight: Option<usize>,
    sink: EventSink,
}

impl WalkBuilder<LocalFs> {
    /// Builder over the local filesystem, descending into every directory
    pub fn new() -> Self {
        Self {
            fs: LocalFs,
            filter: descend_everywhere(),
            max_in_flight: None,
            sink: EventSink::default(),
        }
    }
}

impl Default for WalkBuilder<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> WalkBuilder<F> {
    /// Walk a different filesystem backend
    pub fn filesystem<G: FileSystem>(self, fs: G) -> WalkBuilder<G> {
        WalkBuilder {
            fs,
            filter: self.filter,
            max_in_flight: self.max_in_flight,
            sink: self.sink,
        }
    }

    /// Only descend into directories for which `filter` returns true
    ///
    /// A rejected directory is a hard stop: neither it nor anything below it
    /// is reported.
    pub fn directory_filter<P>(mut self, filter: P) -> Self
    where
        P: Fn(&Path, &EntryStat) -> bool + Send + Sync + 'static,
    {
        self.filter = Arc::new(filter);
        self
    }

    /// Cap concurrent probe and listing I/O (unbounded by default)
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    /// Register a subscriber
    pub fn subscribe(&mut self) -> WalkEvents {
        self.sink.subscribe()
    }

    /// Create the walker without starting a walk
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn build(self) -> Walker<F> {
        Walker {
            shared: Arc::new(Shared {
                fs: self.fs,
                pending: AtomicUsize::new(0),
                filter: RwLock::new(self.filter),
                limiter: self.max_in_flight.map(|n| Arc::new(Semaphore::new(n))),
                runtime: Handle::current(),
                sink: self.sink,
            }),
        }
    }

    /// Create the walker and start walking `root`
    pub fn start(self, root: impl Into<PathBuf>) -> Walker<F> {
        let walker = self.build();
        walker.walk(root);
        walker
    }
}

impl<F: FileSystem> fmt::Debug for WalkBuilder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkBuilder")
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

/// Asynchronous recursive directory walker
///
/// Cloning is cheap; clones drive the same walk.
pub struct Walker<F: FileSystem = LocalFs> {
    shared: Arc<Shared<F>>,
}

struct Shared<F> {
    fs: F,
    /// Probes issued but not yet fully handled, or `DRAINED`
    pending: AtomicUsize,
    filter: RwLock<DirectoryFilter>,
    limiter: Option<Arc<Semaphore>>,
    runtime: Handle,
    sink: EventSink,
}

impl Walker<LocalFs> {
    /// Start walking `root` on the local filesystem
    ///
    /// The returned subscription is registered before the first probe.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(root: impl Into<PathBuf>) -> (Self, WalkEvents) {
        let mut builder = WalkBuilder::new();
        let events = builder.subscribe();
        (builder.start(root), events)
    }

    pub fn builder() -> WalkBuilder<LocalFs> {
        WalkBuilder::new()
    }
}

impl<F: FileSystem> Walker<F> {
    /// Walk `root`, or another path alongside the running walk
    ///
    /// Returns immediately; results arrive as events. Calls on a walker whose
    /// walk already ended are ignored.
    pub fn walk(&self, root: impl Into<PathBuf>) -> &Self {
        Shared::issue(&self.shared, root.into());
        self
    }

    /// Replace the directory filter
    ///
    /// Applies to directories whose probe resolves after this call.
    pub fn set_directory_filter<P>(&self, filter: P) -> &Self
    where
        P: Fn(&Path, &EntryStat) -> bool + Send + Sync + 'static,
    {
        *self.shared.filter.write() = Arc::new(filter);
        self
    }

    /// Register a subscriber; events emitted before this call are not replayed
    pub fn subscribe(&self) -> WalkEvents {
        self.shared.sink.subscribe()
    }

    /// Number of probes currently in flight
    pub fn pending(&self) -> usize {
        match self.shared.pending.load(Ordering::SeqCst) {
            DRAINED => 0,
            n => n,
        }
    }

    /// True once `End` has been sent
    pub fn is_finished(&self) -> bool {
        self.shared.pending.load(Ordering::SeqCst) == DRAINED
    }
}

impl<F: FileSystem> Clone for Walker<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: FileSystem> fmt::Debug for Walker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("pending", &self.pending())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl<F: FileSystem> Shared<F> {
    /// Count a probe of `path`, then spawn it
    fn issue(this: &Arc<Self>, path: PathBuf) {
        // Must happen before the spawn, never inside the task. Checking for
        // the end and counting are one step so a late walk cannot restart it.
        let counted = this
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n != DRAINED).then(|| n + 1)
            });
        if counted.is_err() {
            warn!(path = %path.display(), "Walk already ended, ignoring path");
            return;
        }
        trace!(path = %path.display(), "Probe issued");

        let shared = Arc::clone(this);
        this.runtime.spawn(async move {
            shared.probe(path).await;
        });
    }

    async fn probe(self: Arc<Self>, path: PathBuf) {
        let _slot = Slot(&*self);

        let probed = {
            let _permit = self.acquire().await;
            self.fs.symlink_metadata(&path).await
        };

        match probed {
            Err(source) => {
                debug!(path = %path.display(), error = %source, "Metadata probe failed");
                self.sink
                    .emit(WalkEvent::error(EntryError::ProbeFailed { source }, path, None));
            }
            Ok(stat) => match stat.classify() {
                Some(EntryType::Directory) => self.descend(path, stat).await,
                Some(kind) => self
                    .sink
                    .emit(WalkEvent::classified(Entry::new(path, kind, stat))),
                None => {
                    debug!(path = %path.display(), mode = stat.mode, "Unknown file type");
                    self.sink.emit(WalkEvent::error(
                        EntryError::UnknownFileType,
                        path,
                        Some(stat),
                    ));
                }
            },
        }
    }

    async fn descend(self: &Arc<Self>, path: PathBuf, stat: EntryStat) {
        let filter = Arc::clone(&*self.filter.read());
        if !filter(&path, &stat) {
            debug!(path = %path.display(), "Directory pruned");
            return;
        }

        let listing = {
            let _permit = self.acquire().await;
            self.fs.read_dir(&path).await
        };

        let names = match listing {
            Ok(names) => names,
            Err(source) => {
                debug!(path = %path.display(), error = %source, "Directory read failed");
                self.sink.emit(WalkEvent::error(
                    EntryError::ListFailed { source },
                    path,
                    Some(stat),
                ));
                return;
            }
        };

        let children: Vec<PathBuf> = names.iter().map(|name| path.join(name)).collect();
        self.sink.emit(WalkEvent::Dir(Entry::new(
            path,
            EntryType::Directory,
            stat,
        )));

        for child in children {
            Self::issue(self, child);
        }
    }

    async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.limiter {
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Release one probe slot; the last one out sends `End`
    fn done_one(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 | DRAINED => None,
                1 => Some(DRAINED),
                n => Some(n - 1),
            });
        debug_assert!(previous.is_ok(), "pending count underflow");

        if previous == Ok(1) {
            debug!("Walk drained");
            self.sink.emit(WalkEvent::End);
            self.sink.close();
        }
    }
}

/// One counted probe; releases its slot when dropped, including on unwind
struct Slot<'a, F: FileSystem>(&'a Shared<F>);

impl<F: FileSystem> Drop for Slot<'_, F> {
    fn drop(&mut self) {
        self.0.done_one();
    }
}
