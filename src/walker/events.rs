//! Walk events and subscriber channels
//!
//! Every subscriber owns an unbounded channel. Events are fanned out to all
//! live subscribers under one lock, so every subscriber observes the same
//! order and `End` is always the last event it receives.

use super::types::{Entry, EntryStat, EntryType};
use crate::error::EntryError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A notification from the walker
#[derive(Debug, Clone)]
pub enum WalkEvent {
    /// A directory that is being descended into
    Dir(Entry),
    Symlink(Entry),
    BlockDevice(Entry),
    CharDevice(Entry),
    Fifo(Entry),
    Socket(Entry),
    File(Entry),

    /// A probe or listing failed, or the type could not be determined
    Error {
        error: Arc<EntryError>,
        path: PathBuf,
        /// Present when the probe succeeded before the failure
        stat: Option<EntryStat>,
    },

    /// All outstanding work has drained. Sent exactly once.
    End,
}

impl WalkEvent {
    /// Wrap a classified entry in its matching variant
    pub fn classified(entry: Entry) -> Self {
        match entry.kind {
            EntryType::Directory => WalkEvent::Dir(entry),
            EntryType::Symlink => WalkEvent::Symlink(entry),
            EntryType::BlockDevice => WalkEvent::BlockDevice(entry),
            EntryType::CharDevice => WalkEvent::CharDevice(entry),
            EntryType::Fifo => WalkEvent::Fifo(entry),
            EntryType::Socket => WalkEvent::Socket(entry),
            EntryType::File => WalkEvent::File(entry),
        }
    }

    pub(crate) fn error(error: EntryError, path: PathBuf, stat: Option<EntryStat>) -> Self {
        WalkEvent::Error {
            error: Arc::new(error),
            path,
            stat,
        }
    }

    /// The classified entry, for every variant except `Error` and `End`
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            WalkEvent::Dir(entry)
            | WalkEvent::Symlink(entry)
            | WalkEvent::BlockDevice(entry)
            | WalkEvent::CharDevice(entry)
            | WalkEvent::Fifo(entry)
            | WalkEvent::Socket(entry)
            | WalkEvent::File(entry) => Some(entry),
            WalkEvent::Error { .. } | WalkEvent::End => None,
        }
    }

    pub fn kind(&self) -> Option<EntryType> {
        self.entry().map(|entry| entry.kind)
    }

    /// Path the event is about (`None` for `End`)
    pub fn path(&self) -> Option<&Path> {
        match self {
            WalkEvent::Error { path, .. } => Some(path),
            WalkEvent::End => None,
            _ => self.entry().map(Entry::path),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, WalkEvent::Error { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, WalkEvent::End)
    }

    /// Short lowercase label used in output
    pub fn label(&self) -> &'static str {
        match self {
            WalkEvent::Error { .. } => "error",
            WalkEvent::End => "end",
            _ => self.kind().map(|kind| kind.as_str()).unwrap_or("entry"),
        }
    }
}

/// Receiving half of a subscription
#[derive(Debug)]
pub struct WalkEvents {
    rx: mpsc::UnboundedReceiver<WalkEvent>,
}

impl WalkEvents {
    /// Wait for the next event
    ///
    /// Returns `None` once `End` has been delivered and the walker closed the
    /// channel, or if the walker was dropped without ever starting.
    pub async fn recv(&mut self) -> Option<WalkEvent> {
        self.rx.recv().await
    }

    /// Drain events up to and including `End`
    pub async fn collect_until_end(mut self) -> Vec<WalkEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            let done = event.is_end();
            events.push(event);
            if done {
                break;
            }
        }
        events
    }
}

#[derive(Debug, Default)]
struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<WalkEvent>>,
    closed: bool,
}

/// Fan-out point for events
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    inner: Mutex<Subscribers>,
}

impl EventSink {
    pub(crate) fn subscribe(&self) -> WalkEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        // After close the sender is dropped here, so recv() yields None.
        if !inner.closed {
            inner.senders.push(tx);
        }
        WalkEvents { rx }
    }

    pub(crate) fn emit(&self, event: WalkEvent) {
        let mut inner = self.inner.lock();
        inner.senders.retain(|tx| !tx.is_closed());
        if let Some((last, rest)) = inner.senders.split_last() {
            for tx in rest {
                let _ = tx.send(event.clone());
            }
            let _ = last.send(event);
        }
    }

    /// Drop every sender; later subscriptions see a closed channel
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.senders.clear();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.lock().senders.len()
    }
}
