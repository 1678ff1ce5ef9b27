//! Source: where watch events come from.
//!
//! [`EventSource`] is the seam between the loop and the filesystem
//! notification backend. [`NotifySource`] is the real one; tests drive the
//! loop with [`FakeSource`](super::fake::FakeSource).

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// A file appeared (created, or renamed into the directory).
    Create,
    /// An existing file's contents or metadata changed.
    Modify,
}

/// One create/modify notification for a path in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// Absolute, or relative to the watched directory.
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Result of asking a source for events.
#[derive(Debug)]
pub enum SourcePoll {
    /// Every event pending at the time of the call, in delivery order.
    Ready(Vec<notify::Result<WatchEvent>>),
    /// Nothing pending.
    Idle,
    /// The registration is gone; no further events will arrive.
    Closed,
}

pub trait EventSource: Send {
    /// Non-blocking: drain whatever is pending.
    fn poll(&mut self) -> SourcePoll;

    /// Block until at least one event is pending (or the source closes),
    /// then drain.
    fn wait(&mut self) -> SourcePoll;

    /// Called after each drained batch. False when the registration is no
    /// longer valid.
    fn rearm(&mut self) -> bool;
}

/// Non-recursive `notify` registration on one directory.
pub struct NotifySource {
    // Dropping the watcher ends the registration.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    closed: bool,
}

impl NotifySource {
    pub fn register(dir: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            closed: false,
        })
    }

    fn drain_into(&mut self, batch: &mut Vec<notify::Result<WatchEvent>>) {
        loop {
            match self.rx.try_recv() {
                Ok(raw) => push_translated(raw, batch),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }

    fn finish(&self, batch: Vec<notify::Result<WatchEvent>>) -> SourcePoll {
        if !batch.is_empty() {
            SourcePoll::Ready(batch)
        } else if self.closed {
            SourcePoll::Closed
        } else {
            SourcePoll::Idle
        }
    }
}

impl EventSource for NotifySource {
    fn poll(&mut self) -> SourcePoll {
        let mut batch = Vec::new();
        self.drain_into(&mut batch);
        self.finish(batch)
    }

    fn wait(&mut self) -> SourcePoll {
        let mut batch = Vec::new();
        match self.rx.recv() {
            Ok(raw) => push_translated(raw, &mut batch),
            Err(_) => self.closed = true,
        }
        if !self.closed {
            self.drain_into(&mut batch);
        }
        self.finish(batch)
    }

    fn rearm(&mut self) -> bool {
        !self.closed
    }
}

fn push_translated(raw: notify::Result<Event>, batch: &mut Vec<notify::Result<WatchEvent>>) {
    match raw {
        Ok(event) => {
            trace!("notify event: {:?}", event);
            batch.extend(translate(event).into_iter().map(Ok));
        }
        Err(e) => batch.push(Err(e)),
    }
}

/// Map a backend event onto create/modify events. Access and removal
/// notifications, and the "from" half of a rename, produce nothing.
pub fn translate(event: Event) -> Vec<WatchEvent> {
    let Event { kind, mut paths, .. } = event;

    let kind = match kind {
        EventKind::Create(_) => WatchEventKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchEventKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths = [from, to]
            return paths
                .pop()
                .map(|to| vec![WatchEvent::new(WatchEventKind::Create, to)])
                .unwrap_or_default();
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From))
        | EventKind::Modify(ModifyKind::Name(RenameMode::Other)) => return Vec::new(),
        EventKind::Modify(_) => WatchEventKind::Modify,
        _ => return Vec::new(),
    };

    paths
        .into_iter()
        .map(|path| WatchEvent::new(kind, path))
        .collect()
}
