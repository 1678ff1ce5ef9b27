//! Fake: scripted [`EventSource`] for driving the watch loop in tests.
//!
//! Batches are queued through a cloneable [`FakeSourceHandle`], so a test can
//! feed events while the loop runs on another thread.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::source::{EventSource, SourcePoll, WatchEvent, WatchEventKind};

const WAIT_STEP: Duration = Duration::from_millis(5);

enum Step {
    Batch(Vec<notify::Result<WatchEvent>>),
    Close,
}

#[derive(Default)]
struct Inner {
    steps: Mutex<VecDeque<Step>>,
    polls: AtomicUsize,
    rearm_fails: AtomicBool,
}

/// In-memory event source. Idle until something is queued.
pub struct FakeSource {
    inner: Arc<Inner>,
    closed: bool,
}

/// Producer side of a [`FakeSource`].
#[derive(Clone)]
pub struct FakeSourceHandle {
    inner: Arc<Inner>,
}

impl FakeSource {
    pub fn new() -> (Self, FakeSourceHandle) {
        let inner = Arc::new(Inner::default());
        let source = Self {
            inner: Arc::clone(&inner),
            closed: false,
        };
        (source, FakeSourceHandle { inner })
    }
}

impl FakeSourceHandle {
    pub fn push_batch(&self, batch: Vec<notify::Result<WatchEvent>>) {
        self.inner.steps.lock().push_back(Step::Batch(batch));
    }

    /// Queue one batch of create events for `paths`.
    pub fn push_created<P: Into<PathBuf>>(&self, paths: impl IntoIterator<Item = P>) {
        let batch = paths
            .into_iter()
            .map(|p| Ok(WatchEvent::new(WatchEventKind::Create, p)))
            .collect();
        self.push_batch(batch);
    }

    /// Queue the end of the registration, after any pending batches.
    pub fn close(&self) {
        self.inner.steps.lock().push_back(Step::Close);
    }

    /// Make every later `rearm` report the registration as invalid.
    pub fn fail_rearm(&self) {
        self.inner.rearm_fails.store(true, Ordering::SeqCst);
    }

    /// Number of `poll`/`wait` calls the loop has made so far.
    pub fn polls(&self) -> usize {
        self.inner.polls.load(Ordering::SeqCst)
    }
}

impl EventSource for FakeSource {
    fn poll(&mut self) -> SourcePoll {
        self.inner.polls.fetch_add(1, Ordering::SeqCst);
        if self.closed {
            return SourcePoll::Closed;
        }
        match self.inner.steps.lock().pop_front() {
            Some(Step::Batch(batch)) => SourcePoll::Ready(batch),
            Some(Step::Close) => {
                self.closed = true;
                SourcePoll::Closed
            }
            None => SourcePoll::Idle,
        }
    }

    fn wait(&mut self) -> SourcePoll {
        loop {
            match self.poll() {
                SourcePoll::Idle => thread::sleep(WAIT_STEP),
                other => return other,
            }
        }
    }

    fn rearm(&mut self) -> bool {
        !self.closed && !self.inner.rearm_fails.load(Ordering::SeqCst)
    }
}
