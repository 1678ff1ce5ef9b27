//! Lifecycle: phase tracking, the cooperative stop flag, and the one-shot
//! completion latch shared between the loop thread and its controllers.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchPhase {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl WatchPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WatchPhase::Created,
            1 => WatchPhase::Running,
            2 => WatchPhase::Stopping,
            _ => WatchPhase::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchPhase::Created => "created",
            WatchPhase::Running => "running",
            WatchPhase::Stopping => "stopping",
            WatchPhase::Stopped => "stopped",
        }
    }
}

/// One-shot latch. Waiters return once `release` has been called.
#[derive(Debug, Default)]
struct Completion {
    done: Mutex<bool>,
    cvar: Condvar,
}

impl Completion {
    /// Returns true only for the call that actually released the latch.
    fn release(&self) -> bool {
        let mut done = self.done.lock();
        if *done {
            return false;
        }
        *done = true;
        self.cvar.notify_all();
        true
    }

    fn is_released(&self) -> bool {
        *self.done.lock()
    }

    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cvar.wait(&mut done);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock();
        while !*done {
            if self.cvar.wait_until(&mut done, deadline).timed_out() {
                return *done;
            }
        }
        true
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    phase: AtomicU8,
    stop: AtomicBool,
    completion: Completion,
}

impl Lifecycle {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            phase: AtomicU8::new(WatchPhase::Created as u8),
            stop: AtomicBool::new(false),
            completion: Completion::default(),
        })
    }

    pub(crate) fn phase(&self) -> WatchPhase {
        WatchPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Leave `Created`. The guard releases completion on every exit path.
    pub(crate) fn begin(self: &Arc<Self>) -> Result<CompletionGuard, WatchError> {
        self.phase
            .compare_exchange(
                WatchPhase::Created as u8,
                WatchPhase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| WatchError::AlreadyStarted)?;

        Ok(CompletionGuard {
            lifecycle: Arc::clone(self),
        })
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Only a running loop moves to Stopping; other phases stay put.
        let _ = self.phase.compare_exchange(
            WatchPhase::Running as u8,
            WatchPhase::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Releases completion when the loop thread is done, including on panic.
#[derive(Debug)]
pub(crate) struct CompletionGuard {
    lifecycle: Arc<Lifecycle>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.lifecycle.stop.store(true, Ordering::SeqCst);
        self.lifecycle
            .phase
            .store(WatchPhase::Stopped as u8, Ordering::Release);
        self.lifecycle.completion.release();
    }
}

/// Cloneable handle for stopping a watcher from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    lifecycle: Arc<Lifecycle>,
}

impl StopHandle {
    pub(crate) fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Request a cooperative stop. Idempotent and non-blocking.
    pub fn stop(&self) {
        self.lifecycle.request_stop();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.lifecycle.stop_requested()
    }

    /// True once the loop has exited and completion was released.
    pub fn is_stopped(&self) -> bool {
        self.lifecycle.completion.is_released()
    }

    pub fn phase(&self) -> WatchPhase {
        self.lifecycle.phase()
    }

    /// Block until the watcher has finished. Returns immediately if it
    /// already has; blocks until `start` runs and exits otherwise.
    pub fn await_stop(&self) {
        self.lifecycle.completion.wait();
    }

    /// Like [`await_stop`](Self::await_stop) but bounded. Returns true if
    /// the watcher finished in time.
    pub fn await_stop_timeout(&self, timeout: Duration) -> bool {
        self.lifecycle.completion.wait_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    // ── Completion latch ────────────────────────────────────────

    #[test]
    fn test_completion_releases_once() {
        let completion = Completion::default();
        assert!(!completion.is_released());
        assert!(completion.release());
        assert!(!completion.release());
        assert!(completion.is_released());
        completion.wait();
        completion.wait();
    }

    #[test]
    fn test_completion_wait_timeout_expires() {
        let completion = Completion::default();
        let started = Instant::now();
        assert!(!completion.wait_timeout(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_completion_wakes_waiters() {
        let lifecycle = Lifecycle::new();
        let handle = StopHandle::new(Arc::clone(&lifecycle));

        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || handle.await_stop_timeout(Duration::from_secs(5)))
        };

        let guard = lifecycle.begin().unwrap();
        thread::sleep(Duration::from_millis(20));
        drop(guard);

        assert!(waiter.join().unwrap());
        assert!(handle.is_stopped());
    }

    // ── Phases ──────────────────────────────────────────────────

    #[test]
    fn test_phase_transitions() {
        let lifecycle = Lifecycle::new();
        let handle = StopHandle::new(Arc::clone(&lifecycle));
        assert_eq!(handle.phase(), WatchPhase::Created);

        let guard = lifecycle.begin().unwrap();
        assert_eq!(handle.phase(), WatchPhase::Running);

        handle.stop();
        assert_eq!(handle.phase(), WatchPhase::Stopping);
        assert!(handle.is_stop_requested());
        assert!(!handle.is_stopped());

        drop(guard);
        assert_eq!(handle.phase(), WatchPhase::Stopped);
        assert!(handle.is_stopped());
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let lifecycle = Lifecycle::new();
        let _guard = lifecycle.begin().unwrap();
        assert!(matches!(lifecycle.begin(), Err(WatchError::AlreadyStarted)));
    }

    #[test]
    fn test_stop_before_begin_keeps_created() {
        let lifecycle = Lifecycle::new();
        let handle = StopHandle::new(Arc::clone(&lifecycle));
        handle.stop();
        handle.stop();
        assert_eq!(handle.phase(), WatchPhase::Created);
        assert!(lifecycle.stop_requested());
    }

    #[test]
    fn test_guard_forces_stop_flag() {
        let lifecycle = Lifecycle::new();
        drop(lifecycle.begin().unwrap());
        assert!(lifecycle.stop_requested());
        assert_eq!(lifecycle.phase().as_str(), "stopped");
    }
}
