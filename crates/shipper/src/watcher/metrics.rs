use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::EventError;
use crate::parser::ParseError;

/// Failure categories counted per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestFailure {
    AccessDenied,
    Read,
    Parse,
    /// Parser panicked (caught via catch_unwind)
    Panic,
    Backend,
    /// Sink panicked while taking a record
    Emit,
}

impl From<&EventError> for IngestFailure {
    fn from(err: &EventError) -> Self {
        match err {
            EventError::AccessDenied { .. } => IngestFailure::AccessDenied,
            EventError::Read { .. } => IngestFailure::Read,
            EventError::Parse { source: ParseError::ParserPanic(_), .. } => IngestFailure::Panic,
            EventError::Parse { .. } => IngestFailure::Parse,
            EventError::Backend(_) => IngestFailure::Backend,
            EventError::EmitPanicked { .. } => IngestFailure::Emit,
        }
    }
}

/// Counters for the watch loop.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not transactional
/// across fields, which is fine for log output.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    files_processed: AtomicU64,
    empty_files: AtomicU64,
    records_emitted: AtomicU64,
    access_denied: AtomicU64,
    read_failures: AtomicU64,
    parse_failures: AtomicU64,
    parser_panics: AtomicU64,
    backend_errors: AtomicU64,
    emit_panics: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_file(&self, records: usize) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.records_emitted.fetch_add(records as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_empty(&self) {
        self.empty_files.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self, failure: IngestFailure) {
        let counter = match failure {
            IngestFailure::AccessDenied => &self.access_denied,
            IngestFailure::Read => &self.read_failures,
            IngestFailure::Parse => &self.parse_failures,
            IngestFailure::Panic => &self.parser_panics,
            IngestFailure::Backend => &self.backend_errors,
            IngestFailure::Emit => &self.emit_panics,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            empty_files: self.empty_files.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            access_denied: self.access_denied.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            parser_panics: self.parser_panics.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            emit_panics: self.emit_panics.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of [`IngestMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSnapshot {
    pub files_processed: u64,
    pub empty_files: u64,
    pub records_emitted: u64,
    pub access_denied: u64,
    pub read_failures: u64,
    pub parse_failures: u64,
    pub parser_panics: u64,
    pub backend_errors: u64,
    pub emit_panics: u64,
}

impl IngestSnapshot {
    pub fn total_failures(&self) -> u64 {
        self.access_denied
            + self.read_failures
            + self.parse_failures
            + self.parser_panics
            + self.backend_errors
            + self.emit_panics
    }
}
