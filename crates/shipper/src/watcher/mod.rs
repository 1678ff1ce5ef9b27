//! Watcher: the directory watch loop and its lifecycle.
//!
//! `start` runs on the caller's thread (which should be dedicated to it):
//! ensure the metadata directory, optionally launch the local metadata
//! service, register a non-recursive watch, then read → parse → normalize →
//! emit for every create/modify event until stopped. Per-event failures are
//! logged and skipped. Completion is released exactly once on every exit.

pub mod fake;
pub mod lifecycle;
pub mod metrics;
pub mod sink;
pub mod source;

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::conf::{ShipperConfig, WatchMode};
use crate::error::{EventError, WatchError};
use crate::launcher::{metadata_addr, MetadataLauncher};
use crate::normalize::{LabelPolicy, NormalizedValue, TreeNormalizer};
use crate::parser::{panic_message, parse_guarded, RecordParser};

pub use lifecycle::{StopHandle, WatchPhase};
pub use metrics::{IngestFailure, IngestMetrics, IngestSnapshot};
pub use sink::{EventSink, JsonLinesSink};
pub use source::{EventSource, NotifySource, SourcePoll, WatchEvent, WatchEventKind};

use lifecycle::Lifecycle;

/// Everything a [`DirectoryWatcher`] needs besides its parser.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub directory: PathBuf,
    pub meta_dir: PathBuf,
    pub rest_url: String,
    pub record_label: Option<String>,
    pub label_policy: LabelPolicy,
    pub envelope_key: Option<String>,
    pub with_auxiliary_service: bool,
    pub watch_mode: WatchMode,
    pub poll_interval: Duration,
    pub metadata_ready_timeout: Duration,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self::from(&ShipperConfig::default())
    }
}

impl From<&ShipperConfig> for WatcherOptions {
    fn from(config: &ShipperConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            meta_dir: config.meta_dir.clone(),
            rest_url: config.rest_url.clone(),
            record_label: config.record_label(),
            label_policy: config.label_policy,
            envelope_key: config.envelope_key.clone(),
            with_auxiliary_service: config.with_auxiliary_service,
            watch_mode: config.watch_mode,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            metadata_ready_timeout: Duration::from_millis(config.metadata_ready_timeout_ms),
        }
    }
}

pub struct DirectoryWatcher {
    options: WatcherOptions,
    parser: Arc<dyn RecordParser>,
    normalizer: TreeNormalizer,
    lifecycle: Arc<Lifecycle>,
    metrics: Arc<IngestMetrics>,
}

impl DirectoryWatcher {
    /// Build a watcher. No side effects until [`start`](Self::start).
    pub fn new(options: WatcherOptions, parser: Arc<dyn RecordParser>) -> Self {
        let normalizer = TreeNormalizer::new(options.record_label.clone(), options.label_policy);
        Self {
            options,
            parser,
            normalizer,
            lifecycle: Lifecycle::new(),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    pub fn options(&self) -> &WatcherOptions {
        &self.options
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.lifecycle))
    }

    /// Request a cooperative stop. Idempotent, non-blocking.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn await_stop(&self) {
        self.stop_handle().await_stop();
    }

    pub fn await_stop_timeout(&self, timeout: Duration) -> bool {
        self.stop_handle().await_stop_timeout(timeout)
    }

    pub fn phase(&self) -> WatchPhase {
        self.lifecycle.phase()
    }

    pub fn metrics(&self) -> IngestSnapshot {
        self.metrics.snapshot()
    }

    /// Watch `directory` with the platform's notification backend and emit
    /// records into `sink` until stopped. Blocks the calling thread.
    pub fn start<S: EventSink>(&self, sink: S) -> Result<(), WatchError> {
        self.start_with(NotifySource::register, sink)
    }

    /// [`start`](Self::start) with a caller-supplied registration.
    pub fn start_with<R, E, S>(&self, register: R, mut sink: S) -> Result<(), WatchError>
    where
        R: FnOnce(&Path) -> notify::Result<E>,
        E: EventSource,
        S: EventSink,
    {
        let _completion = self.lifecycle.begin()?;

        info!("Audit-log directory: {}", self.options.directory.display());
        info!("Metadata directory: {}", self.options.meta_dir.display());
        info!(
            "Record label: {} (policy: {})",
            self.options.record_label.as_deref().unwrap_or("<none>"),
            self.options.label_policy.as_str()
        );

        self.prepare()?;

        let source = register(self.options.directory.as_path()).map_err(|source| {
            error!("Failed to watch {}: {}", self.options.directory.display(), source);
            WatchError::Register {
                path: self.options.directory.clone(),
                source,
            }
        })?;
        info!(
            "✓ Watching {} ({} mode, parser: {})",
            self.options.directory.display(),
            self.options.watch_mode,
            self.parser.name()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_loop(source, &mut sink)));

        let snapshot = self.metrics.snapshot();
        info!(
            "Watch loop exited: files={}, records={}, failures={}",
            snapshot.files_processed,
            snapshot.records_emitted,
            snapshot.total_failures()
        );

        outcome.map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!("Watch loop panicked: {}", message);
            WatchError::LoopPanicked(message)
        })
    }

    /// Create the metadata directory and launch the local service if needed.
    fn prepare(&self) -> Result<(), WatchError> {
        let meta_dir = &self.options.meta_dir;
        fs::create_dir_all(meta_dir).map_err(|source| {
            error!("Failed to create metadata directory {}: {}", meta_dir.display(), source);
            WatchError::MetaDir {
                path: meta_dir.clone(),
                source,
            }
        })?;

        if !self.options.with_auxiliary_service {
            debug!("Metadata service disabled");
            return Ok(());
        }

        match metadata_addr(&self.options.rest_url).inspect_err(|e| error!("{}", e))? {
            Some(addr) => {
                MetadataLauncher::new(self.options.metadata_ready_timeout).launch(addr, meta_dir)?;
            }
            None => info!(
                "Metadata service at {} is not local; not launching",
                self.options.rest_url
            ),
        }
        Ok(())
    }

    fn run_loop<E: EventSource, S: EventSink>(&self, mut source: E, sink: &mut S) {
        while !self.lifecycle.stop_requested() {
            let polled = match self.options.watch_mode {
                WatchMode::Polling => source.poll(),
                WatchMode::Blocking => source.wait(),
            };

            match polled {
                SourcePoll::Idle => {
                    thread::sleep(self.options.poll_interval);
                    continue;
                }
                SourcePoll::Closed => {
                    warn!("Watch registration closed; stopping watch loop");
                    break;
                }
                SourcePoll::Ready(batch) => self.drain(batch, sink),
            }

            if !source.rearm() {
                warn!("Watch registration no longer valid; stopping watch loop");
                break;
            }
        }
        debug!("Watch loop leaving (stop requested: {})", self.lifecycle.stop_requested());
    }

    fn drain<S: EventSink>(&self, batch: Vec<notify::Result<WatchEvent>>, sink: &mut S) {
        for event in batch {
            if let Err(e) = self.process_isolated(event, sink) {
                self.metrics.record_failure(IngestFailure::from(&e));
                match &e {
                    EventError::AccessDenied { path } => {
                        error!("Access denied reading {}", path.display())
                    }
                    _ => error!("Failed to process watch event: {}", e),
                }
            }
        }
    }

    /// A panic in the sink fails this event only; the loop moves on.
    fn process_isolated<S: EventSink>(
        &self,
        event: notify::Result<WatchEvent>,
        sink: &mut S,
    ) -> Result<(), EventError> {
        let event = event?;
        let path = self.resolve(&event.path);
        debug!("{:?} event for {}", event.kind, path.display());

        panic::catch_unwind(AssertUnwindSafe(|| self.process_event(&path, sink))).unwrap_or_else(
            |payload| {
                Err(EventError::EmitPanicked {
                    path: path.to_path_buf(),
                    message: panic_message(payload.as_ref()),
                })
            },
        )
    }

    fn process_event<S: EventSink>(&self, path: &Path, sink: &mut S) -> Result<(), EventError> {
        if path.is_dir() {
            debug!("Skipping directory {}", path.display());
            return Ok(());
        }

        let raw = fs::read(path).map_err(|e| EventError::from_io(path.to_path_buf(), e))?;
        if raw.is_empty() {
            self.metrics.record_empty();
            debug!("Skipping empty file {}", path.display());
            return Ok(());
        }

        let records = parse_guarded(self.parser.as_ref(), &raw).map_err(|source| EventError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        for tree in &records {
            sink.emit(self.render(tree));
        }
        self.metrics.record_file(records.len());
        debug!("Emitted {} record(s) from {}", records.len(), path.display());
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.options.directory.join(path)
        } else {
            path.to_path_buf()
        }
    }

    fn render(&self, tree: &crate::record::RecordTree) -> NormalizedValue {
        let value = self.normalizer.normalize(tree);
        match &self.options.envelope_key {
            Some(key) => value.wrap(key.clone()),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::LaunchError;
    use crate::parser::{JsonLinesParser, ParseError};
    use crate::record::{RecordTree, Scalar};
    use fake::FakeSource;
    use parking_lot::Mutex;
    use std::time::Instant;

    fn options(data: &Path, meta: &Path) -> WatcherOptions {
        WatcherOptions {
            directory: data.to_path_buf(),
            meta_dir: meta.to_path_buf(),
            with_auxiliary_service: false,
            poll_interval: Duration::from_millis(10),
            metadata_ready_timeout: Duration::ZERO,
            ..WatcherOptions::default()
        }
    }

    fn json_watcher(options: WatcherOptions) -> DirectoryWatcher {
        DirectoryWatcher::new(options, Arc::new(JsonLinesParser::new()))
    }

    fn collector() -> (Arc<Mutex<Vec<NormalizedValue>>>, impl FnMut(NormalizedValue) + Send) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        (seen, move |record: NormalizedValue| sink_seen.lock().push(record))
    }

    fn str_field<'a>(record: &'a NormalizedValue, key: &str) -> Option<&'a str> {
        match record.get(key)?.as_scalar()? {
            Scalar::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    struct PanicOnBoom;

    impl RecordParser for PanicOnBoom {
        fn parse(&self, raw: &[u8]) -> Result<Vec<RecordTree>, ParseError> {
            if raw.starts_with(b"boom") {
                panic!("boom");
            }
            JsonLinesParser::new().parse(raw)
        }

        fn name(&self) -> &'static str {
            "panic_on_boom"
        }
    }

    // ── Per-event isolation ─────────────────────────────────────

    #[test]
    fn test_failing_event_then_valid_event_emits_once() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("good.log"), "{\"user\":\"alice\"}\n").unwrap();
        fs::write(tmp.path().join("bad.log"), "not json\n").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["missing.log", "bad.log", "good.log"]);
        feed.close();

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(str_field(&seen[0], "user"), Some("alice"));

        let metrics = watcher.metrics();
        assert_eq!(metrics.read_failures, 1);
        assert_eq!(metrics.parse_failures, 1);
        assert_eq!(metrics.files_processed, 1);
    }

    #[test]
    fn test_backend_error_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("good.log"), "{\"a\":1}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_batch(vec![
            Err(notify::Error::generic("queue overflow")),
            Ok(WatchEvent::new(WatchEventKind::Modify, tmp.path().join("good.log"))),
        ]);
        feed.close();

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(watcher.metrics().backend_errors, 1);
    }

    #[test]
    fn test_parser_panic_is_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), "boom").unwrap();
        fs::write(tmp.path().join("b.log"), "{\"ok\":true}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["a.log", "b.log"]);
        feed.close();

        let watcher = DirectoryWatcher::new(
            options(tmp.path(), &tmp.path().join("meta")),
            Arc::new(PanicOnBoom),
        );
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(watcher.metrics().parser_panics, 1);
    }

    #[test]
    fn test_empty_file_emits_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("empty.log"), "").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["empty.log"]);
        feed.close();

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        assert!(seen.lock().is_empty());
        assert_eq!(watcher.metrics().empty_files, 1);
        assert_eq!(watcher.metrics().total_failures(), 0);
    }

    // ── Emission shape ──────────────────────────────────────────

    #[test]
    fn test_records_emitted_in_order_with_label() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("two.log"),
            "{\"seq\":\"first\",\"type\":\"raw\"}\n{\"seq\":\"second\"}\n",
        )
        .unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created([tmp.path().join("two.log")]);
        feed.close();

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(str_field(&seen[0], "seq"), Some("first"));
        assert_eq!(str_field(&seen[1], "seq"), Some("second"));
        assert_eq!(str_field(&seen[0], "type"), Some("audit-log"));
        assert_eq!(str_field(&seen[1], "type"), Some("audit-log"));
    }

    #[test]
    fn test_envelope_wraps_records() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), "{\"a\":1}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["a.log"]);
        feed.close();

        let watcher = json_watcher(WatcherOptions {
            envelope_key: Some("adabas-auditing".to_string()),
            ..options(tmp.path(), &tmp.path().join("meta"))
        });
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        let seen = seen.lock();
        let inner = seen[0].get("adabas-auditing").unwrap();
        assert_eq!(str_field(inner, "type"), Some("audit-log"));
        assert_eq!(seen[0].as_map().unwrap().len(), 1);
    }

    // ── Lifecycle ───────────────────────────────────────────────

    #[test]
    fn test_cooperative_stop_within_a_tick() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = Arc::new(json_watcher(options(tmp.path(), &tmp.path().join("meta"))));
        let (source, feed) = FakeSource::new();

        let runner = {
            let watcher = Arc::clone(&watcher);
            thread::spawn(move || {
                watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {})
            })
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while feed.polls() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(watcher.phase(), WatchPhase::Running);

        let stop_requested = Instant::now();
        watcher.stop();
        assert!(watcher.await_stop_timeout(Duration::from_secs(2)));
        assert!(stop_requested.elapsed() < Duration::from_secs(1));

        assert!(runner.join().unwrap().is_ok());
        assert_eq!(watcher.phase(), WatchPhase::Stopped);
    }

    #[test]
    fn test_repeated_stop_and_await_never_deadlock() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (source, feed) = FakeSource::new();
        feed.close();

        watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {}).unwrap();

        watcher.stop();
        watcher.stop();
        watcher.await_stop();
        watcher.await_stop();
        assert!(watcher.stop_handle().is_stopped());
    }

    #[test]
    fn test_stop_before_start_skips_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (source, feed) = FakeSource::new();

        watcher.stop();
        watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {}).unwrap();

        assert_eq!(feed.polls(), 0);
        assert!(watcher.await_stop_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn test_await_stop_from_other_thread() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let handle = watcher.stop_handle();
        let waiter = thread::spawn(move || handle.await_stop_timeout(Duration::from_secs(5)));

        let (source, feed) = FakeSource::new();
        feed.close();
        watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {}).unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_second_start_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));

        let (source, feed) = FakeSource::new();
        feed.close();
        watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {}).unwrap();

        let (again, _) = FakeSource::new();
        let err = watcher
            .start_with(move |_: &Path| Ok(again), |_: NormalizedValue| {})
            .unwrap_err();
        assert!(matches!(err, WatchError::AlreadyStarted));
    }

    #[test]
    fn test_sink_panic_skips_event_and_loop_continues() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), "{\"seq\":\"a\"}").unwrap();
        fs::write(tmp.path().join("b.log"), "{\"seq\":\"b\"}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["a.log"]);
        feed.push_created(["b.log"]);
        feed.close();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let mut calls = 0;
        let sink = move |record: NormalizedValue| {
            calls += 1;
            if calls == 1 {
                panic!("consumer gone");
            }
            sink_seen.lock().push(record);
        };

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(str_field(&seen[0], "seq"), Some("b"));

        let metrics = watcher.metrics();
        assert_eq!(metrics.emit_panics, 1);
        assert_eq!(metrics.files_processed, 1);
        assert_eq!(watcher.phase(), WatchPhase::Stopped);
    }

    #[test]
    fn test_rearm_failure_after_batch_ends_loop() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), "{\"a\":1}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["a.log"]);
        feed.fail_rearm();
        feed.push_created(["a.log"]);

        let watcher = json_watcher(options(tmp.path(), &tmp.path().join("meta")));
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(feed.polls(), 1);
        assert!(watcher.await_stop_timeout(Duration::from_secs(1)));
        assert_eq!(watcher.phase(), WatchPhase::Stopped);
    }

    #[test]
    fn test_blocking_mode_exits_when_source_closes() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), "{\"a\":1}").unwrap();

        let (source, feed) = FakeSource::new();
        feed.push_created(["a.log"]);
        feed.close();

        let watcher = json_watcher(WatcherOptions {
            watch_mode: WatchMode::Blocking,
            ..options(tmp.path(), &tmp.path().join("meta"))
        });
        let (seen, sink) = collector();
        watcher.start_with(move |_: &Path| Ok(source), sink).unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert!(watcher.stop_handle().is_stopped());
    }

    // ── Startup failures ────────────────────────────────────────

    #[test]
    fn test_meta_dir_failure_releases_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let watcher = json_watcher(options(tmp.path(), &blocker.join("meta")));
        let err = watcher
            .start_with(
                |_: &Path| -> notify::Result<FakeSource> { panic!("registration must not run") },
                |_: NormalizedValue| {},
            )
            .unwrap_err();

        assert!(matches!(err, WatchError::MetaDir { .. }));
        assert!(watcher.await_stop_timeout(Duration::from_secs(1)));
        assert_eq!(watcher.phase(), WatchPhase::Stopped);
    }

    #[test]
    fn test_registration_failure_releases_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(options(&tmp.path().join("missing"), &tmp.path().join("meta")));

        let err = watcher.start(|_: NormalizedValue| {}).unwrap_err();

        assert!(matches!(err, WatchError::Register { .. }));
        assert!(tmp.path().join("meta").is_dir());
        assert!(watcher.await_stop_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn test_local_url_without_port_aborts_start() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(WatcherOptions {
            with_auxiliary_service: true,
            rest_url: "http://localhost/metadata/JSON".to_string(),
            ..options(tmp.path(), &tmp.path().join("meta"))
        });

        let err = watcher
            .start_with(
                |_: &Path| -> notify::Result<FakeSource> { panic!("registration must not run") },
                |_: NormalizedValue| {},
            )
            .unwrap_err();

        assert!(matches!(err, WatchError::Launch(LaunchError::MissingPort { .. })));
        assert!(watcher.await_stop_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn test_remote_url_skips_launch() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = json_watcher(WatcherOptions {
            with_auxiliary_service: true,
            rest_url: "http://remotehost/metadata/JSON".to_string(),
            ..options(tmp.path(), &tmp.path().join("meta"))
        });

        let (source, feed) = FakeSource::new();
        feed.close();
        assert!(watcher.start_with(move |_: &Path| Ok(source), |_: NormalizedValue| {}).is_ok());
    }

    // ── End to end ──────────────────────────────────────────────

    #[test]
    fn test_end_to_end_with_real_notifications() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        let staging = tmp.path().join("staging");
        fs::create_dir_all(&data).unwrap();
        fs::create_dir_all(&staging).unwrap();

        let watcher = Arc::new(json_watcher(options(&data, &tmp.path().join("meta"))));
        let (tx, rx) = std::sync::mpsc::channel();

        let runner = {
            let watcher = Arc::clone(&watcher);
            thread::spawn(move || {
                watcher.start(move |record: NormalizedValue| {
                    let _ = tx.send(record);
                })
            })
        };

        // Give the registration time to be installed before the file lands.
        let deadline = Instant::now() + Duration::from_secs(5);
        while watcher.phase() != WatchPhase::Running && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(300));

        let staged = staging.join("audit-0001.log");
        fs::write(&staged, "{\"seq\":\"1\"}\n{\"seq\":\"2\"}\n").unwrap();
        fs::rename(&staged, data.join("audit-0001.log")).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(str_field(&first, "seq"), Some("1"));
        assert_eq!(str_field(&second, "seq"), Some("2"));
        assert_eq!(str_field(&first, "type"), Some("audit-log"));
        assert_eq!(str_field(&second, "type"), Some("audit-log"));

        watcher.stop();
        assert!(watcher.await_stop_timeout(Duration::from_secs(2)));
        assert!(runner.join().unwrap().is_ok());
    }

    // ── Options ─────────────────────────────────────────────────

    #[test]
    fn test_options_from_config() {
        let config = ShipperConfig {
            record_type: String::new(),
            poll_interval_ms: 250,
            ..ShipperConfig::default()
        };
        let opts = WatcherOptions::from(&config);
        assert!(opts.record_label.is_none());
        assert_eq!(opts.poll_interval, Duration::from_millis(250));
        assert_eq!(opts.metadata_ready_timeout, Duration::from_millis(2000));
        assert!(opts.with_auxiliary_service);
    }
}
