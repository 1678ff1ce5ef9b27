//! Serve: run the watch loop on its own thread until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::conf::{ShipperConfig, WatchMode};
use crate::parser::{JsonLinesParser, RecordParser};
use crate::runtime::stop::shutdown_signal;
use crate::watcher::{DirectoryWatcher, EventSink, JsonLinesSink, WatcherOptions};

/// How long shutdown waits for the loop to notice the stop flag.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the watcher from configuration and emit records to stdout as JSON
/// lines until Ctrl+C/SIGTERM or the loop ends on its own.
pub async fn serve(config: ShipperConfig) -> Result<()> {
    let parser: Arc<dyn RecordParser> = Arc::new(JsonLinesParser::new());
    let watcher = Arc::new(DirectoryWatcher::new(WatcherOptions::from(&config), parser));

    info!("========================================");
    info!("Audit-log shipper is ready!");
    info!("Records are written to stdout, one JSON document per line");
    info!("Press Ctrl+C to shutdown gracefully");
    info!("========================================");

    run(watcher, JsonLinesSink::stdout(), shutdown_signal()).await
}

/// Drive `watcher` on a dedicated thread until it exits or `shutdown`
/// resolves, then stop it and wait (bounded) for completion.
pub async fn run<S, F>(watcher: Arc<DirectoryWatcher>, sink: S, shutdown: F) -> Result<()>
where
    S: EventSink + 'static,
    F: Future<Output = ()>,
{
    let (done_tx, mut done_rx) = oneshot::channel();
    let loop_watcher = Arc::clone(&watcher);
    thread::Builder::new()
        .name("watch-loop".to_string())
        .spawn(move || {
            let _ = done_tx.send(loop_watcher.start(sink));
        })
        .context("Failed to spawn watch loop thread")?;

    let exited = tokio::select! {
        result = &mut done_rx => Some(result),
        _ = shutdown => None,
    };

    let outcome = match exited {
        Some(result) => result,
        None => {
            info!("Stopping watcher...");
            watcher.stop();
            if watcher.options().watch_mode == WatchMode::Blocking {
                warn!("Blocking watch mode only observes stop after the next event; shutdown may time out");
            }

            let handle = watcher.stop_handle();
            let finished = tokio::task::spawn_blocking(move || handle.await_stop_timeout(STOP_TIMEOUT))
                .await
                .context("Stop wait task failed")?;

            if finished {
                done_rx.await
            } else {
                warn!("Watch loop did not stop within {}s; exiting anyway", STOP_TIMEOUT.as_secs());
                Ok(Ok(()))
            }
        }
    };

    let snapshot = watcher.metrics();
    info!(
        files = snapshot.files_processed,
        records = snapshot.records_emitted,
        empty = snapshot.empty_files,
        access_denied = snapshot.access_denied,
        read_failures = snapshot.read_failures,
        parse_failures = snapshot.parse_failures + snapshot.parser_panics,
        emit_panics = snapshot.emit_panics,
        "Ingest summary"
    );

    match outcome {
        Ok(result) => result.context("Watch loop failed"),
        Err(_) => {
            warn!("Watch loop thread ended without reporting a result");
            Ok(())
        }
    }
}
