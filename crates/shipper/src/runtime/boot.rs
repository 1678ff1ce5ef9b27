//! Boot: logging init and config load.

use anyhow::{Context, Result};
use tracing::info;

use crate::conf::{LogFormat, LoggingConfig, ShipperConfig};

/// Phase 1: thread-local logging so config loading can log.
/// Writes to stderr; stdout carries emitted records.
pub fn init_logging_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shipper=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: global subscriber from configuration. RUST_LOG wins over the
/// configured level.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// Load and validate configuration, then install the configured logger.
pub fn boot() -> Result<ShipperConfig> {
    let basic = init_logging_basic();

    info!("Starting audit-log shipper v{}", env!("CARGO_PKG_VERSION"));

    let config = ShipperConfig::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    drop(basic);
    init_logging(&config.logging);

    info!("Configuration loaded successfully");
    info!("  - Directory: {}", config.directory.display());
    info!("  - Metadata directory: {}", config.meta_dir.display());
    info!("  - Metadata URL: {} (auxiliary service: {})", config.rest_url, config.with_auxiliary_service);
    info!("  - Watch mode: {} (idle tick {}ms)", config.watch_mode, config.poll_interval_ms);

    Ok(config)
}
