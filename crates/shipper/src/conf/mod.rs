//! Conf module: configuration model and loading.

pub mod model;
pub mod load;

pub use load::ConfigError;
pub use model::{LogFormat, LoggingConfig, ShipperConfig, WatchMode};
