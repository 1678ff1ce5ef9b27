//! Error types for the watch loop.
//!
//! [`WatchError`] ends `start`; [`EventError`] is per event and only logged.

use std::path::PathBuf;

use thiserror::Error;

use crate::launcher::LaunchError;
use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Watcher already started")]
    AlreadyStarted,

    #[error("Failed to create metadata directory {path}: {source}")]
    MetaDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata service launch failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("Failed to watch {path}: {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watch loop panicked: {0}")]
    LoopPanicked(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Access denied: {path}")]
    AccessDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Watch backend error: {0}")]
    Backend(#[from] notify::Error),

    #[error("Emitting records from {path} panicked: {message}")]
    EmitPanicked { path: PathBuf, message: String },
}

impl EventError {
    /// Build the read error, singling out permission failures.
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            EventError::AccessDenied { path }
        } else {
            EventError::Read { path, source }
        }
    }
}
