//! Metadata lookup service for the audit-log shipper.
//!
//! Serves per-name JSON metadata documents from the shipper's metadata
//! directory over plain HTTP. The shipper launches it on its own thread when
//! the configured `rest_url` points at the local host.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use server::{serve, start_api};
pub use state::AppState;
pub use store::MetadataStore;
