// Module structure for the audit-log shipper.

// Data model
pub mod record;
pub mod normalize;
pub mod parser;

// Watching
pub mod error;
pub mod launcher;
pub mod watcher;

// Process
pub mod conf;
pub mod runtime;
