/// Concrete record parsers

pub mod json_lines;

// Re-export parser implementations
pub use json_lines::{JsonLinesConfig, JsonLinesParser};
