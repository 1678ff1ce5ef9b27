/// Record parsing
///
/// Turns the raw bytes of one audit-log file into an ordered sequence of
/// [`RecordTree`](crate::record::RecordTree)s.
///
/// # Architecture
///
/// - `traits.rs`: the [`RecordParser`] seam the watcher calls
/// - `model.rs`: [`ParseError`]
/// - `formats/`: concrete parser implementations
///
/// # Safety Guarantees
///
/// - Panic safety ([`parse_guarded`] wraps every call in `catch_unwind`)
/// - Binary safety (non-UTF8 input is an error, never a panic)
/// - Line size limits

pub mod formats;
pub mod model;
pub mod traits;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::record::RecordTree;

// Re-export commonly used types
pub use formats::{JsonLinesConfig, JsonLinesParser};
pub use model::ParseError;
pub use traits::RecordParser;

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB

/// Run `parser` and turn a panic into [`ParseError::ParserPanic`], so one
/// bad file cannot take down the watch loop.
pub fn parse_guarded(parser: &dyn RecordParser, raw: &[u8]) -> Result<Vec<RecordTree>, ParseError> {
    match panic::catch_unwind(AssertUnwindSafe(|| parser.parse(raw))) {
        Ok(result) => result,
        Err(payload) => Err(ParseError::ParserPanic(panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingParser;

    impl RecordParser for PanickingParser {
        fn parse(&self, _raw: &[u8]) -> Result<Vec<RecordTree>, ParseError> {
            panic!("decoder exploded");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn test_parse_guarded_catches_panic() {
        let err = parse_guarded(&PanickingParser, b"anything").unwrap_err();
        match err {
            ParseError::ParserPanic(msg) => assert_eq!(msg, "decoder exploded"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_guarded_passes_through() {
        let records = parse_guarded(&JsonLinesParser::new(), br#"{"a":1}"#).unwrap();
        assert_eq!(records.len(), 1);
    }
}
