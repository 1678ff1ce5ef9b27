pub use super::model::ParseError;
use crate::record::RecordTree;

/// Decoder for the raw contents of one audit-log file.
///
/// Implementations are constructed explicitly and handed to the watcher, so
/// tests can substitute their own.
pub trait RecordParser: Send + Sync {
    /// Decode the whole file into records, in file order.
    fn parse(&self, raw: &[u8]) -> Result<Vec<RecordTree>, ParseError>;

    fn name(&self) -> &'static str;
}
