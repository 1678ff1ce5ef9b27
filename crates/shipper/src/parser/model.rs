use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Non-UTF8 content at line {0}")]
    NonUtf8(usize),

    #[error("Parser panic: {0}")]
    ParserPanic(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),
}
