//! Sink: the downstream consumer of normalized records.

use std::io::{self, Stdout, Write};

use tracing::error;

use crate::normalize::NormalizedValue;

/// Receives each record, one at a time, in emission order.
///
/// Any `FnMut(NormalizedValue) + Send` closure is a sink.
pub trait EventSink: Send {
    fn emit(&mut self, record: NormalizedValue);
}

impl<F> EventSink for F
where
    F: FnMut(NormalizedValue) + Send,
{
    fn emit(&mut self, record: NormalizedValue) {
        self(record)
    }
}

/// Writes each record as one compact JSON line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &NormalizedValue) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, record: NormalizedValue) {
        if let Err(e) = self.write_record(&record) {
            error!("Failed to write record: {}", e);
        }
    }
}
