use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::parser::traits::*;
use crate::parser::MAX_LINE_SIZE;
use crate::record::{FieldValue, RecordTree, Scalar};

const TIME_FIELDS: [&str; 4] = ["timestamp", "@timestamp", "time", "ts"];

/// Configuration for the JSON-lines parser
#[derive(Debug, Clone)]
pub struct JsonLinesConfig {
    /// Maximum line size (default: 1MB)
    pub max_line_size: usize,
    /// Name given to every top-level record
    pub record_name: String,
}

impl Default for JsonLinesConfig {
    fn default() -> Self {
        Self {
            max_line_size: MAX_LINE_SIZE,
            record_name: "record".to_string(),
        }
    }
}

/// One JSON object per line, one record per object.
///
/// A file is decoded all-or-nothing: any bad line fails the whole file, so a
/// half-written file is retried on its next modification instead of being
/// shipped partially.
pub struct JsonLinesParser {
    config: JsonLinesConfig,
}

impl JsonLinesParser {
    pub fn new() -> Self {
        Self {
            config: JsonLinesConfig::default(),
        }
    }

    pub fn with_config(config: JsonLinesConfig) -> Self {
        Self { config }
    }

    fn parse_line(&self, line: &[u8], line_no: usize) -> Result<RecordTree, ParseError> {
        if line.len() > self.config.max_line_size {
            return Err(ParseError::LineTooLarge(line.len(), self.config.max_line_size));
        }

        let text = std::str::from_utf8(line).map_err(|_| ParseError::NonUtf8(line_no))?;
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ParseError::ParseFailed(format!("line {}: invalid JSON: {}", line_no, e)))?;

        let obj = value.as_object().ok_or_else(|| {
            ParseError::InvalidFormat(format!("line {}: JSON is not an object", line_no))
        })?;

        let timestamp = extract_timestamp(obj).unwrap_or_else(Utc::now);
        Ok(tree_from_object(&self.config.record_name, obj, timestamp))
    }
}

impl Default for JsonLinesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for JsonLinesParser {
    fn parse(&self, raw: &[u8]) -> Result<Vec<RecordTree>, ParseError> {
        let mut records = Vec::new();
        for (index, line) in raw.split(|b| *b == b'\n').enumerate() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            records.push(self.parse_line(line, index + 1)?);
        }
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "json_lines"
    }
}

// Helper functions

fn tree_from_object(name: &str, obj: &Map<String, Value>, timestamp: DateTime<Utc>) -> RecordTree {
    let mut tree = RecordTree::with_timestamp(name, timestamp);
    // JSON object keys are unique after decoding.
    for (key, value) in obj {
        tree.push_unique(key.as_str(), field_from_value(key, value, timestamp));
    }
    tree
}

fn field_from_value(key: &str, value: &Value, timestamp: DateTime<Utc>) -> FieldValue {
    match value {
        Value::Null => FieldValue::null(),
        Value::Bool(b) => FieldValue::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::from(i),
            None => FieldValue::Scalar(n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null)),
        },
        Value::String(s) => FieldValue::from(s.as_str()),
        Value::Array(items) => FieldValue::List(
            items
                .iter()
                .map(|item| field_from_value(key, item, timestamp))
                .collect(),
        ),
        Value::Object(child) => FieldValue::Record(tree_from_object(key, child, timestamp)),
    }
}

fn extract_timestamp(obj: &Map<String, Value>) -> Option<DateTime<Utc>> {
    for field in TIME_FIELDS {
        if let Some(value) = obj.get(field) {
            let result = match value {
                Value::Number(n) => n.as_i64().and_then(from_unix),
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
                    .or_else(|| s.parse::<i64>().ok().and_then(from_unix)),
                _ => None,
            };

            if result.is_some() {
                return result;
            }
        }
    }
    None
}

/// Unix timestamp in seconds or milliseconds.
fn from_unix(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 1_000_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}
