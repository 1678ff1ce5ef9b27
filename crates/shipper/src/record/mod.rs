//! Record: the recursive value model for one decoded audit record.
//!
//! A [`RecordTree`] is a named bag of fields. Each field holds a
//! [`FieldValue`]: a scalar, an ordered list, or a nested tree. Trees own
//! their children outright, so the structure can never contain cycles.
//!
//! Fields keep their insertion order; `put` on an existing key replaces the
//! value in place (last write wins, position unchanged).

mod dump;
pub mod scalar;

use chrono::{DateTime, Utc};

pub use scalar::{Scalar, DATE_FORMAT};

/// Value held by one field of a [`RecordTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<FieldValue>),
    Record(RecordTree),
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Scalar(Scalar::Null)
    }

    pub fn as_record(&self) -> Option<&RecordTree> {
        match self {
            FieldValue::Record(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(scalar: Scalar) -> Self {
        FieldValue::Scalar(scalar)
    }
}

impl From<RecordTree> for FieldValue {
    fn from(tree: RecordTree) -> Self {
        FieldValue::Record(tree)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(FieldValue::null)
    }
}

/// One decoded record (or sub-record).
#[derive(Debug, Clone)]
pub struct RecordTree {
    name: String,
    timestamp: DateTime<Utc>,
    fields: Vec<(String, FieldValue)>,
}

impl RecordTree {
    /// Create an empty tree stamped with the current instant.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_timestamp(name, Utc::now())
    }

    pub fn with_timestamp(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            timestamp,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Insert or replace a field.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Append a field whose key is known to be absent, skipping the lookup.
    pub(crate) fn push_unique(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Builder-style [`put`](Self::put).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.put(key, value);
        self
    }

    pub fn put_all<K, V, I>(&mut self, entries: I)
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Timestamp is excluded: two decodes of the same bytes are the same record.
impl PartialEq for RecordTree {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}
