//! Normalize: turn a [`RecordTree`] into transport-neutral values.
//!
//! Two targets share one recursive descent:
//!
//! - `normalize_to_plain`: ordered maps / lists / scalars ([`NormalizedValue`]),
//!   the shape handed to the downstream consumer.
//! - `normalize_to_json` (in [`json`]): a `serde_json::Value` document with
//!   temporal scalars rendered in the fixed [`DATE_FORMAT`](crate::record::DATE_FORMAT).
//!
//! Key order always follows field-insertion order and nulls are kept as
//! explicit nulls. Normalization cannot fail.

pub mod json;
pub mod label;
mod serde_utils;

use serde::{Serialize, Serializer};

use crate::record::{FieldValue, RecordTree, Scalar};

pub use json::{normalize_to_json, to_json_string};
pub use label::LabelPolicy;

/// Insertion-ordered map with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMap {
    entries: Vec<(String, NormalizedValue)>,
}

impl NormalizedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: NormalizedValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append without the duplicate scan; `key` must not be present.
    fn push_unique(&mut self, key: impl Into<String>, value: NormalizedValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for NormalizedMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_utils::serialize_entries_as_map(&self.entries, serializer)
    }
}

/// Transport-neutral form of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Scalar(Scalar),
    List(Vec<NormalizedValue>),
    Map(NormalizedMap),
}

impl NormalizedValue {
    pub fn as_map(&self) -> Option<&NormalizedMap> {
        match self {
            NormalizedValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NormalizedValue]> {
        match self {
            NormalizedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            NormalizedValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Map lookup; `None` for non-maps and missing keys.
    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Wrap in a single-key map, e.g. `{"audit": {...}}`.
    pub fn wrap(self, key: impl Into<String>) -> NormalizedValue {
        let mut envelope = NormalizedMap::with_capacity(1);
        envelope.push_unique(key, self);
        NormalizedValue::Map(envelope)
    }
}

impl From<Scalar> for NormalizedValue {
    fn from(scalar: Scalar) -> Self {
        NormalizedValue::Scalar(scalar)
    }
}

/// Convert a tree into an ordered map. Scalars pass through unchanged.
pub fn normalize_to_plain(tree: &RecordTree) -> NormalizedValue {
    NormalizedValue::Map(plain_map(tree))
}

fn plain_map(tree: &RecordTree) -> NormalizedMap {
    let mut map = NormalizedMap::with_capacity(tree.len());
    // Tree keys are already unique.
    for (key, value) in tree.fields() {
        map.push_unique(key, plain_value(value));
    }
    map
}

fn plain_value(value: &FieldValue) -> NormalizedValue {
    match value {
        FieldValue::Record(child) => NormalizedValue::Map(plain_map(child)),
        FieldValue::List(items) => NormalizedValue::List(items.iter().map(plain_value).collect()),
        FieldValue::Scalar(scalar) => NormalizedValue::Scalar(scalar.clone()),
    }
}

/// Plain-path normalizer with the configured `type` label handling.
#[derive(Debug, Clone)]
pub struct TreeNormalizer {
    label: Option<String>,
    policy: LabelPolicy,
}

impl TreeNormalizer {
    pub fn new(label: Option<String>, policy: LabelPolicy) -> Self {
        Self { label, policy }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    pub fn normalize(&self, tree: &RecordTree) -> NormalizedValue {
        let mut map = plain_map(tree);
        self.policy.apply(&mut map, self.label.as_deref());
        NormalizedValue::Map(map)
    }
}
