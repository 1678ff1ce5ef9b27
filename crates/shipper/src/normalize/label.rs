use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{NormalizedMap, NormalizedValue};
use crate::record::Scalar;

/// Top-level key that carries the configured record label.
pub const LABEL_KEY: &str = "type";

/// How the configured label is attached to each emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPolicy {
    /// Always write `type`, replacing any decoded value. With no label
    /// configured the key is still written, as null.
    #[default]
    Overwrite,
    /// Write `type` only when the record has no such field and a label is
    /// configured.
    SetIfAbsent,
}

impl LabelPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelPolicy::Overwrite => "overwrite",
            LabelPolicy::SetIfAbsent => "set-if-absent",
        }
    }

    pub fn apply(&self, map: &mut NormalizedMap, label: Option<&str>) {
        let value = || {
            NormalizedValue::Scalar(label.map(Scalar::from).unwrap_or(Scalar::Null))
        };

        match self {
            LabelPolicy::Overwrite => map.insert(LABEL_KEY, value()),
            LabelPolicy::SetIfAbsent => {
                if label.is_some() && !map.contains_key(LABEL_KEY) {
                    map.insert(LABEL_KEY, value());
                }
            }
        }
    }
}

impl FromStr for LabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(LabelPolicy::Overwrite),
            "set-if-absent" | "set_if_absent" => Ok(LabelPolicy::SetIfAbsent),
            other => Err(format!("unknown label policy '{}' (expected overwrite or set-if-absent)", other)),
        }
    }
}
