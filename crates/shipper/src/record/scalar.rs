use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Fixed date layout used by the JSON form (`yyyy-MM-dd'T'HH:mm:ss.SSSZ`).
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Leaf value of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Short type tag used by the textual dump.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
            Scalar::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Timestamp(ts) => f.write_str(&Scalar::format_timestamp(ts)),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            // JSON has no NaN/Infinity
            Scalar::Float(x) if !x.is_finite() => serializer.serialize_none(),
            Scalar::Float(x) => serializer.serialize_f64(*x),
            Scalar::Str(s) => serializer.serialize_str(s),
            Scalar::Timestamp(ts) => serializer.serialize_str(&Scalar::format_timestamp(ts)),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for super::FieldValue {
                fn from($v: $ty) -> Self {
                    super::FieldValue::Scalar($conv)
                }
            }
        )*
    };
}

scalar_from! {
    bool => |v| Scalar::Bool(v),
    i32 => |v| Scalar::Int(i64::from(v)),
    i64 => |v| Scalar::Int(v),
    u32 => |v| Scalar::Int(i64::from(v)),
    f64 => |v| Scalar::Float(v),
    &str => |v| Scalar::Str(v.to_string()),
    String => |v| Scalar::Str(v),
    DateTime<Utc> => |v| Scalar::Timestamp(v),
}
