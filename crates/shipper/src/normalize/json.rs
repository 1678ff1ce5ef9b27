use serde_json::{Map, Number, Value};

use crate::record::{FieldValue, RecordTree, Scalar};

/// JSON document form of a tree. Relies on serde_json's `preserve_order`
/// so object keys keep field-insertion order.
pub fn normalize_to_json(tree: &RecordTree) -> Value {
    Value::Object(json_object(tree))
}

/// Pretty-printed JSON document.
pub fn to_json_string(tree: &RecordTree) -> String {
    // Serializing a Value cannot fail: all keys are strings.
    serde_json::to_string_pretty(&normalize_to_json(tree)).unwrap_or_default()
}

fn json_object(tree: &RecordTree) -> Map<String, Value> {
    let mut object = Map::with_capacity(tree.len());
    for (key, value) in tree.fields() {
        object.insert(key.to_string(), json_value(value));
    }
    object
}

fn json_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Record(child) => Value::Object(json_object(child)),
        FieldValue::List(items) => Value::Array(items.iter().map(json_value).collect()),
        FieldValue::Scalar(scalar) => json_scalar(scalar),
    }
}

fn json_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::Number((*i).into()),
        Scalar::Float(x) => Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null),
        Scalar::Str(s) => Value::String(s.clone()),
        Scalar::Timestamp(ts) => Value::String(Scalar::format_timestamp(ts)),
    }
}
