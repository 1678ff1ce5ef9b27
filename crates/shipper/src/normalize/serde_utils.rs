use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Serialize ordered `(key, value)` pairs as a map, preserving their order.
pub fn serialize_entries_as_map<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (k, v) in entries {
        map.serialize_entry(k, v)?;
    }
    map.end()
}
