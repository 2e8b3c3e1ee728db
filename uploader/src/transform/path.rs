//! Dotted-path writer for nested payloads.
//!
//! `set_path(payload, "exercise.title", v)` walks or creates the
//! intermediate objects and writes `v` at the leaf.
//!
//! Type conflicts resolve last-write-wins: an intermediate segment that
//! holds a non-object value is replaced by an empty object. Nothing is
//! reported; whatever was stored there is dropped.

use serde_json::{Map, Value};

use crate::models::Payload;

/// Path segment separator.
pub const SEPARATOR: char = '.';

/// Write `value` at `path` inside `payload`, creating objects as needed.
pub fn set_path(payload: &mut Payload, path: &str, value: Value) {
    let mut segments = path.split(SEPARATOR);
    // split always yields at least one item
    let mut leaf = segments.next().unwrap_or_default();
    let mut node = payload;

    for next in segments {
        let slot = node.entry(leaf.to_string()).or_insert(Value::Null);
        node = coerce_to_map(slot);
        leaf = next;
    }

    node.insert(leaf.to_string(), value);
}

/// Turn `slot` into an object, discarding any non-object it held.
pub fn coerce_to_map(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

/// Read the value at `path`, if every segment exists.
pub fn get_path<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(SEPARATOR);
    let first = segments.next()?;
    let mut current = payload.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_creates_intermediate_objects() {
        let mut payload = Payload::new();
        set_path(&mut payload, "exercise.title", json!("Bench Press"));
        set_path(&mut payload, "exercise.muscle_group", json!("chest"));
        assert_eq!(
            Value::Object(payload),
            json!({"exercise": {"title": "Bench Press", "muscle_group": "chest"}})
        );
    }

    #[test]
    fn test_single_segment_path() {
        let mut payload = Payload::new();
        set_path(&mut payload, "name", json!(1));
        assert_eq!(payload["name"], json!(1));
    }

    #[test]
    fn test_scalar_intermediate_is_replaced() {
        let mut payload = Payload::new();
        set_path(&mut payload, "a", json!("scalar"));
        set_path(&mut payload, "a.b", json!(2));
        assert_eq!(Value::Object(payload), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_leaf_overwrites_previous_value() {
        let mut payload = Payload::new();
        set_path(&mut payload, "a.b", json!({"deep": true}));
        set_path(&mut payload, "a.b", json!("flat"));
        assert_eq!(Value::Object(payload), json!({"a": {"b": "flat"}}));
    }

    #[test]
    fn test_round_trip_non_colliding_paths() {
        let writes = [
            ("exercise.title", json!("Squat")),
            ("exercise.meta.level", json!(3)),
            ("exercise.other_muscles", json!(["glutes", "hamstrings"])),
            ("routine.id", json!(null)),
        ];
        let mut payload = Payload::new();
        for (path, value) in &writes {
            set_path(&mut payload, path, value.clone());
        }
        for (path, value) in &writes {
            assert_eq!(get_path(&payload, path), Some(value), "path {}", path);
        }
    }
}
