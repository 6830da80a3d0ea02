//! Nested path writer.
//!
//! Authored page records address deep fields with dotted paths like
//! `sections.2.items.0.title`. This module materializes the container
//! structure a path implies inside a target document and assigns the value
//! at the addressed slot. A segment made only of decimal digits addresses an
//! array slot; everything else addresses an object key.

use serde_json::{Map, Value};

/// Digit-only segments address array slots.
fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}

/// Parse a segment that must index into an array.
///
/// Indexing an array with a non-numeric segment is an input-contract
/// violation by the caller, not a recoverable condition.
fn parse_array_index(segment: &str) -> usize {
    match segment.parse::<usize>() {
        Ok(index) => index,
        Err(_) => panic!("Invalid array index: {segment}"),
    }
}

fn new_container(want_array: bool) -> Value {
    if want_array {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn wrong_kind(slot: &Value, want_array: bool) -> bool {
    if want_array {
        !slot.is_array()
    } else {
        !slot.is_object()
    }
}

/// Ensure `cursor[segment]` holds a container of the wanted kind and descend
/// into it. A missing slot is created; a slot holding a scalar or a container
/// of the wrong kind is silently replaced. Writing past the end of an array
/// grows it, filling the gap with nulls.
fn ensure_container<'a>(cursor: &'a mut Value, segment: &str, want_array: bool) -> &'a mut Value {
    match cursor {
        Value::Array(items) => {
            let index = parse_array_index(segment);
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            let slot = &mut items[index];
            if wrong_kind(slot, want_array) {
                *slot = new_container(want_array);
            }
            slot
        }
        Value::Object(map) => {
            let slot = map.entry(segment.to_string()).or_insert(Value::Null);
            if wrong_kind(slot, want_array) {
                *slot = new_container(want_array);
            }
            slot
        }
        other => {
            // A scalar can only sit here when the root itself is one;
            // replace it with the container kind the first segment needs.
            *other = new_container(is_index_segment(segment));
            ensure_container(other, segment, want_array)
        }
    }
}

/// Write `value` into `target` at a dotted/indexed path.
///
/// Every intermediate segment gets a container whose kind is decided by the
/// *next* segment: a decimal-digit segment means the container before it is
/// an array, anything else means an object. Existing containers of the wrong
/// kind are silently replaced.
///
/// # Panics
/// Panics when a non-numeric segment is used to index into an array. That
/// shape of input is a bug in the caller's data, never valid content.
pub fn set_nested_value(target: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((&last, intermediate)) = segments.split_last() else {
        return;
    };

    let mut cursor = target;
    for (position, &segment) in intermediate.iter().enumerate() {
        let next = intermediate.get(position + 1).copied().unwrap_or(last);
        cursor = ensure_container(cursor, segment, is_index_segment(next));
    }

    match cursor {
        Value::Array(items) => {
            let index = parse_array_index(last);
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
        }
        Value::Object(map) => {
            map.insert(last.to_string(), value);
        }
        other => {
            let mut map = Map::new();
            map.insert(last.to_string(), value);
            *other = Value::Object(map);
        }
    }
}
