//! Dotted-path access into JSON values (`result.data`, `options.auth.user`,
//! `bbox.0`).

use serde_json::{Map, Value};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, seg| match current {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

pub fn get_path_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    segments(path).try_fold(value, |current, seg| match current {
        Value::Object(map) => map.get_mut(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

fn child_mut<'a>(value: &'a mut Value, seg: &str) -> &'a mut Value {
    let index = match &*value {
        Value::Array(items) => seg.parse::<usize>().ok().filter(|i| *i < items.len()),
        _ => None,
    };
    if index.is_none() && !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match (value, index) {
        (Value::Array(items), Some(idx)) => &mut items[idx],
        (Value::Object(map), _) => map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        (other, _) => other,
    }
}

/// Set `new_value` at `path`, creating intermediate objects as needed.
/// Non-container intermediates are replaced by objects.
pub fn set_path(value: &mut Value, path: &str, new_value: Value) {
    let slot = segments(path).fold(value, |current, seg| child_mut(current, seg));
    *slot = new_value;
}

/// Remove the value at `path`, returning it if present.
pub fn unset_path(value: &mut Value, path: &str) -> Option<Value> {
    let segs: Vec<&str> = segments(path).collect();
    let (last, parents) = segs.split_last()?;

    let mut current = value;
    for seg in parents {
        current = match current {
            Value::Object(map) => map.get_mut(*seg)?,
            Value::Array(items) => items.get_mut(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::Object(map) => map.remove(*last),
        _ => None,
    }
}
