//! Dotted-path walking over payload trees.
//!
//! A path `a.b.c` addresses nested mappings; a numeric segment indexes into a sequence.
//! Reads treat a non-traversable node as "not found". Writes replace a scalar with a mapping
//! and turn a sequence they cannot index into a mapping keyed by element position.

use crate::state::Payload;
use serde_json::{Map, Value};

pub(crate) fn empty() -> Value {
    Value::Object(Map::new())
}

pub(crate) fn lookup<'a>(map: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut node = map.get(segments.next()?)?;
    for segment in segments {
        node = match node {
            Value::Object(children) => children.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn lookup_mut<'a>(map: &'a mut Payload, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.');
    let mut node = map.get_mut(segments.next()?)?;
    for segment in segments {
        node = match node {
            Value::Object(children) => children.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Turns `node` into a mapping unless it already is one.
///
/// Sequence elements survive under their index (`"0"`, `"1"`, ...); scalars are dropped.
pub(crate) fn ensure_object(node: &mut Value) -> &mut Payload {
    if let Value::Array(items) = node {
        let indexed = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect();
        *node = Value::Object(indexed);
    } else if !node.is_object() {
        *node = empty();
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was replaced by a mapping"),
    }
}

/// Sequence index addressed by `segment`, if `node` is a sequence and the index is at most
/// its length (one past the end appends).
fn sequence_slot(node: &Value, segment: &str) -> Option<usize> {
    match node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    }
}

fn descend<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let slot = sequence_slot(node, segment);
    match (node, slot) {
        (Value::Array(items), Some(index)) => {
            if index == items.len() {
                items.push(empty());
            }
            &mut items[index]
        },
        (node, _) => ensure_object(node).entry(segment).or_insert_with(empty),
    }
}

fn put(node: &mut Value, key: &str, value: Value) {
    if let Some(index) = sequence_slot(node, key)
        && let Value::Array(items) = node
    {
        if index == items.len() {
            items.push(value);
        } else {
            items[index] = value;
        }
        return;
    }
    ensure_object(node).insert(key.to_owned(), value);
}

/// Sets the value at `path`, creating intermediate mappings as needed.
pub(crate) fn assign(map: &mut Payload, path: &str, value: Value) {
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        map.insert(path.to_owned(), value);
        return;
    };

    let mut segments = parents.split('.');
    let first = segments.next().unwrap_or(parents);
    let mut node = map.entry(first).or_insert_with(empty);
    for segment in segments {
        node = descend(node, segment);
    }
    put(node, leaf, value);
}

/// Appends to the sequence at `path`, or behaves like [`assign`] for anything else.
pub(crate) fn append(map: &mut Payload, path: &str, value: Value) {
    if let Some(Value::Array(items)) = lookup_mut(map, path) {
        items.push(value);
    } else {
        assign(map, path, value);
    }
}

/// Removes the entry at `path`, returning it if it existed.
pub(crate) fn remove(map: &mut Payload, path: &str) -> Option<Value> {
    let Some((parent, leaf)) = path.rsplit_once('.') else {
        return map.remove(path);
    };

    match lookup_mut(map, parent)? {
        Value::Object(children) => children.remove(leaf),
        Value::Array(items) => {
            let index = leaf.parse::<usize>().ok().filter(|i| *i < items.len())?;
            Some(items.remove(index))
        },
        _ => None,
    }
}
