// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Key-path traversal over nested YAML mappings.
//!
//! A key path is an ordered list of key tokens. Every token but the last
//! must address a mapping. An empty key path never addresses anything.

use serde_yaml::{Mapping, Value};

#[cfg(test)]
#[path = "./path_test.rs"]
mod path_test;

/// Build the mapping key for a single key token.
pub fn key(token: &str) -> Value {
    Value::String(token.to_owned())
}

/// Find the value stored at `keys`.
///
/// Returns `None` when `keys` is empty, when any step is missing, or when
/// an intermediate node is not a mapping.
pub fn get<'a>(data: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    let (last, parents) = keys.split_last()?;
    let mut node = data;
    for token in parents {
        node = node.get(*token)?.as_mapping()?;
    }
    node.get(*last)
}

/// Check whether a value is stored at `keys`.
///
/// A stored null still counts as present.
pub fn exists(data: &Mapping, keys: &[&str]) -> bool {
    get(data, keys).is_some()
}

/// Store `value` at `keys`, creating intermediate mappings on the way.
///
/// An intermediate node holding anything other than a mapping is replaced
/// by an empty mapping. Returns the stored value, or `None` for an empty
/// key path.
pub fn set(data: &mut Mapping, keys: &[&str], value: Value) -> Option<Value> {
    let (last, parents) = keys.split_last()?;
    let mut node = data;
    for token in parents {
        let step = key(token);
        if !matches!(node.get(&step), Some(Value::Mapping(_))) {
            node.insert(step.clone(), Value::Mapping(Mapping::new()));
        }
        node = node.get_mut(&step)?.as_mapping_mut()?;
    }
    node.insert(key(last), value.clone());
    Some(value)
}

/// Remove the value stored at `keys` and return it.
pub fn delete(data: &mut Mapping, keys: &[&str]) -> Option<Value> {
    let (last, parents) = keys.split_last()?;
    let mut node = data;
    for token in parents {
        node = node.get_mut(*token)?.as_mapping_mut()?;
    }
    node.remove(*last)
}

/// Prefix a key path with a leading token.
pub fn prefixed<'a>(first: &'a str, keys: &[&'a str]) -> Vec<&'a str> {
    std::iter::once(first).chain(keys.iter().copied()).collect()
}
