// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Merge logic for values found in several layers.
//!
//! Values are folded from the highest precedence layer down:
//! - Mappings: deep-merge by key, higher precedence keys win
//! - Lists: the higher precedence list is kept as is
//! - Mismatched kinds or scalars: the lower precedence value replaces
//!   everything folded so far

use serde_yaml::{Mapping, Value};

#[cfg(test)]
#[path = "./merge_test.rs"]
mod merge_test;

/// Container kind of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Mapping,
    List,
    /// Anything else, tagged values included.
    Scalar,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Mapping(_) => Self::Mapping,
            Value::Sequence(_) => Self::List,
            _ => Self::Scalar,
        }
    }

    pub fn is_container(self) -> bool {
        !matches!(self, Self::Scalar)
    }
}

/// Deep merge two mappings, `overlay` wins on conflicting keys.
///
/// Nested mappings present on both sides are merged recursively. Any
/// other conflict takes the overlay value.
pub fn deep_merge(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, overlay_value) in overlay {
        let merged = match (base.remove(&key), overlay_value) {
            (Some(Value::Mapping(base_map)), Value::Mapping(overlay_map)) => {
                Value::Mapping(deep_merge(base_map, overlay_map))
            }
            (_, overlay_value) => overlay_value,
        };
        base.insert(key, merged);
    }
    base
}

/// Fold one lower precedence value into the accumulated value.
fn merge_step(acc: Value, lower: Value) -> Value {
    match (ValueKind::of(&acc), ValueKind::of(&lower)) {
        (ValueKind::Mapping, ValueKind::Mapping) => match (acc, lower) {
            (Value::Mapping(acc), Value::Mapping(lower)) => Value::Mapping(deep_merge(lower, acc)),
            (acc, _) => acc,
        },
        (ValueKind::List, ValueKind::List) => acc,
        _ => lower,
    }
}

/// Merge values ordered from highest to lowest precedence.
///
/// Returns `None` when there is nothing to merge.
pub fn merge_values<I>(values: I) -> Option<Value>
where
    I: IntoIterator<Item = Value>,
{
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some(value),
        Some(acc) => Some(merge_step(acc, value)),
    })
}

/// Check if values ordered from highest to lowest precedence can merge.
///
/// The lowest precedence value decides: it must be a mapping or a list.
/// When `exclusive` is set, every value must also be of that same kind.
pub fn is_mergeable(values: &[&Value], exclusive: bool) -> bool {
    let Some(base) = values.last() else {
        return false;
    };
    let kind = ValueKind::of(base);
    if !kind.is_container() {
        return false;
    }
    !exclusive || values.iter().all(|value| ValueKind::of(value) == kind)
}
