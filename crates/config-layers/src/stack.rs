// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Resolution of key paths over an ordered stack of layers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_yaml::Value;

use crate::merge::{is_mergeable, merge_values};
use crate::{Layer, LayerSelector, Result};

#[cfg(test)]
#[path = "./stack_test.rs"]
mod stack_test;

/// A layer stack shared between threads.
///
/// Every read and write goes through the one lock, so structural changes
/// are never observed half done.
pub type SharedLayerStack = Arc<Mutex<LayerStack>>;

/// Key path lookup options for [`LayerStack`] reads and writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<'a> {
    /// Key path to resolve.
    pub keys: &'a [&'a str],

    /// Restrict the operation to the topmost layer with this name.
    pub name: Option<&'a str>,

    /// Restrict reads to these layers, in this order. Ignored by writes.
    pub names: Option<&'a [&'a str]>,

    /// Merge the values of all selected layers instead of taking the first.
    pub merge: bool,
}

impl<'a> Query<'a> {
    pub fn new(keys: &'a [&'a str]) -> Self {
        Self {
            keys,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn names(mut self, names: &'a [&'a str]) -> Self {
        self.names = Some(names);
        self
    }

    pub fn merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

/// An ordered stack of configuration layers.
///
/// Index 0 is the top of the stack and has the highest precedence. Reads
/// scan from the top down; writes go to the topmost writable layer.
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl Default for LayerStack {
    /// A stack holding only the `runtime` layer.
    fn default() -> Self {
        Self::from_layers([Layer::default()])
    }
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the initial layers, lowest precedence first.
    ///
    /// Each layer is pushed on top of the previous ones, so the last layer
    /// given ends at the top of the stack. Initial layers are protected
    /// and can never be removed.
    pub fn from_layers<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        let mut stack = Self { layers: Vec::new() };
        for mut layer in layers {
            layer.protected = true;
            stack.layers.insert(0, layer);
        }
        stack
    }

    pub fn into_shared(self) -> SharedLayerStack {
        Arc::new(Mutex::new(self))
    }

    /// Layer names from the top of the stack down.
    pub fn layers(&self) -> Vec<&str> {
        self.layers.iter().map(Layer::name).collect()
    }

    /// The topmost layer named `name`.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.name() == name)
    }

    /// Push `layer` on top of the stack.
    ///
    /// Returns false, leaving the stack unchanged, when a layer with the
    /// same name is already present.
    pub fn layer_add(&mut self, mut layer: Layer) -> bool {
        if self.index_of(layer.name()).is_some() {
            tracing::debug!(name = layer.name(), "layer already exists");
            return false;
        }
        tracing::debug!(name = layer.name(), "adding layer");
        layer.protected = false;
        self.layers.insert(0, layer);
        true
    }

    /// Remove the topmost layer named `name`.
    ///
    /// Returns false, leaving the stack unchanged, when there is no such
    /// layer or it is protected.
    pub fn layer_remove(&mut self, name: &str) -> bool {
        let Some(index) = self.index_of(name) else {
            tracing::debug!(name, "no layer to remove");
            return false;
        };
        if self.layers[index].is_protected() {
            tracing::debug!(name, "refusing to remove a protected layer");
            return false;
        }
        tracing::debug!(name, "removing layer");
        self.layers.remove(index);
        true
    }

    /// Stack indexes matching `selector`.
    ///
    /// A single name with no matching layer gives `None`. Names matching
    /// no layer are skipped when selecting by a list of names.
    pub fn layer_indexes<'a, S>(&self, selector: S) -> Option<Vec<usize>>
    where
        S: Into<LayerSelector<'a>>,
    {
        match selector.into() {
            LayerSelector::Name(name) => {
                let indexes: Vec<usize> = self
                    .layers
                    .iter()
                    .enumerate()
                    .filter(|(_, layer)| layer.name() == name)
                    .map(|(index, _)| index)
                    .collect();
                (!indexes.is_empty()).then_some(indexes)
            }
            LayerSelector::Names(names) => Some(self.topmost_indexes(names)),
            LayerSelector::Matching(predicate) => Some(
                self.layers
                    .iter()
                    .enumerate()
                    .filter(|(index, layer)| predicate(*layer, *index))
                    .map(|(index, _)| index)
                    .collect(),
            ),
        }
    }

    /// Version of the layer named `name`.
    pub fn version(&self, name: &str) -> Option<&str> {
        self.layer(name)?.store().version()
    }

    /// Set the version of the layer named `name` and return it.
    pub fn set_version<V: Into<String>>(&mut self, name: &str, version: V) -> Option<&str> {
        let store = self.layer_mut(name)?.store_mut();
        store.set_version(Some(version.into()));
        store.version()
    }

    /// First value found at `keys`, from the top of the stack down.
    pub fn get(&self, keys: &[&str]) -> Option<Value> {
        self.get_with(&Query::new(keys))
    }

    pub fn get_with(&self, query: &Query<'_>) -> Option<Value> {
        if query.keys.is_empty() {
            return None;
        }
        let indexes = self.selected(query);
        if query.merge {
            return merge_values(
                indexes
                    .into_iter()
                    .filter_map(|index| self.layers[index].store().get(query.keys).cloned()),
            );
        }
        indexes.into_iter().find_map(|index| {
            let layer = &self.layers[index];
            let value = layer.store().get(query.keys)?;
            tracing::trace!(keys = ?query.keys, layer = layer.name(), "found value");
            Some(value.clone())
        })
    }

    /// Check if any layer holds `keys`.
    pub fn exists(&self, keys: &[&str]) -> bool {
        self.exists_with(&Query::new(keys))
    }

    pub fn exists_with(&self, query: &Query<'_>) -> bool {
        if query.keys.is_empty() {
            return false;
        }
        self.selected(query)
            .into_iter()
            .any(|index| self.layers[index].store().exists(query.keys) == Some(true))
    }

    /// Labels of every layer holding `keys`, from the top down.
    ///
    /// Returns `None` when no layer holds `keys`.
    pub fn where_is(&self, keys: &[&str]) -> Option<Vec<String>> {
        self.where_is_with(&Query::new(keys))
    }

    pub fn where_is_with(&self, query: &Query<'_>) -> Option<Vec<String>> {
        if query.keys.is_empty() {
            return None;
        }
        let found: Vec<String> = self
            .selected(query)
            .into_iter()
            .map(|index| &self.layers[index])
            .filter(|layer| layer.store().exists(query.keys) == Some(true))
            .map(|layer| layer.store().where_label(query.keys, layer.name()))
            .collect();
        (!found.is_empty()).then_some(found)
    }

    /// Write `value` at `keys` in the topmost writable layer.
    pub fn set(&mut self, keys: &[&str], value: Value) -> Option<Value> {
        self.set_with(&Query::new(keys), value)
    }

    /// Write `value` at `query.keys`.
    ///
    /// With a `name`, the named layer receives the write whatever its
    /// `writable` flag. Otherwise the topmost writable layer does.
    /// The target store may still refuse the write when data readonly.
    pub fn set_with(&mut self, query: &Query<'_>, value: Value) -> Option<Value> {
        if query.keys.is_empty() {
            return None;
        }
        let index = match query.name {
            Some(name) => self.index_of(name),
            None => self.layers.iter().position(|layer| layer.writable),
        };
        let Some(index) = index else {
            tracing::debug!(keys = ?query.keys, "no layer to write to");
            return None;
        };
        self.layers[index].store_mut().set(query.keys, value)
    }

    /// Remove `keys` from the topmost layer holding it.
    ///
    /// Lower layers are untouched, so their value shows through again.
    ///
    /// A [`crate::SectionsStore`] layer is found by searching all of its
    /// sections but only deletes from its active section. When the topmost
    /// holder only has `keys` in another searched section, nothing is
    /// removed and `None` is returned.
    pub fn delete(&mut self, keys: &[&str]) -> Option<Value> {
        if keys.is_empty() {
            return None;
        }
        let index = self
            .layers
            .iter()
            .position(|layer| layer.store().exists(keys) == Some(true))?;
        self.layers[index].store_mut().delete(keys)
    }

    /// Top level entries of the layer named `name`.
    pub fn each(&self, name: &str) -> Option<serde_yaml::mapping::Iter<'_>> {
        Some(self.layer(name)?.store().entries())
    }

    /// Check if the values found at `keys` can be merged.
    ///
    /// The lowest precedence value must be a mapping or a list. With
    /// `exclusive`, all values must be of that same kind.
    pub fn mergeable(&self, keys: &[&str], exclusive: bool) -> bool {
        if keys.is_empty() {
            return false;
        }
        let values: Vec<&Value> = self
            .layers
            .iter()
            .filter_map(|layer| layer.store().get(keys))
            .collect();
        is_mergeable(&values, exclusive)
    }

    /// Merge the values found at `keys` across the whole stack.
    ///
    /// See [`crate::merge`] for the rules.
    pub fn merge(&self, keys: &[&str]) -> Option<Value> {
        self.get_with(&Query::new(keys).merge(true))
    }

    /// Load the layer named `name` from its file.
    ///
    /// Returns `Ok(false)` for an unknown or non loadable layer.
    pub fn load(&mut self, name: &str) -> Result<bool> {
        let Some(layer) = self.layer_mut(name) else {
            return Ok(false);
        };
        if !layer.loadable {
            tracing::debug!(name, "layer is not loadable");
            return Ok(false);
        }
        layer.store_mut().load(None)
    }

    /// Save the layer named `name` to its file.
    ///
    /// Returns `Ok(false)` for an unknown or non savable layer.
    pub fn save(&mut self, name: &str) -> Result<bool> {
        let Some(layer) = self.layer_mut(name) else {
            return Ok(false);
        };
        if !layer.savable {
            tracing::debug!(name, "layer is not savable");
            return Ok(false);
        }
        layer.store_mut().save(None)
    }

    /// Assign the file of the layer named `name`.
    ///
    /// Only layers defined with `has_file` accept a file.
    pub fn set_layer_file(&mut self, name: &str, file: &Path) -> Option<PathBuf> {
        let layer = self.layer_mut(name)?;
        if !layer.has_file {
            tracing::debug!(name, "layer does not accept a file");
            return None;
        }
        Some(layer.store_mut().set_filename(file))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    fn topmost_indexes(&self, names: &[&str]) -> Vec<usize> {
        names.iter().filter_map(|name| self.index_of(name)).collect()
    }

    /// Layer indexes a read query operates on, in resolution order.
    fn selected(&self, query: &Query<'_>) -> Vec<usize> {
        match (query.name, query.names) {
            (Some(name), _) => self.index_of(name).into_iter().collect(),
            (None, Some(names)) => self.topmost_indexes(names),
            (None, None) => (0..self.layers.len()).collect(),
        }
    }
}
