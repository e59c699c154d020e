// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Layers of a [`crate::LayerStack`] and the ways to select them.

use crate::{PathStore, Store, DEFAULT_LAYER_NAME};

/// A named store taking part in a layer stack.
#[derive(Debug)]
pub struct Layer {
    name: String,
    store: Box<dyn Store>,

    /// Default target of writes that do not name a layer.
    pub writable: bool,

    /// The stack may load this layer from its file.
    pub loadable: bool,

    /// The stack may save this layer to its file.
    pub savable: bool,

    /// The stack may assign this layer's file.
    pub has_file: bool,

    /// Installed with the stack; cannot be removed.
    pub(crate) protected: bool,
}

impl Layer {
    /// Define a writable, non persisted layer around `store`.
    pub fn new<N, S>(name: N, store: S) -> Self
    where
        N: Into<String>,
        S: Store + 'static,
    {
        Self {
            name: name.into(),
            store: Box::new(store),
            writable: true,
            loadable: false,
            savable: false,
            has_file: false,
            protected: false,
        }
    }

    /// Define a layer named `name` around an empty [`PathStore`].
    pub fn named<N: Into<String>>(name: N) -> Self {
        Self::new(name, PathStore::new())
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn loadable(mut self, loadable: bool) -> Self {
        self.loadable = loadable;
        self
    }

    pub fn savable(mut self, savable: bool) -> Self {
        self.savable = savable;
        self
    }

    pub fn has_file(mut self, has_file: bool) -> Self {
        self.has_file = has_file;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn Store {
        &mut *self.store
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

impl Default for Layer {
    /// The `runtime` layer: writable, in memory only.
    fn default() -> Self {
        Self::named(DEFAULT_LAYER_NAME)
    }
}

/// Selects layer indexes in a stack.
pub enum LayerSelector<'a> {
    /// Every index holding a layer with this name.
    Name(&'a str),
    /// For each name in order, the index of its topmost layer.
    Names(&'a [&'a str]),
    /// Every index whose layer satisfies the predicate.
    Matching(Box<dyn Fn(&Layer, usize) -> bool + 'a>),
}

impl<'a> LayerSelector<'a> {
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&Layer, usize) -> bool + 'a,
    {
        Self::Matching(Box::new(predicate))
    }
}

impl<'a> From<&'a str> for LayerSelector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a [&'a str]> for LayerSelector<'a> {
    fn from(names: &'a [&'a str]) -> Self {
        Self::Names(names)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for LayerSelector<'a> {
    fn from(names: &'a [&'a str; N]) -> Self {
        Self::Names(names)
    }
}
