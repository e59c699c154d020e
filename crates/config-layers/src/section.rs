// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Stores partitioned by a top level section key.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::{path, DataOptions, PathStore, Result, Store};

#[cfg(test)]
#[path = "./section_test.rs"]
mod section_test;

/// Forwards the section independent part of [`Store`] to a wrapped store.
macro_rules! forward_store {
    ($field:ident) => {
        fn erase(&mut self) {
            self.$field.erase()
        }

        fn load(&mut self, file: Option<&Path>) -> Result<bool> {
            self.$field.load(file)
        }

        fn save(&mut self, file: Option<&Path>) -> Result<bool> {
            self.$field.save(file)
        }

        fn version(&self) -> Option<&str> {
            self.$field.version()
        }

        fn set_version(&mut self, version: Option<String>) {
            self.$field.set_version(version)
        }

        fn latest_version(&self) -> Option<&str> {
            self.$field.latest_version()
        }

        fn filename(&self) -> Option<&Path> {
            self.$field.filename()
        }

        fn set_filename(&mut self, file: &Path) -> PathBuf {
            self.$field.set_filename(file)
        }

        fn data_options(&self) -> &DataOptions {
            self.$field.data_options()
        }

        fn set_data_options(&mut self, options: DataOptions) -> &DataOptions {
            self.$field.set_data_options(options)
        }

        fn data(&self) -> &Mapping {
            self.$field.data()
        }
    };
}

/// A store where every key path lives under the active section.
///
/// The active section comes from the `section` data option and defaults
/// to `default`. With section `prod`, the key path `[db, host]` addresses
/// `prod.db.host` in the underlying data.
#[derive(Debug, Clone, Default)]
pub struct SectionStore {
    inner: PathStore,
}

impl SectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`, keyed by section at the top level.
    pub fn with_data(data: Mapping) -> Self {
        Self {
            inner: PathStore::with_data(data),
        }
    }

    pub fn versioned<S: Into<String>>(data: Mapping, latest_version: S) -> Self {
        Self {
            inner: PathStore::versioned(data, latest_version),
        }
    }

    fn active_section(&self) -> String {
        self.inner.data_options().active_section().to_string()
    }

    /// Value at `keys` inside an explicit `section`.
    fn section_get(&self, section: &str, keys: &[&str]) -> Option<&Value> {
        self.inner.get(&path::prefixed(section, keys))
    }

    fn section_exists(&self, section: &str, keys: &[&str]) -> bool {
        path::exists(self.inner.data(), &path::prefixed(section, keys))
    }
}

impl Store for SectionStore {
    fn get(&self, keys: &[&str]) -> Option<&Value> {
        if keys.is_empty() {
            return None;
        }
        self.section_get(self.inner.data_options().active_section(), keys)
    }

    fn exists(&self, keys: &[&str]) -> Option<bool> {
        if keys.is_empty() {
            return None;
        }
        Some(self.section_exists(self.inner.data_options().active_section(), keys))
    }

    fn set(&mut self, keys: &[&str], value: Value) -> Option<Value> {
        if keys.is_empty() {
            return None;
        }
        let section = self.active_section();
        self.inner.set(&path::prefixed(&section, keys), value)
    }

    fn delete(&mut self, keys: &[&str]) -> Option<Value> {
        if keys.is_empty() {
            return None;
        }
        let section = self.active_section();
        self.inner.delete(&path::prefixed(&section, keys))
    }

    forward_store!(inner);
}

/// A sectioned store whose reads search an ordered list of sections.
///
/// Reads scan the `sections` data option in order, then the default
/// section (`default_section`, or `default` when unset). The first
/// section holding the key path answers. Writes and deletes keep the
/// single section behavior of [`SectionStore`].
#[derive(Debug, Clone, Default)]
pub struct SectionsStore {
    inner: SectionStore,
}

impl SectionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Mapping) -> Self {
        Self {
            inner: SectionStore::with_data(data),
        }
    }

    pub fn versioned<S: Into<String>>(data: Mapping, latest_version: S) -> Self {
        Self {
            inner: SectionStore::versioned(data, latest_version),
        }
    }

    /// Every searched section holding `keys`, in search order.
    pub fn sections_with(&self, keys: &[&str]) -> Vec<&str> {
        if keys.is_empty() {
            return Vec::new();
        }
        self.data_options()
            .search_sections()
            .into_iter()
            .filter(|section| self.inner.section_exists(section, keys))
            .collect()
    }
}

impl Store for SectionsStore {
    fn get(&self, keys: &[&str]) -> Option<&Value> {
        if keys.is_empty() {
            return None;
        }
        self.data_options()
            .search_sections()
            .into_iter()
            .find(|section| self.inner.section_exists(section, keys))
            .and_then(|section| self.inner.section_get(section, keys))
    }

    fn exists(&self, keys: &[&str]) -> Option<bool> {
        if keys.is_empty() {
            return None;
        }
        let found = self
            .data_options()
            .search_sections()
            .into_iter()
            .any(|section| self.inner.section_exists(section, keys));
        Some(found)
    }

    fn set(&mut self, keys: &[&str], value: Value) -> Option<Value> {
        self.inner.set(keys, value)
    }

    fn delete(&mut self, keys: &[&str]) -> Option<Value> {
        self.inner.delete(keys)
    }

    /// `name(section1|section2)` listing every searched section holding
    /// `keys`, or `name` alone when none does.
    fn where_label(&self, keys: &[&str], name: &str) -> String {
        let found = self.sections_with(keys);
        if found.is_empty() {
            return name.to_string();
        }
        format!("{name}({})", found.join("|"))
    }

    forward_store!(inner);
}
