// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! The capability set every layer store provides.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::{DataOptions, Result};

/// A key-path addressable configuration store.
///
/// [`crate::LayerStack`] only talks to its layers through this trait, so
/// any store variant can back a layer.
pub trait Store: std::fmt::Debug + Send {
    /// Value at `keys`, or `None` if absent or `keys` is empty.
    fn get(&self, keys: &[&str]) -> Option<&Value>;

    /// Presence of `keys`. `None` when `keys` is empty.
    fn exists(&self, keys: &[&str]) -> Option<bool>;

    /// Write `value` at `keys` and return it.
    ///
    /// Returns `None` without writing when `keys` is empty or the store
    /// is data readonly.
    fn set(&mut self, keys: &[&str], value: Value) -> Option<Value>;

    /// Remove the value at `keys` and return it.
    fn delete(&mut self, keys: &[&str]) -> Option<Value>;

    /// Drop all data and reset the version to the latest version.
    fn erase(&mut self);

    /// Load the backing file, optionally switching to `file` first.
    ///
    /// Returns `Ok(false)` for an empty file.
    fn load(&mut self, file: Option<&Path>) -> Result<bool>;

    /// Save to the backing file, optionally switching to `file` first.
    ///
    /// Returns `Ok(false)` when the store is file readonly.
    fn save(&mut self, file: Option<&Path>) -> Result<bool>;

    fn version(&self) -> Option<&str>;

    fn set_version(&mut self, version: Option<String>);

    fn latest_version(&self) -> Option<&str>;

    fn filename(&self) -> Option<&Path>;

    fn set_filename(&mut self, file: &Path) -> PathBuf;

    fn data_options(&self) -> &DataOptions;

    /// Replace the whole option set and return the new one.
    fn set_data_options(&mut self, options: DataOptions) -> &DataOptions;

    /// Label of this store when reporting where `keys` was found.
    fn where_label(&self, _keys: &[&str], name: &str) -> String {
        name.to_string()
    }

    /// The whole data mapping.
    fn data(&self) -> &Mapping;

    /// Top level entries of the store data.
    fn entries(&self) -> serde_yaml::mapping::Iter<'_> {
        self.data().iter()
    }
}
