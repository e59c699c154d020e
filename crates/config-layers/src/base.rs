// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Single nested-mapping store with versioning and YAML persistence.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::{path, DataOptions, Error, Result, Store, FILE_VERSION_KEY};

#[cfg(test)]
#[path = "./base_test.rs"]
mod base_test;

/// A configuration store holding one tree of nested mappings.
///
/// The data can be persisted to a YAML file. When a version is set, the
/// file carries it under the reserved top level `file_version` key, which
/// never shows up in the in-memory data.
#[derive(Debug, Clone, Default)]
pub struct PathStore {
    data: Mapping,
    version: Option<String>,
    latest_version: Option<String>,
    filename: Option<PathBuf>,
    options: DataOptions,
}

impl PathStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`.
    pub fn with_data(data: Mapping) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Create a store holding `data` whose latest version is `latest_version`.
    ///
    /// The current version starts at the latest version.
    pub fn versioned<S: Into<String>>(data: Mapping, latest_version: S) -> Self {
        let latest_version = latest_version.into();
        Self {
            data,
            version: Some(latest_version.clone()),
            latest_version: Some(latest_version),
            ..Default::default()
        }
    }

    /// Check if the current version is the latest version.
    pub fn is_latest_version(&self) -> bool {
        self.version == self.latest_version
    }
}

impl Store for PathStore {
    fn get(&self, keys: &[&str]) -> Option<&Value> {
        path::get(&self.data, keys)
    }

    fn exists(&self, keys: &[&str]) -> Option<bool> {
        if keys.is_empty() {
            return None;
        }
        Some(path::exists(&self.data, keys))
    }

    fn set(&mut self, keys: &[&str], value: Value) -> Option<Value> {
        if self.options.data_readonly {
            tracing::debug!(?keys, "refusing to set a value in readonly data");
            return None;
        }
        path::set(&mut self.data, keys, value)
    }

    fn delete(&mut self, keys: &[&str]) -> Option<Value> {
        path::delete(&mut self.data, keys)
    }

    fn erase(&mut self) {
        self.version = self.latest_version.clone();
        self.data = Mapping::new();
    }

    fn load(&mut self, file: Option<&Path>) -> Result<bool> {
        if let Some(file) = file {
            self.set_filename(file);
        }
        let path = self.filename.clone().ok_or(Error::FilenameNotSet)?;

        let content = std::fs::read_to_string(&path).map_err(|error| Error::ReadFailed {
            path: path.clone(),
            error,
        })?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "config file is empty");
            return Ok(false);
        }

        let document: Value =
            serde_yaml::from_str(&content).map_err(|error| Error::InvalidYaml {
                path: path.clone(),
                error,
            })?;
        let mut data = match document {
            Value::Null => return Ok(false),
            Value::Mapping(data) => data,
            _ => return Err(Error::NotAMapping { path }),
        };

        if let Some(version) = data.remove(FILE_VERSION_KEY) {
            self.version = version_text(version);
        }
        self.data = data;

        tracing::debug!(path = %path.display(), version = ?self.version, "loaded config file");
        Ok(true)
    }

    fn save(&mut self, file: Option<&Path>) -> Result<bool> {
        if self.options.file_readonly {
            tracing::debug!("refusing to save a file readonly config");
            return Ok(false);
        }
        if let Some(file) = file {
            self.set_filename(file);
        }
        let path = self.filename.clone().ok_or(Error::FilenameNotSet)?;

        let mut document = self.data.clone();
        if let Some(version) = &self.version {
            document.insert(path::key(FILE_VERSION_KEY), Value::String(version.clone()));
        }
        let yaml = serde_yaml::to_string(&document).map_err(|error| Error::InvalidYaml {
            path: path.clone(),
            error,
        })?;
        write_file(&path, &yaml)?;

        tracing::debug!(path = %path.display(), version = ?self.version, "saved config file");
        Ok(true)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }

    fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn set_filename(&mut self, file: &Path) -> PathBuf {
        let expanded = expand_path(file);
        self.filename = Some(expanded.clone());
        expanded
    }

    fn data_options(&self) -> &DataOptions {
        &self.options
    }

    fn set_data_options(&mut self, options: DataOptions) -> &DataOptions {
        self.options = options;
        &self.options
    }

    fn data(&self) -> &Mapping {
        &self.data
    }
}

impl std::fmt::Display for PathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filename = self
            .filename
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        writeln!(f, "File : {filename}")?;
        if self.version.is_some() || self.latest_version.is_some() {
            writeln!(
                f,
                "version : '{}' (latest '{}')",
                self.version.as_deref().unwrap_or_default(),
                self.latest_version.as_deref().unwrap_or_default()
            )?;
        }
        let yaml = serde_yaml::to_string(&self.data).map_err(|_| std::fmt::Error)?;
        f.write_str(&yaml)
    }
}

/// Text of a `file_version` entry. Non scalar versions are dropped.
fn version_text(version: Value) -> Option<String> {
    match version {
        Value::String(version) => Some(version),
        Value::Number(version) => Some(version.to_string()),
        Value::Bool(version) => Some(version.to_string()),
        _ => None,
    }
}

/// Expand `~` and make the path absolute against the current directory.
pub(crate) fn expand_path(file: &Path) -> PathBuf {
    let expanded = match (file.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => file.to_path_buf(),
    };
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };
    dunce::simplified(&absolute).to_path_buf()
}

/// Write `content` to `path` in place.
///
/// Symlinks are followed and an existing file keeps its permissions.
fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|error| Error::WriteFailed {
        path: path.to_path_buf(),
        error,
    })
}
