// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Data options that influence how a store reads, writes and persists.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::DEFAULT_SECTION;

#[cfg(test)]
#[path = "./options_test.rs"]
mod options_test;

/// Option set of a store.
///
/// A store keeps exactly one option set. Assigning a new one replaces the
/// previous set entirely; options are never merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DataOptions {
    /// Refuse every `set`; the data stays as it is.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub data_readonly: bool,

    /// Refuse every `save`; the backing file is never written.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub file_readonly: bool,

    /// Active section of a sectioned store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Ordered candidate sections searched by a multi-section store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,

    /// Section always searched last by a multi-section store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_section: Option<String>,

    /// Options this crate does not interpret, kept as given.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl DataOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an option set from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn data_readonly(mut self, readonly: bool) -> Self {
        self.data_readonly = readonly;
        self
    }

    pub fn file_readonly(mut self, readonly: bool) -> Self {
        self.file_readonly = readonly;
        self
    }

    pub fn section<S: Into<String>>(mut self, section: S) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections = Some(sections.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_section<S: Into<String>>(mut self, section: S) -> Self {
        self.default_section = Some(section.into());
        self
    }

    /// The section used by single-section operations.
    pub fn active_section(&self) -> &str {
        self.section.as_deref().unwrap_or(DEFAULT_SECTION)
    }

    /// The ordered list of sections searched by multi-section reads.
    ///
    /// The configured `sections` come first, followed by the default
    /// section unless it is already listed. Without `sections`, only the
    /// default section is searched.
    pub fn search_sections(&self) -> Vec<&str> {
        let fallback = self.default_section.as_deref().unwrap_or(DEFAULT_SECTION);
        let mut search: Vec<&str> = self
            .sections
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if !search.contains(&fallback) {
            search.push(fallback);
        }
        search
    }
}
