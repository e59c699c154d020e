// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for config-layers operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with config-layers Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while persisting configuration stores.
///
/// Only file persistence can fail. Readonly refusals, empty key paths and
/// layer lifecycle violations are reported as `None`/`false` results.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// load/save called before any filename was configured
    #[error("Config filename not set")]
    #[diagnostic(
        code(config_layers::filename_not_set),
        help("Pass a filename to load/save, or call set_filename first")
    )]
    FilenameNotSet,

    /// Failed to read a store file
    #[error("Failed to read config file: {path:?}")]
    #[diagnostic(code(config_layers::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write a store file
    #[error("Failed to write config file: {path:?}")]
    #[diagnostic(code(config_layers::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Invalid YAML in a store file
    #[error("Invalid YAML in config file {path:?}: {error}")]
    #[diagnostic(
        code(config_layers::invalid_yaml),
        help("Check the YAML syntax of the file")
    )]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// The document parsed, but it is not a mapping at the top level
    #[error("Config file {path:?} does not contain a mapping")]
    #[diagnostic(
        code(config_layers::not_a_mapping),
        help("A config file must hold key/value pairs at its top level")
    )]
    NotAMapping { path: PathBuf },
}
