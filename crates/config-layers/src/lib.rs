// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

//! config-layers - Layered Configuration Resolver
//!
//! This crate presents a single key-path addressable configuration view
//! backed by an ordered stack of independently named and persisted stores.
//!
//! # Overview
//!
//! Callers read and write through key paths (`&["db", "host"]`) without
//! knowing which store holds the value. The [`LayerStack`] decides by
//! precedence which layer answers a read and which one receives a write:
//!
//! - reads scan the layers from the top down and return the first hit
//! - writes go to the topmost writable layer, or to a named layer
//! - deletes only remove the topmost occurrence, revealing lower layers
//! - [`LayerStack::merge`] combines mappings found in several layers
//!
//! Each layer wraps a [`Store`]: a plain [`PathStore`], or a
//! [`SectionStore`]/[`SectionsStore`] partitioned by a top level section.
//!
//! # Example
//!
//! ```yaml
//! # ~/.myapp/config.yaml, loaded into a `local` layer
//! file_version: "1"
//! db:
//!   host: db.example.com
//!   port: 5432
//! ```
//!
//! ```no_run
//! use config_layers::{Layer, LayerStack, PathStore, Store};
//!
//! let mut local = PathStore::new();
//! local.load(Some(std::path::Path::new("~/.myapp/config.yaml")))?;
//!
//! let mut config = LayerStack::from_layers([
//!     Layer::new("local", local).writable(false),
//!     Layer::default(),
//! ]);
//! config.set(&["db", "host"], "localhost".into());
//! assert_eq!(config.where_is(&["db", "host"]).unwrap(), ["runtime", "local"]);
//! # Ok::<(), config_layers::Error>(())
//! ```

pub mod base;
pub mod error;
pub mod layer;
pub mod merge;
pub mod options;
pub mod path;
pub mod section;
pub mod stack;
pub mod store;

pub use base::PathStore;
pub use error::{Error, Result};
pub use layer::{Layer, LayerSelector};
pub use merge::ValueKind;
pub use options::DataOptions;
pub use section::{SectionStore, SectionsStore};
pub use stack::{LayerStack, Query, SharedLayerStack};
pub use store::Store;

/// Reserved top level key carrying a store version in its file.
pub const FILE_VERSION_KEY: &str = "file_version";

/// Section used when no section is configured.
pub const DEFAULT_SECTION: &str = "default";

/// Name of the layer defined without a name.
pub const DEFAULT_LAYER_NAME: &str = "runtime";
