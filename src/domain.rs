//! Domain models for traceability linking.
//!
//! This module contains the generic document tree, the compound label codec,
//! configuration, and the warnings produced while linking documents.

mod config;
pub use config::{
    Config, ConfigError, DocumentPrefixes, MAX_REGRESSION_LEVEL, OwningSystem, TestCaseKey,
};

mod document;
pub use document::Document;

pub mod label;

pub mod node;
pub use node::{Flag, Marker, Node, NodeKind, NodePath};

mod warning;
pub use warning::Warning;
