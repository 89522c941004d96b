//! Traceability between hierarchical engineering documents
//!
//! Requirement, design and test documents are loaded as trees of
//! [`Node`]s. The engine numbers them, extracts the links between them,
//! grafts matching content from one document into another and filters test
//! plans down to the current regression cycle.

pub mod domain;
pub use domain::{Config, Document, Flag, Marker, Node, NodeKind, NodePath, Warning};

pub mod storage;

pub mod trace;
