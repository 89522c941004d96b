use std::fmt;

use serde::Serialize;

/// A recoverable inconsistency found while processing a document.
///
/// Warnings never stop processing. They are returned alongside each
/// operation's output (and usually mirrored as flags on the affected nodes)
/// so that a reviewer sees them in the generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Two nodes of one document share an identifier.
    DuplicateId {
        /// The shared identifier.
        id: String,
        /// Label of the later occurrence.
        label: String,
    },
    /// A terminal node has no identifier and cannot be indexed.
    MissingId {
        /// Label of the node.
        label: String,
    },
    /// The same requirement reference reaches a terminal node twice.
    DuplicateReference {
        /// The terminal node.
        terminal: String,
        /// The repeated reference.
        reference: String,
    },
    /// A destination node has no traceability entry at all.
    NoTraceability {
        /// The destination's canonical key.
        key: String,
        /// The destination's label.
        label: String,
    },
    /// A traced identifier does not exist in the paired document.
    MissingTarget {
        /// The destination's canonical key.
        key: String,
        /// The identifier that could not be found.
        target: String,
    },
    /// A test entry is marked both keep and remove.
    ConflictingMarkers {
        /// The test entry.
        id: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id, label } => {
                write!(f, "duplicate identifier {id} (on node '{label}')")
            }
            Self::MissingId { label } => write!(f, "node '{label}' has no identifier"),
            Self::DuplicateReference {
                terminal,
                reference,
            } => write!(f, "reference {reference} reaches node {terminal} more than once"),
            Self::NoTraceability { key, label } => {
                write!(f, "node {key} ('{label}') has no traceability")
            }
            Self::MissingTarget { key, target } => {
                write!(f, "cannot find {target} traced from {key}")
            }
            Self::ConflictingMarkers { id } => {
                write!(f, "test case {id} is marked both keep and remove; keeping it")
            }
        }
    }
}
