//! Link index construction.
//!
//! A [`TraceLinks`] relation maps a source identifier to the identifiers it
//! traces to. Relations are extracted from a tree (terminal nodes, or
//! requirement link nodes attached to design items) and can be reversed to
//! navigate the other way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    domain::{Node, OwningSystem, Warning},
    trace::walk,
};

/// A directed one-to-many relation from one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLink {
    /// The tracing identifier.
    pub source: String,
    /// The traced identifiers, in the order they were found.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl TraceLink {
    /// Creates a trace link.
    #[must_use]
    pub fn new(source: impl Into<String>, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            source: source.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether every target is blank. True for a link without targets.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.targets.iter().all(|target| target.trim().is_empty())
    }
}

/// An ordered relation with at most one entry per source identifier.
///
/// Entries keep the order in which their sources were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TraceLink>", into = "Vec<TraceLink>")]
pub struct TraceLinks {
    links: Vec<TraceLink>,
    positions: HashMap<String, usize>,
}

impl TraceLinks {
    /// Creates an empty relation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry for `source` unless one exists already.
    ///
    /// Returns `false`, leaving the existing entry untouched, if `source` was
    /// already present.
    pub fn insert(&mut self, source: String, targets: Vec<String>) -> bool {
        if self.positions.contains_key(&source) {
            return false;
        }
        self.positions.insert(source.clone(), self.links.len());
        self.links.push(TraceLink { source, targets });
        true
    }

    /// Appends `target` to the entry for `source`, creating the entry on
    /// first sight.
    pub fn push_target(&mut self, source: &str, target: String) {
        match self.positions.get(source) {
            Some(&position) => self.links[position].targets.push(target),
            None => {
                self.insert(source.to_string(), vec![target]);
            }
        }
    }

    /// The targets traced from `source`.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&[String]> {
        self.positions
            .get(source)
            .map(|&position| self.links[position].targets.as_slice())
    }

    /// Whether `source` traces to `target`.
    #[must_use]
    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.get(source)
            .is_some_and(|targets| targets.iter().any(|t| t == target))
    }

    /// The entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &TraceLink> {
        self.links.iter()
    }

    /// The number of source identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The inverse relation. See [`reverse_links`].
    #[must_use]
    pub fn reversed(&self) -> Self {
        reverse_links(&self.links)
    }

    /// Qualifies every source with `source_prefix` and every target with
    /// `target_prefix`.
    #[must_use]
    pub fn prefixed(&self, source_prefix: &str, target_prefix: &str) -> Self {
        self.iter()
            .map(|link| TraceLink {
                source: format!("{source_prefix}{}", link.source),
                targets: link
                    .targets
                    .iter()
                    .map(|target| format!("{target_prefix}{target}"))
                    .collect(),
            })
            .collect()
    }
}

impl From<Vec<TraceLink>> for TraceLinks {
    /// Later entries for an already-present source are merged into the first
    /// one.
    fn from(links: Vec<TraceLink>) -> Self {
        links.into_iter().collect()
    }
}

impl From<TraceLinks> for Vec<TraceLink> {
    fn from(links: TraceLinks) -> Self {
        links.links
    }
}

impl FromIterator<TraceLink> for TraceLinks {
    fn from_iter<I: IntoIterator<Item = TraceLink>>(iter: I) -> Self {
        let mut links = Self::new();
        for link in iter {
            if let Some(&position) = links.positions.get(&link.source) {
                links.links[position].targets.extend(link.targets);
            } else {
                links.insert(link.source, link.targets);
            }
        }
        links
    }
}

/// A relation extracted from a document, with the problems found on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The extracted relation.
    pub links: TraceLinks,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
}

/// Maps every terminal node's identifier to its canonical identifier,
/// `prefix` followed by the node's id.
///
/// A repeated terminal identifier keeps its first mapping and is reported.
/// Terminals without an identifier cannot be indexed and are reported too.
#[instrument(level = "debug", skip(root))]
pub fn extract_terminal_index(root: &Node, prefix: &str) -> Extraction {
    let mut extraction = Extraction::default();
    for node in walk::terminals(root) {
        let Some(id) = node.id.as_deref() else {
            tracing::warn!("Terminal node ({}) has no identifier", node.label);
            extraction.warnings.push(Warning::MissingId {
                label: node.label.clone(),
            });
            continue;
        };
        if !extraction
            .links
            .insert(id.to_string(), vec![format!("{prefix}{id}")])
        {
            tracing::error!(
                "Duplicated terminal item ({id}) found. Please check the document in text mode."
            );
            extraction.warnings.push(Warning::DuplicateId {
                id: id.to_string(),
                label: node.label.clone(),
            });
        }
    }
    extraction
}

/// Associates every requirement reference with the terminal nodes it covers.
///
/// A requirement link node covers every terminal node in the subtree of its
/// parent, the parent included. Each association is recorded once; repeats
/// are reported.
#[instrument(level = "debug", skip_all)]
pub fn extract_ancestor_reference_index(root: &Node, system: &OwningSystem) -> Extraction {
    let mut extraction = Extraction::default();
    for (path, node) in walk::depth_first_paths(root) {
        let Some(reference) = node.reference.as_deref() else {
            continue;
        };
        if !node.is_link() || !system.is_requirement(reference) {
            continue;
        }
        let Some(target) = system.target_id(reference) else {
            tracing::warn!("Requirement link ({}) has no target identifier", node.label);
            continue;
        };
        let Some(parent) = path.parent().and_then(|parent| root.get(&parent)) else {
            continue;
        };
        for terminal in walk::terminals(parent) {
            let Some(id) = terminal.id.as_deref() else {
                continue;
            };
            if extraction.links.contains(id, target) {
                tracing::warn!(
                    "Duplicated requirement item ({target}) found for node ({id}:{})",
                    terminal.label
                );
                extraction.warnings.push(Warning::DuplicateReference {
                    terminal: id.to_string(),
                    reference: target.to_string(),
                });
                continue;
            }
            extraction.links.push_target(id, target.to_string());
        }
    }
    extraction
}

/// The logical inverse of `forward`.
///
/// For each `(source, targets)` and each non-blank target, `source` is
/// appended to the target's entry, creating it on first sight. Key order and
/// source order are first-seen; sources are not de-duplicated.
#[must_use]
pub fn reverse_links(forward: &[TraceLink]) -> TraceLinks {
    tracing::debug!("Reversing the traceability links.");
    let mut reversed = TraceLinks::new();
    for link in forward {
        for target in link.targets.iter().filter(|t| !t.is_empty()) {
            reversed.push_target(target, link.source.clone());
        }
    }
    reversed
}

/// Recovers a bare identifier from a document-qualified one.
///
/// The first prefix occurring exactly once in `doc_id` wins and the text
/// after it is returned.
#[must_use]
pub fn strip_document_prefix<'a>(doc_id: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| {
            let (_, rest) = doc_id.split_once(prefix)?;
            (!rest.contains(prefix)).then_some(rest)
        })
}

/// The identifiers of the test cases linked directly under `node`.
#[must_use]
pub fn linked_test_cases<'a>(node: &'a Node, system: &OwningSystem) -> Vec<&'a str> {
    node.children
        .iter()
        .filter(|child| child.is_link())
        .filter_map(|child| child.reference.as_deref())
        .filter(|reference| system.is_test_case(reference))
        .filter_map(|reference| system.target_id(reference))
        .collect()
}
