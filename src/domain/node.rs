//! The generic hierarchical content unit shared by every document.
//!
//! A [`Node`] is one entry of a hierarchical document: a mind-map bullet, a
//! requirement row, a test suite or a test case. The engine never looks at
//! the on-disk format; adapters translate their format into `Node` trees and
//! back.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// What a node stands for.
///
/// The kind is decided once, when a document is classified against the
/// owning system (see [`crate::domain::Document::new`]), rather than being
/// re-derived from the raw reference at every call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An original content node.
    #[default]
    Content,
    /// A pointer into another tracked document or system.
    Link,
    /// A category node grouping other nodes (a test suite, for example).
    Folder,
}

/// Symbolic tags attached to a node, orthogonal to its label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    /// The entry must stay in the test plan.
    Keep,
    /// The entry must be dropped from the test plan.
    Remove,
    /// The regression level of the entry (and, inherited, of its subtree).
    ///
    /// Written `regression-level-N`; the short form `regression-N` is read
    /// too.
    Regression(u8),
    /// The node is a folder.
    Folder,
    /// The last execution of the entry passed.
    Passed,
    /// The last execution of the entry failed.
    Failed,
    /// The last execution of the entry was blocked.
    Blocked,
    /// The entry has not been executed.
    NotRun,
    /// A marker the engine does not interpret. Preserved as-is.
    Other(String),
}

impl Marker {
    /// The regression level carried by this marker, if any.
    #[must_use]
    pub const fn regression_level(&self) -> Option<u8> {
        match self {
            Self::Regression(level) => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("keep"),
            Self::Remove => f.write_str("remove"),
            Self::Regression(level) => write!(f, "regression-level-{level}"),
            Self::Folder => f.write_str("folder"),
            Self::Passed => f.write_str("passed"),
            Self::Failed => f.write_str("failed"),
            Self::Blocked => f.write_str("blocked"),
            Self::NotRun => f.write_str("not-run"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

impl FromStr for Marker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let marker = match s {
            "keep" => Self::Keep,
            "remove" => Self::Remove,
            "folder" => Self::Folder,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "blocked" => Self::Blocked,
            "not-run" => Self::NotRun,
            other => other
                .strip_prefix("regression-level-")
                .or_else(|| other.strip_prefix("regression-"))
                .and_then(|level| level.parse().ok())
                .map_or_else(|| Self::Other(other.to_string()), Self::Regression),
        };
        Ok(marker)
    }
}

impl Serialize for Marker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Marker {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|never| match never {}))
    }
}

/// Presentation states written by the engine.
///
/// Adapters render these however their format allows (the mind-map adapter
/// uses background and foreground colours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// At least one expected traceability link is missing.
    MissingTraceability,
    /// The test entry is part of the current test cycle.
    Included,
    /// The test entry is left out of the current test cycle.
    Excluded,
    /// None of the entries below this node are part of the test cycle.
    Collapsed,
}

/// Position of a node within its tree: the child index at every level,
/// starting below the root. The root itself has the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The path of the root node.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// The path of the `index`-th child of the node at this path.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// The path of the parent node, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// The number of edges between the root and this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The child indices making up this path.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        let segments: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&segments.join("/"))
    }
}

/// One entry in a hierarchical document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within the owning document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display text. May encode a compound `prefix::team::title` value.
    #[serde(default)]
    pub label: String,

    /// URL-like pointer into another document or system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// What the node stands for.
    #[serde(default)]
    pub kind: NodeKind,

    /// Symbolic tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub markers: BTreeSet<Marker>,

    /// Presentation states written by the engine.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<Flag>,

    /// Presentation attributes carried through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Ordered child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl Node {
    /// Creates a content node with the given identifier and label.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Creates a node without an identifier.
    ///
    /// Such nodes are synthetic (execution history entries, for example).
    #[must_use]
    pub fn synthetic(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Sets the external reference. Whether the node is a link is decided
    /// when its document is classified.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Adds a marker.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        if marker == Marker::Folder {
            self.kind = NodeKind::Folder;
        }
        self.markers.insert(marker);
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// The identifier, or the empty string for synthetic nodes.
    #[must_use]
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Whether this node was classified as a link node.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.kind == NodeKind::Link
    }

    /// Whether this node was classified as a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Whether the node carries the given marker.
    #[must_use]
    pub fn has_marker(&self, marker: &Marker) -> bool {
        self.markers.contains(marker)
    }

    /// The explicit regression level of this node, if it carries one.
    ///
    /// With several level markers the highest one wins.
    #[must_use]
    pub fn regression_level(&self) -> Option<u8> {
        self.markers
            .iter()
            .filter_map(Marker::regression_level)
            .max()
    }

    /// Sets a presentation flag.
    pub fn flag(&mut self, flag: Flag) {
        self.flags.insert(flag);
    }

    /// Clears a presentation flag.
    pub fn unflag(&mut self, flag: Flag) {
        self.flags.remove(&flag);
    }

    /// Whether the node carries the given flag.
    #[must_use]
    pub fn is_flagged(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Returns the node at `path`, relative to this node.
    #[must_use]
    pub fn get(&self, path: &NodePath) -> Option<&Self> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Returns the node at `path` mutably, relative to this node.
    #[must_use]
    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Self> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Detaches and returns the subtree at `path`.
    ///
    /// The root cannot be detached from itself; `None` is returned for the
    /// empty path and for paths that do not exist.
    pub fn detach(&mut self, path: &NodePath) -> Option<Self> {
        let (&last, _) = path.indices().split_last()?;
        let parent = self.get_mut(&path.parent()?)?;
        (last < parent.children.len()).then(|| parent.children.remove(last))
    }

    /// The number of nodes in this subtree, including this node.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always `false`: a subtree contains at least its own root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
