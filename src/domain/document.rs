use std::collections::HashSet;

use tracing::instrument;

use crate::{
    domain::{Marker, Node, NodeKind, OwningSystem, Warning},
    trace::walk,
};

/// A named document: a single rooted tree of [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document title, typically the file stem.
    pub name: String,
    /// The root of the tree.
    pub root: Node,
}

impl Document {
    /// Wraps a freshly parsed tree, classifying every node against the owning
    /// system.
    ///
    /// A node whose reference starts with the system's URL prefix becomes a
    /// [`NodeKind::Link`]; a node carrying the folder marker becomes a
    /// [`NodeKind::Folder`]; everything else is content, including nodes with
    /// unrelated hyperlinks.
    #[must_use]
    pub fn new(name: impl Into<String>, mut root: Node, system: &OwningSystem) -> Self {
        classify(&mut root, system);
        Self {
            name: name.into(),
            root,
        }
    }

    /// Reports every identifier used by more than one node.
    ///
    /// The first occurrence is considered authoritative; a warning is
    /// produced for each later one.
    #[instrument(level = "debug", skip(self), fields(document = %self.name))]
    pub fn duplicate_ids(&self) -> Vec<Warning> {
        let mut seen = HashSet::new();
        walk::depth_first(&self.root)
            .filter_map(|node| {
                let id = node.id.as_deref()?;
                if seen.insert(id) {
                    return None;
                }
                tracing::error!("Duplicated node {id} ({}) in {}", node.label, self.name);
                Some(Warning::DuplicateId {
                    id: id.to_string(),
                    label: node.label.clone(),
                })
            })
            .collect()
    }
}

fn classify(node: &mut Node, system: &OwningSystem) {
    node.kind = match node.reference.as_deref() {
        Some(reference) if system.owns(reference) => NodeKind::Link,
        _ if node.has_marker(&Marker::Folder) || node.kind == NodeKind::Folder => NodeKind::Folder,
        _ => NodeKind::Content,
    };
    for child in &mut node.children {
        classify(child, system);
    }
}
