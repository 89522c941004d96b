//! Hierarchical dotted numbering of node labels.
//!
//! Numbering decorates every content node below the root with its position,
//! `1`, `1.1`, `1.2`, `2`, ..., using the label separator. Link nodes are
//! neither numbered nor counted.

use tracing::instrument;

use crate::{
    domain::{Node, label},
    trace::walk,
};

/// Errors that stop numbering a document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NumberingError {
    /// A content node has no label to decorate.
    #[error("node {id} has no plain-text label; convert it to plain text and retry")]
    MissingLabel {
        /// Identifier of the offending node (`<no id>` for synthetic nodes).
        id: String,
    },
}

/// Prefixes every non-link node below `root` with its dotted position.
///
/// The root's label is left untouched and its own segment is not part of the
/// prefixes: the root's children are numbered `1`, `2`, ... If a label
/// already carries a prefix it is replaced.
///
/// # Errors
///
/// Returns [`NumberingError::MissingLabel`] if a content node has an empty
/// label. No label is modified in that case.
#[instrument(level = "debug", skip_all)]
pub fn add_prefix(root: &mut Node, separator: &str) -> Result<(), NumberingError> {
    check_labels(root)?;
    number_children(root, "", separator);
    Ok(())
}

/// Strips one leading separator-delimited segment from every non-link node
/// whose label contains the separator.
///
/// # Errors
///
/// Returns [`NumberingError::MissingLabel`] if a content node has an empty
/// label. No label is modified in that case.
#[instrument(level = "debug", skip_all)]
pub fn remove_prefix(root: &mut Node, separator: &str) -> Result<(), NumberingError> {
    check_labels(root)?;
    strip(root, separator);
    Ok(())
}

/// The dotted number of the `index`-th (zero-based) content child under a
/// parent numbered `parent`.
#[must_use]
pub fn child_number(parent: &str, index: usize) -> String {
    if parent.is_empty() {
        (index + 1).to_string()
    } else {
        format!("{parent}.{}", index + 1)
    }
}

fn check_labels(root: &Node) -> Result<(), NumberingError> {
    match walk::depth_first(root).find(|node| !node.is_link() && node.label.trim().is_empty()) {
        Some(node) => {
            let id = node.id.clone().unwrap_or_else(|| "<no id>".to_string());
            tracing::error!("Node {id} has no label; numbering aborted");
            Err(NumberingError::MissingLabel { id })
        }
        None => Ok(()),
    }
}

fn number_children(node: &mut Node, number: &str, separator: &str) {
    for (index, child) in node
        .children
        .iter_mut()
        .filter(|child| !child.is_link())
        .enumerate()
    {
        let child_number = child_number(number, index);
        child.label = label::with_prefix(&child.label, &child_number, separator);
        number_children(child, &child_number, separator);
    }
}

fn strip(node: &mut Node, separator: &str) {
    if !node.is_link() {
        if let Some(rest) = label::strip_prefix(&node.label, separator) {
            tracing::debug!("Prefix of node ({}) has been removed", node.label);
            node.label = rest.to_string();
        }
    }
    for child in &mut node.children {
        strip(child, separator);
    }
}
