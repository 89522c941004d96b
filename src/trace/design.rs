//! Publishing design items.
//!
//! Every terminal node of a design document is one design item. Items are
//! published with their dotted number and a title built from the labels of
//! the nodes leading to them.

use serde::Serialize;

use crate::{
    domain::Node,
    trace::{numbering::child_number, walk},
};

/// The longest title a test-management service accepts.
pub const MAX_TITLE_LEN: usize = 100;

/// The separator between the labels of a design item's path.
pub const PATH_SEPARATOR: &str = "|";

/// One publishable design item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignItem {
    /// Identifier of the terminal node.
    pub id: String,
    /// Dotted position of the node, as assigned by numbering.
    pub number: String,
    /// `number`, the separator, and as much of the path as fits.
    pub title: String,
    /// Labels from below the root down to the node, joined by `|`.
    pub path: String,
}

/// Lists the design items of `root` in pre-order.
///
/// Labels already numbered with their own position are used without the
/// number. Terminals without an identifier are skipped.
#[must_use]
pub fn design_items(root: &Node, separator: &str) -> Vec<DesignItem> {
    let mut items = Vec::new();
    collect(root, "", &[], separator, &mut items);
    items
}

fn collect<'a>(
    node: &'a Node,
    number: &str,
    path: &[&'a str],
    separator: &str,
    items: &mut Vec<DesignItem>,
) {
    for (index, child) in node
        .children
        .iter()
        .filter(|child| !child.is_link())
        .enumerate()
    {
        let number = child_number(number, index);
        let mut path = path.to_vec();
        path.push(bare_label(&child.label, &number, separator));

        if !walk::is_terminal(child) {
            collect(child, &number, &path, separator, items);
            continue;
        }
        let Some(id) = child.id.clone() else {
            tracing::warn!("Design item {number} has no identifier");
            continue;
        };
        items.push(DesignItem {
            id,
            title: format!("{number}{separator}{}", fitted_title(&path)),
            path: path.join(PATH_SEPARATOR),
            number,
        });
    }
}

fn bare_label<'a>(node_label: &'a str, number: &str, separator: &str) -> &'a str {
    match node_label.split_once(separator) {
        Some((prefix, rest)) if prefix.trim() == number => rest,
        _ => node_label,
    }
}

/// The longest suffix of whole path segments within [`MAX_TITLE_LEN`]
/// characters, or the tail of the last segment if even that is too long.
///
/// Cutting at segment boundaries means a title never starts mid-word, so it
/// can be shorter than a plain 100-character tail of the joined path.
fn fitted_title(path: &[&str]) -> String {
    let mut title = String::new();
    for segment in path.iter().rev() {
        let candidate = if title.is_empty() {
            (*segment).to_string()
        } else {
            format!("{segment}{PATH_SEPARATOR}{title}")
        };
        if candidate.chars().count() > MAX_TITLE_LEN {
            break;
        }
        title = candidate;
    }
    if title.is_empty() {
        let last = path.last().copied().unwrap_or_default();
        let skip = last.chars().count().saturating_sub(MAX_TITLE_LEN);
        title = last.chars().skip(skip).collect();
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, OwningSystem, label::DEFAULT_SEPARATOR};

    const REQ: &str = "http://testlink/linkto.php?item=req&id=PFS-1";

    fn design() -> Node {
        let root = Node::new("0", "Design")
            .with_child(
                Node::new("1", "Boot")
                    .with_child(Node::new("2", "req").with_reference(REQ))
                    .with_child(Node::new("3", "Cold").with_child(Node::new("4", "req").with_reference(REQ)))
                    .with_child(Node::new("5", "Warm")),
            )
            .with_child(Node::new("6", "Shutdown"));
        Document::new("design", root, &OwningSystem::default()).root
    }

    #[test]
    fn lists_terminals_with_numbers_and_paths() {
        let items = design_items(&design(), DEFAULT_SEPARATOR);

        let summary: Vec<_> = items
            .iter()
            .map(|item| (item.id.as_str(), item.number.as_str(), item.title.as_str(), item.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("3", "1.1", "1.1::Boot|Cold", "Boot|Cold"),
                ("5", "1.2", "1.2::Boot|Warm", "Boot|Warm"),
                ("6", "2", "2::Shutdown", "Shutdown"),
            ]
        );
    }

    #[test]
    fn numbered_labels_are_not_repeated() {
        let mut root = design();
        crate::trace::numbering::add_prefix(&mut root, DEFAULT_SEPARATOR).unwrap();

        let items = design_items(&root, DEFAULT_SEPARATOR);

        assert_eq!(items[0].title, "1.1::Boot|Cold");
    }

    #[test]
    fn long_paths_keep_whole_trailing_segments() {
        let long = "x".repeat(60);
        let path = [long.as_str(), "middle segment", long.as_str()];
        assert_eq!(fitted_title(&path), format!("middle segment|{long}"));
    }

    #[test]
    fn title_never_starts_mid_segment() {
        let head = "a".repeat(90);
        let tail = "b".repeat(20);
        assert_eq!(fitted_title(&[head.as_str(), tail.as_str()]), tail);
    }

    #[test]
    fn oversized_segment_keeps_its_tail() {
        let long = format!("{}{}", "a".repeat(20), "b".repeat(100));
        assert_eq!(fitted_title(&[long.as_str()]), "b".repeat(100));
    }

    #[test]
    fn label_helper_only_strips_matching_numbers() {
        assert_eq!(bare_label("1.2::Warm", "1.2", "::"), "Warm");
        assert_eq!(bare_label("PFS-1::Warm", "1.2", "::"), "PFS-1::Warm");
    }
}
