//! Recursive traversal utilities.
//!
//! Almost every algorithm in this crate needs the notion of a "leaf of real
//! content, ignoring attached reference pointers". That notion lives here.

use crate::domain::{Node, NodePath};

/// Pre-order iterator over a tree: parent before children, siblings in their
/// original order.
#[derive(Debug)]
pub struct DepthFirst<'a> {
    stack: Vec<(NodePath, &'a Node)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (NodePath, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        self.stack.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child)| (path.child(index), child)),
        );
        Some((path, node))
    }
}

/// Lazily enumerates `root` and its descendants in pre-order.
///
/// The iterator borrows the tree, so it can be created again from the same
/// root any number of times.
pub fn depth_first(root: &Node) -> impl Iterator<Item = &Node> {
    depth_first_paths(root).map(|(_, node)| node)
}

/// Like [`depth_first`], also yielding each node's path from `root`.
#[must_use]
pub fn depth_first_paths(root: &Node) -> DepthFirst<'_> {
    DepthFirst {
        stack: vec![(NodePath::root(), root)],
    }
}

/// Whether `node` points into the owning system.
///
/// Documents are classified against the owning system's URL prefix when
/// they are constructed, so nodes carrying an unrelated hyperlink are
/// ordinary content here.
#[must_use]
pub fn is_link_node(node: &Node) -> bool {
    node.is_link()
}

/// Whether `node` is a terminal node: it has no children left once link
/// children are discounted.
///
/// A link node is never terminal.
#[must_use]
pub fn is_terminal(node: &Node) -> bool {
    !is_link_node(node) && node.children.iter().all(is_link_node)
}

/// All terminal nodes of the tree, in pre-order.
pub fn terminals(root: &Node) -> impl Iterator<Item = &Node> {
    depth_first(root).filter(|node| is_terminal(node))
}

/// The path of the first node, in pre-order, satisfying `predicate`.
pub fn find_first<P>(root: &Node, mut predicate: P) -> Option<NodePath>
where
    P: FnMut(&Node) -> bool,
{
    depth_first_paths(root)
        .find(|(_, node)| predicate(node))
        .map(|(path, _)| path)
}

/// The path of the first node, in pre-order, with the given identifier.
#[must_use]
pub fn find_by_id(root: &Node, id: &str) -> Option<NodePath> {
    find_first(root, |node| node.id.as_deref() == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, OwningSystem};

    const REQ: &str = "http://testlink/linkto.php?item=req&id=5";

    fn classified(root: Node) -> Node {
        Document::new("test", root, &OwningSystem::default()).root
    }

    fn sample() -> Node {
        classified(
            Node::new("A", "a")
                .with_child(
                    Node::new("B", "b")
                        .with_child(Node::new("D", "d"))
                        .with_child(Node::new("E", "e").with_reference(REQ)),
                )
                .with_child(Node::new("C", "c").with_reference(REQ)),
        )
    }

    #[test]
    fn depth_first_is_pre_order() {
        let root = sample();
        let ids: Vec<_> = depth_first(&root).map(Node::id_str).collect();
        assert_eq!(ids, vec!["A", "B", "D", "E", "C"]);
    }

    #[test]
    fn depth_first_is_restartable() {
        let root = sample();
        assert_eq!(depth_first(&root).count(), depth_first(&root).count());
    }

    #[test]
    fn paths_address_the_yielded_nodes() {
        let root = sample();
        for (path, node) in depth_first_paths(&root) {
            assert_eq!(root.get(&path), Some(node));
        }
    }

    #[test]
    fn node_with_only_link_children_is_terminal() {
        let root = classified(Node::new("1", "x").with_child(Node::new("2", "l").with_reference(REQ)));
        assert!(is_terminal(&root));
    }

    #[test]
    fn node_with_content_child_is_not_terminal() {
        let root = classified(
            Node::new("1", "x")
                .with_child(Node::new("2", "l").with_reference(REQ))
                .with_child(Node::new("3", "y")),
        );
        assert!(!is_terminal(&root));
    }

    #[test]
    fn link_node_is_never_terminal() {
        let root = classified(Node::new("1", "x").with_reference(REQ));
        assert!(is_link_node(&root));
        assert!(!is_terminal(&root));
    }

    #[test]
    fn unrelated_hyperlink_is_content() {
        let root = classified(Node::new("1", "x").with_reference("https://example.org/spec"));
        assert!(!is_link_node(&root));
        assert!(is_terminal(&root));
    }

    #[test]
    fn terminals_skip_links_and_branches() {
        let root = sample();
        let ids: Vec<_> = terminals(&root).map(Node::id_str).collect();
        assert_eq!(ids, vec!["D"]);
    }

    #[test]
    fn find_by_id_returns_first_match() {
        let root = sample();
        assert_eq!(find_by_id(&root, "E"), Some(NodePath::from(vec![0, 1])));
        assert_eq!(find_by_id(&root, "Z"), None);
    }
}
