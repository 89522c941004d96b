//! Grafting source subtrees into destination documents.
//!
//! Linking happens in two passes. [`plan`] reads both trees and decides which
//! source subtree goes under which destination node; [`LinkPlan::apply`]
//! then moves them. Neither tree is mutated while it is being searched.

use std::collections::{BTreeSet, HashSet};

use tracing::instrument;

use crate::{
    domain::{Flag, Node, NodePath, OwningSystem, Warning, label},
    trace::{index::TraceLinks, walk},
};

/// Which destination nodes receive grafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Nodes with no children at all, keyed by the first label segment.
    /// Suits flat documents such as requirement lists, whose leaves are
    /// typically links into the owning system.
    #[default]
    Leaves,
    /// Terminal nodes (see [`walk::is_terminal`]), keyed by identifier.
    /// Suits tree-structured design documents.
    Terminals,
}

/// One planned move: the subtree at `source` goes under `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graft {
    /// Path of the receiving node in the destination tree.
    pub destination: NodePath,
    /// Path of the grafted subtree in the source tree.
    pub source: NodePath,
}

/// The outcome of the planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    /// Planned moves, in destination pre-order.
    pub grafts: Vec<Graft>,
    /// Destination nodes to flag [`Flag::MissingTraceability`].
    pub flagged: Vec<NodePath>,
    /// Recoverable problems found while planning.
    pub warnings: Vec<Warning>,
}

/// Summary of a completed link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Number of subtrees appended to the destination.
    pub grafted: usize,
    /// Number of destination nodes flagged as missing traceability.
    pub flagged: usize,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
}

/// Decides the grafts linking `source` into `destination`.
///
/// Targets are visited in destination pre-order. A target whose key has no
/// entry, or only blank entries, in `links` is flagged. Each non-blank
/// traced identifier is looked up in the source (root included) by the first
/// segment of its label; unresolved identifiers flag the target too. Once a
/// source label has been grafted, destination targets with that same label
/// are skipped.
#[instrument(level = "debug", skip_all, fields(mode = ?mode))]
pub fn plan(
    destination: &Node,
    source: &Node,
    links: &TraceLinks,
    mode: TargetMode,
    separator: &str,
) -> LinkPlan {
    let mut plan = LinkPlan::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for (path, node) in walk::depth_first_paths(destination) {
        if !is_target(node, mode) || seen.contains(node.label.as_str()) {
            continue;
        }
        let key = match mode {
            TargetMode::Leaves => label::key(&node.label, separator),
            TargetMode::Terminals => node.id_str(),
        };

        let targets = links.get(key).unwrap_or_default();
        let targets: Vec<&str> = targets
            .iter()
            .map(|target| target.trim())
            .filter(|target| !target.is_empty())
            .collect();
        if targets.is_empty() {
            tracing::warn!("No traceability for {key} ({})", node.label);
            plan.warnings.push(Warning::NoTraceability {
                key: key.to_string(),
                label: node.label.clone(),
            });
            plan.flagged.push(path);
            continue;
        }

        let mut unresolved = false;
        for target in targets {
            let found = walk::depth_first_paths(source)
                .find(|(_, candidate)| label::key(&candidate.label, separator) == target);
            if let Some((source_path, found)) = found {
                tracing::debug!("Linking {target} under {key}");
                seen.insert(found.label.as_str());
                plan.grafts.push(Graft {
                    destination: path.clone(),
                    source: source_path,
                });
            } else {
                tracing::warn!("Cannot find {target} traced from {key}");
                plan.warnings.push(Warning::MissingTarget {
                    key: key.to_string(),
                    target: target.to_string(),
                });
                unresolved = true;
            }
        }
        if unresolved {
            plan.flagged.push(path);
        }
    }
    plan
}

// Requirement leaves usually link into the owning system, so leaves may be
// links. Terminals never are.
fn is_target(node: &Node, mode: TargetMode) -> bool {
    if node.is_folder() {
        return false;
    }
    match mode {
        TargetMode::Leaves => node.children.is_empty(),
        TargetMode::Terminals => walk::is_terminal(node),
    }
}

impl LinkPlan {
    /// Moves the planned subtrees and sets the planned flags.
    ///
    /// The plan must be applied to the trees it was computed from. Every
    /// grafted subtree is copied before anything is detached, so a source
    /// matched by several destinations is given to each of them and removed
    /// from the source once. The source root can be copied but never
    /// detached.
    #[instrument(level = "debug", skip_all, fields(grafts = self.grafts.len()))]
    pub fn apply(self, destination: &mut Node, source: &mut Node) -> LinkReport {
        let copies: Vec<(NodePath, Node)> = self
            .grafts
            .iter()
            .filter_map(|graft| {
                let subtree = source.get(&graft.source)?.clone();
                Some((graft.destination.clone(), subtree))
            })
            .collect();

        // Later and deeper paths first, so earlier detaches never shift them.
        let detached: BTreeSet<&NodePath> = self.grafts.iter().map(|graft| &graft.source).collect();
        for path in detached.into_iter().rev() {
            source.detach(path);
        }

        let mut report = LinkReport::default();
        for (path, subtree) in copies {
            if let Some(receiver) = destination.get_mut(&path) {
                receiver.children.push(subtree);
                report.grafted += 1;
            }
        }
        for path in &self.flagged {
            if let Some(node) = destination.get_mut(path) {
                node.flag(Flag::MissingTraceability);
                report.flagged += 1;
            }
        }
        report.warnings = self.warnings;
        report
    }
}

/// Plans and applies in one go.
pub fn link(
    destination: &mut Node,
    source: &mut Node,
    links: &TraceLinks,
    mode: TargetMode,
    separator: &str,
) -> LinkReport {
    plan(destination, source, links, mode, separator).apply(destination, source)
}

/// Flags requirement links that no design item traces to.
///
/// A requirement link node is checked when the team segment of its label
/// (the second segment, teams separated by `|`) names one of `teams`, or
/// always when `teams` is empty. It is flagged
/// [`Flag::MissingTraceability`] when its target identifier has no entry in
/// `covered`.
#[instrument(level = "debug", skip_all, fields(teams = ?teams))]
pub fn flag_uncovered(
    root: &mut Node,
    covered: &TraceLinks,
    teams: &[String],
    system: &OwningSystem,
    separator: &str,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    visit_requirements(root, &mut |node| {
        let Some(reference) = node.reference.as_deref() else {
            return;
        };
        if !system.is_requirement(reference) || !names_team(&node.label, teams, separator) {
            return;
        }
        let Some(target) = system.target_id(reference) else {
            return;
        };
        match covered.get(target) {
            Some(items) if !items.is_empty() => {
                tracing::info!("{target} is covered by {} design item(s)", items.len());
            }
            _ => {
                tracing::warn!("{target} ({}) is not covered", node.label);
                warnings.push(Warning::NoTraceability {
                    key: target.to_string(),
                    label: node.label.clone(),
                });
                node.flag(Flag::MissingTraceability);
            }
        }
    });
    warnings
}

fn visit_requirements(node: &mut Node, visit: &mut impl FnMut(&mut Node)) {
    if node.is_link() {
        visit(node);
    }
    for child in &mut node.children {
        visit_requirements(child, visit);
    }
}

fn names_team(node_label: &str, teams: &[String], separator: &str) -> bool {
    if teams.is_empty() {
        return true;
    }
    node_label
        .split(separator)
        .nth(1)
        .into_iter()
        .flat_map(|segment| segment.split(label::TEAM_SEPARATOR))
        .map(str::trim)
        .any(|team| teams.iter().any(|wanted| wanted == team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Document, Marker},
        trace::index::TraceLink,
    };

    const SEP: &str = "::";

    /// Targets are comma-separated.
    fn links(entries: &[(&str, &str)]) -> TraceLinks {
        entries
            .iter()
            .map(|(source, targets)| TraceLink::new(*source, targets.split(',')))
            .collect()
    }

    fn source() -> Node {
        Node::new("s0", "PFS")
            .with_child(
                Node::new("s1", "Y::Restart")
                    .with_child(Node::new("s2", "detail")),
            )
            .with_child(Node::new("s3", "Z::Shutdown"))
    }

    #[test]
    fn blank_entry_flags_destination() {
        let mut destination = Node::new("d0", "PMR").with_child(Node::new("d1", "X::Fast boot"));
        let mut source = source();

        let report = link(&mut destination, &mut source, &links(&[("X", "")]), TargetMode::Leaves, SEP);

        assert!(destination.children[0].is_flagged(Flag::MissingTraceability));
        assert_eq!(report.grafted, 0);
        assert_eq!(
            report.warnings,
            vec![Warning::NoTraceability {
                key: "X".into(),
                label: "X::Fast boot".into()
            }]
        );
    }

    #[test]
    fn unresolved_target_flags_and_warns() {
        let mut destination = Node::new("d0", "PMR").with_child(Node::new("d1", "X::Fast boot"));
        let mut source = Node::new("s0", "PFS").with_child(Node::new("s1", "W::Other"));

        let report = link(&mut destination, &mut source, &links(&[("X", "Y")]), TargetMode::Leaves, SEP);

        assert!(destination.children[0].is_flagged(Flag::MissingTraceability));
        assert_eq!(
            report.warnings,
            vec![Warning::MissingTarget {
                key: "X".into(),
                target: "Y".into()
            }]
        );
        assert_eq!(source.children.len(), 1);
    }

    #[test]
    fn missing_entry_flags_destination() {
        let mut destination = Node::new("d0", "PMR").with_child(Node::new("d1", "Q::Unknown"));
        let mut source = source();
        let report = link(&mut destination, &mut source, &TraceLinks::new(), TargetMode::Leaves, SEP);
        assert_eq!(report.flagged, 1);
    }

    #[test]
    fn grafts_move_subtrees() {
        let mut destination = Node::new("d0", "PMR")
            .with_child(Node::new("d1", "X::Fast boot"))
            .with_child(Node::new("d2", "V::Quiet"));
        let mut source = source();

        let report = link(
            &mut destination,
            &mut source,
            &links(&[("X", "Y"), ("V", "Z")]),
            TargetMode::Leaves,
            SEP,
        );

        assert_eq!(report.grafted, 2);
        assert_eq!(report.flagged, 0);
        assert_eq!(destination.children[0].children[0].label, "Y::Restart");
        assert_eq!(destination.children[0].children[0].children.len(), 1);
        assert_eq!(destination.children[1].children[0].label, "Z::Shutdown");
        assert!(source.children.is_empty());
    }

    #[test]
    fn shared_source_is_copied_to_each_destination() {
        let mut destination = Node::new("d0", "PMR")
            .with_child(Node::new("d1", "X::one"))
            .with_child(Node::new("d2", "V::two"));
        let mut source = source();

        let report = link(
            &mut destination,
            &mut source,
            &links(&[("X", "Y"), ("V", "Y")]),
            TargetMode::Leaves,
            SEP,
        );

        assert_eq!(report.grafted, 2);
        assert_eq!(destination.children[0].children[0].label, "Y::Restart");
        assert_eq!(destination.children[1].children[0].label, "Y::Restart");
        assert_eq!(source.children.len(), 1);
        assert_eq!(source.children[0].label, "Z::Shutdown");
    }

    #[test]
    fn nested_sources_detach_cleanly() {
        let mut destination = Node::new("d0", "PMR")
            .with_child(Node::new("d1", "X::one"))
            .with_child(Node::new("d2", "V::two"));
        let mut source = Node::new("s0", "PFS")
            .with_child(Node::new("s1", "Y::outer").with_child(Node::new("s2", "Z::inner")));

        link(
            &mut destination,
            &mut source,
            &links(&[("X", "Y"), ("V", "Z")]),
            TargetMode::Leaves,
            SEP,
        );

        assert_eq!(destination.children[0].children[0].len(), 2);
        assert_eq!(destination.children[1].children[0].label, "Z::inner");
        assert!(source.children.is_empty());
    }

    #[test]
    fn folders_are_never_targets() {
        let mut destination = Node::new("d0", "Plan").with_child(Node::new("d1", "X::suite").with_marker(Marker::Folder));
        let mut source = source();
        let report = link(&mut destination, &mut source, &TraceLinks::new(), TargetMode::Leaves, SEP);
        assert_eq!(report, LinkReport::default());
    }

    #[test]
    fn terminals_mode_keys_by_id_and_ignores_link_children() {
        let system = OwningSystem::default();
        let design = Node::new("0", "Design").with_child(
            Node::new("T1", "1::Boot")
                .with_child(Node::new("L", "req").with_reference("http://testlink/linkto.php?item=req&id=PFS-1")),
        );
        let mut destination = Document::new("design", design, &system).root;
        let mut source = Node::new("c0", "Cases").with_child(Node::new("c1", "HDVB-3::Cold boot"));

        let report = link(
            &mut destination,
            &mut source,
            &links(&[("T1", "HDVB-3")]),
            TargetMode::Terminals,
            SEP,
        );

        assert_eq!(report.grafted, 1);
        assert_eq!(destination.children[0].children[1].label, "HDVB-3::Cold boot");
    }

    fn requirement(id: &str, label: &str, target: &str) -> Node {
        Node::new(id, label).with_reference(format!("http://testlink/linkto.php?item=req&id={target}"))
    }

    #[test]
    fn requirement_link_leaves_receive_grafts() {
        let system = OwningSystem::default();
        let pfs = Node::new("p0", "PFS")
            .with_child(requirement("p1", "PFS-1::SIT::Restart", "PFS_PFS-1"))
            .with_child(requirement("p2", "PFS-2::SIT::Shutdown", "PFS_PFS-2"));
        let pmr = Node::new("m0", "PMR").with_child(requirement("m1", "PMR-9::Fast boot", "PMR_PMR-9"));
        let mut destination = Document::new("pfs", pfs, &system).root;
        let mut source = Document::new("pmr", pmr, &system).root;
        assert!(destination.children[0].is_link());

        let report = link(
            &mut destination,
            &mut source,
            &links(&[("PFS-1", "PMR-9")]),
            TargetMode::Leaves,
            SEP,
        );

        assert_eq!(report.grafted, 1);
        assert_eq!(destination.children[0].children[0].label, "PMR-9::Fast boot");
        assert!(!destination.children[0].is_flagged(Flag::MissingTraceability));
        assert!(destination.children[1].is_flagged(Flag::MissingTraceability));
        assert_eq!(
            report.warnings,
            vec![Warning::NoTraceability {
                key: "PFS-2".into(),
                label: "PFS-2::SIT::Shutdown".into()
            }]
        );
        assert!(source.children.is_empty());
    }

    #[test]
    fn test_case_link_leaves_receive_requirements() {
        let system = OwningSystem::default();
        let cases = Node::new("c0", "TDS-TC").with_child(
            Node::new("c1", "Boot").with_child(
                Node::new("c2", "HDVB-3::Cold boot")
                    .with_reference("http://testlink/linkto.php?item=testcase&id=HDVB-3"),
            ),
        );
        let pfs = Node::new("p0", "PFS").with_child(requirement("p1", "PFS-1::SIT::Restart", "PFS_PFS-1"));
        let mut destination = Document::new("tds-tc", cases, &system).root;
        let mut source = Document::new("pfs", pfs, &system).root;

        let report = link(
            &mut destination,
            &mut source,
            &links(&[("HDVB-3", "PFS-1")]),
            TargetMode::Leaves,
            SEP,
        );

        assert_eq!(report.grafted, 1);
        assert_eq!(report.flagged, 0);
        assert_eq!(destination.children[0].children[0].children[0].label, "PFS-1::SIT::Restart");
    }

    #[test]
    fn source_root_is_copied_not_detached() {
        let mut destination = Node::new("d0", "PMR").with_child(Node::new("d1", "X::one"));
        let mut source = source();
        let report = link(&mut destination, &mut source, &links(&[("X", "PFS")]), TargetMode::Leaves, SEP);

        assert_eq!(report.grafted, 1);
        assert_eq!(destination.children[0].children[0].label, "PFS");
        assert_eq!(source.children.len(), 2);
    }

    #[test]
    fn plan_leaves_trees_untouched() {
        let destination = Node::new("d0", "PMR").with_child(Node::new("d1", "X::one"));
        let source = source();
        let (before_destination, before_source) = (destination.clone(), source.clone());

        let plan = plan(&destination, &source, &links(&[("X", "Y")]), TargetMode::Leaves, SEP);

        assert_eq!(
            plan.grafts,
            vec![Graft {
                destination: vec![0].into(),
                source: vec![0].into()
            }]
        );
        assert_eq!(destination, before_destination);
        assert_eq!(source, before_source);
    }

    #[test]
    fn uncovered_requirements_of_selected_teams_are_flagged() {
        let system = OwningSystem::default();
        let requirements = Node::new("0", "PFS")
            .with_child(Node::new("1", "PFS-1::SIT|FIT::one").with_reference("http://testlink/linkto.php?item=req&id=PFS-1"))
            .with_child(Node::new("2", "PFS-2::SIT::two").with_reference("http://testlink/linkto.php?item=req&id=PFS-2"))
            .with_child(Node::new("3", "PFS-3::DVT::three").with_reference("http://testlink/linkto.php?item=req&id=PFS-3"));
        let mut root = Document::new("pfs", requirements, &system).root;
        let covered = links(&[("PFS-1", "T1")]);

        let warnings = flag_uncovered(&mut root, &covered, &["SIT".to_string()], &system, SEP);

        assert!(!root.children[0].is_flagged(Flag::MissingTraceability));
        assert!(root.children[1].is_flagged(Flag::MissingTraceability));
        assert!(!root.children[2].is_flagged(Flag::MissingTraceability));
        assert_eq!(warnings.len(), 1);
    }
}
