//! Test plan filtering.
//!
//! A test plan is a tree of folders (suites) and test entries. An entry is
//! any node whose canonical key (the first label segment) matches the
//! configured [`TestCaseKey`]; nothing below an entry is inspected. Markers on
//! entries and folders decide which entries make up the current test cycle.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    domain::{
        Flag, MAX_REGRESSION_LEVEL, Marker, Node, TestCaseKey, Warning,
        label::{self, CompoundLabel},
    },
    trace::regression::{EntryState, RegressionFilter},
};

/// Entries carrying an explicit keep or remove marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedEntries {
    /// Keys of entries marked for removal.
    pub removed: Vec<String>,
    /// Keys of entries marked to be kept.
    pub kept: Vec<String>,
    /// Entries marked both ways. They are kept.
    pub warnings: Vec<Warning>,
}

/// The result of diffing a test plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanOutcome {
    /// Keys of entries marked for removal.
    pub removed: Vec<String>,
    /// Keys of entries marked to be kept.
    pub kept: Vec<String>,
    /// Keys of the selected entries, de-duplicated, in plan order.
    pub selected: Vec<String>,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
}

/// Test entry recognition for one repository.
#[derive(Debug, Clone)]
pub struct TestPlan {
    key: TestCaseKey,
    separator: String,
}

impl TestPlan {
    /// Recognises entries by `key`, reading labels split on `separator`.
    #[must_use]
    pub fn new(key: TestCaseKey, separator: impl Into<String>) -> Self {
        Self {
            key,
            separator: separator.into(),
        }
    }

    /// The canonical key of `node` if it is a test entry.
    ///
    /// Entries are recognised by label alone. Test cases usually link into
    /// the owning system, so link nodes qualify too.
    #[must_use]
    pub fn entry_key<'a>(&self, node: &'a Node) -> Option<&'a str> {
        let key = label::key(&node.label, &self.separator);
        self.key.matches(key).then_some(key)
    }

    /// Whether `node` is a test entry.
    #[must_use]
    pub fn is_entry(&self, node: &Node) -> bool {
        self.entry_key(node).is_some()
    }

    /// Selects the entries of the current cycle and marks them in the tree.
    #[instrument(level = "debug", skip_all, fields(ceiling = filter.ceiling))]
    pub fn diff(&self, root: &mut Node, filter: &RegressionFilter) -> PlanOutcome {
        let marked = self.find_marked_entries(root);
        let selected = dedupe(self.select_entries(root, &marked, filter));
        self.annotate(root, &selected);
        tracing::info!(
            "{} test cases selected ({} removed, {} kept)",
            selected.len(),
            marked.removed.len(),
            marked.kept.len()
        );
        PlanOutcome {
            removed: marked.removed,
            kept: marked.kept,
            selected,
            warnings: marked.warnings,
        }
    }

    /// Collects the entries marked keep or remove.
    ///
    /// An entry marked both ways is only reported as kept.
    #[must_use]
    pub fn find_marked_entries(&self, root: &Node) -> MarkedEntries {
        let mut marked = MarkedEntries::default();
        self.collect_marked(root, &mut marked);
        marked
    }

    fn collect_marked(&self, node: &Node, marked: &mut MarkedEntries) {
        let Some(key) = self.entry_key(node) else {
            for child in &node.children {
                self.collect_marked(child, marked);
            }
            return;
        };
        let keep = node.has_marker(&Marker::Keep);
        let remove = node.has_marker(&Marker::Remove);
        if keep && remove {
            tracing::warn!("Test case {key} is marked both keep and remove; keeping it");
            marked.warnings.push(Warning::ConflictingMarkers { id: key.to_string() });
        }
        if keep {
            marked.kept.push(key.to_string());
        } else if remove {
            marked.removed.push(key.to_string());
        }
    }

    /// Keys of the entries `filter` keeps, in plan order.
    ///
    /// An entry's level is its own marker, else the one inherited from the
    /// nearest marked ancestor, else [`MAX_REGRESSION_LEVEL`].
    #[must_use]
    pub fn select_entries(
        &self,
        root: &Node,
        marked: &MarkedEntries,
        filter: &RegressionFilter,
    ) -> Vec<String> {
        let removed: HashSet<&str> = marked.removed.iter().map(String::as_str).collect();
        let kept: HashSet<&str> = marked.kept.iter().map(String::as_str).collect();
        let mut selected = Vec::new();
        self.collect_selected(
            root,
            MAX_REGRESSION_LEVEL,
            &Membership { removed, kept },
            filter,
            &mut selected,
        );
        selected
    }

    fn collect_selected(
        &self,
        node: &Node,
        inherited: u8,
        membership: &Membership<'_>,
        filter: &RegressionFilter,
        selected: &mut Vec<String>,
    ) {
        if let Some(key) = self.entry_key(node) {
            let state = EntryState {
                removed: membership.removed.contains(key),
                kept: membership.kept.contains(key),
                level: node.regression_level().unwrap_or(inherited),
                inherited,
                teams: CompoundLabel::parse(&node.label, &self.separator)
                    .teams()
                    .collect(),
            };
            if filter.keeps(&state) {
                selected.push(key.to_string());
            } else {
                tracing::debug!("Test case {key} left out of the cycle");
            }
            return;
        }
        let inherited = node.regression_level().unwrap_or(inherited);
        for child in &node.children {
            self.collect_selected(child, inherited, membership, filter, selected);
        }
    }

    /// Flags every entry [`Flag::Included`] or [`Flag::Excluded`] and every
    /// other node below the root [`Flag::Collapsed`] when none of its entries
    /// is selected.
    pub fn annotate(&self, root: &mut Node, selected: &[String]) {
        let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
        for child in &mut root.children {
            self.annotate_node(child, &selected);
        }
    }

    /// Returns whether a selected entry was found in the subtree.
    fn annotate_node(&self, node: &mut Node, selected: &HashSet<&str>) -> bool {
        if let Some(key) = self.entry_key(node) {
            let included = selected.contains(key);
            let (set, clear) = if included {
                (Flag::Included, Flag::Excluded)
            } else {
                (Flag::Excluded, Flag::Included)
            };
            node.flag(set);
            node.unflag(clear);
            return included;
        }
        let mut any = false;
        for child in &mut node.children {
            any |= self.annotate_node(child, selected);
        }
        if any {
            node.unflag(Flag::Collapsed);
        } else {
            node.flag(Flag::Collapsed);
        }
        any
    }

    /// Entries of `baseline` missing from `current`.
    ///
    /// An entry is present when `current` has a node with the same label
    /// under a parent with the same label as in `baseline`.
    #[must_use]
    pub fn removed_since(&self, baseline: &Node, current: &Node) -> Vec<String> {
        let mut removed = Vec::new();
        self.collect_removed(baseline, None, current, &mut removed);
        removed
    }

    fn collect_removed(&self, node: &Node, parent: Option<&str>, current: &Node, removed: &mut Vec<String>) {
        if let Some(key) = self.entry_key(node) {
            if !contains_entry(current, None, &node.label, parent) {
                tracing::info!("Test case {key} has been removed from the plan");
                removed.push(key.to_string());
            }
            return;
        }
        for child in &node.children {
            self.collect_removed(child, Some(node.label.as_str()), current, removed);
        }
    }

    /// Drops every subtree below `root` that holds no entry.
    ///
    /// Returns the number of subtrees dropped.
    pub fn prune_without_entries(&self, root: &mut Node) -> usize {
        let mut dropped = 0;
        root.children.retain_mut(|child| {
            if self.is_entry(child) {
                return true;
            }
            if self.holds_entry(child) {
                dropped += self.prune_without_entries(child);
                return true;
            }
            tracing::debug!("Dropping {} without test cases", child.label);
            dropped += 1;
            false
        });
        dropped
    }

    fn holds_entry(&self, node: &Node) -> bool {
        self.is_entry(node) || node.children.iter().any(|child| self.holds_entry(child))
    }

    /// Adds one child per recorded execution under each entry with a
    /// history.
    ///
    /// Previously attached history nodes are replaced. Returns the number of
    /// entries that received a history.
    #[instrument(level = "debug", skip_all)]
    pub fn attach_history(&self, root: &mut Node, history: &ExecutionHistory) -> usize {
        let Some(key) = self.entry_key(root).map(str::to_string) else {
            return root
                .children
                .iter_mut()
                .map(|child| self.attach_history(child, history))
                .sum();
        };
        root.children.retain(|child| !is_history_node(child));
        let records = history.get(&key);
        for record in records {
            root.children.push(
                Node::synthetic(record.plan.clone()).with_marker(record.status.into()),
            );
        }
        usize::from(!records.is_empty())
    }
}

struct Membership<'a> {
    removed: HashSet<&'a str>,
    kept: HashSet<&'a str>,
}

fn contains_entry(node: &Node, parent: Option<&str>, entry: &str, entry_parent: Option<&str>) -> bool {
    if node.label == entry && parent == entry_parent {
        return true;
    }
    node.children
        .iter()
        .any(|child| contains_entry(child, Some(node.label.as_str()), entry, entry_parent))
}

fn is_history_node(node: &Node) -> bool {
    node.id.is_none() && node.markers.iter().any(|marker| ExecutionStatus::from_marker(marker).is_some())
}

/// Stable first-occurrence de-duplication.
#[must_use]
pub fn dedupe(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// The outcome of one test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
    /// The test could not be run.
    Blocked,
    /// The test is planned but was not run.
    NotRun,
}

impl ExecutionStatus {
    /// Parses the single-letter code used by test-management services
    /// (`p`, `f`, `b`, `n`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "p" => Some(Self::Passed),
            "f" => Some(Self::Failed),
            "b" => Some(Self::Blocked),
            "n" => Some(Self::NotRun),
            _ => None,
        }
    }

    /// The status recorded by an execution marker.
    #[must_use]
    pub const fn from_marker(marker: &Marker) -> Option<Self> {
        match marker {
            Marker::Passed => Some(Self::Passed),
            Marker::Failed => Some(Self::Failed),
            Marker::Blocked => Some(Self::Blocked),
            Marker::NotRun => Some(Self::NotRun),
            _ => None,
        }
    }
}

impl From<ExecutionStatus> for Marker {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Passed => Self::Passed,
            ExecutionStatus::Failed => Self::Failed,
            ExecutionStatus::Blocked => Self::Blocked,
            ExecutionStatus::NotRun => Self::NotRun,
        }
    }
}


/// One execution of a test in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Name of the plan the test was executed in.
    pub plan: String,
    /// Outcome of the execution.
    pub status: ExecutionStatus,
}

/// Execution records per test key, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHistory {
    records: HashMap<String, Vec<ExecutionRecord>>,
}

impl ExecutionHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one execution of `test`.
    pub fn record(&mut self, test: impl Into<String>, plan: impl Into<String>, status: ExecutionStatus) {
        self.records.entry(test.into()).or_default().push(ExecutionRecord {
            plan: plan.into(),
            status,
        });
    }

    /// The executions recorded for `test`.
    #[must_use]
    pub fn get(&self, test: &str) -> &[ExecutionRecord] {
        self.records.get(test).map_or(&[], Vec::as_slice)
    }

    /// The number of tests with at least one record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
