//! The traceability engine.
//!
//! Every operation works on in-memory [`Node`](crate::domain::Node) trees,
//! built fresh for each run and mutated in place.

pub mod design;
pub mod index;
pub mod linker;
pub mod numbering;
pub mod plan;
pub mod regression;
pub mod walk;

pub use design::{DesignItem, design_items};
pub use index::{
    Extraction, TraceLink, TraceLinks, extract_ancestor_reference_index, extract_terminal_index,
    linked_test_cases, reverse_links, strip_document_prefix,
};
pub use linker::{Graft, LinkPlan, LinkReport, TargetMode, flag_uncovered, link};
pub use numbering::{NumberingError, add_prefix, remove_prefix};
pub use plan::{ExecutionHistory, ExecutionStatus, PlanOutcome, TestPlan, dedupe};
pub use regression::{EntryState, RegressionFilter};
