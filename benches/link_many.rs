//! This bench simulates linking a large functional specification into a
//! requirements document and filtering a large test plan.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tracelink::{
    Marker, Node,
    domain::TestCaseKey,
    trace::{RegressionFilter, TargetMode, TestPlan, TraceLink, TraceLinks, link},
};

const SEPARATOR: &str = "::";

/// Generates a requirements document, a specification and the links between
/// them: every requirement traces to three specification items.
fn preseed_documents(size: usize) -> (Node, Node, TraceLinks) {
    let requirements = Node::new("pmr", "PMR").with_children(
        (0..size).map(|i| Node::new(format!("r{i}"), format!("PMR-{i}::requirement {i}"))),
    );
    let specification = Node::new("pfs", "PFS").with_children((0..size).map(|group| {
        Node::new(format!("g{group}"), format!("group {group}")).with_children((0..3).map(|item| {
            let id = group * 3 + item;
            Node::new(format!("p{id}"), format!("PFS-{id}::item {id}"))
        }))
    }));
    let links = (0..size)
        .map(|i| TraceLink::new(format!("PMR-{i}"), (0..3).map(|item| format!("PFS-{}", i * 3 + item))))
        .collect();
    (requirements, specification, links)
}

fn preseed_plan(size: usize) -> Node {
    Node::new("plan", "Plan").with_children((0..size).map(|suite| {
        let level = u8::try_from(suite % 5 + 1).unwrap();
        Node::new(format!("s{suite}"), format!("suite {suite}"))
            .with_marker(Marker::Folder)
            .with_marker(Marker::Regression(level))
            .with_children((0..10).map(|case| {
                let id = suite * 10 + case;
                Node::new(format!("c{id}"), format!("HDVB-{id}::case {id}"))
            }))
    }))
}

fn link_many(c: &mut Criterion) {
    c.bench_function("link 500 requirements", |b| {
        b.iter_batched(
            || preseed_documents(500),
            |(mut requirements, mut specification, links)| {
                link(
                    &mut requirements,
                    &mut specification,
                    &links,
                    TargetMode::Leaves,
                    SEPARATOR,
                )
            },
            BatchSize::SmallInput,
        );
    });
}

fn diff_plan(c: &mut Criterion) {
    let plan = TestPlan::new(TestCaseKey::for_repository("HDVB"), SEPARATOR);
    let filter = RegressionFilter::new(3);
    c.bench_function("diff 5000 test cases", |b| {
        b.iter_batched(
            || preseed_plan(500),
            |mut root| plan.diff(&mut root, &filter),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, link_many, diff_plan);
criterion_main!(benches);
