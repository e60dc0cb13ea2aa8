//! Fixture helpers for handler unit tests.

use pretty_assertions::assert_eq;
use vega_test_utils::{resolve, Fixture};

use crate::assist_context::AssistContext;
use crate::config::AssistConfig;
use crate::proposal::{AssistResolveStrategy, Proposal};
use crate::rewrite::TreeEdit;
use crate::Handler;

/// Runs one handler over `fixture` and returns its proposals in emission
/// order, without aggregation.
pub(crate) fn run_with(handler: Handler, fixture: &Fixture, config: &AssistConfig) -> Vec<Proposal> {
    let mut ctx = AssistContext::new(
        &fixture.file,
        fixture.selection,
        &[],
        config,
        AssistResolveStrategy::All,
    );
    handler(&mut ctx);
    ctx.into_proposals()
}

pub(crate) fn run(handler: Handler, fixture: &str) -> (Fixture, Vec<Proposal>) {
    let fixture = Fixture::parse(fixture);
    let proposals = run_with(handler, &fixture, &AssistConfig::default());
    (fixture, proposals)
}

#[track_caller]
pub(crate) fn edit_for(handler: Handler, label: &str, before: &str) -> TreeEdit {
    let (_, proposals) = run(handler, before);
    let labels: Vec<&str> = proposals.iter().map(|p| p.label.as_str()).collect();
    proposals
        .iter()
        .find(|p| p.label == label)
        .and_then(Proposal::edit)
        .cloned()
        .unwrap_or_else(|| panic!("no edit labelled {label:?}; offered {labels:?}"))
}

/// Applies the proposal labelled `label` and compares with `after`, both in
/// normalized printed form.
#[track_caller]
pub(crate) fn check_assist(handler: Handler, label: &str, before: &str, after: &str) {
    let fixture = Fixture::parse(before);
    check_assist_in(handler, label, &fixture, after);
}

#[track_caller]
pub(crate) fn check_assist_in(handler: Handler, label: &str, fixture: &Fixture, after: &str) {
    let proposals = run_with(handler, fixture, &AssistConfig::default());
    let labels: Vec<&str> = proposals.iter().map(|p| p.label.as_str()).collect();
    let edit = proposals
        .iter()
        .find(|p| p.label == label)
        .and_then(Proposal::edit)
        .unwrap_or_else(|| panic!("no edit labelled {label:?}; offered {labels:?}"));
    let expected = resolve(after);
    assert_eq!(
        edit.apply(&fixture.file.tree),
        expected.print(expected.tree.root())
    );
}

#[track_caller]
pub(crate) fn check_assist_not_applicable(handler: Handler, before: &str) {
    let (_, proposals) = run(handler, before);
    let labels: Vec<&str> = proposals.iter().map(|p| p.label.as_str()).collect();
    assert!(labels.is_empty(), "unexpected proposals: {labels:?}");
}

#[track_caller]
pub(crate) fn check_labels(handler: Handler, before: &str, expected: &[&str]) {
    let (_, proposals) = run(handler, before);
    let labels: Vec<&str> = proposals.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, expected);
}
