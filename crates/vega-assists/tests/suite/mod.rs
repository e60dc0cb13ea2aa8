mod assign_param;
mod catch_to_throws;
mod extract;
mod gate_and_config;
mod lambda_conversions;
mod logging;
mod selection_properties;
mod static_import;

use vega_assists::{quick_assists, AssistConfig, AssistRequest, Proposal};
use vega_syntax::Diagnostic;
use vega_test_utils::Fixture;

pub(crate) fn assists(fixture: &Fixture) -> Vec<Proposal> {
    assists_with(fixture, &AssistConfig::default(), &[])
}

pub(crate) fn assists_with(
    fixture: &Fixture,
    config: &AssistConfig,
    diagnostics: &[Diagnostic],
) -> Vec<Proposal> {
    let request = AssistRequest::new(&fixture.file, fixture.selection).with_diagnostics(diagnostics);
    quick_assists(&request, config)
}

pub(crate) fn labels(proposals: &[Proposal]) -> Vec<&str> {
    proposals.iter().map(|p| p.label.as_str()).collect()
}

/// Source text after applying the edit of the proposal labelled `label`.
#[track_caller]
pub(crate) fn apply(fixture: &Fixture, proposals: &[Proposal], label: &str) -> String {
    let proposal = proposals
        .iter()
        .find(|p| p.label == label)
        .unwrap_or_else(|| panic!("no proposal {label:?} in {:?}", labels(proposals)));
    let edit = proposal
        .edit()
        .unwrap_or_else(|| panic!("proposal {label:?} carries no edit"));
    edit.apply(&fixture.file.tree)
}

pub(crate) fn command_config() -> AssistConfig {
    AssistConfig {
        command_refactoring: true,
        ..AssistConfig::default()
    }
}

/// `text` in the printer's normalized form, for comparing with applied edits.
pub(crate) fn render(text: &str) -> String {
    let file = vega_test_utils::resolve(text);
    file.print(file.tree.root())
}
