use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use vega_assists::relevance;
use vega_assists::{
    has_assists, quick_assists, quick_assists_with_cancellation, AssistConfig, AssistId,
    AssistRequest, AssistResolveStrategy, Cancelled, ProposalAction,
};
use vega_syntax::{Diagnostic, DiagnosticSource};
use vega_test_utils::Fixture;

use super::{assists, assists_with, labels};

const EXTRACT: &str = "class A { void m(String s) { int a = /*[*/s.length()/*]*/; } }";

fn error_at_selection(fixture: &Fixture, code: &str) -> Diagnostic {
    Diagnostic::error(code, "problem", fixture.selection)
}

#[test]
fn blocking_error_skips_gated_rules_only() {
    let fixture = Fixture::parse("class A { A(int <|>count) { } void m() { } }");
    let diagnostics = [error_at_selection(&fixture, "UndefinedName")];
    let proposals = assists_with(&fixture, &AssistConfig::default(), &diagnostics);
    assert_eq!(labels(&proposals), vec!["Assign parameter to new field"]);

    let fixture = Fixture::parse(EXTRACT);
    let diagnostics = [error_at_selection(&fixture, "UndefinedName")];
    assert!(assists_with(&fixture, &AssistConfig::default(), &diagnostics).is_empty());
}

#[test]
fn configurable_errors_only_lower_relevance() {
    let fixture = Fixture::parse(EXTRACT);
    let clean = assists(&fixture);
    assert_eq!(clean.last().map(|p| p.relevance), Some(relevance::EXTRACT_LOCAL));

    let diagnostics = [error_at_selection(&fixture, "UnusedImport")];
    let flagged = assists_with(&fixture, &AssistConfig::default(), &diagnostics);
    assert_eq!(labels(&flagged), labels(&clean));
    assert_eq!(flagged.last().map(|p| p.relevance), Some(relevance::EXTRACT_LOCAL_ERROR));
}

#[test]
fn configured_codes_and_diagnostic_sources() {
    let fixture = Fixture::parse(EXTRACT);
    let team_rule = [error_at_selection(&fixture, "TeamRule")];
    assert!(assists_with(&fixture, &AssistConfig::default(), &team_rule).is_empty());

    let config = AssistConfig::from_toml_str(r#"configurable_codes = ["TeamRule"]"#).unwrap();
    assert!(!assists_with(&fixture, &config, &team_rule).is_empty());

    let external =
        [error_at_selection(&fixture, "UnusedImport").with_source(DiagnosticSource::External)];
    assert!(assists_with(&fixture, &AssistConfig::default(), &external).is_empty());
}

#[test]
fn toml_config_switches_to_commands() {
    let fixture = Fixture::parse(EXTRACT);
    let config = AssistConfig::from_toml_str("command_refactoring = true").unwrap();
    let proposals = assists_with(&fixture, &config, &[]);
    assert!(proposals.iter().any(|p| p.id == AssistId::ExtractMethod));
    assert!(proposals
        .iter()
        .all(|p| matches!(p.action, ProposalAction::Command(_))));
}

#[test]
fn applicability_only_mode_builds_nothing() {
    let fixture = Fixture::parse(EXTRACT);
    let request = AssistRequest::new(&fixture.file, fixture.selection)
        .with_resolve(AssistResolveStrategy::None);
    let proposals = quick_assists(&request, &AssistConfig::default());
    assert!(!proposals.is_empty());
    assert!(proposals
        .iter()
        .all(|p| p.action == ProposalAction::Unresolved));
    assert!(has_assists(&request, &AssistConfig::default()));

    let nothing = Fixture::parse("class A { <|>}");
    let request = AssistRequest::new(&nothing.file, nothing.selection);
    assert!(!has_assists(&request, &AssistConfig::default()));
}

#[test]
fn cancelled_token_stops_the_run() {
    let fixture = Fixture::parse(EXTRACT);
    let request = AssistRequest::new(&fixture.file, fixture.selection);

    let token = CancellationToken::new();
    let live = quick_assists_with_cancellation(&request, &AssistConfig::default(), &token);
    assert_eq!(live.map(|p| p.len()), Ok(2));

    token.cancel();
    let cancelled = quick_assists_with_cancellation(&request, &AssistConfig::default(), &token);
    assert_eq!(cancelled, Err(Cancelled));
}
