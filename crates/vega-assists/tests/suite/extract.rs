use lsp_types::CodeActionKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use vega_assists::command::APPLY_REFACTORING_COMMAND;
use vega_assists::{AssistId, ProposalAction};
use vega_test_utils::Fixture;

use super::{apply, assists, assists_with, command_config, labels, render};

#[test]
fn literal_selection_yields_five_extract_commands_in_menu_order() {
    let fixture = Fixture::parse("class A { void m() { int x = /*]*/0/*[*/; } }");
    let proposals = assists_with(&fixture, &command_config(), &[]);

    assert_eq!(
        labels(&proposals),
        vec![
            "Extract to constant",
            "Extract to field",
            "Extract to method",
            "Extract to local variable (replace all occurrences)",
            "Extract to local variable",
        ]
    );
    assert_eq!(
        proposals.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![
            AssistId::ExtractConstant,
            AssistId::ExtractField,
            AssistId::ExtractMethod,
            AssistId::ExtractLocalAll,
            AssistId::ExtractLocal,
        ]
    );
    for proposal in &proposals {
        let command = proposal.command().expect("extract proposals are commands");
        assert_eq!(command.command, APPLY_REFACTORING_COMMAND);
    }
}

#[test]
fn two_if_statements_extract_to_a_method_command() {
    let fixture = Fixture::parse(
        r#"
class A {
    void m(int a) {
        int x = 0;
        /*[*/if (a > 0) {
            x = 1;
        }
        if (a > 1) {
            x = 2;
        }/*]*/
        System.out.println(x);
    }
}
"#,
    );
    let proposals = assists_with(&fixture, &command_config(), &[]);
    let method = proposals
        .iter()
        .find(|p| p.id == AssistId::ExtractMethod)
        .expect("extract method offered");

    assert_eq!(method.label, "Extract to method");
    assert_eq!(method.kind, CodeActionKind::new("refactor.extract.function"));
    let ProposalAction::Command(command) = &method.action else {
        panic!("expected a command, got {:?}", method.action);
    };
    assert_eq!(command.command, APPLY_REFACTORING_COMMAND);
    let arguments = command.arguments.clone().unwrap_or_default();
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[0], json!("extractMethod"));
    assert_eq!(
        arguments[1],
        json!({
            "range": {
                "start": { "line": 4, "character": 13 },
                "end": { "line": 9, "character": 9 }
            }
        })
    );
}

#[test]
fn inline_extraction_without_command_support() {
    let fixture = Fixture::parse(
        "class A { void m(String s) { int a = /*[*/s.length()/*]*/; int b = s.length() + 1; } }",
    );
    let proposals = assists(&fixture);
    assert_eq!(
        labels(&proposals),
        vec![
            "Extract to local variable (replace all occurrences)",
            "Extract to local variable",
        ]
    );
    assert_eq!(
        apply(&fixture, &proposals, "Extract to local variable (replace all occurrences)"),
        render("class A { void m(String s) { int length = s.length(); int a = length; int b = length + 1; } }")
    );
}
