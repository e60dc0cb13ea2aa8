//! Proposal records handed to the consumption layer.

use std::fmt;

use lsp_types::{CodeActionKind, Command};

use crate::rewrite::TreeEdit;

pub const REFACTOR_EXTRACT_CONSTANT: CodeActionKind =
    CodeActionKind::new("refactor.extract.constant");
pub const REFACTOR_EXTRACT_FIELD: CodeActionKind = CodeActionKind::new("refactor.extract.field");
pub const REFACTOR_EXTRACT_FUNCTION: CodeActionKind =
    CodeActionKind::new("refactor.extract.function");
pub const REFACTOR_EXTRACT_VARIABLE: CodeActionKind =
    CodeActionKind::new("refactor.extract.variable");
pub const REFACTOR_ASSIGN_FIELD: CodeActionKind = CodeActionKind::new("refactor.assign.field");

/// Stable identifier of the rule that produced a proposal. Clients key
/// bindings and filters on [`AssistId::as_str`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssistId {
    AssignParamToField,
    AssignAllParamsToFields,
    ConvertVarToResolvedType,
    ConvertResolvedTypeToVar,
    ConvertAnonymousToLambda,
    ConvertLambdaToAnonymous,
    ConvertMethodRefToLambda,
    CatchToThrows,
    RemoveCatch,
    AddStaticImport,
    ExtractConstant,
    ExtractField,
    ExtractMethod,
    ExtractLocalAll,
    ExtractLocal,
}

impl AssistId {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssistId::AssignParamToField => "assign-param-to-field",
            AssistId::AssignAllParamsToFields => "assign-all-params-to-fields",
            AssistId::ConvertVarToResolvedType => "convert-var-to-resolved-type",
            AssistId::ConvertResolvedTypeToVar => "convert-resolved-type-to-var",
            AssistId::ConvertAnonymousToLambda => "convert-anonymous-to-lambda",
            AssistId::ConvertLambdaToAnonymous => "convert-lambda-to-anonymous",
            AssistId::ConvertMethodRefToLambda => "convert-method-ref-to-lambda",
            AssistId::CatchToThrows => "catch-to-throws",
            AssistId::RemoveCatch => "remove-catch",
            AssistId::AddStaticImport => "add-static-import",
            AssistId::ExtractConstant => "extract-constant",
            AssistId::ExtractField => "extract-field",
            AssistId::ExtractMethod => "extract-method",
            AssistId::ExtractLocalAll => "extract-local-all",
            AssistId::ExtractLocal => "extract-local",
        }
    }

    /// Code action kind every proposal of this rule carries.
    pub fn kind(self) -> CodeActionKind {
        match self {
            AssistId::AssignParamToField | AssistId::AssignAllParamsToFields => {
                REFACTOR_ASSIGN_FIELD
            }
            AssistId::ConvertVarToResolvedType
            | AssistId::ConvertResolvedTypeToVar
            | AssistId::ConvertAnonymousToLambda
            | AssistId::ConvertLambdaToAnonymous
            | AssistId::ConvertMethodRefToLambda => CodeActionKind::REFACTOR_REWRITE,
            AssistId::CatchToThrows | AssistId::RemoveCatch | AssistId::AddStaticImport => {
                CodeActionKind::QUICKFIX
            }
            AssistId::ExtractConstant => REFACTOR_EXTRACT_CONSTANT,
            AssistId::ExtractField => REFACTOR_EXTRACT_FIELD,
            AssistId::ExtractMethod => REFACTOR_EXTRACT_FUNCTION,
            AssistId::ExtractLocalAll | AssistId::ExtractLocal => REFACTOR_EXTRACT_VARIABLE,
        }
    }
}

impl fmt::Display for AssistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether proposals carry their edits or only report applicability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssistResolveStrategy {
    /// Skip edit construction; every proposal is [`ProposalAction::Unresolved`].
    None,
    #[default]
    All,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProposalAction {
    Edit(TreeEdit),
    /// Deferred to the client, which runs the refactoring interactively.
    Command(Command),
    Unresolved,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    pub id: AssistId,
    pub label: String,
    pub kind: CodeActionKind,
    pub relevance: i32,
    pub action: ProposalAction,
}

impl Proposal {
    pub fn is_quick_fix(&self) -> bool {
        self.kind == CodeActionKind::QUICKFIX
    }

    pub fn edit(&self) -> Option<&TreeEdit> {
        match &self.action {
            ProposalAction::Edit(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&Command> {
        match &self.action {
            ProposalAction::Command(command) => Some(command),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_kinds_sort_in_menu_order() {
        let mut kinds = vec![
            AssistId::ExtractLocal.kind(),
            AssistId::ExtractMethod.kind(),
            AssistId::ExtractConstant.kind(),
            AssistId::ExtractField.kind(),
        ];
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(
            kinds,
            vec![
                REFACTOR_EXTRACT_CONSTANT,
                REFACTOR_EXTRACT_FIELD,
                REFACTOR_EXTRACT_FUNCTION,
                REFACTOR_EXTRACT_VARIABLE,
            ]
        );
    }

    #[test]
    fn ids_are_kebab_case() {
        assert_eq!(AssistId::ConvertMethodRefToLambda.to_string(), "convert-method-ref-to-lambda");
        assert!(AssistId::AddStaticImport.kind() == CodeActionKind::QUICKFIX);
    }
}
