//! Deferred refactoring commands.
//!
//! Refactorings that need user input (names, initialization sites) are handed
//! to the client as a command the client sends back to the server. The
//! arguments are `[discriminator, params]`, plus the legal initialization
//! sites for extract field.

use lsp_types::{Command, Position, Range};
use serde::{Deserialize, Serialize};
use vega_syntax::TextRange;

pub const APPLY_REFACTORING_COMMAND: &str = "java.action.applyRefactoringCommand";

pub const EXTRACT_VARIABLE: &str = "extractVariable";
pub const EXTRACT_VARIABLE_ALL_OCCURRENCE: &str = "extractVariableAllOccurrence";
pub const EXTRACT_CONSTANT: &str = "extractConstant";
pub const EXTRACT_FIELD: &str = "extractField";
pub const EXTRACT_METHOD: &str = "extractMethod";

/// Where an extracted field may be initialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializeIn {
    #[serde(rename = "field declaration")]
    FieldDeclaration,
    #[serde(rename = "current method")]
    CurrentMethod,
    #[serde(rename = "class constructors")]
    ClassConstructors,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactoringParams {
    pub range: Range,
}

impl RefactoringParams {
    pub fn new(text: &str, range: TextRange) -> Self {
        Self {
            range: Range {
                start: position(text, range.start().into()),
                end: position(text, range.end().into()),
            },
        }
    }
}

/// Zero-based line and UTF-16 column of `offset`.
pub fn position(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let line = before.matches('\n').count();
    let character: usize = before[line_start..].chars().map(char::len_utf16).sum();
    Position::new(line as u32, character as u32)
}

pub fn refactoring_command(
    title: &str,
    discriminator: &str,
    params: &RefactoringParams,
    extra: Option<serde_json::Value>,
) -> Option<Command> {
    let mut arguments = vec![
        serde_json::Value::String(discriminator.to_string()),
        serde_json::to_value(params).ok()?,
    ];
    arguments.extend(extra);
    Some(Command {
        title: title.to_string(),
        command: APPLY_REFACTORING_COMMAND.to_string(),
        arguments: Some(arguments),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_count_utf16_units() {
        let text = "a\n\u{1F600}b\nc";
        assert_eq!(position(text, 0), Position::new(0, 0));
        assert_eq!(position(text, 2), Position::new(1, 0));
        assert_eq!(position(text, 6), Position::new(1, 2));
        assert_eq!(position(text, text.len()), Position::new(2, 1));
    }

    #[test]
    fn command_carries_discriminator_then_params() {
        let params = RefactoringParams::new("int x = 0;", TextRange::new(8.into(), 9.into()));
        let command = refactoring_command("Extract to constant", EXTRACT_CONSTANT, &params, None).unwrap();
        assert_eq!(command.command, APPLY_REFACTORING_COMMAND);
        let args = command.arguments.unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], serde_json::json!("extractConstant"));
        assert_eq!(
            args[1],
            serde_json::json!({
                "range": {
                    "start": { "line": 0, "character": 8 },
                    "end": { "line": 0, "character": 9 }
                }
            })
        );
    }

    #[test]
    fn init_sites_serialize_as_labels() {
        let sites = vec![InitializeIn::FieldDeclaration, InitializeIn::ClassConstructors];
        assert_eq!(
            serde_json::to_value(sites).unwrap(),
            serde_json::json!(["field declaration", "class constructors"])
        );
    }
}
