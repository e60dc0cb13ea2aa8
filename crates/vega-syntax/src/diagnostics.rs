use serde::{Deserialize, Serialize};
use text_size::TextRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Where a diagnostic came from. Only compiler problems carry codes whose
/// severity is user-configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    Compiler,
    External,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: DiagnosticSource,
    pub code: String,
    pub message: String,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Error,
            source: DiagnosticSource::Compiler,
            code: code.into(),
            message: message.into(),
            range,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Warning,
            source: DiagnosticSource::Compiler,
            code: code.into(),
            message: message.into(),
            range,
        }
    }

    pub fn with_source(mut self, source: DiagnosticSource) -> Self {
        self.source = source;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
