//! Decides whether error-gated assists may run at a location.

use vega_syntax::{Diagnostic, DiagnosticSource, TextRange};

use crate::config::AssistConfig;

/// Outcome of looking at the diagnostics around a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gate {
    /// No error at the location would be a hard compile failure.
    pub passes: bool,
    /// Any diagnostic, of any severity, touches the selection.
    pub problems_at_location: bool,
}

impl Gate {
    pub fn evaluate(diagnostics: &[Diagnostic], selection: TextRange, config: &AssistConfig) -> Self {
        let mut problems_at_location = false;
        let mut passes = true;
        for diagnostic in diagnostics
            .iter()
            .filter(|d| intersects(d.range, selection))
        {
            problems_at_location = true;
            if is_blocking(diagnostic, config) {
                tracing::debug!(
                    target: "vega.assists",
                    code = %diagnostic.code,
                    "blocking error at selection"
                );
                passes = false;
            }
        }
        Self {
            passes,
            problems_at_location,
        }
    }
}

/// Errors block unless the compiler reports them under a code whose severity
/// is user-configurable.
pub fn is_blocking(diagnostic: &Diagnostic, config: &AssistConfig) -> bool {
    if !diagnostic.is_error() {
        return false;
    }
    !(diagnostic.source == DiagnosticSource::Compiler && config.is_configurable(&diagnostic.code))
}

fn intersects(a: TextRange, b: TextRange) -> bool {
    a.start() <= b.end() && b.start() <= a.end()
}
