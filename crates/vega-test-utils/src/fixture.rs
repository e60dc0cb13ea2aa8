use vega_syntax::{JavaLanguageLevel, NodeId, ResolvedFile, TextRange, TextSize};

use crate::{resolve_with_level, CARET};

const START_MARKER: &str = "/*[*/";
const END_MARKER: &str = "/*]*/";

/// Extracts the selection from a fixture.
///
/// `/*[*/` and `/*]*/` stay in the text (they are comments) and the selection
/// spans the text between them, in whichever order they appear. A `<|>` caret
/// is stripped and yields an empty selection.
pub fn extract_selection(fixture: &str) -> (String, TextRange) {
    if let Some(offset) = fixture.find(CARET) {
        let mut text = String::with_capacity(fixture.len());
        text.push_str(&fixture[..offset]);
        text.push_str(&fixture[offset + CARET.len()..]);
        return (text, TextRange::empty(TextSize::from(offset as u32)));
    }

    let start = fixture
        .find(START_MARKER)
        .expect("fixture missing /*[*/ marker");
    let end = fixture.find(END_MARKER).expect("fixture missing /*]*/ marker");
    let (first, second) = if start < end {
        (start + START_MARKER.len(), end)
    } else {
        (end + END_MARKER.len(), start)
    };
    (
        fixture.to_string(),
        TextRange::new((first as u32).into(), (second as u32).into()),
    )
}

/// A resolved fixture file with the selection its markers describe.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub file: ResolvedFile,
    pub selection: TextRange,
}

impl Fixture {
    pub fn parse(fixture: &str) -> Self {
        Self::with_level(fixture, JavaLanguageLevel::JAVA_21)
    }

    pub fn with_level(fixture: &str, level: JavaLanguageLevel) -> Self {
        let (text, selection) = extract_selection(fixture);
        Self {
            file: resolve_with_level(&text, level),
            selection,
        }
    }

    pub fn text(&self) -> &str {
        self.file.text()
    }

    pub fn selected_text(&self) -> &str {
        &self.file.text()[self.selection]
    }

    /// Innermost node covering the selection.
    pub fn covering_node(&self) -> NodeId {
        self.file.tree.covering_node(self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_in_order_select_the_enclosed_text() {
        let (text, range) = extract_selection("int x = /*[*/1 + 2/*]*/;");
        assert_eq!(&text[range], "1 + 2");
    }

    #[test]
    fn reversed_markers_select_the_enclosed_text() {
        let (text, range) = extract_selection("int x = /*]*/0/*[*/;");
        assert_eq!(&text[range], "0");
    }

    #[test]
    fn caret_is_removed() {
        let (text, range) = extract_selection("int <|>x;");
        assert_eq!(text, "int x;");
        assert!(range.is_empty());
        assert_eq!(u32::from(range.start()), 4);
    }
}
