use pretty_assertions::assert_eq;
use vega_test_utils::Fixture;

use super::{apply, assists, labels};

const ALL: &str = "Convert to static import (replace all occurrences)";

fn qualified_references(text: &str) -> usize {
    text.matches("Collections.").count() - text.matches("import static java.util.Collections.").count()
}

#[test]
fn replace_all_removes_exactly_the_identical_occurrences() {
    let cases = [
        // (source, identical occurrences, type import survives)
        (
            "import java.util.*;\nimport java.util.Collections;\nclass A { List<String> a = Collections.<|>emptyList(); List<String> b = Collections.emptyList(); }",
            2,
            false,
        ),
        (
            "import java.util.*;\nimport java.util.Collections;\nclass A { List<String> a = Collections.<|>emptyList(); List<String> b = Collections.singletonList(\"x\"); }",
            1,
            true,
        ),
        (
            "import java.util.*;\nimport java.util.Collections;\nclass A { List<String> a = Collections.<|>emptyList(); List<String> b = Collections.emptyList(); List<String> c = Collections.singletonList(\"x\"); }",
            2,
            true,
        ),
    ];
    for (source, identical, keeps_import) in cases {
        let fixture = Fixture::parse(source);
        let before = qualified_references(fixture.text());
        let proposals = assists(&fixture);
        let after = apply(&fixture, &proposals, ALL);

        assert_eq!(qualified_references(&after), before - identical, "{after}");
        assert_eq!(after.contains("import java.util.Collections;"), keeps_import, "{after}");
        assert!(after.contains("import static java.util.Collections.emptyList;"), "{after}");
    }
}

#[test]
fn offered_as_low_relevance_quick_fixes() {
    let fixture = Fixture::parse("class A { int m() { return Math.<|>max(1, 2); } }");
    let proposals = assists(&fixture);
    assert_eq!(
        labels(&proposals),
        vec!["Convert to static import", "Convert to static import (replace all occurrences)"]
    );
    assert!(proposals.iter().all(|p| p.is_quick_fix() && p.relevance == 1));
}
