use pretty_assertions::assert_eq;
use vega_test_utils::Fixture;

use super::{apply, assists, labels, render};

const REPLACE: &str = "Replace catch clause with throws";

fn method_with_try(body: &str) -> String {
    format!(
        "import java.io.*;\nclass A {{ void m(boolean b) {{ try {{ {body} }} catch (<|>FileNotFoundException e) {{ }} }} }}"
    )
}

#[test]
fn single_statement_try_leaves_no_try_behind() {
    let bodies = [
        "new FileReader(\"f\");",
        "Reader r = new FileReader(\"f\");",
        "if (b) new FileReader(\"f\");",
        "{ new FileReader(\"f\"); }",
        "for (int i = 0; i < 2; i++) new FileReader(\"f\");",
    ];
    for body in bodies {
        let fixture = Fixture::parse(&method_with_try(body));
        let proposals = assists(&fixture);
        let after = apply(&fixture, &proposals, REPLACE);
        assert!(!after.contains("try"), "try kept for {body:?}:\n{after}");
        assert!(
            after.contains("void m(boolean b) throws FileNotFoundException"),
            "throws clause missing for {body:?}:\n{after}"
        );
    }
}

#[test]
fn quick_fixes_are_listed_by_relevance() {
    let fixture = Fixture::parse(&method_with_try("new FileReader(\"f\");"));
    let proposals = assists(&fixture);
    assert_eq!(labels(&proposals), vec![REPLACE, "Remove catch clause"]);
    assert!(proposals.iter().all(|p| p.is_quick_fix()));
}

#[test]
fn remove_catch_keeps_the_body() {
    let fixture = Fixture::parse(&method_with_try("new FileReader(\"f\"); b = !b;"));
    let proposals = assists(&fixture);
    assert_eq!(
        apply(&fixture, &proposals, "Remove catch clause"),
        render("import java.io.*;\nclass A { void m(boolean b) { { new FileReader(\"f\"); b = !b; } } }")
    );
}
