use pretty_assertions::assert_eq;
use vega_test_utils::Fixture;

use super::{apply, assists, labels, render};

const NEW_FIELD: &str = "Assign parameter to new field";

#[test]
fn assigning_to_a_new_field_is_not_offered_twice() {
    let fixture = Fixture::parse("class A { A(int <|>count) { } }");
    let proposals = assists(&fixture);
    assert!(labels(&proposals).contains(&NEW_FIELD), "{:?}", labels(&proposals));

    let after = apply(&fixture, &proposals, NEW_FIELD);
    let param = after.find("int count)").expect("parameter kept") + "int ".len();
    let again = Fixture::parse(&format!("{}<|>{}", &after[..param], &after[param..]));
    let proposals = assists(&again);
    assert!(
        !labels(&proposals).contains(&NEW_FIELD),
        "offered again after applying: {:?}",
        labels(&proposals)
    );
}

#[test]
fn assign_all_covers_every_parameter() {
    let fixture = Fixture::parse("class A { A(int <|>a, String b) { } }");
    let proposals = assists(&fixture);
    assert_eq!(
        apply(&fixture, &proposals, "Assign all parameters to new fields"),
        render(
            "class A { private int a; private String b; A(int a, String b) { this.a = a; this.b = b; } }"
        )
    );
}
