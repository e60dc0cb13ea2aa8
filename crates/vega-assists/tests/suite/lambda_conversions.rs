use pretty_assertions::assert_eq;
use vega_assists::rewrite::FragmentRef;
use vega_assists::{method_ref_to_lambda_edit, LambdaBody, TreeEdit};
use vega_syntax::scope::visible_variable_names;
use vega_syntax::{NodeId, NodeKind};
use vega_test_utils::{resolve, Fixture};

use super::{apply, assists, render};

/// Parameter names and parenthesization of the lambda an edit introduces.
fn lambda_shape(edit: &TreeEdit) -> (Vec<String>, bool) {
    let (params, parenthesized) = edit
        .fragments()
        .iter()
        .find_map(|(_, kind)| match kind {
            NodeKind::Lambda {
                params,
                parenthesized,
                ..
            } => Some((params.clone(), *parenthesized)),
            _ => None,
        })
        .expect("edit introduces a lambda");
    let names = params
        .iter()
        .map(|param| {
            let FragmentRef::New(id) = param else {
                panic!("lambda parameter is not synthesized: {param:?}");
            };
            let Some(NodeKind::Parameter {
                name: FragmentRef::New(name),
                ..
            }) = edit.fragment(*id)
            else {
                panic!("unexpected lambda parameter fragment");
            };
            match edit.fragment(*name) {
                Some(NodeKind::SimpleName { ident }) => ident.clone(),
                other => panic!("unexpected parameter name fragment {other:?}"),
            }
        })
        .collect();
    (names, parenthesized)
}

fn method_refs(file: &vega_syntax::ResolvedFile) -> Vec<NodeId> {
    file.tree
        .preorder(file.tree.root())
        .into_iter()
        .filter(|n| file.tree.kind(*n).is_method_ref())
        .collect()
}

#[test]
fn constructor_references_take_the_functional_arity() {
    let file = resolve(
        r#"
import java.util.function.*;
class P {
    P() { }
    P(Integer a) { }
    P(Integer a, Integer b) { }
    Supplier<P> none = P::new;
    Function<Integer, P> one = P::new;
    BiFunction<Integer, Integer, P> two = P::new;
}
"#,
    );
    let refs = method_refs(&file);
    assert_eq!(refs.len(), 3);
    for (arity, node) in refs.into_iter().enumerate() {
        let edit = method_ref_to_lambda_edit(&file, node, LambdaBody::Expression)
            .unwrap()
            .expect("constructor reference converts");
        let (names, parenthesized) = lambda_shape(&edit);
        assert_eq!(names.len(), arity);
        assert_eq!(parenthesized, arity != 1, "arity {arity}");
    }
}

#[test]
fn parameter_names_avoid_visible_variables() {
    let file = resolve(
        r#"
import java.util.function.*;
class A {
    int t;
    void m(String u) {
        String t1 = "";
        BiFunction<String, String, Boolean> starts = String::startsWith;
    }
}
"#,
    );
    let node = method_refs(&file)[0];
    let visible = visible_variable_names(&file, node);
    let edit = method_ref_to_lambda_edit(&file, node, LambdaBody::Expression)
        .unwrap()
        .expect("method reference converts");
    let (names, _) = lambda_shape(&edit);

    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    for name in &names {
        assert!(!visible.contains(name), "{name} shadows a visible variable");
    }
}

#[test]
fn anonymous_class_and_lambda_convert_both_ways() {
    let fixture = Fixture::parse(
        "class A { void work() { } void m() { Runnable r = new <|>Runnable() { public void run() { work(); } }; } }",
    );
    let lambda = apply(&fixture, &assists(&fixture), "Convert to lambda expression");
    assert_eq!(
        lambda,
        render("class A { void work() { } void m() { Runnable r = () -> work(); } }")
    );

    let arrow = lambda.find("->").expect("lambda printed");
    let back = Fixture::parse(&format!("{}<|>{}", &lambda[..arrow], &lambda[arrow..]));
    let anonymous = apply(&back, &assists(&back), "Convert to anonymous class creation");
    assert_eq!(
        anonymous,
        render(
            "class A { void work() { } void m() { Runnable r = new Runnable() { @Override public void run() { work(); } }; } }"
        )
    );
}

#[test]
fn block_bodied_lambda_from_a_reference() {
    let file = resolve(
        "import java.util.function.*;\nclass A { Function<String, Integer> f = String::length; }",
    );
    let node = method_refs(&file)[0];
    let edit = method_ref_to_lambda_edit(&file, node, LambdaBody::Block)
        .unwrap()
        .expect("method reference converts");
    assert_eq!(
        edit.apply(&file.tree),
        render("import java.util.function.*;\nclass A { Function<String, Integer> f = t -> { return t.length(); }; }")
    );
}
