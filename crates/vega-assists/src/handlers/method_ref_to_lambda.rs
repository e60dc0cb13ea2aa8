//! Method reference to lambda expression.
//!
//! The conversion is also exposed as [`method_ref_to_lambda_edit`] for
//! callers that need a lambda in place of a reference before doing further
//! work on it (for example turning it into a block to add statements).

use vega_syntax::scope::{declarations_in_scope, visible_variable_names};
use vega_syntax::{Binding, MethodId, NodeId, NodeKind, ResolvedFile, ScopeFlags, TypeId};

use crate::assist_context::AssistContext;
use crate::handlers::enclosing_type_body;
use crate::import_rewrite::ImportRewrite;
use crate::names::unique_parameter_names;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{FragmentRef, RewriteBuilder, RewriteError, TreeEdit};

/// Shape of the generated lambda body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LambdaBody {
    /// `x -> call(x)`
    #[default]
    Expression,
    /// `x -> { return call(x); }`, or an expression statement for `void`.
    Block,
}

struct MethodRefSite {
    node: NodeId,
    referred: Option<MethodId>,
    params: Vec<String>,
    returns_void: bool,
}

// Assist: convert_method_ref_to_lambda
//
// ```
// Function<String, Integer> f = String::<|>length;
// ```
// ->
// ```
// Function<String, Integer> f = t -> t.length();
// ```
pub(crate) fn method_ref_to_lambda(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    if !file.language_level.supports_lambdas() {
        return None;
    }
    let tree = ctx.tree();
    let mut node = ctx.covering();
    while tree.kind(node).is_name() || tree.kind(node).is_type() {
        node = tree.parent(node)?;
    }
    let site = analyze(file, node)?;

    ctx.add(
        AssistId::ConvertMethodRefToLambda,
        "Convert to lambda expression",
        relevance::CONVERT_TO_LAMBDA,
        |builder| replace_with_lambda(builder, file, &site, LambdaBody::Expression),
    );
    Some(())
}

/// An edit replacing the method reference `method_ref` by an equivalent
/// lambda. `Ok(None)` if `method_ref` is not a method reference with a
/// resolved functional target.
pub fn method_ref_to_lambda_edit(
    file: &ResolvedFile,
    method_ref: NodeId,
    body: LambdaBody,
) -> Result<Option<TreeEdit>, RewriteError> {
    let Some(site) = analyze(file, method_ref) else {
        return Ok(None);
    };
    let mut builder = RewriteBuilder::new(&file.tree);
    replace_with_lambda(&mut builder, file, &site, body)?;
    builder.finish().map(Some)
}

fn analyze(file: &ResolvedFile, node: NodeId) -> Option<MethodRefSite> {
    let tree = &file.tree;
    let model = &file.model;
    if !tree.kind(node).is_method_ref() {
        return None;
    }
    let target = model.target_type(node)?;
    let functional = model.functional_method(target)?;
    let symbol = model.method(functional);
    if !symbol.type_params.is_empty() {
        return None;
    }
    let originals: Vec<String> = symbol.params.iter().map(|p| p.name.clone()).collect();
    let params = unique_parameter_names(&originals, &visible_variable_names(file, node));

    let referred = model.method_binding(node);
    if referred.is_none() {
        tracing::warn!(
            target: "vega.assists",
            kind = tree.kind(node).kind_name(),
            "method reference without a method binding"
        );
    }
    Some(MethodRefSite {
        node,
        referred,
        params,
        returns_void: model.return_type(target, functional).is_void(),
    })
}

fn replace_with_lambda(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &MethodRefSite,
    body: LambdaBody,
) -> Result<(), RewriteError> {
    let mut imports = ImportRewrite::new(file);

    let mut params = Vec::with_capacity(site.params.len());
    for (idx, name) in site.params.iter().enumerate() {
        let name_node = builder.name(name.clone());
        builder.link(name.clone(), name_node, idx == 0);
        params.push(builder.new_node(NodeKind::Parameter {
            modifiers: Default::default(),
            ty: None,
            varargs: false,
            name: name_node,
        }));
    }

    let call = call_expression(builder, file, site, &mut imports)?;
    let body = match body {
        LambdaBody::Expression => call,
        LambdaBody::Block => {
            let stmt = if site.returns_void {
                builder.expr_stmt(call)
            } else {
                builder.new_node(NodeKind::Return { expr: Some(call) })
            };
            builder.block(vec![stmt])
        }
    };
    let parenthesized = params.len() != 1;
    let lambda = builder.new_node(NodeKind::Lambda {
        params,
        parenthesized,
        body,
    });
    builder.replace(site.node, lambda)?;
    imports.apply(builder)
}

/// Synthesized parameter names starting at `from`, each linked to its
/// parameter.
fn arguments(builder: &mut RewriteBuilder<'_>, site: &MethodRefSite, from: usize) -> Vec<FragmentRef> {
    site.params
        .iter()
        .skip(from)
        .map(|name| {
            let arg = builder.name(name.clone());
            builder.link(name.clone(), arg, false);
            arg
        })
        .collect()
}

fn call_expression(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &MethodRefSite,
    imports: &mut ImportRewrite<'_>,
) -> Result<FragmentRef, RewriteError> {
    let tree = &file.tree;
    let model = &file.model;
    if let NodeKind::CreationRef { ty, .. } = tree.kind(site.node) {
        if let NodeKind::ArrayType { element, dims } = tree.kind(*ty) {
            let first = arguments(builder, site, 0)
                .into_iter()
                .next()
                .ok_or(RewriteError::UnknownNode(site.node))?;
            let element_ty = builder.copy(*element);
            return Ok(builder.new_node(NodeKind::ArrayCreation {
                element_ty,
                dims: vec![first],
                extra_dims: dims.len().saturating_sub(1) as u32,
                initializer: None,
            }));
        }
        let generic = model
            .type_binding(*ty)
            .is_some_and(|def| !model.type_symbol(def).type_params.is_empty());
        let created = if generic && !matches!(tree.kind(*ty), NodeKind::ParameterizedType { .. }) {
            let base = builder.copy(*ty);
            builder.new_node(NodeKind::ParameterizedType {
                base,
                args: Vec::new(),
            })
        } else {
            builder.copy(*ty)
        };
        let args = arguments(builder, site, 0);
        return Ok(builder.new_node(NodeKind::New {
            ty: created,
            args,
            body: None,
        }));
    }

    let referred_static = site
        .referred
        .is_some_and(|m| model.method(m).is_static());
    match tree.kind(site.node) {
        NodeKind::ExprMethodRef {
            expr,
            type_args,
            name,
        } if referred_static => {
            let receiver = needs_qualifier(file, site, type_args).then(|| builder.copy(*expr));
            let type_args = copies(builder, type_args);
            let name = builder.copy(*name);
            let args = arguments(builder, site, 0);
            Ok(builder.new_node(NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            }))
        }
        NodeKind::TypeMethodRef {
            ty,
            type_args,
            name,
        } if referred_static => {
            let receiver = match needs_qualifier(file, site, type_args)
                .then(|| referenced_type(file, *ty))
                .flatten()
            {
                Some(def) => {
                    let spelled = imports.add_import(def);
                    Some(builder.qualified_name(&spelled))
                }
                None => None,
            };
            let type_args = copies(builder, type_args);
            let name = builder.copy(*name);
            let args = arguments(builder, site, 0);
            Ok(builder.new_node(NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            }))
        }
        NodeKind::SuperMethodRef {
            qualifier,
            type_args,
            name,
        } => {
            let qualifier = qualifier.map(|q| builder.copy(q));
            let type_args = copies(builder, type_args);
            let name = builder.copy(*name);
            let args = arguments(builder, site, 0);
            Ok(builder.new_node(NodeKind::SuperMethodCall {
                qualifier,
                type_args,
                name,
                args,
            }))
        }
        NodeKind::TypeMethodRef {
            type_args, name, ..
        } => unbound_receiver_call(builder, site, type_args, *name),
        NodeKind::ExprMethodRef {
            expr,
            type_args,
            name,
        } => {
            let names_a_type = tree.kind(*expr).is_name()
                && matches!(model.binding(*expr), Some(Binding::Type(_)));
            if names_a_type {
                return unbound_receiver_call(builder, site, type_args, *name);
            }
            let plain_this = matches!(tree.kind(*expr), NodeKind::This { qualifier: None })
                && type_args.is_empty();
            let receiver = (!plain_this).then(|| builder.copy(*expr));
            let type_args = copies(builder, type_args);
            let name = builder.copy(*name);
            let args = arguments(builder, site, 0);
            Ok(builder.new_node(NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            }))
        }
        _ => Err(RewriteError::UnknownNode(site.node)),
    }
}

/// `Type::instanceMethod`: the first parameter becomes the receiver.
fn unbound_receiver_call(
    builder: &mut RewriteBuilder<'_>,
    site: &MethodRefSite,
    type_args: &[NodeId],
    name: NodeId,
) -> Result<FragmentRef, RewriteError> {
    let first = site.params.first().ok_or(RewriteError::UnknownNode(site.node))?;
    let receiver = builder.name(first.clone());
    builder.link(first.clone(), receiver, false);
    let type_args = copies(builder, type_args);
    let name = builder.copy(name);
    let args = arguments(builder, site, 1);
    Ok(builder.new_node(NodeKind::MethodCall {
        receiver: Some(receiver),
        type_args,
        name,
        args,
    }))
}

fn copies(builder: &RewriteBuilder<'_>, nodes: &[NodeId]) -> Vec<FragmentRef> {
    nodes.iter().map(|n| builder.copy(*n)).collect()
}

/// A static call keeps its qualifier when the bare name could bind to
/// something else, when the declaring class is not one the call site
/// inherits from, or when explicit type arguments need a receiver to
/// attach to.
fn needs_qualifier(file: &ResolvedFile, site: &MethodRefSite, type_args: &[NodeId]) -> bool {
    let Some(referred) = site.referred else {
        return true;
    };
    if !type_args.is_empty() {
        return true;
    }
    let tree = &file.tree;
    let model = &file.model;
    let declaring = model.method(referred).declaring;
    let inherited = enclosing_type_body(tree, site.node)
        .and_then(|body| model.type_binding(body))
        .is_some_and(|enclosing| model.hierarchy(enclosing).contains(&declaring));
    !inherited || has_conflict(file, site.node, referred)
}

/// Any visible method sharing `referred`'s simple name that is not
/// `referred` itself. Overloads count as conflicts.
fn has_conflict(file: &ResolvedFile, node: NodeId, referred: MethodId) -> bool {
    let model = &file.model;
    let name = &model.method(referred).name;
    let offset = file.tree.range(node).start();
    declarations_in_scope(file, offset, ScopeFlags::METHODS)
        .into_iter()
        .filter_map(|binding| binding.as_method())
        .any(|method| method != referred && model.method(method).name == *name)
}

fn referenced_type(file: &ResolvedFile, ty: NodeId) -> Option<TypeId> {
    let model = &file.model;
    model.type_binding(ty).or_else(|| match file.tree.kind(ty) {
        NodeKind::ParameterizedType { base, .. } => model.type_binding(*base),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vega_test_utils::{resolve, Fixture};

    use crate::tests::{check_assist, edit_for};

    use super::*;

    const LABEL: &str = "Convert to lambda expression";

    #[test]
    fn unbound_receiver_takes_the_first_parameter() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = String::<|>length; }",
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = t -> t.length(); }",
        );
    }

    #[test]
    fn static_reference_to_another_class_keeps_its_qualifier() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.Comparator;\nclass A { Comparator<Integer> c = Integer::<|>compare; }",
            "import java.util.Comparator;\nclass A { Comparator<Integer> c = (o1, o2) -> Integer.compare(o1, o2); }",
        );
    }

    #[test]
    fn static_reference_to_own_class_drops_the_qualifier() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.IntUnaryOperator;\nclass A { static int twice(int x) { return x * 2; } IntUnaryOperator f = A::<|>twice; }",
            "import java.util.function.IntUnaryOperator;\nclass A { static int twice(int x) { return x * 2; } IntUnaryOperator f = operand -> twice(operand); }",
        );
    }

    #[test]
    fn overloaded_static_name_keeps_the_qualifier() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.IntUnaryOperator;\nclass A { static int twice(int x) { return x * 2; } static long twice(long x) { return x * 2; } IntUnaryOperator f = A::<|>twice; }",
            "import java.util.function.IntUnaryOperator;\nclass A { static int twice(int x) { return x * 2; } static long twice(long x) { return x * 2; } IntUnaryOperator f = operand -> A.twice(operand); }",
        );
    }

    #[test]
    fn bound_this_receiver_is_dropped() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.Supplier;\nclass A { String name() { return \"\"; } Supplier<String> s = this::<|>name; }",
            "import java.util.function.Supplier;\nclass A { String name() { return \"\"; } Supplier<String> s = () -> name(); }",
        );
    }

    #[test]
    fn bound_expression_receiver_is_copied() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.Predicate;\nclass A { void m(String prefix) { Predicate<String> p = prefix::<|>startsWith; } }",
            "import java.util.function.Predicate;\nclass A { void m(String prefix) { Predicate<String> p = t -> prefix.startsWith(t); } }",
        );
    }

    #[test]
    fn generic_constructor_reference_gets_a_diamond() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.ArrayList;\nimport java.util.function.Supplier;\nclass A { Supplier<ArrayList<String>> s = ArrayList::<|>new; }",
            "import java.util.ArrayList;\nimport java.util.function.Supplier;\nclass A { Supplier<ArrayList<String>> s = () -> new ArrayList<>(); }",
        );
    }

    #[test]
    fn array_constructor_reference_sizes_by_the_parameter() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.IntFunction;\nclass A { IntFunction<int[]> f = int[]::<|>new; }",
            "import java.util.function.IntFunction;\nclass A { IntFunction<int[]> f = value -> new int[value]; }",
        );
    }

    #[test]
    fn colliding_parameter_names_get_suffixes() {
        check_assist(
            method_ref_to_lambda,
            LABEL,
            "import java.util.function.Function;\nclass A { void m(String t) { Function<String, Integer> f = String::<|>length; } }",
            "import java.util.function.Function;\nclass A { void m(String t) { Function<String, Integer> f = t1 -> t1.length(); } }",
        );
    }

    #[test]
    fn parameters_are_linked_for_renaming() {
        let edit = edit_for(
            method_ref_to_lambda,
            LABEL,
            "import java.util.Comparator;\nclass A { Comparator<Integer> c = Integer::<|>compare; }",
        );
        assert_eq!(edit.linked_positions().groups(), vec!["o1", "o2"]);
        let first: Vec<bool> = edit
            .linked_positions()
            .group("o1")
            .map(|p| p.is_first)
            .collect();
        assert_eq!(first, vec![true, false]);
    }

    #[test]
    fn block_body_returns_or_evaluates() {
        let file = resolve(
            "import java.util.function.*;\nclass A { Function<String, Integer> f = String::length; Consumer<String> c = System.out::println; }",
        );
        let tree = &file.tree;
        let refs: Vec<NodeId> = tree
            .ids()
            .filter(|n| tree.kind(*n).is_method_ref())
            .collect();
        let rendered: Vec<String> = refs
            .iter()
            .map(|r| {
                method_ref_to_lambda_edit(&file, *r, LambdaBody::Block)
                    .unwrap()
                    .unwrap()
                    .apply(tree)
            })
            .collect();
        assert!(rendered[0].contains("t -> {"), "{}", rendered[0]);
        assert!(rendered[0].contains("return t.length();"), "{}", rendered[0]);
        assert!(rendered[1].contains("System.out.println(t);"), "{}", rendered[1]);
        assert!(!rendered[1].contains("return"), "{}", rendered[1]);
    }

    #[test]
    fn non_references_produce_no_edit() {
        let fixture = Fixture::parse("class A { int <|>x = 1; }");
        let edit = method_ref_to_lambda_edit(&fixture.file, fixture.covering_node(), LambdaBody::Expression);
        assert_eq!(edit, Ok(None));
    }
}
