use std::collections::{HashMap, HashSet};

use vega_syntax::{ModifierFlags, Modifiers, NodeId, NodeKind, ResolvedFile, Ty};

use crate::assist_context::AssistContext;
use crate::handlers::enclosing_type_body;
use crate::import_rewrite::ImportRewrite;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{FragmentRef, RewriteBuilder, RewriteError};

// Assist: convert_lambda_to_anonymous
//
// ```
// Runnable r = <|>() -> work();
// ```
// ->
// ```
// Runnable r = new Runnable() {
//     @Override
//     public void run() {
//         work();
//     }
// };
// ```
pub(crate) fn lambda_to_anonymous(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let tree = ctx.tree();
    let model = ctx.model();

    let lambda = tree
        .ancestors_with_self(ctx.covering())
        .take_while(|n| !tree.kind(*n).is_body_declaration())
        .find(|n| matches!(tree.kind(*n), NodeKind::Lambda { .. }))?;
    let target = model.target_type(lambda)?;
    if target.contains_unknown() || target.type_args().iter().any(Ty::is_wildcard) {
        return None;
    }
    let functional = model.functional_method(target)?;
    if !model.method(functional).type_params.is_empty() {
        return None;
    }
    let NodeKind::Lambda { body, .. } = tree.kind(lambda) else {
        return None;
    };

    let this_qualifier = this_qualifier(file, lambda, *body)?;
    if calls_inherited_member(file, target, *body) {
        return None;
    }

    let target = target.clone();
    ctx.add(
        AssistId::ConvertLambdaToAnonymous,
        "Convert to anonymous class creation",
        relevance::CONVERT_TO_ANONYMOUS,
        |builder| build_creation(builder, file, lambda, &target, functional, this_qualifier.as_deref()),
    );
    Some(())
}

/// Name that qualifies `this` inside the new class body. `Some(None)` when
/// the body has no `this` to rewrite, `None` when it cannot be qualified.
fn this_qualifier(file: &ResolvedFile, lambda: NodeId, body: NodeId) -> Option<Option<String>> {
    if own_this_references(file, lambda, body).is_empty() {
        return Some(None);
    }
    let tree = &file.tree;
    let owner = enclosing_type_body(tree, lambda)?;
    let def = file.model.type_binding(owner)?;
    if file.model.type_symbol(def).is_anonymous() {
        return None;
    }
    Some(Some(file.model.source_name(def)))
}

/// Unqualified `this` in `body` that refers to the instance enclosing
/// `lambda`, skipping nested class bodies.
fn own_this_references(file: &ResolvedFile, lambda: NodeId, body: NodeId) -> Vec<NodeId> {
    let tree = &file.tree;
    tree.preorder(body)
        .into_iter()
        .filter(|node| matches!(tree.kind(*node), NodeKind::This { qualifier: None }))
        .filter(|node| {
            !tree
                .ancestors(*node)
                .take_while(|a| *a != lambda)
                .any(|a| {
                    matches!(
                        tree.kind(a),
                        NodeKind::AnonymousBody { .. } | NodeKind::TypeDecl { .. }
                    )
                })
        })
        .collect()
}

/// An unqualified call in `body` would bind to a member the anonymous class
/// inherits instead of the enclosing one.
fn calls_inherited_member(file: &ResolvedFile, target: &Ty, body: NodeId) -> bool {
    let tree = &file.tree;
    let model = &file.model;
    let Some(def) = target.class_def() else {
        return false;
    };
    let inherited: HashSet<&str> = model
        .hierarchy(def)
        .into_iter()
        .flat_map(|t| model.type_symbol(t).methods.iter())
        .map(|m| model.method(*m).name.as_str())
        .collect();
    tree.preorder(body).into_iter().any(|node| match tree.kind(node) {
        NodeKind::MethodCall {
            receiver: None,
            name,
            ..
        } => tree.ident(*name).is_some_and(|n| inherited.contains(n)),
        _ => false,
    })
}

fn build_creation(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    lambda: NodeId,
    target: &Ty,
    functional: vega_syntax::MethodId,
    this_qualifier: Option<&str>,
) -> Result<(), RewriteError> {
    let tree = &file.tree;
    let model = &file.model;
    let NodeKind::Lambda { params, body, .. } = tree.kind(lambda) else {
        return Err(RewriteError::UnknownNode(lambda));
    };
    let mut imports = ImportRewrite::new(file);

    let param_tys = model.parameter_types(target, functional);
    let return_ty = model.return_type(target, functional);

    let mut new_params = Vec::with_capacity(params.len());
    for (param, ty) in params.iter().zip(&param_tys) {
        let NodeKind::Parameter {
            modifiers,
            ty: declared,
            varargs,
            name,
        } = tree.kind(*param)
        else {
            continue;
        };
        let explicit = (*declared).filter(|t| tree.node_text(*t) != "var");
        let ty = match explicit {
            Some(declared) => builder.copy(declared),
            None => imports.required_type_node(builder, ty)?,
        };
        let name = builder.copy(*name);
        new_params.push(builder.new_node(NodeKind::Parameter {
            modifiers: modifiers.clone(),
            ty: Some(ty),
            varargs: *varargs,
            name,
        }));
    }

    let mut substitutions = HashMap::new();
    if let Some(qualifier) = this_qualifier {
        for this in own_this_references(file, lambda, *body) {
            let qualifier = builder.qualified_name(qualifier);
            substitutions.insert(this, builder.this(Some(qualifier)));
        }
    }
    let copied = builder.copy_with_substitutions(*body, &substitutions)?;
    let method_body = if matches!(tree.kind(*body), NodeKind::Block { .. }) {
        copied
    } else if return_ty.is_void() {
        let stmt = builder.expr_stmt(copied);
        builder.block(vec![stmt])
    } else {
        let stmt = builder.new_node(NodeKind::Return { expr: Some(copied) });
        builder.block(vec![stmt])
    };

    let symbol = model.method(functional);
    let return_type = imports.required_type_node(builder, &return_ty)?;
    let thrown = symbol
        .thrown
        .iter()
        .map(|ty| imports.required_type_node(builder, ty))
        .collect::<Result<Vec<_>, _>>()?;
    let name = builder.name(symbol.name.clone());
    let method = builder.new_node(NodeKind::MethodDecl {
        modifiers: Modifiers::new(ModifierFlags::PUBLIC).with_annotation("Override"),
        type_params: Vec::new(),
        return_type: Some(return_type),
        name,
        params: new_params,
        thrown,
        body: Some(method_body),
    });
    let anonymous = builder.new_node(NodeKind::AnonymousBody {
        members: vec![method],
    });
    let created: FragmentRef = imports.required_type_node(builder, target)?;
    let creation = builder.new_node(NodeKind::New {
        ty: created,
        args: Vec::new(),
        body: Some(anonymous),
    });
    builder.replace(lambda, creation)?;
    imports.apply(builder)
}

#[cfg(test)]
mod tests {
    use crate::tests::{check_assist, check_assist_not_applicable};

    use super::*;

    const LABEL: &str = "Convert to anonymous class creation";

    #[test]
    fn expression_lambda_becomes_anonymous_class() {
        check_assist(
            lambda_to_anonymous,
            LABEL,
            "class A { void work() { } void m() { Runnable r = () <|>-> work(); } }",
            "class A { void work() { } void m() { Runnable r = new Runnable() { @Override public void run() { work(); } }; } }",
        );
    }

    #[test]
    fn value_lambda_returns_and_gets_parameter_types() {
        check_assist(
            lambda_to_anonymous,
            LABEL,
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = <|>s -> s.length(); }",
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = new Function<String, Integer>() { @Override public Integer apply(String s) { return s.length(); } }; }",
        );
    }

    #[test]
    fn this_is_qualified_with_the_enclosing_class() {
        check_assist(
            lambda_to_anonymous,
            LABEL,
            "class A { void m() { Runnable r = () -> <|>System.out.println(this); } }",
            "class A { void m() { Runnable r = new Runnable() { @Override public void run() { System.out.println(A.this); } }; } }",
        );
    }

    #[test]
    fn block_body_and_declared_exceptions_are_kept() {
        check_assist(
            lambda_to_anonymous,
            LABEL,
            "import java.util.concurrent.Callable;\nclass A { Callable<String> c = () -> { <|>return \"x\"; }; }",
            "import java.util.concurrent.Callable;\nclass A { Callable<String> c = new Callable<String>() { @Override public String call() throws Exception { return \"x\"; } }; }",
        );
    }

    #[test]
    fn declines_calls_that_the_anonymous_class_would_capture() {
        check_assist_not_applicable(
            lambda_to_anonymous,
            "class A { void m() { Runnable r = () <|>-> toString(); } }",
        );
    }

    #[test]
    fn declines_outside_lambdas() {
        check_assist_not_applicable(lambda_to_anonymous, "class A { void m() { int <|>x = 1; } }");
    }
}
