use std::collections::{HashMap, HashSet};

use vega_syntax::scope::declarations_in_scope;
use vega_syntax::{Modifiers, NodeId, NodeKind, ResolvedFile, ScopeFlags, TypeId, VarId};

use crate::assist_context::AssistContext;
use crate::names::unique_name;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{FragmentRef, RewriteBuilder, RewriteError};

/// `new I() { ... }` with the single method that implements `I`.
struct AnonymousCreation {
    creation: NodeId,
    method: NodeId,
    params: Vec<NodeId>,
    body: NodeId,
}

// Assist: convert_anonymous_to_lambda
//
// ```
// Runnable r = new <|>Runnable() { public void run() { work(); } };
// ```
// ->
// ```
// Runnable r = () -> work();
// ```
pub(crate) fn anonymous_to_lambda(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    if !file.language_level.supports_lambdas() {
        return None;
    }
    let site = find_creation(ctx)?;
    if captures_anonymous_instance(file, &site)? {
        return None;
    }
    let renames = renamed_declarations(file, &site);

    let site = &site;
    ctx.add(
        AssistId::ConvertAnonymousToLambda,
        "Convert to lambda expression",
        relevance::CONVERT_TO_LAMBDA,
        |builder| build_lambda(builder, file, site, &renames),
    );
    Some(())
}

fn find_creation(ctx: &AssistContext<'_>) -> Option<AnonymousCreation> {
    let tree = ctx.tree();
    let model = ctx.model();

    let mut node = ctx.covering();
    loop {
        let kind = tree.kind(node);
        let climb = kind.is_name()
            || kind.is_type()
            || matches!(kind, NodeKind::Dimension)
            || tree
                .parent(node)
                .is_some_and(|p| matches!(tree.kind(p), NodeKind::MethodDecl { .. }))
            || (matches!(kind, NodeKind::MethodDecl { .. }) && tree.has_role(node, vega_syntax::Prop::Members));
        match tree.parent(node) {
            Some(parent) if climb => node = parent,
            _ => break,
        }
    }
    if matches!(tree.kind(node), NodeKind::AnonymousBody { .. }) {
        node = tree.parent(node)?;
    }
    let NodeKind::New {
        args,
        body: Some(body),
        ..
    } = tree.kind(node)
    else {
        return None;
    };
    if !args.is_empty() {
        return None;
    }
    // A lambda cannot be the receiver of a call or field access.
    if tree.has_role(node, vega_syntax::Prop::Receiver)
        || matches!(
            tree.parent(node).map(|p| tree.kind(p)),
            Some(NodeKind::FieldAccess { .. })
        )
    {
        return None;
    }

    let created = model.expr_type(node)?;
    let functional = model.functional_method(created)?;
    // The lambda needs a target of the interface type itself, not a supertype
    // such as `Object`.
    let target = model.target_type(node)?;
    if target.class_def() != created.class_def() {
        return None;
    }

    let NodeKind::AnonymousBody { members } = tree.kind(*body) else {
        return None;
    };
    let [member] = members.as_slice() else {
        return None;
    };
    let NodeKind::MethodDecl {
        type_params,
        params,
        body: Some(method_body),
        name,
        ..
    } = tree.kind(*member)
    else {
        return None;
    };
    let functional = model.method(functional);
    if !type_params.is_empty()
        || tree.ident(*name) != Some(functional.name.as_str())
        || params.len() != functional.params.len()
    {
        return None;
    }
    Some(AnonymousCreation {
        creation: node,
        method: *member,
        params: params.clone(),
        body: *method_body,
    })
}

/// `Some(true)` if the body relies on being inside the anonymous instance:
/// an unqualified `this` or `super`, or an unqualified use of a member the
/// anonymous class declares or inherits.
fn captures_anonymous_instance(file: &ResolvedFile, site: &AnonymousCreation) -> Option<bool> {
    let tree = &file.tree;
    let model = &file.model;
    let NodeKind::New { body: Some(body), .. } = tree.kind(site.creation) else {
        return None;
    };
    let Some(anonymous) = model.type_binding(*body) else {
        tracing::warn!(target: "vega.assists", "anonymous class body without a type binding");
        return None;
    };
    let inherited: HashSet<TypeId> = model.hierarchy(anonymous).into_iter().collect();

    for node in tree.preorder(site.body) {
        let captured = match tree.kind(node) {
            NodeKind::This { qualifier: None } => true,
            NodeKind::SuperMethodCall {
                qualifier: None, ..
            } => true,
            NodeKind::MethodCall { receiver: None, .. } => model
                .method_binding(node)
                .is_some_and(|m| inherited.contains(&model.method(m).declaring)),
            NodeKind::SimpleName { .. } => {
                let qualified = matches!(
                    tree.parent(node).map(|p| tree.kind(p)),
                    Some(NodeKind::FieldAccess { name, .. } | NodeKind::QualifiedName { name, .. }) if *name == node
                );
                !qualified
                    && model.var_binding(node).is_some_and(|var| {
                        let var = model.var(var);
                        var.is_field()
                            && var
                                .declaring_type
                                .is_some_and(|owner| inherited.contains(&owner))
                    })
            }
            _ => false,
        };
        if captured {
            return Some(true);
        }
    }
    Some(false)
}

/// Parameters and locals of the method whose names clash with locals that
/// are visible where the lambda will be, mapped to fresh names.
fn renamed_declarations(file: &ResolvedFile, site: &AnonymousCreation) -> HashMap<VarId, String> {
    let tree = &file.tree;
    let model = &file.model;
    let offset = tree.range(site.creation).start();
    let enclosing: HashSet<String> = declarations_in_scope(file, offset, ScopeFlags::VARIABLES)
        .iter()
        .filter_map(|binding| binding.as_var())
        .filter(|var| !model.var(*var).is_field())
        .map(|var| model.var(var).name.clone())
        .collect();

    let declared: Vec<VarId> = tree
        .preorder(site.method)
        .into_iter()
        .filter(|node| {
            matches!(
                tree.kind(*node),
                NodeKind::Parameter { .. } | NodeKind::VarFragment { .. }
            )
        })
        .filter_map(|node| model.var_binding(node))
        .collect();
    let mut taken: HashSet<String> = enclosing.clone();
    taken.extend(declared.iter().map(|var| model.var(*var).name.clone()));

    let mut renames = HashMap::new();
    for var in declared {
        let name = &model.var(var).name;
        if enclosing.contains(name) {
            let fresh = unique_name(name, &taken);
            taken.insert(fresh.clone());
            renames.insert(var, fresh);
        }
    }
    renames
}

fn build_lambda(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &AnonymousCreation,
    renames: &HashMap<VarId, String>,
) -> Result<(), RewriteError> {
    let tree = &file.tree;
    let model = &file.model;

    let mut substitutions = HashMap::new();
    for node in tree.preorder(site.body) {
        if !matches!(tree.kind(node), NodeKind::SimpleName { .. }) {
            continue;
        }
        if let Some(fresh) = model.var_binding(node).and_then(|var| renames.get(&var)) {
            substitutions.insert(node, builder.name(fresh.clone()));
        }
    }

    let mut params = Vec::with_capacity(site.params.len());
    for param in &site.params {
        let NodeKind::Parameter { name, .. } = tree.kind(*param) else {
            continue;
        };
        let name = match model.var_binding(*param).and_then(|var| renames.get(&var)) {
            Some(fresh) => builder.name(fresh.clone()),
            None => builder.copy(*name),
        };
        params.push(builder.new_node(NodeKind::Parameter {
            modifiers: Modifiers::default(),
            ty: None,
            varargs: false,
            name,
        }));
    }

    let statements = tree
        .kind(site.body)
        .list(vega_syntax::Prop::Statements)
        .cloned()
        .unwrap_or_default();
    let body: FragmentRef = match statements.as_slice() {
        [single] => match tree.kind(*single) {
            NodeKind::Return { expr: Some(expr) } | NodeKind::ExprStmt { expr } => {
                builder.copy_with_substitutions(*expr, &substitutions)?
            }
            _ => builder.copy_with_substitutions(site.body, &substitutions)?,
        },
        _ => builder.copy_with_substitutions(site.body, &substitutions)?,
    };

    let parenthesized = params.len() != 1;
    let lambda = builder.new_node(NodeKind::Lambda {
        params,
        parenthesized,
        body,
    });
    builder.replace(site.creation, lambda)
}

#[cfg(test)]
mod tests {
    use vega_syntax::JavaLanguageLevel;
    use vega_test_utils::Fixture;

    use crate::config::AssistConfig;
    use crate::tests::{check_assist, check_assist_not_applicable, run_with};

    use super::*;

    const LABEL: &str = "Convert to lambda expression";

    #[test]
    fn single_expression_body_collapses() {
        check_assist(
            anonymous_to_lambda,
            LABEL,
            "class A { void work() { } void m() { Runnable r = new <|>Runnable() { public void run() { work(); } }; } }",
            "class A { void work() { } void m() { Runnable r = () -> work(); } }",
        );
    }

    #[test]
    fn return_statement_becomes_expression_and_single_param_drops_parens() {
        check_assist(
            anonymous_to_lambda,
            LABEL,
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = new Function<String, Integer>() { public Integer <|>apply(String s) { return s.length(); } }; }",
            "import java.util.function.Function;\nclass A { Function<String, Integer> f = s -> s.length(); }",
        );
    }

    #[test]
    fn multi_statement_body_stays_a_block() {
        check_assist(
            anonymous_to_lambda,
            LABEL,
            "import java.util.Comparator;\nclass A { Comparator<String> c = new <|>Comparator<String>() { public int compare(String a, String b) { int d = a.length(); return d - b.length(); } }; }",
            "import java.util.Comparator;\nclass A { Comparator<String> c = (a, b) -> { int d = a.length(); return d - b.length(); }; }",
        );
    }

    #[test]
    fn clashing_parameter_is_renamed() {
        check_assist(
            anonymous_to_lambda,
            LABEL,
            "import java.util.function.Function;\nclass A { void m(String s) { Function<String, String> f = new <|>Function<String, String>() { public String apply(String s) { return s.trim(); } }; } }",
            "import java.util.function.Function;\nclass A { void m(String s) { Function<String, String> f = s1 -> s1.trim(); } }",
        );
    }

    #[test]
    fn declines_when_the_body_uses_this() {
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { Runnable r = new <|>Runnable() { public void run() { System.out.println(this); } }; } }",
        );
    }

    #[test]
    fn declines_recursive_and_multi_member_bodies() {
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { Runnable r = new <|>Runnable() { public void run() { run(); } }; } }",
        );
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { Runnable r = new <|>Runnable() { int n; public void run() { n++; } }; } }",
        );
    }

    #[test]
    fn converts_a_method_argument() {
        check_assist(
            anonymous_to_lambda,
            LABEL,
            "class A { void m() { new Thread(new <|>Runnable() { public void run() { m(); } }); } }",
            "class A { void m() { new Thread(() -> m()); } }",
        );
    }

    #[test]
    fn declines_without_a_functional_target() {
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { Object o = new <|>Runnable() { public void run() { } }; } }",
        );
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { new <|>Runnable() { public void run() { } }; } }",
        );
    }

    #[test]
    fn declines_classes_and_old_language_levels() {
        check_assist_not_applicable(
            anonymous_to_lambda,
            "class A { void m() { Object o = new <|>Object() { public String toString() { return \"\"; } }; } }",
        );
        let fixture = Fixture::with_level(
            "class A { void m() { Runnable r = new <|>Runnable() { public void run() { } }; } }",
            JavaLanguageLevel::JAVA_7,
        );
        assert!(run_with(anonymous_to_lambda, &fixture, &AssistConfig::default()).is_empty());
    }
}
