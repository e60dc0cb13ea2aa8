use vega_syntax::{Binding, NodeId, NodeKind, ResolvedFile, Ty, VarId};

use crate::assist_context::AssistContext;
use crate::import_rewrite::ImportRewrite;
use crate::proposal::AssistId;
use crate::relevance;

/// A local variable referenced at the cursor, with the pieces of its
/// declaration the conversions need.
struct LocalDecl {
    var: VarId,
    /// Declared type node (`var` or explicit).
    ty: NodeId,
    /// Initializer, or the iterable of a for-each loop.
    source: Option<NodeId>,
    for_each: bool,
    /// Number of names sharing the type node.
    fragment_count: usize,
}

// Assist: convert_var_to_resolved_type
//
// ```
// var <|>names = new ArrayList<String>();
// ```
// ->
// ```
// ArrayList<String> names = new ArrayList<String>();
// ```
pub(crate) fn var_to_resolved_type(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    if !file.language_level.supports_var_local_inference() {
        return None;
    }
    let decl = local_at(file, ctx.covering())?;
    if !is_var_type(file, decl.ty) {
        return None;
    }
    let var = file.model.var(decl.var);
    let ty = var.ty.clone();
    let anonymous = ty
        .class_def()
        .is_some_and(|def| file.model.type_symbol(def).is_anonymous());
    if anonymous || ty.is_intersection() || ty.is_wildcard() || ty.contains_unknown() {
        return None;
    }
    if matches!(ty, Ty::Null) {
        return None;
    }

    let label = format!(
        "Change type of '{}' to '{}'",
        var.name,
        file.model.display(&ty)
    );
    ctx.add(
        AssistId::ConvertVarToResolvedType,
        label,
        relevance::CHANGE_VARIABLE,
        |builder| {
            let mut imports = ImportRewrite::new(file);
            let new_ty = imports.required_type_node(builder, &ty)?;
            builder.replace(decl.ty, new_ty)?;
            imports.apply(builder)
        },
    );
    Some(())
}

// Assist: convert_resolved_type_to_var
//
// ```
// String <|>s = "a";
// ```
// ->
// ```
// var s = "a";
// ```
pub(crate) fn resolved_type_to_var(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let tree = &file.tree;
    let model = &file.model;
    if !file.language_level.supports_var_local_inference() {
        return None;
    }
    let decl = local_at(file, ctx.covering())?;
    if is_var_type(file, decl.ty) || decl.fragment_count > 1 {
        return None;
    }
    let source = decl.source?;
    if matches!(
        tree.kind(source),
        NodeKind::ArrayInit { .. } | NodeKind::Lambda { .. }
    ) || tree.kind(source).is_method_ref()
    {
        return None;
    }
    let source_ty = model.expr_type(source)?;
    let inferred = if decl.for_each {
        model.iteration_element_type(source_ty)?
    } else {
        source_ty.clone()
    };
    let var = model.var(decl.var);
    if var.ty.contains_unknown() || inferred != var.ty {
        return None;
    }

    ctx.add(
        AssistId::ConvertResolvedTypeToVar,
        format!("Change type of '{}' to 'var'", var.name),
        relevance::CHANGE_VARIABLE,
        |builder| {
            let var_type = builder.simple_type("var");
            builder.replace(decl.ty, var_type)
        },
    );
    Some(())
}

fn local_at(file: &ResolvedFile, covering: NodeId) -> Option<LocalDecl> {
    let tree = &file.tree;
    let model = &file.model;
    if !matches!(tree.kind(covering), NodeKind::SimpleName { .. }) {
        return None;
    }
    let var = model.var_binding(covering)?;
    let symbol = model.var(var);
    if symbol.is_field() || symbol.is_parameter() {
        return None;
    }
    let Some(decl) = model.declaring_node(&Binding::Var(var)) else {
        tracing::warn!(
            target: "vega.assists",
            name = %symbol.name,
            "local variable without a declaring node"
        );
        return None;
    };
    match tree.kind(decl) {
        NodeKind::VarFragment { initializer, .. } => {
            let parent = tree.parent(decl)?;
            let (ty, fragments) = match tree.kind(parent) {
                NodeKind::LocalVarDecl { ty, fragments, .. }
                | NodeKind::VarDeclExpr { ty, fragments, .. } => (*ty, fragments.len()),
                _ => return None,
            };
            Some(LocalDecl {
                var,
                ty,
                source: *initializer,
                for_each: false,
                fragment_count: fragments,
            })
        }
        NodeKind::Parameter { ty: Some(ty), .. } => {
            let iterable = match tree.parent(decl).map(|p| tree.kind(p)) {
                Some(NodeKind::ForEach { param, iterable, .. }) if *param == decl => {
                    Some(*iterable)
                }
                _ => None,
            };
            Some(LocalDecl {
                var,
                ty: *ty,
                source: iterable,
                for_each: iterable.is_some(),
                fragment_count: 1,
            })
        }
        _ => None,
    }
}

/// The contextual keyword `var`, not a type that happens to be named so.
fn is_var_type(file: &ResolvedFile, ty: NodeId) -> bool {
    let tree = &file.tree;
    let NodeKind::SimpleType { name } = tree.kind(ty) else {
        return false;
    };
    tree.ident(*name) == Some("var")
        && !matches!(file.model.binding(*name), Some(Binding::Type(_)))
        && !matches!(file.model.binding(ty), Some(Binding::Type(_)))
}

#[cfg(test)]
mod tests {
    use vega_syntax::JavaLanguageLevel;
    use vega_test_utils::Fixture;

    use crate::config::AssistConfig;
    use crate::tests::{check_assist, check_assist_not_applicable, run_with};

    use super::*;

    #[test]
    fn var_becomes_the_inferred_type() {
        check_assist(
            var_to_resolved_type,
            "Change type of 'names' to 'ArrayList<String>'",
            "import java.util.ArrayList;\nclass A { void m() { var <|>names = new ArrayList<String>(); } }",
            "import java.util.ArrayList;\nclass A { void m() { ArrayList<String> names = new ArrayList<String>(); } }",
        );
    }

    #[test]
    fn var_conversion_imports_the_type() {
        check_assist(
            var_to_resolved_type,
            "Change type of 'r' to 'Random'",
            "class A { void m() { var <|>r = new java.util.Random(); } }",
            "import java.util.Random;\nclass A { void m() { Random r = new java.util.Random(); } }",
        );
    }

    #[test]
    fn works_from_a_later_reference() {
        check_assist(
            var_to_resolved_type,
            "Change type of 'n' to 'int'",
            "class A { int m() { var n = 1; return <|>n; } }",
            "class A { int m() { int n = 1; return n; } }",
        );
    }

    #[test]
    fn unresolved_types_are_declined() {
        check_assist_not_applicable(
            var_to_resolved_type,
            "class A { void m() { var <|>x = missing(); } }",
        );
    }

    #[test]
    fn explicit_type_becomes_var() {
        check_assist(
            resolved_type_to_var,
            "Change type of 's' to 'var'",
            "class A { void m() { String <|>s = \"a\"; } }",
            "class A { void m() { var s = \"a\"; } }",
        );
    }

    #[test]
    fn for_each_variable_becomes_var() {
        check_assist(
            resolved_type_to_var,
            "Change type of 'item' to 'var'",
            "import java.util.List;\nclass A { void m(List<String> items) { for (String <|>item : items) { } } }",
            "import java.util.List;\nclass A { void m(List<String> items) { for (var item : items) { } } }",
        );
    }

    #[test]
    fn declared_type_must_equal_the_initializer_type() {
        check_assist_not_applicable(
            resolved_type_to_var,
            "import java.util.*;\nclass A { void m() { List<String> <|>l = new ArrayList<String>(); } }",
        );
        check_assist_not_applicable(
            resolved_type_to_var,
            "class A { void m() { long <|>n = 1; } }",
        );
    }

    #[test]
    fn non_inferable_initializers_and_multiple_names_are_rejected() {
        check_assist_not_applicable(
            resolved_type_to_var,
            "class A { void m() { int[] <|>a = { 1, 2 }; } }",
        );
        check_assist_not_applicable(
            resolved_type_to_var,
            "class A { void m() { Runnable <|>r = () -> { }; } }",
        );
        check_assist_not_applicable(
            resolved_type_to_var,
            "class A { void m() { int <|>a = 1, b = 2; } }",
        );
    }

    #[test]
    fn fields_and_parameters_are_not_locals() {
        check_assist_not_applicable(resolved_type_to_var, "class A { String <|>s = \"a\"; }");
        check_assist_not_applicable(resolved_type_to_var, "class A { void m(String <|>s) { } }");
    }

    #[test]
    fn requires_local_type_inference() {
        let fixture = Fixture::with_level(
            "class A { void m() { String <|>s = \"a\"; } }",
            JavaLanguageLevel::JAVA_8,
        );
        assert!(run_with(resolved_type_to_var, &fixture, &AssistConfig::default()).is_empty());
    }
}
