use vega_syntax::{
    ModifierFlags, Modifiers, NodeId, NodeKind, PostfixOp, PrefixOp, Prop, ResolvedFile,
    SyntaxTree, Ty, TypeDeclKind,
};

use crate::assist_context::AssistContext;
use crate::command::{self, InitializeIn, RefactoringParams};
use crate::handlers::{enclosing_block_statement, enclosing_body_owner, enclosing_type_body, insert_field};
use crate::import_rewrite::ImportRewrite;
use crate::names::{constant_name, suggest_variable_name, taken_variable_names, unique_name};
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{FragmentRef, InsertPosition, RewriteBuilder, RewriteError};

const EXTRACT_CONSTANT: &str = "Extract to constant";
const EXTRACT_FIELD: &str = "Extract to field";
const EXTRACT_METHOD: &str = "Extract to method";
const EXTRACT_LOCAL_ALL: &str = "Extract to local variable (replace all occurrences)";
const EXTRACT_LOCAL: &str = "Extract to local variable";

/// Linked-mode group of the introduced name and its uses.
const NAME_GROUP: &str = "name";

/// An expression that can be pulled out into a variable, field or constant.
struct ExprSite {
    expr: NodeId,
    ty: Ty,
    /// Class body that receives an extracted field or constant.
    type_body: Option<NodeId>,
    /// Block and the statement in it before which a local is declared.
    anchor: Option<(NodeId, NodeId)>,
    is_static_context: bool,
    /// Reads a local variable or parameter.
    uses_locals: bool,
    /// Reads nothing tied to an instance or a frame.
    is_constant: bool,
}

// Assist: extract
//
// ```
// int x = /*]*/compute()/*[*/;
// ```
// ->
// ```
// int compute = compute();
// int x = compute;
// ```
pub(crate) fn extract(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let tree = ctx.tree();
    let problems = ctx.gate.problems_at_location;
    let commands = ctx.config.command_refactoring;
    let params = RefactoringParams::new(tree.text(), ctx.selection.range);

    let candidate = ctx
        .selection
        .single_covered()
        .filter(|node| is_extractable_expression(file, *node));
    let site = candidate.and_then(|expr| expr_site(file, expr));
    let statements = match candidate {
        Some(_) => false,
        None => is_statement_selection(tree, &ctx.selection.covered),
    };
    if candidate.is_none() && !statements {
        return None;
    }

    if let Some(site) = &site {
        if site.is_constant && is_class_body(tree, site.type_body) {
            let rel = pick(problems, relevance::EXTRACT_CONSTANT, relevance::EXTRACT_CONSTANT_ERROR);
            if commands {
                let command = command::refactoring_command(EXTRACT_CONSTANT, command::EXTRACT_CONSTANT, &params, None);
                ctx.add_command(AssistId::ExtractConstant, EXTRACT_CONSTANT, rel, command);
            } else {
                ctx.add(AssistId::ExtractConstant, EXTRACT_CONSTANT, rel, |builder| {
                    extract_constant(builder, file, site)
                });
            }
        }

        let rel = pick(problems, relevance::EXTRACT_FIELD, relevance::EXTRACT_FIELD_ERROR);
        if commands {
            let sites = field_init_sites(tree, site);
            if !sites.is_empty() {
                let extra = serde_json::to_value(&sites).ok();
                let command = extra.and_then(|extra| {
                    command::refactoring_command(EXTRACT_FIELD, command::EXTRACT_FIELD, &params, Some(extra))
                });
                ctx.add_command(AssistId::ExtractField, EXTRACT_FIELD, rel, command);
            }
        } else if !site.uses_locals && can_declare_field(tree, site.type_body) {
            ctx.add(AssistId::ExtractField, EXTRACT_FIELD, rel, |builder| {
                extract_field(builder, file, site)
            });
        }
    }

    // Extract method needs the refactoring dialog to pick a name and the
    // parameters, so it only exists as a command.
    if commands {
        let rel = pick(problems, relevance::EXTRACT_METHOD, relevance::EXTRACT_METHOD_ERROR);
        let command = command::refactoring_command(EXTRACT_METHOD, command::EXTRACT_METHOD, &params, None);
        ctx.add_command(AssistId::ExtractMethod, EXTRACT_METHOD, rel, command);
    }

    let Some(site) = &site else {
        return Some(());
    };
    if site.anchor.is_none() {
        return Some(());
    }
    let rel_all = pick(problems, relevance::EXTRACT_LOCAL_ALL, relevance::EXTRACT_LOCAL_ALL_ERROR);
    let rel_one = pick(problems, relevance::EXTRACT_LOCAL, relevance::EXTRACT_LOCAL_ERROR);
    if commands {
        let all = command::refactoring_command(
            EXTRACT_LOCAL_ALL,
            command::EXTRACT_VARIABLE_ALL_OCCURRENCE,
            &params,
            None,
        );
        ctx.add_command(AssistId::ExtractLocalAll, EXTRACT_LOCAL_ALL, rel_all, all);
        let one = command::refactoring_command(EXTRACT_LOCAL, command::EXTRACT_VARIABLE, &params, None);
        ctx.add_command(AssistId::ExtractLocal, EXTRACT_LOCAL, rel_one, one);
    } else {
        ctx.add(AssistId::ExtractLocalAll, EXTRACT_LOCAL_ALL, rel_all, |builder| {
            extract_local(builder, file, site, &occurrences(file, site))
        });
        ctx.add(AssistId::ExtractLocal, EXTRACT_LOCAL, rel_one, |builder| {
            extract_local(builder, file, site, &[site.expr])
        });
    }
    Some(())
}

fn pick(problems: bool, clean: i32, with_problems: i32) -> i32 {
    if problems {
        with_problems
    } else {
        clean
    }
}

/// A value-producing expression inside a body that is not a name being
/// declared, written or used as a qualifier.
fn is_extractable_expression(file: &ResolvedFile, node: NodeId) -> bool {
    let tree = &file.tree;
    let kind = tree.kind(node);
    if !kind.is_expression()
        || matches!(
            kind,
            NodeKind::VarDeclExpr { .. }
                | NodeKind::ArrayInit { .. }
                | NodeKind::Lambda { .. }
                | NodeKind::ExprMethodRef { .. }
                | NodeKind::TypeMethodRef { .. }
                | NodeKind::SuperMethodRef { .. }
                | NodeKind::CreationRef { .. }
        )
    {
        return false;
    }
    if tree.has_role(node, Prop::Name) || is_written(tree, node) {
        return false;
    }
    if let Some(parent) = tree.parent(node) {
        if matches!(tree.kind(parent), NodeKind::QualifiedName { .. }) {
            return false;
        }
    }
    if kind.is_name() && file.model.var_binding(node).is_none() {
        return false;
    }
    enclosing_body_owner(tree, node).is_some()
}

fn is_written(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::Assign { lhs, .. } => *lhs == node,
        NodeKind::Prefix { op, .. } => matches!(op, PrefixOp::Inc | PrefixOp::Dec),
        NodeKind::Postfix { op, .. } => matches!(op, PostfixOp::Inc | PostfixOp::Dec),
        _ => false,
    }
}

/// Two or more statements, or one, that share a block.
fn is_statement_selection(tree: &SyntaxTree, covered: &[NodeId]) -> bool {
    let Some(first) = covered.first() else {
        return false;
    };
    let parent = tree.parent(*first);
    parent.is_some_and(|p| matches!(tree.kind(p), NodeKind::Block { .. }))
        && covered
            .iter()
            .all(|s| tree.kind(*s).is_statement() && tree.parent(*s) == parent)
        && enclosing_body_owner(tree, *first).is_some()
}

fn expr_site(file: &ResolvedFile, expr: NodeId) -> Option<ExprSite> {
    let tree = &file.tree;
    let model = &file.model;
    let ty = model.expr_type(expr)?;
    if ty.is_void() || matches!(ty, Ty::Null) || ty.contains_unknown() {
        return None;
    }

    let mut uses_locals = false;
    let mut is_constant = true;
    for node in tree.preorder(expr) {
        match tree.kind(node) {
            NodeKind::This { .. } | NodeKind::SuperMethodCall { .. } => is_constant = false,
            NodeKind::SimpleName { .. } => {
                if let Some(var) = model.var_binding(node) {
                    let var = model.var(var);
                    if !var.is_field() {
                        uses_locals = true;
                    }
                    if !var.is_static() {
                        is_constant = false;
                    }
                }
            }
            NodeKind::MethodCall { .. } => {
                let is_static = model
                    .method_binding(node)
                    .is_some_and(|m| model.method(m).is_static());
                if !is_static {
                    is_constant = false;
                }
            }
            _ => {}
        }
    }

    Some(ExprSite {
        expr,
        ty: ty.clone(),
        type_body: enclosing_type_body(tree, expr),
        anchor: local_anchor(tree, expr),
        is_static_context: is_static_context(tree, expr),
        uses_locals,
        is_constant,
    })
}

/// Where a local holding `expr` can be declared: before the statement that
/// evaluates `expr` exactly once per execution of the block.
fn local_anchor(tree: &SyntaxTree, expr: NodeId) -> Option<(NodeId, NodeId)> {
    let statement = enclosing_block_statement(tree, expr)?;
    let crosses_scope = tree
        .ancestors(expr)
        .take_while(|n| *n != statement)
        .any(|n| {
            let kind = tree.kind(n);
            kind.is_statement()
                || matches!(kind, NodeKind::Lambda { .. } | NodeKind::AnonymousBody { .. })
        });
    if crosses_scope || matches!(tree.kind(statement), NodeKind::While { .. } | NodeKind::For { .. }) {
        return None;
    }
    Some((tree.parent(statement)?, statement))
}

fn is_static_context(tree: &SyntaxTree, node: NodeId) -> bool {
    let owner = tree.ancestors(node).find(|n| {
        matches!(
            tree.kind(*n),
            NodeKind::MethodDecl { .. } | NodeKind::Initializer { .. }
        )
    });
    match owner.map(|o| tree.kind(o)) {
        Some(NodeKind::MethodDecl { modifiers, .. }) => modifiers.is_static(),
        Some(NodeKind::Initializer { is_static, .. }) => *is_static,
        _ => false,
    }
}

fn is_class_body(tree: &SyntaxTree, body: Option<NodeId>) -> bool {
    body.is_some_and(|b| {
        matches!(
            tree.kind(b),
            NodeKind::TypeDecl {
                kind: TypeDeclKind::Class,
                ..
            }
        )
    })
}

fn can_declare_field(tree: &SyntaxTree, body: Option<NodeId>) -> bool {
    is_class_body(tree, body)
        || body.is_some_and(|b| matches!(tree.kind(b), NodeKind::AnonymousBody { .. }))
}

/// Initialization sites the extract field dialog may offer.
fn field_init_sites(tree: &SyntaxTree, site: &ExprSite) -> Vec<InitializeIn> {
    if !can_declare_field(tree, site.type_body) {
        return Vec::new();
    }
    let mut sites = Vec::new();
    if !site.uses_locals {
        sites.push(InitializeIn::FieldDeclaration);
    }
    if site.anchor.is_some() {
        sites.push(InitializeIn::CurrentMethod);
    }
    if !site.uses_locals && !site.is_static_context && is_class_body(tree, site.type_body) {
        sites.push(InitializeIn::ClassConstructors);
    }
    sites
}

/// Expressions in the anchor block that print like the selected one and
/// have its type, in document order.
fn occurrences(file: &ResolvedFile, site: &ExprSite) -> Vec<NodeId> {
    let tree = &file.tree;
    let model = &file.model;
    let Some((block, _)) = site.anchor else {
        return vec![site.expr];
    };
    let kind_name = tree.kind(site.expr).kind_name();
    let printed = file.print(site.expr);
    tree.preorder(block)
        .into_iter()
        .filter(|n| *n == site.expr || tree.kind(*n).kind_name() == kind_name)
        .filter(|n| {
            *n == site.expr
                || (!is_written(tree, *n)
                    && !tree.has_role(*n, Prop::Name)
                    && !inside_nested_body(tree, *n, block)
                    && model.expr_type(*n) == Some(&site.ty)
                    && file.print(*n) == printed)
        })
        .collect()
}

fn inside_nested_body(tree: &SyntaxTree, node: NodeId, block: NodeId) -> bool {
    tree.ancestors(node)
        .take_while(|n| *n != block)
        .any(|n| matches!(tree.kind(n), NodeKind::Lambda { .. } | NodeKind::AnonymousBody { .. }))
}

fn extract_local(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &ExprSite,
    occurrences: &[NodeId],
) -> Result<(), RewriteError> {
    let tree = &file.tree;
    let Some((block, statement)) = site.anchor else {
        return Err(RewriteError::UnknownNode(site.expr));
    };
    // Declare before the first statement of the block that uses the value.
    let first = occurrences
        .iter()
        .filter_map(|occ| tree.ancestors_with_self(*occ).find(|n| tree.parent(*n) == Some(block)))
        .min_by_key(|stmt| tree.range(*stmt).start())
        .unwrap_or(statement);

    let taken = taken_variable_names(file, site.expr);
    let name = unique_name(&suggest_variable_name(file, site.expr), &taken);

    let mut imports = ImportRewrite::new(file);
    let ty = imports.required_type_node(builder, &site.ty)?;
    let decl_name = builder.name(name.clone());
    builder.link(NAME_GROUP, decl_name, true);
    let initializer = builder.copy(site.expr);
    let decl = builder.local_var(Modifiers::default(), ty, decl_name, Some(initializer));
    builder.insert(block, Prop::Statements, InsertPosition::Before(first), decl)?;

    replace_occurrences(builder, occurrences, &name)?;
    imports.apply(builder)
}

fn extract_constant(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &ExprSite,
) -> Result<(), RewriteError> {
    let flags = ModifierFlags::PRIVATE | ModifierFlags::STATIC | ModifierFlags::FINAL;
    let taken = taken_variable_names(file, site.expr);
    let name = unique_name(&constant_name(&suggest_variable_name(file, site.expr)), &taken);
    extract_to_member(builder, file, site, flags, &name)
}

fn extract_field(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &ExprSite,
) -> Result<(), RewriteError> {
    let mut flags = ModifierFlags::PRIVATE;
    if site.is_static_context {
        flags.insert(ModifierFlags::STATIC);
    }
    let taken = taken_variable_names(file, site.expr);
    let name = unique_name(&suggest_variable_name(file, site.expr), &taken);
    extract_to_member(builder, file, site, flags, &name)
}

/// Declares `flags ty name = expr;` in the enclosing class and reads it at
/// the selection.
fn extract_to_member(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &ExprSite,
    flags: ModifierFlags,
    name: &str,
) -> Result<(), RewriteError> {
    let Some(type_body) = site.type_body else {
        return Err(RewriteError::UnknownNode(site.expr));
    };
    let mut imports = ImportRewrite::new(file);
    let ty = imports.required_type_node(builder, &site.ty)?;
    let decl_name = builder.name(name);
    builder.link(NAME_GROUP, decl_name, true);
    let initializer = builder.copy(site.expr);
    let fragment = builder.new_node(NodeKind::VarFragment {
        name: decl_name,
        initializer: Some(initializer),
    });
    let decl: FragmentRef = builder.new_node(NodeKind::FieldDecl {
        modifiers: Modifiers::new(flags),
        ty,
        fragments: vec![fragment],
    });
    insert_field(builder, &file.tree, type_body, decl)?;
    replace_occurrences(builder, &[site.expr], name)?;
    imports.apply(builder)
}

fn replace_occurrences(
    builder: &mut RewriteBuilder<'_>,
    occurrences: &[NodeId],
    name: &str,
) -> Result<(), RewriteError> {
    for occurrence in occurrences {
        let use_site = builder.name(name);
        builder.link(NAME_GROUP, use_site, false);
        builder.replace(*occurrence, use_site)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vega_test_utils::Fixture;

    use crate::config::AssistConfig;
    use crate::proposal::ProposalAction;
    use crate::tests::{check_assist, check_assist_not_applicable, check_labels, edit_for, run_with};

    use super::*;

    fn commands() -> AssistConfig {
        AssistConfig {
            command_refactoring: true,
            ..AssistConfig::default()
        }
    }

    #[test]
    fn literal_offers_every_inline_extraction() {
        check_labels(
            extract,
            "class A { void m() { int x = /*]*/0/*[*/; } }",
            &[EXTRACT_CONSTANT, EXTRACT_FIELD, EXTRACT_LOCAL_ALL, EXTRACT_LOCAL],
        );
    }

    #[test]
    fn extract_local_declares_before_the_statement() {
        check_assist(
            extract,
            EXTRACT_LOCAL,
            "class A { int compute() { return 1; } void m() { int x = /*[*/compute()/*]*/ + 1; } }",
            "class A { int compute() { return 1; } void m() { int compute = compute(); int x = compute + 1; } }",
        );
    }

    #[test]
    fn extract_local_picks_a_free_name() {
        check_assist(
            extract,
            EXTRACT_LOCAL,
            "class A { void m(String s) { int length = 0; int x = /*[*/s.length()/*]*/; } }",
            "class A { void m(String s) { int length = 0; int length1 = s.length(); int x = length1; } }",
        );
    }

    #[test]
    fn all_occurrences_share_one_declaration() {
        check_assist(
            extract,
            EXTRACT_LOCAL_ALL,
            "class A { void m(String s) { int a = 1; int x = /*[*/s.length()/*]*/; int y = s.length() * 2; } }",
            "class A { void m(String s) { int a = 1; int length = s.length(); int x = length; int y = length * 2; } }",
        );
        check_assist(
            extract,
            EXTRACT_LOCAL,
            "class A { void m(String s) { int x = s.length(); int y = /*[*/s.length()/*]*/ * 2; } }",
            "class A { void m(String s) { int x = s.length(); int length = s.length(); int y = length * 2; } }",
        );
    }

    #[test]
    fn introduced_names_are_linked() {
        let edit = edit_for(
            extract,
            EXTRACT_LOCAL_ALL,
            "class A { void m(String s) { int x = /*[*/s.length()/*]*/; int y = s.length(); } }",
        );
        let firsts: Vec<bool> = edit
            .linked_positions()
            .group(NAME_GROUP)
            .map(|p| p.is_first)
            .collect();
        assert_eq!(firsts, vec![true, false, false]);
    }

    #[test]
    fn constant_and_field_go_after_existing_fields() {
        check_assist(
            extract,
            EXTRACT_CONSTANT,
            "class A { int n; void m() { String s = /*[*/\"hello\"/*]*/; } }",
            "class A { int n; private static final String STRING = \"hello\"; void m() { String s = STRING; } }",
        );
        check_assist(
            extract,
            EXTRACT_FIELD,
            "class A { static void m() { int x = /*[*/40 + 2/*]*/; } }",
            "class A { private static int i = 40 + 2; static void m() { int x = i; } }",
        );
    }

    #[test]
    fn frame_and_instance_reads_limit_the_choices() {
        check_labels(
            extract,
            "class A { void m(int p) { int x = /*[*/p + 1/*]*/; } }",
            &[EXTRACT_LOCAL_ALL, EXTRACT_LOCAL],
        );
        check_labels(
            extract,
            "class A { int n; void m() { int x = /*[*/n + 1/*]*/; } }",
            &[EXTRACT_FIELD, EXTRACT_LOCAL_ALL, EXTRACT_LOCAL],
        );
    }

    #[test]
    fn loop_conditions_only_extract_to_members() {
        check_labels(
            extract,
            "class A { int n; void m() { while (/*[*/n > 0/*]*/) { n--; } } }",
            &[EXTRACT_FIELD],
        );
    }

    #[test]
    fn commands_carry_discriminator_and_params() {
        let fixture = Fixture::parse("class A { void m() { int x = /*]*/0/*[*/; } }");
        let proposals = run_with(extract, &fixture, &commands());
        let labels: Vec<&str> = proposals.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![EXTRACT_CONSTANT, EXTRACT_FIELD, EXTRACT_METHOD, EXTRACT_LOCAL_ALL, EXTRACT_LOCAL]
        );
        let discriminators: Vec<serde_json::Value> = proposals
            .iter()
            .map(|p| p.command().and_then(|c| c.arguments.clone()).unwrap()[0].clone())
            .collect();
        assert_eq!(
            discriminators,
            vec![
                serde_json::json!("extractConstant"),
                serde_json::json!("extractField"),
                serde_json::json!("extractMethod"),
                serde_json::json!("extractVariableAllOccurrence"),
                serde_json::json!("extractVariable"),
            ]
        );
        let field_args = proposals[1].command().and_then(|c| c.arguments.clone()).unwrap();
        assert_eq!(
            field_args[2],
            serde_json::json!(["field declaration", "current method", "class constructors"])
        );
    }

    #[test]
    fn statements_only_offer_extract_method() {
        let fixture = Fixture::parse(
            "class A { void m() { /*[*/int a = 1;\n int b = a;/*]*/ int c = 2; } }",
        );
        let proposals = run_with(extract, &fixture, &commands());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].label, EXTRACT_METHOD);
        assert!(matches!(proposals[0].action, ProposalAction::Command(_)));
        assert!(run_with(extract, &fixture, &AssistConfig::default()).is_empty());
    }

    #[test]
    fn declines_written_names_and_void_calls() {
        check_assist_not_applicable(extract, "class A { void m() { int x; /*[*/x/*]*/ = 1; } }");
        check_assist_not_applicable(
            extract,
            "class A { void work() { } void m() { /*[*/work()/*]*/; } }",
        );
        check_assist_not_applicable(extract, "class A { int f = /*[*/1/*]*/; }");
    }
}
