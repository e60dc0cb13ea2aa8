use std::collections::HashSet;

use vega_syntax::scope::declared_local_names;
use vega_syntax::{
    AssignOp, ModifierFlags, Modifiers, NodeId, NodeKind, Prop, SyntaxTree, VarId,
};

use crate::assist_context::AssistContext;
use crate::handlers::insert_field;
use crate::names::unique_name;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{FragmentRef, InsertPosition, RewriteBuilder};

/// A method parameter together with what the rule needs to know about its
/// method and enclosing type.
#[derive(Clone, Copy)]
struct ParamSite {
    param: NodeId,
    /// Declared type node of the parameter.
    ty: NodeId,
    varargs: bool,
    var: VarId,
    method: NodeId,
    body: NodeId,
    /// `TypeDecl` or `AnonymousBody` holding the method.
    type_body: NodeId,
    is_static: bool,
}

// Assist: assign_param_to_field
//
// ```
// class A { A(int <|>count) { } }
// ```
// ->
// ```
// class A { private int count; A(int count) { this.count = count; } }
// ```
pub(crate) fn assign_param_to_field(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let tree = &file.tree;
    let model = &file.model;
    let site = param_site(ctx)?;
    let var = model.var(site.var);
    if var.ty.is_unknown() || is_assigned_to_field(ctx, &site, site.var) {
        return None;
    }
    // Names that would shadow a bare field reference in the body.
    let locals = &declared_local_names(file, site.method);
    let def = model.type_binding(site.type_body)?;
    let type_symbol = model.type_symbol(def);

    for field in &type_symbol.fields {
        let field_symbol = model.var(*field);
        if field_symbol.is_static() != site.is_static
            || !model.is_assignment_compatible(&var.ty, &field_symbol.ty)
        {
            continue;
        }
        let Some(fragment) = field_symbol.decl else {
            continue;
        };
        if !matches!(
            tree.kind(fragment),
            NodeKind::VarFragment {
                initializer: None,
                ..
            }
        ) {
            continue;
        }
        let field_name = field_symbol.name.clone();
        let param_name = var.name.clone();
        let site = &site;
        ctx.add(
            AssistId::AssignParamToField,
            format!("Assign parameter to field '{field_name}'"),
            relevance::ASSIGN_PARAM_TO_EXISTING_FIELD,
            |builder| {
                let stmt = assignment(builder, tree, site, &field_name, &param_name, locals);
                let position = insert_position(tree, model, site);
                builder.insert(site.body, Prop::Statements, position, stmt)
            },
        );
    }

    let param_name = var.name.clone();
    let field_names: HashSet<String> = type_symbol
        .fields
        .iter()
        .map(|f| model.var(*f).name.clone())
        .collect();
    let field_name = unique_name(&param_name, &field_names);
    let site = &site;
    ctx.add(
        AssistId::AssignParamToField,
        "Assign parameter to new field",
        relevance::ASSIGN_PARAM_TO_NEW_FIELD,
        |builder| {
            let (decl, decl_name) = field_declaration(builder, site, &field_name);
            insert_field(builder, tree, site.type_body, decl)?;
            builder.link("name", decl_name, true);
            let stmt = assignment(builder, tree, site, &field_name, &param_name, locals);
            let position = insert_position(tree, model, site);
            builder.insert(site.body, Prop::Statements, position, stmt)
        },
    );
    Some(())
}

// Assist: assign_all_params_to_fields
//
// ```
// class A { A(int <|>a, String b) { } }
// ```
// ->
// ```
// class A { private int a; private String b; A(int a, String b) { this.a = a; this.b = b; } }
// ```
pub(crate) fn assign_all_params_to_fields(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let tree = &file.tree;
    let model = &file.model;
    let site = param_site(ctx)?;
    let NodeKind::MethodDecl { params, .. } = tree.kind(site.method) else {
        return None;
    };
    if params.len() < 2 || is_assigned_to_field(ctx, &site, site.var) {
        return None;
    }
    let def = model.type_binding(site.type_body)?;
    let mut vars = Vec::with_capacity(params.len());
    for param in params {
        let var = model.var_binding(*param)?;
        if model.var(var).ty.is_unknown() {
            return None;
        }
        vars.push((*param, var));
    }
    let locals = &declared_local_names(file, site.method);

    let mut taken: HashSet<String> = model
        .type_symbol(def)
        .fields
        .iter()
        .map(|f| model.var(*f).name.clone())
        .collect();
    let mut planned = Vec::with_capacity(vars.len());
    for (param, var) in vars {
        let param_name = model.var(var).name.clone();
        let field_name = unique_name(&param_name, &taken);
        taken.insert(field_name.clone());
        planned.push((param, field_name, param_name));
    }

    let site = &site;
    ctx.add(
        AssistId::AssignAllParamsToFields,
        "Assign all parameters to new fields",
        relevance::ASSIGN_ALL_PARAMS_TO_NEW_FIELDS,
        |builder| {
            let mut statements = Vec::with_capacity(planned.len());
            for (param, field_name, param_name) in &planned {
                let NodeKind::Parameter {
                    ty: Some(ty),
                    varargs,
                    ..
                } = tree.kind(*param)
                else {
                    continue;
                };
                let param_site = ParamSite {
                    param: *param,
                    ty: *ty,
                    varargs: *varargs,
                    ..*site
                };
                let (decl, decl_name) = field_declaration(builder, &param_site, field_name);
                insert_field(builder, tree, site.type_body, decl)?;
                builder.link(field_name.clone(), decl_name, true);
                statements.push(assignment(
                    builder,
                    tree,
                    &param_site,
                    field_name,
                    param_name,
                    locals,
                ));
            }
            let position = insert_position(tree, model, site);
            for stmt in statements {
                builder.insert(site.body, Prop::Statements, position, stmt)?;
            }
            Ok(())
        },
    );
    Some(())
}

fn param_site(ctx: &AssistContext<'_>) -> Option<ParamSite> {
    let tree = ctx.tree();
    let model = ctx.model();
    let anchor = ctx.anchor();
    let param = match tree.kind(anchor) {
        NodeKind::Parameter { .. } => anchor,
        _ => {
            let parent = tree.parent(anchor)?;
            matches!(tree.kind(parent), NodeKind::Parameter { .. }).then_some(parent)?
        }
    };
    let NodeKind::Parameter {
        ty: Some(ty),
        varargs,
        ..
    } = tree.kind(param)
    else {
        return None;
    };
    if !tree.has_role(param, Prop::Params) {
        return None;
    }
    let method = tree.parent(param)?;
    let NodeKind::MethodDecl {
        modifiers,
        body: Some(body),
        ..
    } = tree.kind(method)
    else {
        return None;
    };
    let type_body = tree.parent(method)?;
    let def = model.type_binding(type_body)?;
    if model.type_symbol(def).is_interface() {
        return None;
    }
    let Some(var) = model.var_binding(param) else {
        tracing::warn!(target: "vega.assists", "parameter declaration without a binding");
        return None;
    };
    Some(ParamSite {
        param,
        ty: *ty,
        varargs: *varargs,
        var,
        method,
        body: *body,
        type_body,
        is_static: modifiers.is_static(),
    })
}

/// `var` is read on the right of an assignment whose target is a field.
fn is_assigned_to_field(ctx: &AssistContext<'_>, site: &ParamSite, var: VarId) -> bool {
    let tree = ctx.tree();
    let model = ctx.model();
    tree.preorder(site.body).into_iter().any(|node| {
        let NodeKind::Assign {
            op: AssignOp::Assign,
            lhs,
            rhs,
        } = tree.kind(node)
        else {
            return false;
        };
        let target = match tree.kind(*lhs) {
            NodeKind::FieldAccess { name, .. } | NodeKind::QualifiedName { name, .. } => *name,
            _ => *lhs,
        };
        model.var_binding(*rhs) == Some(var)
            && [*lhs, target].into_iter().any(|node| {
                model
                    .var_binding(node)
                    .is_some_and(|field| model.var(field).is_field())
            })
    })
}

/// `this.field = param;`, or `field = param;` when no local shadows the field.
fn assignment(
    builder: &mut RewriteBuilder<'_>,
    tree: &SyntaxTree,
    site: &ParamSite,
    field_name: &str,
    param_name: &str,
    locals: &HashSet<String>,
) -> FragmentRef {
    let target = if !locals.contains(field_name) {
        builder.name(field_name)
    } else if site.is_static {
        let owner = match tree.kind(site.type_body) {
            NodeKind::TypeDecl { name, .. } => tree.ident(*name).unwrap_or_default(),
            _ => "",
        };
        builder.qualified_name(&format!("{owner}.{field_name}"))
    } else {
        let receiver = builder.this(None);
        let name = builder.name(field_name);
        builder.new_node(NodeKind::FieldAccess { receiver, name })
    };
    let value = builder.name(param_name);
    let assign = builder.new_node(NodeKind::Assign {
        op: AssignOp::Assign,
        lhs: target,
        rhs: value,
    });
    builder.expr_stmt(assign)
}

/// `private [static] T name;` for the parameter's declared type. Returns the
/// declaration and its name fragment.
fn field_declaration(
    builder: &mut RewriteBuilder<'_>,
    site: &ParamSite,
    field_name: &str,
) -> (FragmentRef, FragmentRef) {
    let mut field_ty = builder.copy(site.ty);
    if site.varargs {
        let dim = builder.new_node(NodeKind::Dimension);
        field_ty = builder.new_node(NodeKind::ArrayType {
            element: field_ty,
            dims: vec![dim],
        });
    }
    let mut flags = ModifierFlags::PRIVATE;
    if site.is_static {
        flags.insert(ModifierFlags::STATIC);
    }
    let name = builder.name(field_name);
    let fragment = builder.new_node(NodeKind::VarFragment {
        name,
        initializer: None,
    });
    let decl = builder.new_node(NodeKind::FieldDecl {
        modifiers: Modifiers::new(flags),
        ty: field_ty,
        fragments: vec![fragment],
    });
    (decl, name)
}

/// After the leading assignments of earlier parameters, so repeated use
/// keeps parameter order.
fn insert_position(
    tree: &SyntaxTree,
    model: &vega_syntax::SemanticModel,
    site: &ParamSite,
) -> InsertPosition {
    let NodeKind::MethodDecl { params, .. } = tree.kind(site.method) else {
        return InsertPosition::First;
    };
    let index = params.iter().position(|p| *p == site.param).unwrap_or(0);
    let earlier: Vec<VarId> = params[..index]
        .iter()
        .filter_map(|p| model.var_binding(*p))
        .collect();
    let statements = tree
        .kind(site.body)
        .list(Prop::Statements)
        .cloned()
        .unwrap_or_default();
    let mut position = InsertPosition::First;
    for stmt in statements {
        let NodeKind::ExprStmt { expr } = tree.kind(stmt) else {
            break;
        };
        let NodeKind::Assign { rhs, .. } = tree.kind(*expr) else {
            break;
        };
        if !model.var_binding(*rhs).is_some_and(|v| earlier.contains(&v)) {
            break;
        }
        position = InsertPosition::After(stmt);
    }
    position
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::tests::{check_assist, check_assist_not_applicable, check_labels};

    use super::*;

    #[test]
    fn offers_existing_and_new_fields() {
        check_labels(
            assign_param_to_field,
            "class A { private long total; private String name; A(int <|>count) { } }",
            &["Assign parameter to field 'total'", "Assign parameter to new field"],
        );
    }

    #[test]
    fn new_field_in_constructor() {
        check_assist(
            assign_param_to_field,
            "Assign parameter to new field",
            "class A { A(int <|>count) { } }",
            "class A { private int count; A(int count) { this.count = count; } }",
        );
    }

    #[test]
    fn existing_field_without_shadowing_needs_no_qualifier() {
        check_assist(
            assign_param_to_field,
            "Assign parameter to field 'total'",
            "class A { private long total; void set(int <|>value) { } }",
            "class A { private long total; void set(int value) { total = value; } }",
        );
    }

    #[test]
    fn initialized_and_static_fields_are_skipped() {
        check_labels(
            assign_param_to_field,
            "class A { int a = 1; static int b; void set(int <|>value) { } }",
            &["Assign parameter to new field"],
        );
    }

    #[test]
    fn static_method_assigns_through_the_type() {
        check_assist(
            assign_param_to_field,
            "Assign parameter to new field",
            "class A { static void init(String <|>name) { } }",
            "class A { private static String name; static void init(String name) { A.name = name; } }",
        );
    }

    #[test]
    fn not_offered_in_interfaces_or_abstract_methods() {
        check_assist_not_applicable(
            assign_param_to_field,
            "interface I { default void m(int <|>a) { } }",
        );
        check_assist_not_applicable(
            assign_param_to_field,
            "abstract class A { abstract void m(int <|>a); }",
        );
    }

    #[test]
    fn already_assigned_parameter_is_not_offered_again() {
        check_assist_not_applicable(
            assign_param_to_field,
            "class A { private int count; A(int <|>count) { this.count = count; } }",
        );
    }

    #[test]
    fn varargs_become_array_fields() {
        check_assist(
            assign_param_to_field,
            "Assign parameter to new field",
            "class A { A(String... <|>names) { } }",
            "class A { private String[] names; A(String... names) { this.names = names; } }",
        );
    }

    #[test]
    fn assign_all_keeps_parameter_order() {
        check_assist(
            assign_all_params_to_fields,
            "Assign all parameters to new fields",
            "class A { int a; A(int <|>a, String b) { } }",
            "class A { int a; private int a1; private String b; A(int a, String b) { a1 = a; this.b = b; } }",
        );
    }

    #[test]
    fn assign_all_needs_two_parameters() {
        check_assist_not_applicable(assign_all_params_to_fields, "class A { A(int <|>a) { } }");
    }

    #[test]
    fn new_field_name_is_linked() {
        let edit = crate::tests::edit_for(
            assign_param_to_field,
            "Assign parameter to new field",
            "class A { A(int <|>count) { } }",
        );
        assert_eq!(edit.linked_positions().groups(), vec!["name"]);
    }
}
