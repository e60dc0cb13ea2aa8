use vega_syntax::scope::declarations_in_scope;
use vega_syntax::{NodeId, NodeKind, ResolvedFile, ScopeFlags, SyntaxTree, TypeId};

use crate::assist_context::AssistContext;
use crate::import_rewrite::ImportRewrite;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{RewriteBuilder, RewriteError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    /// `Type.method(..)`: the call node.
    Call(NodeId),
    /// `Type.FIELD`: the qualified name node.
    Field(NodeId),
}

struct StaticMember {
    access: Access,
    declaring: TypeId,
    member: String,
}

/// References to the declaring class found by one pass over the file.
#[derive(Debug, Default, PartialEq, Eq)]
struct Occurrences {
    /// Accesses spelled exactly like the selected one.
    identical: Vec<Access>,
    /// Every other qualified reference to the declaring class.
    others: usize,
}

// Assist: add_static_import
//
// ```
// int m = Math.<|>max(a, b);
// ```
// ->
// ```
// import static java.lang.Math.max;
// int m = max(a, b);
// ```
pub(crate) fn add_static_import(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let site = static_member(file, ctx.covering())?;
    let occurrences = occurrences(file, &site);
    let site = &site;

    ctx.add(
        AssistId::AddStaticImport,
        "Convert to static import",
        relevance::ADD_STATIC_IMPORT,
        |builder| {
            unqualify(builder, site.access)?;
            let total = occurrences.identical.len() + occurrences.others;
            import_member(builder, file, site, total == 1)
        },
    );
    ctx.add(
        AssistId::AddStaticImport,
        "Convert to static import (replace all occurrences)",
        relevance::ADD_STATIC_IMPORT,
        |builder| {
            for access in &occurrences.identical {
                unqualify(builder, *access)?;
            }
            import_member(builder, file, site, occurrences.others == 0)
        },
    );
    Some(())
}

fn static_member(file: &ResolvedFile, node: NodeId) -> Option<StaticMember> {
    let tree = &file.tree;
    let model = &file.model;
    if !matches!(tree.kind(node), NodeKind::SimpleName { .. }) {
        return None;
    }
    let parent = tree.parent(node)?;
    let (access, declaring) = match tree.kind(parent) {
        NodeKind::MethodCall {
            receiver: Some(receiver),
            name,
            ..
        } if *name == node && tree.kind(*receiver).is_name() => {
            let method = model.method(model.method_binding(parent)?);
            if !method.is_static() {
                return None;
            }
            (Access::Call(parent), method.declaring)
        }
        NodeKind::QualifiedName { name, .. } if *name == node => {
            if matches!(
                tree.parent(parent).map(|p| tree.kind(p)),
                Some(NodeKind::ImportDecl { .. } | NodeKind::PackageDecl { .. })
            ) {
                return None;
            }
            let var = model
                .var_binding(parent)
                .or_else(|| model.var_binding(node))?;
            let var = model.var(var);
            if !var.is_field() || !var.is_static() {
                return None;
            }
            (Access::Field(parent), var.declaring_type?)
        }
        _ => return None,
    };

    if is_directly_accessible(file, node, declaring) || model.type_symbol(declaring).is_private() {
        return None;
    }
    let member = tree.ident(node)?.to_string();
    if is_shadowed(file, node, access, declaring, &member) {
        return None;
    }
    Some(StaticMember {
        access,
        declaring,
        member,
    })
}

/// A visible declaration from another type shares the member's simple name,
/// so the unqualified access would bind to it instead. Overloads count.
fn is_shadowed(
    file: &ResolvedFile,
    node: NodeId,
    access: Access,
    declaring: TypeId,
    member: &str,
) -> bool {
    let model = &file.model;
    let offset = file.tree.range(node).start();
    match access {
        Access::Call(_) => declarations_in_scope(file, offset, ScopeFlags::METHODS)
            .into_iter()
            .filter_map(|binding| binding.as_method())
            .map(|method| model.method(method))
            .any(|method| method.name == member && method.declaring != declaring),
        Access::Field(_) => declarations_in_scope(file, offset, ScopeFlags::VARIABLES)
            .into_iter()
            .filter_map(|binding| binding.as_var())
            .map(|var| model.var(var))
            .any(|var| var.name == member && var.declaring_type != Some(declaring)),
    }
}

/// `declaring`'s members are inherited by a class enclosing `node`.
fn is_directly_accessible(file: &ResolvedFile, node: NodeId, declaring: TypeId) -> bool {
    let tree = &file.tree;
    let model = &file.model;
    tree.ancestors(node)
        .filter(|n| {
            matches!(
                tree.kind(*n),
                NodeKind::TypeDecl { .. } | NodeKind::AnonymousBody { .. }
            )
        })
        .filter_map(|n| model.type_binding(n))
        .any(|def| model.is_subclass_of(def, declaring))
}

fn occurrences(file: &ResolvedFile, site: &StaticMember) -> Occurrences {
    let tree = &file.tree;
    let class_name = file.model.type_symbol(site.declaring).name.as_str();
    let (selected_qualifier, selected_member, selected_path) = match site.access {
        Access::Call(call) => match tree.kind(call) {
            NodeKind::MethodCall {
                receiver: Some(receiver),
                ..
            } => (dotted(tree, *receiver), Some(site.member.as_str()), None),
            _ => (None, None, None),
        },
        Access::Field(qn) => (None, None, dotted(tree, qn)),
    };

    let mut found = Occurrences::default();
    for node in tree.preorder(tree.root()) {
        match tree.kind(node) {
            NodeKind::MethodCall {
                receiver: Some(receiver),
                name,
                ..
            } => {
                if let Some(qualifier) = dotted(tree, *receiver) {
                    let same = selected_qualifier.as_deref() == Some(qualifier.as_str())
                        && selected_member.is_some()
                        && tree.ident(*name) == selected_member;
                    if same {
                        found.identical.push(Access::Call(node));
                    } else if qualifier == class_name {
                        found.others += 1;
                    }
                } else if let NodeKind::New { ty, .. } = tree.kind(*receiver) {
                    if let NodeKind::SimpleType { name } = tree.kind(*ty) {
                        if dotted(tree, *name).as_deref() == Some(class_name) {
                            found.others += 1;
                        }
                    }
                }
            }
            NodeKind::QualifiedName { qualifier, .. } => {
                if selected_path.is_some() && dotted(tree, node) == selected_path {
                    found.identical.push(Access::Field(node));
                } else if dotted(tree, *qualifier).as_deref() == Some(class_name) {
                    found.others += 1;
                }
            }
            _ => {}
        }
    }
    found
}

/// `a.b.c` for a simple or qualified name, `None` for other expressions.
fn dotted(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        NodeKind::SimpleName { ident } => Some(ident.clone()),
        NodeKind::QualifiedName { qualifier, name } => {
            Some(format!("{}.{}", dotted(tree, *qualifier)?, tree.ident(*name)?))
        }
        _ => None,
    }
}

fn unqualify(builder: &mut RewriteBuilder<'_>, access: Access) -> Result<(), RewriteError> {
    let tree = builder.tree();
    match access {
        Access::Call(call) => {
            let NodeKind::MethodCall {
                receiver: Some(receiver),
                type_args,
                ..
            } = tree.kind(call)
            else {
                return Err(RewriteError::UnknownNode(call));
            };
            builder.remove(*receiver)?;
            for arg in type_args {
                builder.remove(*arg)?;
            }
            Ok(())
        }
        Access::Field(qn) => {
            let NodeKind::QualifiedName { name, .. } = tree.kind(qn) else {
                return Err(RewriteError::UnknownNode(qn));
            };
            let name = builder.copy(*name);
            builder.replace(qn, name)
        }
    }
}

fn import_member(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    site: &StaticMember,
    drop_type_import: bool,
) -> Result<(), RewriteError> {
    let mut imports = ImportRewrite::new(file);
    imports.add_static_import(site.declaring, &site.member);
    if drop_type_import {
        imports.remove_import(site.declaring);
    }
    imports.apply(builder)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vega_test_utils::Fixture;

    use crate::tests::{check_assist, check_assist_not_applicable, check_labels};

    use super::*;

    const SINGLE: &str = "Convert to static import";
    const ALL: &str = "Convert to static import (replace all occurrences)";

    #[test]
    fn offers_single_and_all_occurrences() {
        check_labels(
            add_static_import,
            "class A { int m() { return Math.<|>max(1, 2); } }",
            &[SINGLE, ALL],
        );
    }

    #[test]
    fn static_call_loses_its_qualifier() {
        check_assist(
            add_static_import,
            SINGLE,
            "class A { int m() { return Math.<|>max(1, 2) + Math.max(3, 4); } }",
            "import static java.lang.Math.max;\nclass A { int m() { return max(1, 2) + Math.max(3, 4); } }",
        );
        check_assist(
            add_static_import,
            ALL,
            "class A { int m() { return Math.<|>max(1, 2) + Math.max(3, 4); } }",
            "import static java.lang.Math.max;\nclass A { int m() { return max(1, 2) + max(3, 4); } }",
        );
    }

    #[test]
    fn static_field_becomes_a_simple_name() {
        check_assist(
            add_static_import,
            SINGLE,
            "class A { double r = Math.<|>PI; }",
            "import static java.lang.Math.PI;\nclass A { double r = PI; }",
        );
    }

    #[test]
    fn type_import_is_dropped_once_unused() {
        let before = "import java.util.Collections;\nimport java.util.List;\nclass A { List<String> a = Collections.<|>emptyList(); List<String> b = Collections.emptyList(); }";
        check_assist(
            add_static_import,
            SINGLE,
            before,
            "import java.util.Collections;\nimport java.util.List;\nimport static java.util.Collections.emptyList;\nclass A { List<String> a = emptyList(); List<String> b = Collections.emptyList(); }",
        );
        check_assist(
            add_static_import,
            ALL,
            before,
            "import java.util.List;\nimport static java.util.Collections.emptyList;\nclass A { List<String> a = emptyList(); List<String> b = emptyList(); }",
        );
    }

    #[test]
    fn other_references_keep_the_type_import() {
        check_assist(
            add_static_import,
            ALL,
            "import java.util.Collections;\nimport java.util.List;\nclass A { List<String> a = Collections.<|>emptyList(); List<String> b = Collections.singletonList(\"x\"); }",
            "import java.util.Collections;\nimport java.util.List;\nimport static java.util.Collections.emptyList;\nclass A { List<String> a = emptyList(); List<String> b = Collections.singletonList(\"x\"); }",
        );
    }

    #[test]
    fn counts_identical_and_other_references() {
        let fixture = Fixture::parse(
            "class A { int m() { return Math.<|>max(1, 2) + Math.max(3, 4) + Math.min(5, 6) + (int) Math.PI; } }",
        );
        let site = static_member(&fixture.file, fixture.covering_node()).unwrap();
        let found = occurrences(&fixture.file, &site);
        assert_eq!(found.identical.len(), 2);
        assert_eq!(found.others, 2);
    }

    #[test]
    fn declines_instance_members_inherited_members_and_imports() {
        check_assist_not_applicable(add_static_import, "class A { int m(String s) { return s.<|>length(); } }");
        check_assist_not_applicable(
            add_static_import,
            "class B { static int twice(int x) { return x * 2; } }\nclass A extends B { int m() { return B.<|>twice(1); } }",
        );
        check_assist_not_applicable(add_static_import, "import java.util.<|>List;\nclass A { }");
    }

    #[test]
    fn declines_when_a_same_named_declaration_would_capture_the_name() {
        check_assist_not_applicable(
            add_static_import,
            "class A { int max(int a, int b) { return a; } int m() { return Math.<|>max(1, 2); } }",
        );
        check_assist_not_applicable(
            add_static_import,
            "class A { double m() { double PI = 3; return Math.<|>PI; } }",
        );
    }
}
