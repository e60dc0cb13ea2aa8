use vega_syntax::{NodeId, NodeKind, Prop, ResolvedFile, SyntaxTree, TypeId};

use crate::assist_context::AssistContext;
use crate::handlers::is_control_body;
use crate::proposal::AssistId;
use crate::relevance;
use crate::rewrite::{InsertPosition, RewriteBuilder, RewriteError};

struct CatchSite {
    clause: NodeId,
    try_stmt: NodeId,
    /// Declared exception type of the clause.
    ty: NodeId,
    /// The enclosing method, `None` inside an initializer.
    method: Option<NodeId>,
    /// One alternative of a multi-catch, when the selection names it.
    alternative: Option<NodeId>,
}

// Assist: replace_catch_with_throws
//
// ```
// void m() { try { read(); } catch (<|>IOException e) { } }
// ```
// ->
// ```
// void m() throws IOException { read(); }
// ```
pub(crate) fn catch_to_throws(ctx: &mut AssistContext<'_>) -> Option<()> {
    let file = ctx.file;
    let site = catch_site(file, ctx.covering())?;
    let site = &site;

    if let Some(method) = site.method {
        match site.alternative {
            Some(alternative) => ctx.add(
                AssistId::CatchToThrows,
                "Replace exception with throws",
                relevance::REPLACE_EXCEPTION_WITH_THROWS,
                |builder| {
                    builder.remove(alternative)?;
                    add_to_throws(builder, file, method, &[alternative])
                },
            ),
            None => {
                let thrown = exception_types(&file.tree, site.ty)?;
                ctx.add(
                    AssistId::CatchToThrows,
                    "Replace catch clause with throws",
                    relevance::REPLACE_CATCH_WITH_THROWS,
                    |builder| {
                        remove_catch(builder, site)?;
                        add_to_throws(builder, file, method, &thrown)
                    },
                );
            }
        }
    }

    match site.alternative {
        Some(alternative) => ctx.add(
            AssistId::RemoveCatch,
            "Remove exception",
            relevance::REMOVE_EXCEPTION,
            |builder| builder.remove(alternative),
        ),
        None => ctx.add(
            AssistId::RemoveCatch,
            "Remove catch clause",
            relevance::REMOVE_CATCH,
            |builder| remove_catch(builder, site),
        ),
    }
    Some(())
}

fn catch_site(file: &ResolvedFile, covering: NodeId) -> Option<CatchSite> {
    let tree = &file.tree;
    let clause = tree
        .ancestors_with_self(covering)
        .find(|n| matches!(tree.kind(*n), NodeKind::CatchClause { .. }))?;
    let NodeKind::CatchClause { param, body } = tree.kind(clause) else {
        return None;
    };
    let try_stmt = tree.parent(clause)?;

    // Only the clause header or its block, not a statement inside it.
    let statement = tree
        .ancestors_with_self(covering)
        .find(|n| tree.kind(*n).is_statement());
    if statement.is_some_and(|s| s != try_stmt && s != *body) {
        return None;
    }

    let NodeKind::Parameter { ty: Some(ty), .. } = tree.kind(*param) else {
        return None;
    };
    if !matches!(
        tree.kind(*ty),
        NodeKind::SimpleType { .. } | NodeKind::UnionType { .. }
    ) {
        return None;
    }

    // Body declaration owning the try. A lambda in between has no throws
    // clause of its own that the method's would cover.
    let owner = tree.ancestors(clause).find(|n| {
        matches!(
            tree.kind(*n),
            NodeKind::MethodDecl { .. } | NodeKind::Initializer { .. } | NodeKind::Lambda { .. }
        )
    })?;
    let method = match tree.kind(owner) {
        NodeKind::MethodDecl { .. } => Some(owner),
        NodeKind::Initializer { .. } => None,
        _ => return None,
    };

    let alternative = match tree.kind(*ty) {
        NodeKind::UnionType { .. } if tree.kind(covering).is_name() => {
            let top = tree
                .ancestors_with_self(covering)
                .take_while(|n| tree.kind(*n).is_name())
                .last()?;
            tree.parent(top)
                .filter(|p| matches!(tree.kind(*p), NodeKind::SimpleType { .. }))
                .filter(|p| tree.parent(*p) == Some(*ty))
        }
        _ => None,
    };

    Some(CatchSite {
        clause,
        try_stmt,
        ty: *ty,
        method,
        alternative,
    })
}

/// The single type, or every alternative of a union.
fn exception_types(tree: &SyntaxTree, ty: NodeId) -> Option<Vec<NodeId>> {
    match tree.kind(ty) {
        NodeKind::UnionType { alternatives } => {
            if alternatives
                .iter()
                .all(|a| matches!(tree.kind(*a), NodeKind::SimpleType { .. }))
            {
                Some(alternatives.clone())
            } else {
                None
            }
        }
        _ => Some(vec![ty]),
    }
}

fn remove_catch(builder: &mut RewriteBuilder<'_>, site: &CatchSite) -> Result<(), RewriteError> {
    let tree = builder.tree();
    let NodeKind::Try {
        resources,
        body,
        catches,
        finally,
    } = tree.kind(site.try_stmt)
    else {
        return Err(RewriteError::UnknownNode(site.try_stmt));
    };
    if catches.len() > 1 || finally.is_some() || !resources.is_empty() {
        return builder.remove(site.clause);
    }

    let statements = tree
        .kind(*body)
        .list(Prop::Statements)
        .cloned()
        .unwrap_or_default();
    let in_control_body = is_control_body(tree, site.try_stmt);
    match statements.as_slice() {
        [] if in_control_body => {
            let empty = builder.block(Vec::new());
            builder.replace(site.try_stmt, empty)
        }
        [] => builder.remove(site.try_stmt),
        [single] => {
            let copy = builder.copy(*single);
            let declares = matches!(tree.kind(*single), NodeKind::LocalVarDecl { .. });
            let replacement = if in_control_body && declares {
                builder.block(vec![copy])
            } else {
                copy
            };
            builder.replace(site.try_stmt, replacement)
        }
        many => {
            let copies = many.iter().map(|s| builder.copy(*s)).collect();
            let block = builder.block(copies);
            builder.replace(site.try_stmt, block)
        }
    }
}

/// Appends each of `types` to the method's throws clause unless the clause
/// already declares it or a supertype of it.
fn add_to_throws(
    builder: &mut RewriteBuilder<'_>,
    file: &ResolvedFile,
    method: NodeId,
    types: &[NodeId],
) -> Result<(), RewriteError> {
    let tree = &file.tree;
    let model = &file.model;
    let NodeKind::MethodDecl { thrown, .. } = tree.kind(method) else {
        return Err(RewriteError::UnknownNode(method));
    };
    let declared: Vec<TypeId> = thrown
        .iter()
        .filter_map(|t| model.type_binding(*t))
        .collect();
    for ty in types {
        let covered = model
            .type_binding(*ty)
            .is_some_and(|def| declared.iter().any(|sup| model.is_subclass_of(def, *sup)));
        if covered {
            continue;
        }
        let copy = builder.copy(*ty);
        builder.insert(method, Prop::Thrown, InsertPosition::Last, copy)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests::{check_assist, check_assist_not_applicable, check_labels};

    use super::*;

    const IO: &str = "import java.io.*;\n";

    fn with_io(body: &str) -> String {
        format!("{IO}{body}")
    }

    #[test]
    fn whole_clause_offers_throws_then_removal() {
        check_labels(
            catch_to_throws,
            &with_io("class A { void m() throws IOException { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &["Replace catch clause with throws", "Remove catch clause"],
        );
    }

    #[test]
    fn single_statement_try_is_unwrapped() {
        check_assist(
            catch_to_throws,
            "Replace catch clause with throws",
            &with_io("class A { void m() { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &with_io("class A { void m() throws FileNotFoundException { new FileReader(\"f\"); } }"),
        );
    }

    #[test]
    fn supertype_already_thrown_is_not_added_again() {
        check_assist(
            catch_to_throws,
            "Replace catch clause with throws",
            &with_io("class A { void m() throws IOException { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &with_io("class A { void m() throws IOException { new FileReader(\"f\"); } }"),
        );
    }

    #[test]
    fn multi_statement_try_becomes_a_block() {
        check_assist(
            catch_to_throws,
            "Remove catch clause",
            &with_io("class A { void m() { try { int a = 1; new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &with_io("class A { void m() { { int a = 1; new FileReader(\"f\"); } } }"),
        );
    }

    #[test]
    fn control_body_keeps_a_block_around_declarations() {
        check_assist(
            catch_to_throws,
            "Remove catch clause",
            &with_io("class A { void m(boolean b) { if (b) try { Reader r = new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &with_io("class A { void m(boolean b) { if (b) { Reader r = new FileReader(\"f\"); } } }"),
        );
    }

    #[test]
    fn finally_keeps_the_try() {
        check_assist(
            catch_to_throws,
            "Remove catch clause",
            &with_io("class A { void m() { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } finally { } } }"),
            &with_io("class A { void m() { try { new FileReader(\"f\"); } finally { } } }"),
        );
    }

    #[test]
    fn one_alternative_of_a_multi_catch() {
        let before = with_io("class A { void m() { try { new FileReader(\"f\"); Thread.sleep(1); } catch (<|>FileNotFoundException | InterruptedException e) { } } }");
        check_labels(
            catch_to_throws,
            &before,
            &["Replace exception with throws", "Remove exception"],
        );
        check_assist(
            catch_to_throws,
            "Replace exception with throws",
            &before,
            &with_io("class A { void m() throws FileNotFoundException { try { new FileReader(\"f\"); Thread.sleep(1); } catch (InterruptedException e) { } } }"),
        );
    }

    #[test]
    fn initializers_only_offer_removal() {
        check_labels(
            catch_to_throws,
            &with_io("class A { { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } } }"),
            &["Remove catch clause"],
        );
    }

    #[test]
    fn declines_inside_the_catch_body_and_across_lambdas() {
        check_assist_not_applicable(
            catch_to_throws,
            &with_io("class A { void m() { try { new FileReader(\"f\"); } catch (FileNotFoundException e) { <|>e.printStackTrace(); } } }"),
        );
        check_assist_not_applicable(
            catch_to_throws,
            &with_io("class A { void m() { Runnable r = () -> { try { new FileReader(\"f\"); } catch (<|>FileNotFoundException e) { } }; } }"),
        );
    }
}
