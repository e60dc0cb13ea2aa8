//! One module per rule. Each handler takes the [`AssistContext`] and returns
//! `None` as soon as a precondition fails.
//!
//! [`AssistContext`]: crate::AssistContext

pub(crate) mod anonymous_to_lambda;
pub(crate) mod assign_param_to_field;
pub(crate) mod catch_to_throws;
pub(crate) mod extract;
pub(crate) mod lambda_to_anonymous;
pub(crate) mod method_ref_to_lambda;
pub(crate) mod static_import;
pub(crate) mod var_type;

use vega_syntax::{NodeId, NodeKind, Prop, SyntaxTree};

use crate::rewrite::{FragmentRef, InsertPosition, RewriteBuilder, RewriteError};

/// The method, initializer or lambda whose body contains `node`.
pub(crate) fn enclosing_body_owner(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|n| {
        matches!(
            tree.kind(*n),
            NodeKind::MethodDecl { .. } | NodeKind::Initializer { .. } | NodeKind::Lambda { .. }
        )
    })
}

/// The innermost `TypeDecl` or `AnonymousBody` containing `node`.
pub(crate) fn enclosing_type_body(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node).find(|n| {
        matches!(
            tree.kind(*n),
            NodeKind::TypeDecl { .. } | NodeKind::AnonymousBody { .. }
        )
    })
}

/// The statement containing `node` that sits directly in a block.
pub(crate) fn enclosing_block_statement(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors_with_self(node).find(|n| {
        tree.kind(*n).is_statement()
            && tree
                .parent(*n)
                .is_some_and(|p| matches!(tree.kind(p), NodeKind::Block { .. }))
    })
}

/// `true` if `node` occupies a position where Java requires a statement but
/// not a block (the body of `if`, `while`, `for`).
pub(crate) fn is_control_body(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::If {
            then_branch,
            else_branch,
            ..
        } => *then_branch == node || *else_branch == Some(node),
        NodeKind::While { body, .. }
        | NodeKind::For { body, .. }
        | NodeKind::ForEach { body, .. } => *body == node,
        _ => false,
    }
}

/// New fields go after the last existing field, or first.
pub(crate) fn insert_field(
    builder: &mut RewriteBuilder<'_>,
    tree: &SyntaxTree,
    type_body: NodeId,
    decl: FragmentRef,
) -> Result<(), RewriteError> {
    let members = tree
        .kind(type_body)
        .list(Prop::Members)
        .cloned()
        .unwrap_or_default();
    let position = members
        .iter()
        .rev()
        .find(|m| matches!(tree.kind(**m), NodeKind::FieldDecl { .. }))
        .map_or(InsertPosition::First, |last| InsertPosition::After(*last));
    builder.insert(type_body, Prop::Members, position, decl)
}
