//! Mapping a text selection onto syntax nodes.

use vega_syntax::{NodeId, NodeKind, SyntaxTree, TextRange};

/// The selection a request was made for, resolved against the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub range: TextRange,
    /// Innermost node whose range contains the selection.
    pub covering: NodeId,
    /// Maximal nodes fully inside the selection, in document order.
    pub covered: Vec<NodeId>,
}

impl Selection {
    pub fn new(tree: &SyntaxTree, range: TextRange) -> Self {
        let covering = tree.covering_node(range);
        let covered = covered_nodes(tree, covering, range);
        tracing::trace!(
            target: "vega.assists",
            ?range,
            covering = tree.kind(covering).kind_name(),
            covered = covered.len(),
            "resolved selection"
        );
        Self {
            range,
            covering,
            covered,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The single covered node, if the selection spans exactly one.
    pub fn single_covered(&self) -> Option<NodeId> {
        match self.covered.as_slice() {
            [node] => Some(*node),
            _ => None,
        }
    }
}

/// Maximal nodes fully contained in `range`, searched from `covering`.
///
/// A node is reported when it lies inside the selection and its parent does
/// not; its subtree is not visited further. An empty selection covers
/// nothing.
pub fn covered_nodes(tree: &SyntaxTree, covering: NodeId, range: TextRange) -> Vec<NodeId> {
    if range.is_empty() {
        return Vec::new();
    }

    let inside = |node: NodeId| range.contains_range(tree.range(node));

    let mut root = covering;
    while let Some(parent) = tree.parent(root) {
        if !inside(parent) {
            break;
        }
        root = parent;
    }

    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let node_range = tree.range(node);
        if node_range.end() < range.start() || range.end() < node_range.start() {
            continue;
        }
        if inside(node) && !tree.parent(node).is_some_and(inside) {
            out.push(node);
            continue;
        }
        stack.extend(tree.children(node).into_iter().rev());
    }
    out
}

/// Climbs from a name to the construct it names: the qualified name it ends,
/// and the type reference it spells.
pub fn normalized_node(tree: &SyntaxTree, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        let climb = match tree.kind(parent) {
            NodeKind::QualifiedName { name, .. } => *name == current,
            NodeKind::SimpleType { .. } => true,
            NodeKind::ParameterizedType { base, .. } => *base == current,
            NodeKind::ArrayType { element, .. } => *element == current,
            _ => false,
        };
        if !climb {
            break;
        }
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use vega_test_utils::Fixture;

    use super::*;

    fn covered_text(fixture: &str) -> Vec<String> {
        let fixture = Fixture::parse(fixture);
        let selection = Selection::new(&fixture.file.tree, fixture.selection);
        selection
            .covered
            .iter()
            .map(|node| fixture.file.tree.node_text(*node).to_string())
            .collect()
    }

    #[test]
    fn literal_selection_covers_the_literal() {
        assert_eq!(
            covered_text("class A { void m() { int x = /*]*/0/*[*/; } }"),
            vec!["0"]
        );
    }

    #[test]
    fn statement_selection_reports_each_statement_once() {
        let covered = covered_text(
            "class A { void m() { /*[*/int a = 1;\n int b = a;/*]*/ int c = 2; } }",
        );
        assert_eq!(covered, vec!["int a = 1;", "int b = a;"]);
    }

    #[test]
    fn caret_covers_nothing() {
        let fixture = Fixture::parse("class A { void m() { int x<|> = 0; } }");
        let selection = Selection::new(&fixture.file.tree, fixture.selection);
        assert!(selection.covered.is_empty());
        assert!(selection.is_empty());
        assert_eq!(fixture.file.tree.node_text(selection.covering), "x");
    }

    #[test]
    fn normalization_climbs_to_the_type_reference() {
        let fixture = Fixture::parse("class A { void m(java.util.Li<|>st<String> l) { } }");
        let tree = &fixture.file.tree;
        let normalized = normalized_node(tree, fixture.covering_node());
        assert!(matches!(tree.kind(normalized), NodeKind::ParameterizedType { .. }));
        assert_eq!(tree.node_text(normalized), "java.util.List<String>");
    }
}
