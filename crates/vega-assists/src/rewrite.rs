//! Declarative tree edits.
//!
//! A [`RewriteBuilder`] records operations against an immutable
//! [`SyntaxTree`]: replacing a node, inserting into or removing from a list
//! property, and removing an optional child. Replacement content is either a
//! reference to an existing node ([`FragmentRef::Copy`], [`FragmentRef::Move`])
//! or a synthesized node ([`FragmentRef::New`]) whose children are again
//! fragment references. The finished [`TreeEdit`] is a plain value; the input
//! tree is never touched.
//!
//! [`EditView`] presents the tree with an edit applied so the printer can
//! render the result without materializing a second tree.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;
use vega_syntax::printer::{self, SyntaxView};
use vega_syntax::{Modifiers, NodeId, NodeKind, Primitive, Prop, SyntaxTree};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u32);

impl FragmentId {
    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentId({})", self.0)
    }
}

/// Child reference inside a synthesized fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentRef {
    /// A node synthesized by the edit.
    New(FragmentId),
    /// A duplicate of an existing subtree; may be used any number of times.
    Copy(NodeId),
    /// An existing subtree relocated by the edit; placed exactly once.
    Move(NodeId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentArena {
    nodes: Vec<NodeKind<FragmentRef>>,
}

impl FragmentArena {
    fn alloc(&mut self, kind: NodeKind<FragmentRef>) -> FragmentId {
        let id = FragmentId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    pub fn get(&self, id: FragmentId) -> Option<&NodeKind<FragmentRef>> {
        self.nodes.get(id.idx())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FragmentId, &NodeKind<FragmentRef>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, kind)| (FragmentId(idx as u32), kind))
    }
}

/// A list property of an existing node (`Block.statements`, `CU.imports`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListSlot {
    pub owner: NodeId,
    pub prop: Prop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    First,
    Last,
    /// Before the element currently at this index; past the end appends.
    Index(usize),
    Before(NodeId),
    After(NodeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteOp {
    Replace {
        target: NodeId,
        with: FragmentRef,
    },
    InsertInList {
        slot: ListSlot,
        position: InsertPosition,
        fragment: FragmentRef,
    },
    RemoveFromList {
        slot: ListSlot,
        target: NodeId,
    },
    /// Clears an optional child (an initializer, an `else` branch, ...).
    Remove {
        target: NodeId,
    },
}

/// A position the client keeps in sync after applying the edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedPosition {
    pub group: String,
    pub fragment: FragmentRef,
    /// Marks the initial tab stop of the group.
    pub is_first: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkedPositions {
    positions: Vec<LinkedPosition>,
}

impl LinkedPositions {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkedPosition> {
        self.positions.iter()
    }

    pub fn group<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LinkedPosition> + 'a {
        self.positions.iter().filter(move |p| p.group == name)
    }

    /// Group names in first-use order.
    pub fn groups(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for position in &self.positions {
            if !out.contains(&position.group.as_str()) {
                out.push(&position.group);
            }
        }
        out
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("fragment {0:?} does not exist")]
    UnknownFragment(FragmentId),
    #[error("node {0:?} is moved more than once")]
    MovedTwice(NodeId),
    #[error("moved node {0:?} must be placed exactly once, inside a replaced or removed subtree")]
    DanglingMove(NodeId),
    #[error("{kind} has no list property {prop:?}")]
    ListSlotMismatch { kind: &'static str, prop: Prop },
    #[error("node {node:?} is not an element of {prop:?}")]
    NotInList { node: NodeId, prop: Prop },
    #[error("node {0:?} has no parent")]
    DetachedNode(NodeId),
    #[error("node {0:?} is neither a list element nor an optional child")]
    NotRemovable(NodeId),
    #[error("type `{0}` cannot be written in source")]
    NoSourceForm(String),
}

/// Records operations and synthesized fragments for one proposal.
pub struct RewriteBuilder<'t> {
    tree: &'t SyntaxTree,
    ops: Vec<RewriteOp>,
    fragments: FragmentArena,
    linked: LinkedPositions,
    moved: Vec<NodeId>,
}

impl<'t> RewriteBuilder<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            ops: Vec::new(),
            fragments: FragmentArena::default(),
            linked: LinkedPositions::default(),
            moved: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    fn check(&self, node: NodeId) -> Result<(), RewriteError> {
        if self.tree.contains(node) {
            Ok(())
        } else {
            Err(RewriteError::UnknownNode(node))
        }
    }

    pub fn new_node(&mut self, kind: NodeKind<FragmentRef>) -> FragmentRef {
        FragmentRef::New(self.fragments.alloc(kind))
    }

    pub fn name(&mut self, ident: impl Into<String>) -> FragmentRef {
        self.new_node(NodeKind::SimpleName {
            ident: ident.into(),
        })
    }

    /// `a.b.c` as nested qualified names.
    pub fn qualified_name(&mut self, dotted: &str) -> FragmentRef {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let mut current = self.name(first);
        for part in parts {
            let name = self.name(part);
            current = self.new_node(NodeKind::QualifiedName {
                qualifier: current,
                name,
            });
        }
        current
    }

    /// Type reference spelled `dotted`.
    pub fn simple_type(&mut self, dotted: &str) -> FragmentRef {
        let name = self.qualified_name(dotted);
        self.new_node(NodeKind::SimpleType { name })
    }

    pub fn primitive_type(&mut self, keyword: Primitive) -> FragmentRef {
        self.new_node(NodeKind::PrimitiveType { keyword })
    }

    pub fn this(&mut self, qualifier: Option<FragmentRef>) -> FragmentRef {
        self.new_node(NodeKind::This { qualifier })
    }

    pub fn expr_stmt(&mut self, expr: FragmentRef) -> FragmentRef {
        self.new_node(NodeKind::ExprStmt { expr })
    }

    pub fn block(&mut self, statements: Vec<FragmentRef>) -> FragmentRef {
        self.new_node(NodeKind::Block { statements })
    }

    /// `modifiers ty name = initializer;` as a local declaration.
    pub fn local_var(
        &mut self,
        modifiers: Modifiers,
        ty: FragmentRef,
        name: FragmentRef,
        initializer: Option<FragmentRef>,
    ) -> FragmentRef {
        let fragment = self.new_node(NodeKind::VarFragment { name, initializer });
        self.new_node(NodeKind::LocalVarDecl {
            modifiers,
            ty,
            fragments: vec![fragment],
        })
    }

    /// A duplicate of `node`, rendered with any other edits inside it applied.
    pub fn copy(&self, node: NodeId) -> FragmentRef {
        FragmentRef::Copy(node)
    }

    pub fn move_node(&mut self, node: NodeId) -> Result<FragmentRef, RewriteError> {
        self.check(node)?;
        if self.moved.contains(&node) {
            return Err(RewriteError::MovedTwice(node));
        }
        self.moved.push(node);
        Ok(FragmentRef::Move(node))
    }

    pub fn replace(&mut self, target: NodeId, with: FragmentRef) -> Result<(), RewriteError> {
        self.check(target)?;
        if matches!(with, FragmentRef::Copy(n) | FragmentRef::Move(n) if n == target) {
            return Ok(());
        }
        self.ops.push(RewriteOp::Replace { target, with });
        Ok(())
    }

    pub fn insert(
        &mut self,
        owner: NodeId,
        prop: Prop,
        position: InsertPosition,
        fragment: FragmentRef,
    ) -> Result<(), RewriteError> {
        self.check(owner)?;
        let kind = self.tree.kind(owner);
        let list = kind.list(prop).ok_or(RewriteError::ListSlotMismatch {
            kind: kind.kind_name(),
            prop,
        })?;
        if let InsertPosition::Before(anchor) | InsertPosition::After(anchor) = position {
            if !list.contains(&anchor) {
                return Err(RewriteError::NotInList { node: anchor, prop });
            }
        }
        self.ops.push(RewriteOp::InsertInList {
            slot: ListSlot { owner, prop },
            position,
            fragment,
        });
        Ok(())
    }

    /// Removes `target` from its parent: list elements leave their list,
    /// optional children are cleared.
    pub fn remove(&mut self, target: NodeId) -> Result<(), RewriteError> {
        self.check(target)?;
        let parent = self
            .tree
            .parent(target)
            .ok_or(RewriteError::DetachedNode(target))?;
        let role = self
            .tree
            .role(target)
            .ok_or(RewriteError::DetachedNode(target))?;
        if role.index.is_some() {
            self.ops.push(RewriteOp::RemoveFromList {
                slot: ListSlot {
                    owner: parent,
                    prop: role.prop,
                },
                target,
            });
            return Ok(());
        }
        if self.tree.kind(parent).optional(role.prop).is_some() {
            self.ops.push(RewriteOp::Remove { target });
            return Ok(());
        }
        Err(RewriteError::NotRemovable(target))
    }

    pub fn link(&mut self, group: impl Into<String>, fragment: FragmentRef, is_first: bool) {
        self.linked.positions.push(LinkedPosition {
            group: group.into(),
            fragment,
            is_first,
        });
    }

    /// Copies `node`, replacing the descendants keyed in `substitutions`.
    /// Subtrees without a substitution stay plain copies.
    pub fn copy_with_substitutions(
        &mut self,
        node: NodeId,
        substitutions: &HashMap<NodeId, FragmentRef>,
    ) -> Result<FragmentRef, RewriteError> {
        self.check(node)?;
        if let Some(substitute) = substitutions.get(&node) {
            return Ok(*substitute);
        }
        let tree = self.tree;
        let affected = substitutions
            .keys()
            .any(|sub| *sub != node && tree.contains(*sub) && tree.is_within(*sub, node));
        if !affected {
            return Ok(FragmentRef::Copy(node));
        }
        let kind = tree.kind(node);
        let mut copied = HashMap::new();
        for (_, child) in kind.children() {
            copied.insert(*child, self.copy_with_substitutions(*child, substitutions)?);
        }
        let rebuilt = kind.map(|child| {
            copied
                .get(child)
                .copied()
                .unwrap_or(FragmentRef::Copy(*child))
        });
        Ok(self.new_node(rebuilt))
    }

    fn check_ref(&self, fragment: FragmentRef) -> Result<(), RewriteError> {
        match fragment {
            FragmentRef::New(id) if id.idx() >= self.fragments.len() => {
                Err(RewriteError::UnknownFragment(id))
            }
            FragmentRef::New(_) => Ok(()),
            FragmentRef::Copy(node) | FragmentRef::Move(node) => self.check(node),
        }
    }

    fn placed_refs(&self) -> Vec<FragmentRef> {
        let mut refs: Vec<FragmentRef> = self
            .fragments
            .nodes
            .iter()
            .flat_map(|kind| kind.children().into_iter().map(|(_, r)| *r))
            .collect();
        for op in &self.ops {
            match op {
                RewriteOp::Replace { with, .. } => refs.push(*with),
                RewriteOp::InsertInList { fragment, .. } => refs.push(*fragment),
                RewriteOp::RemoveFromList { .. } | RewriteOp::Remove { .. } => {}
            }
        }
        refs
    }

    pub fn finish(self) -> Result<TreeEdit, RewriteError> {
        let refs = self.placed_refs();
        for fragment in &refs {
            self.check_ref(*fragment)?;
        }

        for &moved in &self.moved {
            let placements = refs
                .iter()
                .filter(|r| **r == FragmentRef::Move(moved))
                .count();
            let vacated = self.ops.iter().any(|op| match op {
                RewriteOp::Replace { target, .. }
                | RewriteOp::RemoveFromList { target, .. }
                | RewriteOp::Remove { target } => self.tree.is_within(moved, *target),
                RewriteOp::InsertInList { .. } => false,
            });
            if placements != 1 || !vacated {
                return Err(RewriteError::DanglingMove(moved));
            }
        }

        Ok(TreeEdit {
            ops: self.ops,
            fragments: self.fragments,
            linked: self.linked,
        })
    }
}

/// The finished, immutable result of a [`RewriteBuilder`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeEdit {
    ops: Vec<RewriteOp>,
    fragments: FragmentArena,
    linked: LinkedPositions,
}

impl TreeEdit {
    pub fn ops(&self) -> &[RewriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn fragments(&self) -> &FragmentArena {
        &self.fragments
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&NodeKind<FragmentRef>> {
        self.fragments.get(id)
    }

    pub fn linked_positions(&self) -> &LinkedPositions {
        &self.linked
    }

    pub fn view<'a>(&'a self, tree: &'a SyntaxTree) -> EditView<'a> {
        EditView::new(tree, self)
    }

    /// Source of the whole compilation unit after the edit.
    pub fn apply(&self, tree: &SyntaxTree) -> String {
        let view = self.view(tree);
        printer::print(&view, ViewRef::Node(tree.root()))
    }

    pub fn print_fragment(&self, tree: &SyntaxTree, fragment: FragmentRef) -> String {
        let view = self.view(tree);
        printer::print(&view, ViewRef::from(fragment))
    }

    /// One readable line per operation.
    pub fn describe(&self, tree: &SyntaxTree) -> Vec<String> {
        let render = |fragment: FragmentRef| {
            let text = self.print_fragment(tree, fragment);
            collapse_whitespace(&text)
        };
        let original = |node: NodeId| collapse_whitespace(&printer::print(tree, node));
        self.ops
            .iter()
            .map(|op| match op {
                RewriteOp::Replace { target, with } => format!(
                    "replace {} `{}` with `{}`",
                    tree.kind(*target).kind_name(),
                    original(*target),
                    render(*with)
                ),
                RewriteOp::InsertInList {
                    slot,
                    position,
                    fragment,
                } => format!(
                    "insert `{}` into {}.{:?} at {}",
                    render(*fragment),
                    tree.kind(slot.owner).kind_name(),
                    slot.prop,
                    describe_position(tree, *position)
                ),
                RewriteOp::RemoveFromList { target, .. } | RewriteOp::Remove { target } => format!(
                    "remove {} `{}`",
                    tree.kind(*target).kind_name(),
                    original(*target)
                ),
            })
            .collect()
    }
}

fn describe_position(tree: &SyntaxTree, position: InsertPosition) -> String {
    match position {
        InsertPosition::First => "first".to_string(),
        InsertPosition::Last => "last".to_string(),
        InsertPosition::Index(idx) => format!("index {idx}"),
        InsertPosition::Before(node) => {
            format!("before `{}`", collapse_whitespace(&printer::print(tree, node)))
        }
        InsertPosition::After(node) => {
            format!("after `{}`", collapse_whitespace(&printer::print(tree, node)))
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Node reference of an [`EditView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewRef {
    Node(NodeId),
    New(FragmentId),
}

impl From<FragmentRef> for ViewRef {
    fn from(fragment: FragmentRef) -> Self {
        match fragment {
            FragmentRef::New(id) => ViewRef::New(id),
            FragmentRef::Copy(node) | FragmentRef::Move(node) => ViewRef::Node(node),
        }
    }
}

/// A [`SyntaxTree`] with a [`TreeEdit`] applied, for printing.
pub struct EditView<'a> {
    tree: &'a SyntaxTree,
    edit: &'a TreeEdit,
    replacements: HashMap<NodeId, FragmentRef>,
    removed: HashSet<NodeId>,
    inserts: HashMap<ListSlot, Vec<(InsertPosition, FragmentRef)>>,
    edited_lists: HashMap<NodeId, Vec<Prop>>,
}

impl<'a> EditView<'a> {
    fn new(tree: &'a SyntaxTree, edit: &'a TreeEdit) -> Self {
        let mut view = Self {
            tree,
            edit,
            replacements: HashMap::new(),
            removed: HashSet::new(),
            inserts: HashMap::new(),
            edited_lists: HashMap::new(),
        };
        for op in &edit.ops {
            match op {
                RewriteOp::Replace { target, with } => {
                    view.replacements.insert(*target, *with);
                }
                RewriteOp::InsertInList {
                    slot,
                    position,
                    fragment,
                } => {
                    view.inserts
                        .entry(*slot)
                        .or_default()
                        .push((*position, *fragment));
                    view.mark_list(*slot);
                }
                RewriteOp::RemoveFromList { slot, target } => {
                    view.removed.insert(*target);
                    view.mark_list(*slot);
                }
                RewriteOp::Remove { target } => {
                    view.removed.insert(*target);
                }
            }
        }
        view
    }

    fn mark_list(&mut self, slot: ListSlot) {
        let props = self.edited_lists.entry(slot.owner).or_default();
        if !props.contains(&slot.prop) {
            props.push(slot.prop);
        }
    }

    /// An original child as its parent sees it: replaced or as-is.
    fn child(&self, node: NodeId) -> ViewRef {
        match self.replacements.get(&node) {
            Some(fragment) => ViewRef::from(*fragment),
            None => ViewRef::Node(node),
        }
    }

    fn edit_list(&self, slot: ListSlot, original: &[NodeId]) -> Vec<ViewRef> {
        let inserts = self.inserts.get(&slot).map(Vec::as_slice).unwrap_or(&[]);
        let placed = |out: &mut Vec<ViewRef>, pred: &dyn Fn(InsertPosition) -> bool| {
            for (position, fragment) in inserts {
                if pred(*position) {
                    out.push(ViewRef::from(*fragment));
                }
            }
        };

        let mut out = Vec::new();
        placed(&mut out, &|p| p == InsertPosition::First);
        for (idx, node) in original.iter().enumerate() {
            placed(&mut out, &|p| {
                p == InsertPosition::Index(idx) || p == InsertPosition::Before(*node)
            });
            if !self.removed.contains(node) {
                out.push(self.child(*node));
            }
            placed(&mut out, &|p| p == InsertPosition::After(*node));
        }
        let len = original.len();
        placed(&mut out, &|p| match p {
            InsertPosition::Last => true,
            InsertPosition::Index(idx) => idx >= len,
            _ => false,
        });
        out
    }
}

impl SyntaxView for EditView<'_> {
    type Ref = ViewRef;

    fn view_kind(&self, node: ViewRef) -> Cow<'_, NodeKind<ViewRef>> {
        match node {
            ViewRef::New(id) => match self.edit.fragments.get(id) {
                Some(kind) => Cow::Owned(kind.map(|child| ViewRef::from(*child))),
                None => Cow::Owned(NodeKind::Empty),
            },
            ViewRef::Node(id) => {
                let kind = self.tree.kind(id);
                let mut viewed = kind.map(|child| self.child(*child));
                for (role, child) in kind.children() {
                    if role.index.is_none() && self.removed.contains(child) {
                        if let Some(slot) = viewed.optional_mut(role.prop) {
                            *slot = None;
                        }
                    }
                }
                if let Some(props) = self.edited_lists.get(&id) {
                    for prop in props {
                        let original = kind.list(*prop).map(Vec::as_slice).unwrap_or(&[]);
                        let edited = self.edit_list(ListSlot { owner: id, prop: *prop }, original);
                        if let Some(list) = viewed.list_mut(*prop) {
                            *list = edited;
                        }
                    }
                }
                Cow::Owned(viewed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vega_syntax::{LiteralKind, ResolvedFile};
    use vega_test_utils::resolve;

    use super::*;

    fn find(file: &ResolvedFile, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
        file.tree
            .ids()
            .find(|id| pred(file.tree.kind(*id)))
            .expect("node not found")
    }

    fn normalized(text: &str) -> String {
        let file = resolve(text);
        file.print(file.tree.root())
    }

    #[test]
    fn inserts_before_an_anchor_statement() {
        let file = resolve("class A { void m() { int x = 1; } }");
        let block = find(&file, |k| matches!(k, NodeKind::Block { .. }));
        let decl = find(&file, |k| matches!(k, NodeKind::LocalVarDecl { .. }));

        let mut builder = RewriteBuilder::new(&file.tree);
        let ty = builder.primitive_type(Primitive::Int);
        let name = builder.name("y");
        let zero = builder.new_node(NodeKind::Literal {
            kind: LiteralKind::Int,
            text: "0".into(),
        });
        let stmt = builder.local_var(Modifiers::default(), ty, name, Some(zero));
        builder
            .insert(block, Prop::Statements, InsertPosition::Before(decl), stmt)
            .unwrap();
        let edit = builder.finish().unwrap();

        assert_eq!(
            edit.apply(&file.tree),
            normalized("class A { void m() { int y = 0; int x = 1; } }")
        );
    }

    #[test]
    fn moved_node_is_placed_inside_new_fragment() {
        let file = resolve("class A { int m() { return 1 + 2; } }");
        let sum = find(&file, |k| matches!(k, NodeKind::Binary { .. }));

        let mut builder = RewriteBuilder::new(&file.tree);
        let moved = builder.move_node(sum).unwrap();
        let paren = builder.new_node(NodeKind::Paren { expr: moved });
        builder.replace(sum, paren).unwrap();
        let edit = builder.finish().unwrap();

        assert_eq!(
            edit.apply(&file.tree),
            normalized("class A { int m() { return (1 + 2); } }")
        );
    }

    #[test]
    fn moving_twice_is_rejected() {
        let file = resolve("class A { int m() { return 1; } }");
        let one = find(&file, |k| matches!(k, NodeKind::Literal { .. }));
        let mut builder = RewriteBuilder::new(&file.tree);
        builder.move_node(one).unwrap();
        assert_eq!(builder.move_node(one), Err(RewriteError::MovedTwice(one)));
    }

    #[test]
    fn move_without_vacating_its_source_is_dangling() {
        let file = resolve("class A { void m() { int x = 1; } }");
        let block = find(&file, |k| matches!(k, NodeKind::Block { .. }));
        let decl = find(&file, |k| matches!(k, NodeKind::LocalVarDecl { .. }));

        let mut builder = RewriteBuilder::new(&file.tree);
        let moved = builder.move_node(decl).unwrap();
        builder
            .insert(block, Prop::Statements, InsertPosition::Last, moved)
            .unwrap();
        assert_eq!(builder.finish(), Err(RewriteError::DanglingMove(decl)));
    }

    #[test]
    fn insert_checks_the_list_slot() {
        let file = resolve("class A { void m() { int x = 1; } }");
        let decl = find(&file, |k| matches!(k, NodeKind::LocalVarDecl { .. }));
        let block = find(&file, |k| matches!(k, NodeKind::Block { .. }));
        let mut builder = RewriteBuilder::new(&file.tree);
        let stmt = builder.new_node(NodeKind::Empty);

        assert_eq!(
            builder.insert(decl, Prop::Statements, InsertPosition::First, stmt),
            Err(RewriteError::ListSlotMismatch {
                kind: "LocalVarDecl",
                prop: Prop::Statements,
            })
        );
        assert_eq!(
            builder.insert(block, Prop::Statements, InsertPosition::After(block), stmt),
            Err(RewriteError::NotInList {
                node: block,
                prop: Prop::Statements,
            })
        );
    }

    #[test]
    fn remove_clears_optional_children_and_list_elements() {
        let file = resolve("class A { void m() { int x = 1; int y; } }");
        let one = find(&file, |k| matches!(k, NodeKind::Literal { .. }));
        let second = file
            .tree
            .ids()
            .filter(|id| matches!(file.tree.kind(*id), NodeKind::LocalVarDecl { .. }))
            .nth(1)
            .unwrap();

        let mut builder = RewriteBuilder::new(&file.tree);
        builder.remove(one).unwrap();
        builder.remove(second).unwrap();
        let edit = builder.finish().unwrap();

        assert_eq!(
            edit.apply(&file.tree),
            normalized("class A { void m() { int x; } }")
        );
        assert_eq!(edit.describe(&file.tree), vec![
            "remove Literal `1`".to_string(),
            "remove LocalVarDecl `int y;`".to_string(),
        ]);
    }

    #[test]
    fn copy_with_substitutions_rebuilds_only_affected_paths() {
        let file = resolve("class A { int f; int m() { return f + f; } }");
        let sum = find(&file, |k| matches!(k, NodeKind::Binary { .. }));
        let NodeKind::Binary { lhs, rhs, .. } = file.tree.kind(sum) else {
            unreachable!()
        };

        let mut builder = RewriteBuilder::new(&file.tree);
        let renamed = builder.name("g");
        let copy = builder
            .copy_with_substitutions(sum, &HashMap::from([(*lhs, renamed)]))
            .unwrap();
        assert!(matches!(copy, FragmentRef::New(_)));
        let untouched = builder
            .copy_with_substitutions(*rhs, &HashMap::from([(*lhs, renamed)]))
            .unwrap();
        assert_eq!(untouched, FragmentRef::Copy(*rhs));

        builder.replace(sum, copy).unwrap();
        let edit = builder.finish().unwrap();
        assert_eq!(
            edit.apply(&file.tree),
            normalized("class A { int f; int m() { return g + f; } }")
        );
    }

    #[test]
    fn linked_groups_keep_first_use_order() {
        let file = resolve("class A { }");
        let mut builder = RewriteBuilder::new(&file.tree);
        let a = builder.name("a");
        let b = builder.name("b");
        builder.link("b", b, true);
        builder.link("a", a, true);
        builder.link("b", a, false);
        let edit = builder.finish().unwrap();

        assert_eq!(edit.linked_positions().groups(), vec!["b", "a"]);
        assert_eq!(edit.linked_positions().group("b").count(), 2);
    }
}
