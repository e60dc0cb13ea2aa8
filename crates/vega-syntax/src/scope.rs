//! Visible declarations at a source position.
//!
//! Walks outward from the innermost node at an offset, collecting locals,
//! parameters, members of enclosing types (inherited ones included), top-level
//! types and imports. Inner declarations shadow outer ones with the same name
//! in the same namespace.

use std::collections::HashSet;
use std::ops::BitOr;

use text_size::TextSize;

use crate::model::{Binding, SemanticModel, TypeId};
use crate::tree::{NodeId, NodeKind, SyntaxTree};
use crate::ResolvedFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeFlags(u8);

impl ScopeFlags {
    pub const VARIABLES: Self = Self(1 << 0);
    pub const METHODS: Self = Self(1 << 1);
    pub const TYPES: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ScopeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Variable,
    Method,
    Type,
}

struct Collector<'a> {
    model: &'a SemanticModel,
    flags: ScopeFlags,
    out: Vec<Binding>,
    /// Names bound by enclosing (already finished) levels.
    shadowed: HashSet<(Namespace, String)>,
    /// Names bound at the level being collected.
    level: HashSet<(Namespace, String)>,
}

impl<'a> Collector<'a> {
    fn namespace(binding: &Binding) -> Option<Namespace> {
        match binding {
            Binding::Var(_) => Some(Namespace::Variable),
            Binding::Method(_) => Some(Namespace::Method),
            Binding::Type(_) | Binding::TypeParam(_) => Some(Namespace::Type),
            Binding::Package(_) => None,
        }
    }

    fn wanted(&self, namespace: Namespace) -> bool {
        match namespace {
            Namespace::Variable => self.flags.contains(ScopeFlags::VARIABLES),
            Namespace::Method => self.flags.contains(ScopeFlags::METHODS),
            Namespace::Type => self.flags.contains(ScopeFlags::TYPES),
        }
    }

    fn add(&mut self, binding: Binding) {
        let Some(namespace) = Self::namespace(&binding) else {
            return;
        };
        if !self.wanted(namespace) {
            return;
        }
        let key = (namespace, binding_name(self.model, &binding));
        if self.shadowed.contains(&key) || self.out.contains(&binding) {
            return;
        }
        self.level.insert(key);
        self.out.push(binding);
    }

    fn end_level(&mut self) {
        self.shadowed.extend(self.level.drain());
    }

    fn type_members(&mut self, def: TypeId) {
        for field in self.model.fields_in_hierarchy(def) {
            self.add(Binding::Var(field));
        }
        for method in self.model.methods_in_hierarchy(def) {
            self.add(Binding::Method(method));
        }
        for ty in self.model.hierarchy(def) {
            for member in &self.model.type_symbol(ty).member_types {
                self.add(Binding::Type(*member));
            }
        }
        if !self.model.type_symbol(def).is_anonymous() {
            self.add(Binding::Type(def));
        }
        for param in &self.model.type_symbol(def).type_params {
            self.add(Binding::TypeParam(param.clone()));
        }
    }
}

/// Simple name a binding introduces.
pub fn binding_name(model: &SemanticModel, binding: &Binding) -> String {
    match binding {
        Binding::Type(id) => model.type_symbol(*id).name.clone(),
        Binding::Method(id) => model.method(*id).name.clone(),
        Binding::Var(id) => model.var(*id).name.clone(),
        Binding::Package(name) | Binding::TypeParam(name) => name.clone(),
    }
}

fn declared_before(tree: &SyntaxTree, node: NodeId, offset: TextSize) -> bool {
    tree.range(node).end() <= offset
}

/// Bindings of the fragments of a local or expression-position declaration.
fn fragment_bindings(
    tree: &SyntaxTree,
    model: &SemanticModel,
    fragments: &[NodeId],
    offset: TextSize,
) -> Vec<Binding> {
    fragments
        .iter()
        .filter(|fragment| declared_before(tree, **fragment, offset))
        .filter_map(|fragment| model.binding(*fragment).cloned())
        .collect()
}

/// Declarations visible at `offset`, innermost first.
pub fn declarations_in_scope(
    file: &ResolvedFile,
    offset: TextSize,
    flags: ScopeFlags,
) -> Vec<Binding> {
    let tree = &file.tree;
    let model = &file.model;
    let mut collector = Collector {
        model,
        flags,
        out: Vec::new(),
        shadowed: HashSet::new(),
        level: HashSet::new(),
    };

    let start = tree.covering_node_at(offset);
    for node in tree.ancestors_with_self(start) {
        match tree.kind(node) {
            NodeKind::Block { statements } => {
                for stmt in statements {
                    if let NodeKind::LocalVarDecl { fragments, .. } = tree.kind(*stmt) {
                        for binding in fragment_bindings(tree, model, fragments, offset) {
                            collector.add(binding);
                        }
                    }
                }
            }
            NodeKind::For { init, .. } => {
                for expr in init {
                    if let NodeKind::VarDeclExpr { fragments, .. } = tree.kind(*expr) {
                        for binding in fragment_bindings(tree, model, fragments, offset) {
                            collector.add(binding);
                        }
                    }
                }
            }
            NodeKind::Try { resources, body, .. } => {
                if tree.range(*body).contains(offset) {
                    for resource in resources {
                        if let NodeKind::VarDeclExpr { fragments, .. } = tree.kind(*resource) {
                            for binding in fragment_bindings(tree, model, fragments, offset) {
                                collector.add(binding);
                            }
                        }
                    }
                }
            }
            NodeKind::ForEach { param, body, .. } => {
                if tree.range(*body).contains_inclusive(offset) {
                    if let Some(binding) = model.binding(*param) {
                        collector.add(binding.clone());
                    }
                }
            }
            NodeKind::CatchClause { param, .. } => {
                if let Some(binding) = model.binding(*param) {
                    collector.add(binding.clone());
                }
            }
            NodeKind::Lambda { params, .. } => {
                for param in params {
                    if let Some(binding) = model.binding(*param) {
                        collector.add(binding.clone());
                    }
                }
            }
            NodeKind::MethodDecl {
                params,
                type_params,
                ..
            } => {
                for param in params {
                    if let Some(binding) = model.binding(*param) {
                        collector.add(binding.clone());
                    }
                }
                for param in type_params {
                    if let NodeKind::TypeParam { name, .. } = tree.kind(*param) {
                        if let Some(ident) = tree.ident(*name) {
                            collector.add(Binding::TypeParam(ident.to_string()));
                        }
                    }
                }
            }
            NodeKind::TypeDecl { .. } | NodeKind::AnonymousBody { .. } => {
                if let Some(def) = model.type_binding(node) {
                    collector.type_members(def);
                }
            }
            NodeKind::CompilationUnit { imports, types, .. } => {
                for ty in types {
                    if let Some(def) = model.type_binding(*ty) {
                        collector.add(Binding::Type(def));
                    }
                }
                collector.end_level();
                for import in imports {
                    import_bindings(tree, model, *import, &mut collector);
                }
            }
            _ => continue,
        }
        collector.end_level();
    }

    collector.out
}

fn import_bindings(
    tree: &SyntaxTree,
    model: &SemanticModel,
    import: NodeId,
    collector: &mut Collector<'_>,
) {
    let NodeKind::ImportDecl {
        is_static,
        on_demand,
        name,
    } = tree.kind(import)
    else {
        return;
    };
    match (is_static, on_demand) {
        (false, false) => {
            if let Some(def) = model.type_binding(*name) {
                collector.add(Binding::Type(def));
            }
        }
        (false, true) => {}
        (true, on_demand) => {
            let (owner, member) = match tree.kind(*name) {
                NodeKind::QualifiedName { qualifier, name } if !on_demand => {
                    (*qualifier, tree.ident(*name))
                }
                _ => (*name, None),
            };
            let Some(def) = model.type_binding(owner) else {
                return;
            };
            let matches = |candidate: &str| member.map_or(true, |m| m == candidate);
            for field in model.fields_in_hierarchy(def) {
                let var = model.var(field);
                if var.is_static() && matches(&var.name) {
                    collector.add(Binding::Var(field));
                }
            }
            for method in model.methods_in_hierarchy(def) {
                let symbol = model.method(method);
                if symbol.is_static() && matches(&symbol.name) {
                    collector.add(Binding::Method(method));
                }
            }
        }
    }
}

/// Names of variables visible at the start of `node`.
pub fn visible_variable_names(file: &ResolvedFile, node: NodeId) -> HashSet<String> {
    let offset = file.tree.range(node).start();
    declarations_in_scope(file, offset, ScopeFlags::VARIABLES)
        .iter()
        .map(|binding| binding_name(&file.model, binding))
        .collect()
}

/// Names of locals and parameters declared anywhere inside `body`.
pub fn declared_local_names(file: &ResolvedFile, body: NodeId) -> HashSet<String> {
    let tree = &file.tree;
    tree.preorder(body)
        .into_iter()
        .filter(|node| {
            matches!(
                tree.kind(*node),
                NodeKind::VarFragment { .. } | NodeKind::Parameter { .. }
            ) && !matches!(
                tree.parent(*node).map(|p| tree.kind(p)),
                Some(NodeKind::FieldDecl { .. })
            )
        })
        .filter_map(|node| file.model.var_binding(node))
        .map(|var| file.model.var(var).name.clone())
        .collect()
}
