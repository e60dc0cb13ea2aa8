//! Import bookkeeping for edits that introduce or drop type references.
//!
//! Requests are collected while a proposal is built and turned into ordinary
//! insert/remove operations on the compilation unit's import list by
//! [`ImportRewrite::apply`].

use vega_syntax::printer;
use vega_syntax::{NodeId, NodeKind, Prop, ResolvedFile, SyntaxTree, Ty, TypeId};

use crate::rewrite::{FragmentRef, InsertPosition, RewriteBuilder, RewriteError};

#[derive(Clone, Debug, PartialEq, Eq)]
struct ExistingImport {
    node: NodeId,
    is_static: bool,
    on_demand: bool,
    path: String,
}

impl ExistingImport {
    fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NewImport {
    is_static: bool,
    path: String,
}

pub struct ImportRewrite<'a> {
    file: &'a ResolvedFile,
    package: String,
    existing: Vec<ExistingImport>,
    added: Vec<NewImport>,
    removed: Vec<NodeId>,
}

impl<'a> ImportRewrite<'a> {
    pub fn new(file: &'a ResolvedFile) -> Self {
        let tree = &file.tree;
        let NodeKind::CompilationUnit {
            package, imports, ..
        } = tree.kind(tree.root())
        else {
            return Self {
                file,
                package: String::new(),
                existing: Vec::new(),
                added: Vec::new(),
                removed: Vec::new(),
            };
        };
        let package = package
            .and_then(|decl| match tree.kind(decl) {
                NodeKind::PackageDecl { name } => Some(dotted(tree, *name)),
                _ => None,
            })
            .unwrap_or_default();
        let existing = imports
            .iter()
            .filter_map(|import| match tree.kind(*import) {
                NodeKind::ImportDecl {
                    is_static,
                    on_demand,
                    name,
                } => Some(ExistingImport {
                    node: *import,
                    is_static: *is_static,
                    on_demand: *on_demand,
                    path: dotted(tree, *name),
                }),
                _ => None,
            })
            .collect();
        Self {
            file,
            package,
            existing,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Makes `def` referable and returns the name to spell it with: the
    /// source name when an import suffices (or none is needed), the qualified
    /// name when the simple name is already taken by another type.
    pub fn add_import(&mut self, def: TypeId) -> String {
        let file = self.file;
        let model = &file.model;
        let source_name = model.source_name(def);
        let top = model.top_level(def);
        let top_symbol = model.type_symbol(top);
        if top_symbol.is_anonymous() || top_symbol.decl.is_some() {
            return source_name;
        }
        let top_path = model.qualified_name(top);
        let simple = top_symbol.name.as_str();

        if top_symbol.package == "java.lang"
            && !self.declares_type(simple)
            && !self.simple_name_taken(simple, &top_path)
        {
            return source_name;
        }
        if top_symbol.package == self.package {
            return source_name;
        }
        let imported = self.existing.iter().any(|import| {
            !import.is_static
                && ((!import.on_demand && import.path == top_path)
                    || (import.on_demand && import.path == top_symbol.package))
        }) || self
            .added
            .iter()
            .any(|import| !import.is_static && import.path == top_path);
        if imported {
            return source_name;
        }
        if self.simple_name_taken(simple, &top_path) || self.declares_type(simple) {
            return model.qualified_name(def);
        }
        self.added.push(NewImport {
            is_static: false,
            path: top_path,
        });
        source_name
    }

    /// Adds `import static Declaring.member;` unless an equivalent import is
    /// present. Returns `false` when nothing needed to be added.
    pub fn add_static_import(&mut self, declaring: TypeId, member: &str) -> bool {
        let owner = self.file.model.qualified_name(declaring);
        let path = format!("{owner}.{member}");
        let present = self.existing.iter().any(|import| {
            import.is_static
                && ((!import.on_demand && import.path == path)
                    || (import.on_demand && import.path == owner))
        }) || self
            .added
            .iter()
            .any(|import| import.is_static && import.path == path);
        if present {
            return false;
        }
        self.added.push(NewImport {
            is_static: true,
            path,
        });
        true
    }

    /// Drops the single-type import of `def`, if the file has one.
    pub fn remove_import(&mut self, def: TypeId) -> bool {
        let path = self.file.model.qualified_name(def);
        let found = self
            .existing
            .iter()
            .find(|import| !import.is_static && !import.on_demand && import.path == path)
            .map(|import| import.node);
        match found {
            Some(node) if !self.removed.contains(&node) => {
                self.removed.push(node);
                true
            }
            _ => false,
        }
    }

    /// A type node spelling `ty`, importing what it references. `None` for
    /// types without a source form (null, unknown, intersections).
    pub fn type_node(&mut self, builder: &mut RewriteBuilder<'_>, ty: &Ty) -> Option<FragmentRef> {
        match ty {
            Ty::Primitive(keyword) => Some(builder.primitive_type(*keyword)),
            Ty::Class { def, args } => {
                let file = self.file;
                let symbol = file.model.type_symbol(*def);
                if symbol.is_anonymous() {
                    let supertype = symbol
                        .interfaces
                        .first()
                        .or(symbol.superclass.as_ref())?
                        .clone();
                    return self.type_node(builder, &supertype);
                }
                let name = self.add_import(*def);
                let base = builder.simple_type(&name);
                if args.is_empty() {
                    return Some(base);
                }
                let args = args
                    .iter()
                    .map(|arg| self.type_node(builder, arg))
                    .collect::<Option<Vec<_>>>()?;
                Some(builder.new_node(NodeKind::ParameterizedType { base, args }))
            }
            Ty::Array(_) => {
                let (element, dims) = ty.element_and_dims();
                let element = self.type_node(builder, element)?;
                let dims = (0..dims)
                    .map(|_| builder.new_node(NodeKind::Dimension))
                    .collect();
                Some(builder.new_node(NodeKind::ArrayType { element, dims }))
            }
            Ty::TypeVar(name) => Some(builder.simple_type(name)),
            Ty::Wildcard { upper, bound } => {
                let bound = match bound {
                    Some(bound) => Some(self.type_node(builder, bound)?),
                    None => None,
                };
                Some(builder.new_node(NodeKind::Wildcard {
                    upper: *upper,
                    bound,
                }))
            }
            Ty::Null | Ty::Intersection(_) | Ty::Unknown => None,
        }
    }

    /// [`type_node`](Self::type_node) for types that must be spelled out.
    pub fn required_type_node(
        &mut self,
        builder: &mut RewriteBuilder<'_>,
        ty: &Ty,
    ) -> Result<FragmentRef, RewriteError> {
        let file = self.file;
        self.type_node(builder, ty)
            .ok_or_else(|| RewriteError::NoSourceForm(file.model.display(ty)))
    }

    /// Records the collected changes in `builder`.
    pub fn apply(&self, builder: &mut RewriteBuilder<'_>) -> Result<(), RewriteError> {
        let root = builder.tree().root();
        for import in &self.added {
            let name = builder.qualified_name(&import.path);
            let decl = builder.new_node(NodeKind::ImportDecl {
                is_static: import.is_static,
                on_demand: false,
                name,
            });
            builder.insert(root, Prop::Imports, InsertPosition::Last, decl)?;
        }
        for node in &self.removed {
            builder.remove(*node)?;
        }
        Ok(())
    }

    fn declares_type(&self, simple: &str) -> bool {
        self.file.model.type_ids().any(|id| {
            let symbol = self.file.model.type_symbol(id);
            symbol.decl.is_some() && symbol.outer.is_none() && symbol.name == simple
        })
    }

    /// Another type with this simple name is already imported.
    fn simple_name_taken(&self, simple: &str, path: &str) -> bool {
        self.existing
            .iter()
            .any(|import| {
                !import.is_static
                    && !import.on_demand
                    && import.simple_name() == simple
                    && import.path != path
            })
            || self.added.iter().any(|import| {
                !import.is_static
                    && import.path.rsplit('.').next() == Some(simple)
                    && import.path != path
            })
    }
}

fn dotted(tree: &SyntaxTree, name: NodeId) -> String {
    printer::print(tree, name)
}
