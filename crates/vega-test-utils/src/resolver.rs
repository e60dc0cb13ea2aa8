//! Binding resolution for fixture sources.
//!
//! Resolution runs in three passes over every unit (library stubs first, then
//! the fixture): declare types, resolve member signatures, then resolve method
//! and initializer bodies of the fixture. Node-keyed tables are only filled for
//! the fixture's tree; library symbols carry no declaration nodes.

use std::collections::HashMap;

use vega_syntax::{
    BinaryOp, Binding, LiteralKind, MethodId, MethodSymbol, ModifierFlags, NodeId, NodeKind,
    ParamInfo, PrefixOp, Primitive, SemanticModel, SyntaxTree, Ty, TypeDeclKind, TypeId,
    TypeKind, TypeSymbol, VarId, VarKind, VarSymbol,
};

struct Import {
    is_static: bool,
    on_demand: bool,
    path: String,
}

struct Unit<'t> {
    tree: &'t SyntaxTree,
    source: bool,
    package: String,
    imports: Vec<Import>,
    top_level: Vec<TypeId>,
}

#[derive(Clone)]
struct Ctx {
    unit: usize,
    enclosing: Option<TypeId>,
    /// Method type parameters in scope.
    type_vars: Vec<String>,
}

struct Body {
    ctx: Ctx,
    this_type: TypeId,
    scopes: Vec<Vec<(String, VarId)>>,
    return_ty: Option<Ty>,
}

impl Body {
    fn lookup(&self, name: &str) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    fn declare(&mut self, name: String, var: VarId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name, var));
        }
    }
}

/// Result of resolving a name in expression position.
enum Resolved {
    Value(Ty),
    Type(TypeId),
    Package(String),
    Unknown,
}

struct Resolver<'t> {
    units: Vec<Unit<'t>>,
    model: SemanticModel,
    decls: Vec<(usize, NodeId, TypeId)>,
}

/// Resolves `file` against the library `stubs`.
pub fn resolve(stubs: &[SyntaxTree], file: &SyntaxTree) -> SemanticModel {
    let mut units: Vec<Unit<'_>> = stubs.iter().map(|tree| scan_unit(tree, false)).collect();
    units.push(scan_unit(file, true));
    let mut resolver = Resolver {
        units,
        model: SemanticModel::new(),
        decls: Vec::new(),
    };
    resolver.run();
    resolver.model
}

fn name_text(tree: &SyntaxTree, node: NodeId) -> String {
    match tree.kind(node) {
        NodeKind::SimpleName { ident } => ident.clone(),
        NodeKind::QualifiedName { qualifier, name } => {
            format!("{}.{}", name_text(tree, *qualifier), name_text(tree, *name))
        }
        _ => String::new(),
    }
}

/// Rightmost simple name of a (possibly qualified) name.
fn last_name(tree: &SyntaxTree, node: NodeId) -> NodeId {
    match tree.kind(node) {
        NodeKind::QualifiedName { name, .. } => *name,
        _ => node,
    }
}

fn scan_unit(tree: &SyntaxTree, source: bool) -> Unit<'_> {
    let mut package = String::new();
    let mut imports = Vec::new();
    if let NodeKind::CompilationUnit {
        package: pkg,
        imports: import_nodes,
        ..
    } = tree.kind(tree.root())
    {
        if let Some(NodeKind::PackageDecl { name }) = pkg.map(|p| tree.kind(p)) {
            package = name_text(tree, *name);
        }
        for import in import_nodes {
            if let NodeKind::ImportDecl {
                is_static,
                on_demand,
                name,
            } = tree.kind(*import)
            {
                imports.push(Import {
                    is_static: *is_static,
                    on_demand: *on_demand,
                    path: name_text(tree, *name),
                });
            }
        }
    }
    Unit {
        tree,
        source,
        package,
        imports,
        top_level: Vec::new(),
    }
}

fn is_poly(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Lambda { .. }) || kind.is_method_ref()
}

fn contains_type_var(ty: &Ty, vars: &[String]) -> bool {
    match ty {
        Ty::TypeVar(name) => vars.contains(name),
        Ty::Class { args, .. } => args.iter().any(|a| contains_type_var(a, vars)),
        Ty::Array(component) => contains_type_var(component, vars),
        Ty::Wildcard { bound, .. } => bound.as_deref().is_some_and(|b| contains_type_var(b, vars)),
        Ty::Intersection(parts) => parts.iter().any(|p| contains_type_var(p, vars)),
        Ty::Primitive(_) | Ty::Null | Ty::Unknown => false,
    }
}

impl<'t> Resolver<'t> {
    fn run(&mut self) {
        for unit in 0..self.units.len() {
            self.declare_unit(unit);
        }
        let decls = self.decls.clone();
        for (unit, node, id) in &decls {
            self.signatures(*unit, *node, *id);
        }
        let source = self.units.len() - 1;
        self.resolve_imports(source);
        for (unit, node, id) in decls {
            if unit == source {
                self.type_bodies(unit, node, id);
            }
        }
    }

    fn tree(&self, unit: usize) -> &'t SyntaxTree {
        self.units[unit].tree
    }

    fn bind(&mut self, unit: usize, node: NodeId, binding: Binding) {
        if self.units[unit].source {
            self.model.record_binding(node, binding);
        }
    }

    fn record_type(&mut self, unit: usize, node: NodeId, ty: &Ty) {
        if self.units[unit].source && !ty.is_unknown() {
            self.model.record_expr_type(node, ty.clone());
        }
    }

    fn decl(&self, unit: usize, node: NodeId) -> Option<NodeId> {
        self.units[unit].source.then_some(node)
    }

    fn object(&self) -> Ty {
        self.model.object_type().map_or(Ty::Unknown, Ty::class)
    }

    fn string(&self) -> Ty {
        self.model
            .lookup_type("java.lang.String")
            .map_or(Ty::Unknown, Ty::class)
    }

    /// `def` as seen from inside its own declaration.
    fn this_ty(&self, def: TypeId) -> Ty {
        let params = &self.model.type_symbol(def).type_params;
        Ty::generic(def, params.iter().cloned().map(Ty::TypeVar).collect())
    }

    fn enclosing_chain(&self, def: TypeId) -> Vec<TypeId> {
        let mut chain = vec![def];
        let mut current = def;
        while let Some(outer) = self.model.type_symbol(current).outer {
            chain.push(outer);
            current = outer;
        }
        chain
    }

    // --- pass 1: declarations -------------------------------------------

    fn declare_unit(&mut self, unit: usize) {
        let tree = self.tree(unit);
        let NodeKind::CompilationUnit { types, .. } = tree.kind(tree.root()) else {
            return;
        };
        for ty in types {
            if let Some(id) = self.declare_type(unit, *ty, None) {
                self.units[unit].top_level.push(id);
            }
        }
    }

    fn declare_type(&mut self, unit: usize, node: NodeId, outer: Option<TypeId>) -> Option<TypeId> {
        let tree = self.tree(unit);
        let NodeKind::TypeDecl {
            modifiers,
            kind,
            name,
            type_params,
            members,
            ..
        } = tree.kind(node)
        else {
            return None;
        };
        let kind = match kind {
            TypeDeclKind::Class => TypeKind::Class,
            TypeDeclKind::Interface => TypeKind::Interface,
        };
        let mut symbol = TypeSymbol::new(
            tree.ident(*name).unwrap_or_default(),
            self.units[unit].package.clone(),
            kind,
        );
        symbol.modifiers = modifiers.flags;
        symbol.outer = outer;
        symbol.decl = self.decl(unit, node);
        symbol.type_params = type_params
            .iter()
            .filter_map(|p| match tree.kind(*p) {
                NodeKind::TypeParam { name, .. } => tree.ident(*name).map(str::to_string),
                _ => None,
            })
            .collect();
        let id = self.model.add_type(symbol);
        self.bind(unit, node, Binding::Type(id));
        self.bind(unit, *name, Binding::Type(id));
        self.decls.push((unit, node, id));

        for member in members {
            if matches!(tree.kind(*member), NodeKind::TypeDecl { .. }) {
                self.declare_type(unit, *member, Some(id));
            }
        }
        Some(id)
    }

    // --- type references ------------------------------------------------

    fn lookup_type_name(&self, ctx: &Ctx, simple: &str) -> Option<Ty> {
        if ctx.type_vars.iter().any(|v| v == simple) {
            return Some(Ty::TypeVar(simple.to_string()));
        }
        if let Some(enclosing) = ctx.enclosing {
            for def in self.enclosing_chain(enclosing) {
                if self.model.type_symbol(def).type_params.iter().any(|p| p == simple) {
                    return Some(Ty::TypeVar(simple.to_string()));
                }
                for sup in self.model.hierarchy(def) {
                    for member in &self.model.type_symbol(sup).member_types {
                        if self.model.type_symbol(*member).name == simple {
                            return Some(Ty::class(*member));
                        }
                    }
                }
            }
        }

        let unit = &self.units[ctx.unit];
        if let Some(id) = unit
            .top_level
            .iter()
            .find(|id| self.model.type_symbol(**id).name == simple)
        {
            return Some(Ty::class(*id));
        }
        for import in unit.imports.iter().filter(|i| !i.is_static && !i.on_demand) {
            if import.path.rsplit('.').next() == Some(simple) {
                if let Some(id) = self.model.lookup_type(&import.path) {
                    return Some(Ty::class(id));
                }
            }
        }
        let same_package = if unit.package.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{simple}", unit.package)
        };
        if let Some(id) = self.model.lookup_type(&same_package) {
            return Some(Ty::class(id));
        }
        for import in unit.imports.iter().filter(|i| !i.is_static && i.on_demand) {
            if let Some(id) = self.model.lookup_type(&format!("{}.{simple}", import.path)) {
                return Some(Ty::class(id));
            }
        }
        self.model
            .lookup_type(&format!("java.lang.{simple}"))
            .map(Ty::class)
    }

    /// Resolves a (possibly qualified) type name node.
    fn type_name(&mut self, ctx: &Ctx, node: NodeId) -> Option<Ty> {
        let tree = self.tree(ctx.unit);
        let ty = match tree.kind(node) {
            NodeKind::SimpleName { ident } => self.lookup_type_name(ctx, ident),
            NodeKind::QualifiedName { qualifier, name } => {
                let member = tree.ident(*name).unwrap_or_default();
                let outer = match tree.kind(*qualifier) {
                    NodeKind::SimpleName { ident } => self
                        .lookup_type_name(ctx, ident)
                        .and_then(|t| t.class_def()),
                    _ => None,
                };
                let nested = outer.and_then(|outer| {
                    self.model
                        .type_symbol(outer)
                        .member_types
                        .iter()
                        .copied()
                        .find(|m| self.model.type_symbol(*m).name == member)
                });
                match nested {
                    Some(nested) => {
                        if let Some(outer) = outer {
                            self.bind(ctx.unit, *qualifier, Binding::Type(outer));
                        }
                        Some(Ty::class(nested))
                    }
                    None => self
                        .model
                        .lookup_type(&name_text(tree, node))
                        .map(Ty::class),
                }
            }
            _ => None,
        };
        if let Some(def) = ty.as_ref().and_then(Ty::class_def) {
            self.bind(ctx.unit, node, Binding::Type(def));
            let last = last_name(tree, node);
            if last != node {
                self.bind(ctx.unit, last, Binding::Type(def));
            }
        }
        ty
    }

    fn is_var_type(&self, ctx: &Ctx, node: NodeId) -> bool {
        let tree = self.tree(ctx.unit);
        match tree.kind(node) {
            NodeKind::SimpleType { name } => {
                tree.ident(*name) == Some("var") && self.lookup_type_name(ctx, "var").is_none()
            }
            _ => false,
        }
    }

    fn type_of(&mut self, ctx: &Ctx, node: NodeId) -> Ty {
        let tree = self.tree(ctx.unit);
        let ty = match tree.kind(node) {
            NodeKind::PrimitiveType { keyword } => Ty::Primitive(*keyword),
            NodeKind::SimpleType { name } => self.type_name(ctx, *name).unwrap_or(Ty::Unknown),
            NodeKind::ParameterizedType { base, args } => {
                let base = self.type_of(ctx, *base);
                let args = args.iter().map(|a| self.type_of(ctx, *a)).collect();
                match base.class_def() {
                    Some(def) => Ty::generic(def, args),
                    None => Ty::Unknown,
                }
            }
            NodeKind::ArrayType { element, dims } => {
                let mut ty = self.type_of(ctx, *element);
                for _ in dims {
                    ty = Ty::array_of(ty);
                }
                ty
            }
            NodeKind::Wildcard { upper, bound } => Ty::Wildcard {
                upper: *upper,
                bound: bound.map(|b| Box::new(self.type_of(ctx, b))),
            },
            NodeKind::UnionType { alternatives } => {
                let alternatives: Vec<Ty> =
                    alternatives.iter().map(|a| self.type_of(ctx, *a)).collect();
                self.lub(&alternatives)
            }
            _ => Ty::Unknown,
        };
        if let Some(def) = ty.class_def() {
            if matches!(
                tree.kind(node),
                NodeKind::SimpleType { .. } | NodeKind::ParameterizedType { .. }
            ) {
                self.bind(ctx.unit, node, Binding::Type(def));
            }
        }
        ty
    }

    /// Nearest common superclass of the given class types.
    fn lub(&self, types: &[Ty]) -> Ty {
        let defs: Vec<TypeId> = types.iter().filter_map(Ty::class_def).collect();
        let Some((first, rest)) = defs.split_first() else {
            return Ty::Unknown;
        };
        self.model
            .hierarchy(*first)
            .into_iter()
            .find(|candidate| rest.iter().all(|d| self.model.is_subclass_of(*d, *candidate)))
            .map_or(Ty::Unknown, Ty::class)
    }

    // --- pass 2: signatures ---------------------------------------------

    fn signatures(&mut self, unit: usize, node: NodeId, id: TypeId) {
        let tree = self.tree(unit);
        let NodeKind::TypeDecl {
            kind,
            superclass,
            interfaces,
            members,
            ..
        } = tree.kind(node)
        else {
            return;
        };
        let ctx = Ctx {
            unit,
            enclosing: Some(id),
            type_vars: Vec::new(),
        };
        let superclass = superclass.map(|s| self.type_of(&ctx, s));
        let interfaces: Vec<Ty> = interfaces.iter().map(|i| self.type_of(&ctx, *i)).collect();
        let symbol = self.model.type_symbol_mut(id);
        symbol.superclass = superclass;
        symbol.interfaces = interfaces;

        let interface = *kind == TypeDeclKind::Interface;
        self.member_signatures(&ctx, id, members, interface);
    }

    fn member_signatures(&mut self, ctx: &Ctx, owner: TypeId, members: &[NodeId], interface: bool) {
        let tree = self.tree(ctx.unit);
        let mut has_constructor = false;
        for member in members {
            match tree.kind(*member) {
                NodeKind::FieldDecl {
                    modifiers,
                    ty,
                    fragments,
                } => {
                    let field_ty = self.type_of(ctx, *ty);
                    let mut flags = modifiers.flags;
                    if interface {
                        flags.insert(ModifierFlags::PUBLIC | ModifierFlags::STATIC | ModifierFlags::FINAL);
                    }
                    for fragment in fragments {
                        let NodeKind::VarFragment { name, .. } = tree.kind(*fragment) else {
                            continue;
                        };
                        let var = self.model.add_var(VarSymbol {
                            name: tree.ident(*name).unwrap_or_default().to_string(),
                            kind: VarKind::Field,
                            declaring_type: Some(owner),
                            ty: field_ty.clone(),
                            modifiers: flags,
                            decl: self.decl(ctx.unit, *fragment),
                        });
                        self.bind(ctx.unit, *fragment, Binding::Var(var));
                        self.bind(ctx.unit, *name, Binding::Var(var));
                    }
                }
                NodeKind::MethodDecl { return_type, .. } => {
                    has_constructor |= return_type.is_none();
                    self.method_signature(ctx, owner, *member, interface);
                }
                _ => {}
            }
        }

        let symbol = self.model.type_symbol(owner);
        if !has_constructor && symbol.kind == TypeKind::Class {
            let name = symbol.name.clone();
            let return_ty = self.this_ty(owner);
            self.model.add_method(MethodSymbol {
                name,
                declaring: owner,
                type_params: Vec::new(),
                params: Vec::new(),
                return_ty,
                modifiers: ModifierFlags::PUBLIC,
                is_constructor: true,
                varargs: false,
                thrown: Vec::new(),
                decl: None,
            });
        }
    }

    fn method_signature(&mut self, ctx: &Ctx, owner: TypeId, node: NodeId, interface: bool) {
        let tree = self.tree(ctx.unit);
        let NodeKind::MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            params,
            thrown,
            body,
        } = tree.kind(node)
        else {
            return;
        };
        let mut ctx = ctx.clone();
        let method_type_params: Vec<String> = type_params
            .iter()
            .filter_map(|p| match tree.kind(*p) {
                NodeKind::TypeParam { name, .. } => tree.ident(*name).map(str::to_string),
                _ => None,
            })
            .collect();
        ctx.type_vars.extend(method_type_params.iter().cloned());

        let is_constructor = return_type.is_none();
        let return_ty = match return_type {
            Some(ty) => self.type_of(&ctx, *ty),
            None => self.this_ty(owner),
        };

        let mut infos = Vec::new();
        let mut varargs = false;
        let mut param_vars = Vec::new();
        for param in params {
            let NodeKind::Parameter {
                modifiers,
                ty: Some(ty),
                varargs: is_varargs,
                name,
            } = tree.kind(*param)
            else {
                continue;
            };
            let mut param_ty = self.type_of(&ctx, *ty);
            if *is_varargs {
                param_ty = Ty::array_of(param_ty);
                varargs = true;
            }
            let param_name = tree.ident(*name).unwrap_or_default().to_string();
            infos.push(ParamInfo {
                name: param_name.clone(),
                ty: param_ty.clone(),
            });
            param_vars.push((*param, *name, param_name, param_ty, modifiers.flags));
        }

        let thrown = thrown.iter().map(|t| self.type_of(&ctx, *t)).collect();
        let mut flags = modifiers.flags;
        if interface {
            flags.insert(ModifierFlags::PUBLIC);
            if body.is_none() && !flags.contains(ModifierFlags::STATIC) && !flags.contains(ModifierFlags::DEFAULT) {
                flags.insert(ModifierFlags::ABSTRACT);
            }
        }

        let method = self.model.add_method(MethodSymbol {
            name: tree.ident(*name).unwrap_or_default().to_string(),
            declaring: owner,
            type_params: method_type_params,
            params: infos,
            return_ty,
            modifiers: flags,
            is_constructor,
            varargs,
            thrown,
            decl: self.decl(ctx.unit, node),
        });
        self.bind(ctx.unit, node, Binding::Method(method));
        self.bind(ctx.unit, *name, Binding::Method(method));

        if self.units[ctx.unit].source {
            for (param, name_node, param_name, ty, flags) in param_vars {
                let var = self.model.add_var(VarSymbol {
                    name: param_name,
                    kind: VarKind::Parameter,
                    declaring_type: Some(owner),
                    ty,
                    modifiers: flags,
                    decl: Some(param),
                });
                self.bind(ctx.unit, param, Binding::Var(var));
                self.bind(ctx.unit, name_node, Binding::Var(var));
            }
        }
    }

    fn resolve_imports(&mut self, unit: usize) {
        let tree = self.tree(unit);
        let NodeKind::CompilationUnit { imports, .. } = tree.kind(tree.root()) else {
            return;
        };
        for import in imports {
            let NodeKind::ImportDecl {
                is_static,
                on_demand,
                name,
            } = tree.kind(*import)
            else {
                continue;
            };
            let path = name_text(tree, *name);
            match (is_static, on_demand) {
                (false, false) => {
                    if let Some(def) = self.model.lookup_type(&path) {
                        self.bind(unit, *name, Binding::Type(def));
                        self.bind(unit, last_name(tree, *name), Binding::Type(def));
                    }
                }
                (_, true) => {
                    let binding = match self.model.lookup_type(&path) {
                        Some(def) => Binding::Type(def),
                        None => Binding::Package(path),
                    };
                    self.bind(unit, *name, binding);
                }
                (true, false) => {
                    let NodeKind::QualifiedName { qualifier, name: member } = tree.kind(*name) else {
                        continue;
                    };
                    let Some(def) = self.model.lookup_type(&name_text(tree, *qualifier)) else {
                        continue;
                    };
                    self.bind(unit, *qualifier, Binding::Type(def));
                    let member_name = tree.ident(*member).unwrap_or_default();
                    let binding = self
                        .static_field(def, member_name)
                        .map(Binding::Var)
                        .or_else(|| {
                            self.static_methods(def, member_name)
                                .first()
                                .copied()
                                .map(Binding::Method)
                        });
                    if let Some(binding) = binding {
                        self.bind(unit, *name, binding.clone());
                        self.bind(unit, *member, binding);
                    }
                }
            }
        }
    }

    fn static_field(&self, def: TypeId, name: &str) -> Option<VarId> {
        self.model
            .fields_in_hierarchy(def)
            .into_iter()
            .find(|f| {
                let var = self.model.var(*f);
                var.name == name && var.is_static()
            })
    }

    fn static_methods(&self, def: TypeId, name: &str) -> Vec<MethodId> {
        self.model
            .methods_in_hierarchy(def)
            .into_iter()
            .filter(|m| {
                let method = self.model.method(*m);
                method.name == name && method.is_static()
            })
            .collect()
    }

    fn named_methods(&self, def: TypeId, name: &str) -> Vec<MethodId> {
        self.model
            .methods_in_hierarchy(def)
            .into_iter()
            .filter(|m| self.model.method(*m).name == name)
            .collect()
    }

    /// Static members brought in by `import static` declarations.
    fn statically_imported(&self, unit: usize, name: &str) -> (Option<VarId>, Vec<MethodId>) {
        let mut field = None;
        let mut methods = Vec::new();
        for import in self.units[unit].imports.iter().filter(|i| i.is_static) {
            let (owner, member) = if import.on_demand {
                (import.path.as_str(), None)
            } else {
                match import.path.rsplit_once('.') {
                    Some((owner, member)) => (owner, Some(member)),
                    None => continue,
                }
            };
            if member.is_some_and(|m| m != name) {
                continue;
            }
            let Some(def) = self.model.lookup_type(owner) else {
                continue;
            };
            if field.is_none() {
                field = self.static_field(def, name);
            }
            methods.extend(self.static_methods(def, name));
        }
        (field, methods)
    }

    // --- pass 3: bodies -------------------------------------------------

    fn type_bodies(&mut self, unit: usize, node: NodeId, id: TypeId) {
        let tree = self.tree(unit);
        let NodeKind::TypeDecl { members, .. } = tree.kind(node) else {
            return;
        };
        let ctx = Ctx {
            unit,
            enclosing: Some(id),
            type_vars: Vec::new(),
        };
        self.member_bodies(&ctx, id, members, Vec::new());
    }

    fn member_bodies(
        &mut self,
        ctx: &Ctx,
        owner: TypeId,
        members: &[NodeId],
        captured: Vec<Vec<(String, VarId)>>,
    ) {
        let tree = self.tree(ctx.unit);
        for member in members {
            let mut body = Body {
                ctx: ctx.clone(),
                this_type: owner,
                scopes: captured.clone(),
                return_ty: None,
            };
            body.scopes.push(Vec::new());
            match tree.kind(*member) {
                NodeKind::FieldDecl { fragments, .. } => {
                    for fragment in fragments {
                        let NodeKind::VarFragment {
                            initializer: Some(init),
                            ..
                        } = tree.kind(*fragment)
                        else {
                            continue;
                        };
                        let expected = self
                            .model
                            .var_binding(*fragment)
                            .map(|v| self.model.var(v).ty.clone());
                        self.expr(&mut body, *init, expected.as_ref());
                    }
                }
                NodeKind::MethodDecl {
                    type_params,
                    params,
                    body: Some(block),
                    ..
                } => {
                    body.ctx.type_vars.extend(type_params.iter().filter_map(|p| {
                        match tree.kind(*p) {
                            NodeKind::TypeParam { name, .. } => {
                                tree.ident(*name).map(str::to_string)
                            }
                            _ => None,
                        }
                    }));
                    for param in params {
                        if let Some(var) = self.model.var_binding(*param) {
                            body.declare(self.model.var(var).name.clone(), var);
                        }
                    }
                    body.return_ty = self
                        .model
                        .binding(*member)
                        .and_then(Binding::as_method)
                        .map(|m| self.model.method(m))
                        .map(|m| if m.is_constructor { Ty::VOID } else { m.return_ty.clone() });
                    self.stmt(&mut body, *block);
                }
                NodeKind::Initializer { body: block, .. } => {
                    body.return_ty = Some(Ty::VOID);
                    self.stmt(&mut body, *block);
                }
                _ => {}
            }
        }
    }

    fn stmt(&mut self, b: &mut Body, node: NodeId) {
        let tree = self.tree(b.ctx.unit);
        match tree.kind(node) {
            NodeKind::Block { statements } => {
                b.scopes.push(Vec::new());
                for stmt in statements {
                    self.stmt(b, *stmt);
                }
                b.scopes.pop();
            }
            NodeKind::LocalVarDecl { ty, fragments, .. } => {
                self.local_decl(b, *ty, fragments);
            }
            NodeKind::ExprStmt { expr } | NodeKind::Throw { expr } => {
                self.expr(b, *expr, None);
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(b, *condition, Some(&Ty::BOOLEAN));
                self.stmt(b, *then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(b, *else_branch);
                }
            }
            NodeKind::While { condition, body } => {
                self.expr(b, *condition, Some(&Ty::BOOLEAN));
                self.stmt(b, *body);
            }
            NodeKind::For {
                init,
                condition,
                updates,
                body,
            } => {
                b.scopes.push(Vec::new());
                for expr in init {
                    self.expr(b, *expr, None);
                }
                if let Some(condition) = condition {
                    self.expr(b, *condition, Some(&Ty::BOOLEAN));
                }
                for update in updates {
                    self.expr(b, *update, None);
                }
                self.stmt(b, *body);
                b.scopes.pop();
            }
            NodeKind::ForEach {
                param,
                iterable,
                body,
            } => {
                b.scopes.push(Vec::new());
                let iterable_ty = self.expr(b, *iterable, None);
                if let NodeKind::Parameter {
                    ty: Some(ty), name, modifiers, ..
                } = tree.kind(*param)
                {
                    let var_ty = if self.is_var_type(&b.ctx, *ty) {
                        self.model
                            .iteration_element_type(&iterable_ty)
                            .unwrap_or(Ty::Unknown)
                    } else {
                        self.type_of(&b.ctx, *ty)
                    };
                    self.declare_local(b, *param, *name, var_ty, modifiers.flags, VarKind::Local);
                }
                self.stmt(b, *body);
                b.scopes.pop();
            }
            NodeKind::Return { expr } => {
                if let Some(expr) = expr {
                    let expected = b.return_ty.clone().filter(|t| !t.is_void());
                    self.expr(b, *expr, expected.as_ref());
                }
            }
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                b.scopes.push(Vec::new());
                for resource in resources {
                    self.expr(b, *resource, None);
                }
                self.stmt(b, *body);
                b.scopes.pop();
                for catch in catches {
                    let NodeKind::CatchClause { param, body } = tree.kind(*catch) else {
                        continue;
                    };
                    b.scopes.push(Vec::new());
                    if let NodeKind::Parameter {
                        ty: Some(ty), name, modifiers, ..
                    } = tree.kind(*param)
                    {
                        let var_ty = self.type_of(&b.ctx, *ty);
                        self.declare_local(b, *param, *name, var_ty, modifiers.flags, VarKind::Local);
                    }
                    self.stmt(b, *body);
                    b.scopes.pop();
                }
                if let Some(finally) = finally {
                    self.stmt(b, *finally);
                }
            }
            _ => {}
        }
    }

    fn declare_local(
        &mut self,
        b: &mut Body,
        decl: NodeId,
        name: NodeId,
        ty: Ty,
        modifiers: ModifierFlags,
        kind: VarKind,
    ) -> VarId {
        let tree = self.tree(b.ctx.unit);
        let ident = tree.ident(name).unwrap_or_default().to_string();
        let var = self.model.add_var(VarSymbol {
            name: ident.clone(),
            kind,
            declaring_type: Some(b.this_type),
            ty,
            modifiers,
            decl: Some(decl),
        });
        self.bind(b.ctx.unit, decl, Binding::Var(var));
        self.bind(b.ctx.unit, name, Binding::Var(var));
        b.declare(ident, var);
        var
    }

    fn local_decl(&mut self, b: &mut Body, ty: NodeId, fragments: &[NodeId]) {
        let tree = self.tree(b.ctx.unit);
        let inferred = self.is_var_type(&b.ctx, ty);
        let declared = if inferred {
            Ty::Unknown
        } else {
            self.type_of(&b.ctx, ty)
        };
        let modifiers = match tree.parent(ty).map(|p| tree.kind(p)) {
            Some(NodeKind::LocalVarDecl { modifiers, .. })
            | Some(NodeKind::VarDeclExpr { modifiers, .. }) => modifiers.flags,
            _ => ModifierFlags::NONE,
        };
        for fragment in fragments {
            let NodeKind::VarFragment { name, initializer } = tree.kind(*fragment) else {
                continue;
            };
            let var_ty = match (inferred, initializer) {
                (true, Some(init)) => {
                    let ty = self.expr(b, *init, None);
                    if matches!(ty, Ty::Null) {
                        Ty::Unknown
                    } else {
                        ty
                    }
                }
                (true, None) => Ty::Unknown,
                (false, Some(init)) => {
                    self.expr(b, *init, Some(&declared));
                    declared.clone()
                }
                (false, None) => declared.clone(),
            };
            self.declare_local(b, *fragment, *name, var_ty, modifiers, VarKind::Local);
        }
    }

    // --- expressions ----------------------------------------------------

    fn expr(&mut self, b: &mut Body, node: NodeId, expected: Option<&Ty>) -> Ty {
        let ty = self.expr_inner(b, node, expected);
        self.record_type(b.ctx.unit, node, &ty);
        ty
    }

    fn expr_inner(&mut self, b: &mut Body, node: NodeId, expected: Option<&Ty>) -> Ty {
        let tree = self.tree(b.ctx.unit);
        match tree.kind(node) {
            NodeKind::Literal { kind, .. } => match kind {
                LiteralKind::Int => Ty::INT,
                LiteralKind::Long => Ty::Primitive(Primitive::Long),
                LiteralKind::Float => Ty::Primitive(Primitive::Float),
                LiteralKind::Double => Ty::Primitive(Primitive::Double),
                LiteralKind::Char => Ty::Primitive(Primitive::Char),
                LiteralKind::Boolean => Ty::BOOLEAN,
                LiteralKind::String => self.string(),
                LiteralKind::Null => Ty::Null,
            },
            NodeKind::SimpleName { .. } | NodeKind::QualifiedName { .. } => {
                match self.name_expr(b, node) {
                    Resolved::Value(ty) => ty,
                    _ => Ty::Unknown,
                }
            }
            NodeKind::This { qualifier } => match qualifier {
                None => self.this_ty(b.this_type),
                Some(q) => self
                    .type_name(&b.ctx, *q)
                    .and_then(|t| t.class_def())
                    .map_or(Ty::Unknown, |def| self.this_ty(def)),
            },
            NodeKind::FieldAccess { receiver, name } => {
                let receiver_ty = self.expr(b, *receiver, None);
                let ident = tree.ident(*name).unwrap_or_default();
                match self.field_of(&receiver_ty, ident) {
                    Some((var, ty)) => {
                        self.bind(b.ctx.unit, *name, Binding::Var(var));
                        self.record_type(b.ctx.unit, *name, &ty);
                        ty
                    }
                    None => Ty::Unknown,
                }
            }
            NodeKind::MethodCall {
                receiver,
                name,
                args,
                ..
            } => self.method_call(b, node, *receiver, *name, args, expected),
            NodeKind::SuperMethodCall {
                qualifier,
                name,
                args,
                ..
            } => {
                let receiver = match qualifier {
                    Some(q) => self.type_name(&b.ctx, *q),
                    None => self.model.type_symbol(b.this_type).superclass.clone(),
                }
                .unwrap_or_else(|| self.object());
                let ident = tree.ident(*name).unwrap_or_default();
                let candidates = receiver
                    .class_def()
                    .map(|def| self.named_methods(def, ident))
                    .unwrap_or_default();
                self.invoke(b, node, Some(*name), &candidates, &receiver, args, expected)
            }
            NodeKind::New { ty, args, body } => self.creation(b, node, *ty, args, *body, expected),
            NodeKind::ArrayCreation {
                element_ty,
                dims,
                extra_dims,
                initializer,
            } => {
                let mut ty = self.type_of(&b.ctx, *element_ty);
                for dim in dims {
                    self.expr(b, *dim, Some(&Ty::INT));
                }
                for _ in 0..(dims.len() + *extra_dims as usize) {
                    ty = Ty::array_of(ty);
                }
                if let Some(init) = initializer {
                    self.expr(b, *init, Some(&ty));
                }
                ty
            }
            NodeKind::ArrayInit { elements } => {
                let ty = expected.cloned().unwrap_or(Ty::Unknown);
                let component = ty.component().cloned();
                for element in elements {
                    self.expr(b, *element, component.as_ref());
                }
                ty
            }
            NodeKind::ArrayAccess { array, index } => {
                let array_ty = self.expr(b, *array, None);
                self.expr(b, *index, Some(&Ty::INT));
                array_ty.component().cloned().unwrap_or(Ty::Unknown)
            }
            NodeKind::Assign { lhs, rhs, .. } => {
                let lhs_ty = self.expr(b, *lhs, None);
                self.expr(b, *rhs, Some(&lhs_ty));
                lhs_ty
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.expr(b, *lhs, None);
                let rhs_ty = self.expr(b, *rhs, None);
                self.binary_type(*op, &lhs_ty, &rhs_ty)
            }
            NodeKind::Prefix { op, operand } => {
                let ty = self.expr(b, *operand, None);
                match op {
                    PrefixOp::Not => Ty::BOOLEAN,
                    _ => self.model.unboxed(&ty).map_or(ty, Ty::Primitive),
                }
            }
            NodeKind::Postfix { operand, .. } => self.expr(b, *operand, None),
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(b, *condition, Some(&Ty::BOOLEAN));
                let then_ty = self.expr(b, *then_expr, expected);
                let else_ty = self.expr(b, *else_expr, expected);
                if matches!(then_ty, Ty::Null) {
                    else_ty
                } else {
                    then_ty
                }
            }
            NodeKind::Cast { ty, expr } => {
                let cast_ty = self.type_of(&b.ctx, *ty);
                self.expr(b, *expr, Some(&cast_ty));
                cast_ty
            }
            NodeKind::InstanceOf { expr, ty } => {
                self.expr(b, *expr, None);
                self.type_of(&b.ctx, *ty);
                Ty::BOOLEAN
            }
            NodeKind::Paren { expr } => self.expr(b, *expr, expected),
            NodeKind::Lambda { params, body, .. } => self.lambda(b, node, params, *body, expected),
            NodeKind::ExprMethodRef { .. }
            | NodeKind::TypeMethodRef { .. }
            | NodeKind::SuperMethodRef { .. }
            | NodeKind::CreationRef { .. } => self.method_ref(b, node, expected),
            NodeKind::VarDeclExpr { ty, fragments, .. } => {
                self.local_decl(b, *ty, fragments);
                Ty::Unknown
            }
            _ => Ty::Unknown,
        }
    }

    fn binary_type(&self, op: BinaryOp, lhs: &Ty, rhs: &Ty) -> Ty {
        if op.is_comparison() {
            return Ty::BOOLEAN;
        }
        let string = self.string();
        if op == BinaryOp::Add && (*lhs == string || *rhs == string) {
            return string;
        }
        let lhs = self.model.unboxed(lhs).map_or_else(|| lhs.clone(), Ty::Primitive);
        let rhs = self.model.unboxed(rhs).map_or_else(|| rhs.clone(), Ty::Primitive);
        if lhs == Ty::BOOLEAN && rhs == Ty::BOOLEAN {
            return Ty::BOOLEAN;
        }
        let rank = |ty: &Ty| match ty {
            Ty::Primitive(Primitive::Double) => 4,
            Ty::Primitive(Primitive::Float) => 3,
            Ty::Primitive(Primitive::Long) => 2,
            Ty::Primitive(_) => 1,
            _ => 0,
        };
        match rank(&lhs).max(rank(&rhs)) {
            4 => Ty::Primitive(Primitive::Double),
            3 => Ty::Primitive(Primitive::Float),
            2 => Ty::Primitive(Primitive::Long),
            1 => Ty::INT,
            _ => Ty::Unknown,
        }
    }

    fn field_of(&self, receiver: &Ty, name: &str) -> Option<(VarId, Ty)> {
        let def = receiver.class_def()?;
        let field = self
            .model
            .fields_in_hierarchy(def)
            .into_iter()
            .find(|f| self.model.var(*f).name == name)?;
        let symbol = self.model.var(field);
        let ty = match symbol.declaring_type {
            Some(declaring) => self.model.member_type(receiver, declaring, &symbol.ty),
            None => symbol.ty.clone(),
        };
        Some((field, ty))
    }

    fn name_expr(&mut self, b: &mut Body, node: NodeId) -> Resolved {
        let unit = b.ctx.unit;
        let tree = self.tree(unit);
        let resolved = match tree.kind(node) {
            NodeKind::SimpleName { ident } => {
                let (resolved, var) = self.simple_name(b, ident);
                if let Some(var) = var {
                    self.bind(unit, node, Binding::Var(var));
                }
                resolved
            }
            NodeKind::QualifiedName { qualifier, name } => {
                let ident = tree.ident(*name).unwrap_or_default();
                let (resolved, var) = match self.name_expr(b, *qualifier) {
                    Resolved::Value(ty) => match self.field_of(&ty, ident) {
                        Some((var, ty)) => (Resolved::Value(ty), Some(var)),
                        None if ident == "length" && matches!(ty, Ty::Array(_)) => {
                            (Resolved::Value(Ty::INT), None)
                        }
                        None => (Resolved::Unknown, None),
                    },
                    Resolved::Type(def) => match self.field_of(&Ty::class(def), ident) {
                        Some((var, ty)) => (Resolved::Value(ty), Some(var)),
                        None => {
                            let member = self
                                .model
                                .type_symbol(def)
                                .member_types
                                .iter()
                                .copied()
                                .find(|m| self.model.type_symbol(*m).name == ident);
                            (member.map_or(Resolved::Unknown, Resolved::Type), None)
                        }
                    },
                    Resolved::Package(package) => {
                        let path = format!("{package}.{ident}");
                        match self.model.lookup_type(&path) {
                            Some(def) => (Resolved::Type(def), None),
                            None => (Resolved::Package(path), None),
                        }
                    }
                    Resolved::Unknown => (Resolved::Unknown, None),
                };
                let binding = match (&resolved, var) {
                    (_, Some(var)) => Some(Binding::Var(var)),
                    (Resolved::Type(def), None) => Some(Binding::Type(*def)),
                    (Resolved::Package(path), None) => Some(Binding::Package(path.clone())),
                    _ => None,
                };
                if let Some(binding) = binding {
                    self.bind(unit, *name, binding.clone());
                    self.bind(unit, node, binding);
                }
                if let Resolved::Value(ty) = &resolved {
                    self.record_type(unit, *name, ty);
                }
                resolved
            }
            _ => Resolved::Unknown,
        };

        match &resolved {
            Resolved::Value(ty) => self.record_type(unit, node, ty),
            Resolved::Type(def) => self.bind(unit, node, Binding::Type(*def)),
            Resolved::Package(path) => self.bind(unit, node, Binding::Package(path.clone())),
            Resolved::Unknown => {}
        }
        resolved
    }

    /// Locals, then fields of enclosing types, then static imports, then types.
    fn simple_name(&self, b: &Body, ident: &str) -> (Resolved, Option<VarId>) {
        let found = b
            .lookup(ident)
            .map(|var| (var, self.model.var(var).ty.clone()))
            .or_else(|| {
                self.enclosing_chain(b.this_type)
                    .into_iter()
                    .find_map(|def| self.field_of(&self.this_ty(def), ident))
            })
            .or_else(|| {
                self.statically_imported(b.ctx.unit, ident)
                    .0
                    .map(|var| (var, self.model.var(var).ty.clone()))
            });
        if let Some((var, ty)) = found {
            return (Resolved::Value(ty), Some(var));
        }
        match self.lookup_type_name(&b.ctx, ident).and_then(|t| t.class_def()) {
            Some(def) => (Resolved::Type(def), None),
            None => (Resolved::Package(ident.to_string()), None),
        }
    }

    /// Declaration searched for members of `ty`; arrays and type variables
    /// fall back to `Object`.
    fn member_owner(&self, ty: &Ty) -> Option<TypeId> {
        match ty {
            Ty::Array(_) | Ty::TypeVar(_) => self.model.object_type(),
            Ty::Wildcard {
                bound: Some(bound),
                upper: true,
            } => self.member_owner(bound),
            _ => ty.class_def(),
        }
    }

    fn wildcard_bound(&self, ty: Ty) -> Ty {
        match ty {
            Ty::Wildcard {
                bound: Some(bound), ..
            } => *bound,
            Ty::Wildcard { bound: None, .. } => self.object(),
            other => other,
        }
    }

    fn method_call(
        &mut self,
        b: &mut Body,
        node: NodeId,
        receiver: Option<NodeId>,
        name: NodeId,
        args: &[NodeId],
        expected: Option<&Ty>,
    ) -> Ty {
        let tree = self.tree(b.ctx.unit);
        let ident = tree.ident(name).unwrap_or_default();
        let (candidates, receiver_ty) = match receiver {
            None => {
                let found = self
                    .enclosing_chain(b.this_type)
                    .into_iter()
                    .find_map(|def| {
                        let methods = self.named_methods(def, ident);
                        (!methods.is_empty()).then(|| (methods, self.this_ty(def)))
                    });
                match found {
                    Some(found) => found,
                    None => {
                        let methods = self.statically_imported(b.ctx.unit, ident).1;
                        let receiver = methods
                            .first()
                            .map_or(Ty::Unknown, |m| Ty::class(self.model.method(*m).declaring));
                        (methods, receiver)
                    }
                }
            }
            Some(receiver) => {
                let receiver_ty = if tree.kind(receiver).is_name() {
                    match self.name_expr(b, receiver) {
                        Resolved::Value(ty) => ty,
                        Resolved::Type(def) => Ty::class(def),
                        Resolved::Package(_) | Resolved::Unknown => Ty::Unknown,
                    }
                } else {
                    self.expr(b, receiver, None)
                };
                let methods = self
                    .member_owner(&receiver_ty)
                    .map(|def| self.named_methods(def, ident))
                    .unwrap_or_default();
                (methods, receiver_ty)
            }
        };
        self.invoke(b, node, Some(name), &candidates, &receiver_ty, args, expected)
    }

    #[allow(clippy::too_many_arguments)]
    fn invoke(
        &mut self,
        b: &mut Body,
        node: NodeId,
        name: Option<NodeId>,
        candidates: &[MethodId],
        receiver: &Ty,
        args: &[NodeId],
        expected: Option<&Ty>,
    ) -> Ty {
        let unit = b.ctx.unit;
        let tree = self.tree(unit);
        let arg_tys: Vec<Option<Ty>> = args
            .iter()
            .map(|arg| (!is_poly(tree.kind(*arg))).then(|| self.expr(b, *arg, None)))
            .collect();

        let Some(method) = self.select(tree, candidates, receiver, &arg_tys, args) else {
            for (arg, ty) in args.iter().zip(&arg_tys) {
                if ty.is_none() {
                    self.expr(b, *arg, None);
                }
            }
            return Ty::Unknown;
        };

        let symbol = self.model.method(method).clone();
        let params = self.model.parameter_types(receiver, method);
        let vars = &symbol.type_params;
        let mut inferred = HashMap::new();
        for (idx, arg_ty) in arg_tys.iter().enumerate() {
            let Some(arg_ty) = arg_ty else {
                continue;
            };
            if let Some(param) = param_for_arg(&params, symbol.varargs, idx, args.len(), arg_ty) {
                self.unify(&param, arg_ty, vars, &mut inferred);
            }
        }
        let ret = if symbol.is_constructor {
            receiver.clone()
        } else {
            self.model.return_type(receiver, method)
        };
        if let Some(expected) = expected {
            if contains_type_var(&ret, vars) {
                self.unify(&ret, expected, vars, &mut inferred);
            }
        }
        let resolved_vars: Vec<Ty> = vars
            .iter()
            .map(|v| inferred.get(v).cloned().unwrap_or_else(|| self.object()))
            .collect();

        for (idx, (arg, arg_ty)) in args.iter().zip(&arg_tys).enumerate() {
            match arg_ty {
                None => {
                    let param = param_for_arg(&params, symbol.varargs, idx, args.len(), &Ty::Unknown)
                        .map(|p| p.substitute(vars, &resolved_vars));
                    self.expr(b, *arg, param.as_ref());
                }
                // Anonymous classes are typed up front; only their target is recorded here.
                Some(arg_ty) if matches!(tree.kind(*arg), NodeKind::New { body: Some(_), .. }) => {
                    let param = param_for_arg(&params, symbol.varargs, idx, args.len(), arg_ty)
                        .map(|p| p.substitute(vars, &resolved_vars));
                    if let (Some(param), true) = (param, self.units[unit].source) {
                        self.model.record_target_type(*arg, param);
                    }
                }
                Some(_) => {}
            }
        }

        if self.units[unit].source {
            self.model.record_method_binding(node, method);
        }
        if let Some(name) = name {
            self.bind(unit, name, Binding::Method(method));
        }
        ret.substitute(vars, &resolved_vars)
    }

    fn select(
        &self,
        tree: &SyntaxTree,
        candidates: &[MethodId],
        receiver: &Ty,
        arg_tys: &[Option<Ty>],
        args: &[NodeId],
    ) -> Option<MethodId> {
        for expand in [false, true] {
            let found: Vec<MethodId> = candidates
                .iter()
                .copied()
                .filter(|m| self.applicable(tree, *m, receiver, arg_tys, args, expand))
                .collect();
            if !found.is_empty() {
                return Some(self.most_specific(&found, receiver));
            }
        }
        candidates
            .iter()
            .copied()
            .find(|m| self.model.method(*m).param_count() == args.len())
    }

    fn applicable(
        &self,
        tree: &SyntaxTree,
        method: MethodId,
        receiver: &Ty,
        arg_tys: &[Option<Ty>],
        args: &[NodeId],
        expand: bool,
    ) -> bool {
        let symbol = self.model.method(method);
        let params = self.model.parameter_types(receiver, method);
        let n = args.len();
        if expand {
            if !symbol.varargs || n + 1 < params.len() {
                return false;
            }
        } else if params.len() != n {
            return false;
        }
        for (idx, arg) in args.iter().enumerate() {
            let param = if expand && idx + 1 >= params.len() {
                params.last().and_then(Ty::component).cloned()
            } else {
                params.get(idx).cloned()
            };
            let Some(param) = param else {
                return false;
            };
            let compatible = match &arg_tys[idx] {
                None => self.poly_compatible(tree.kind(*arg), &param),
                Some(arg_ty) if arg_ty.is_unknown() => true,
                Some(arg_ty) => self
                    .model
                    .is_assignment_compatible(arg_ty, &self.erase(&param)),
            };
            if !compatible {
                return false;
            }
        }
        true
    }

    /// Drops type arguments and replaces type variables with `Object`.
    fn erase(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Class { def, .. } => Ty::class(*def),
            Ty::Array(component) => Ty::array_of(self.erase(component)),
            Ty::TypeVar(_) | Ty::Wildcard { .. } => self.object(),
            other => other.clone(),
        }
    }

    fn poly_compatible(&self, kind: &NodeKind, param: &Ty) -> bool {
        if matches!(param, Ty::TypeVar(_)) {
            return true;
        }
        let Some(functional) = self.model.functional_method(param) else {
            return false;
        };
        match kind {
            NodeKind::Lambda { params, .. } => {
                params.len() == self.model.method(functional).param_count()
            }
            _ => true,
        }
    }

    fn most_specific(&self, found: &[MethodId], receiver: &Ty) -> MethodId {
        found
            .iter()
            .copied()
            .find(|m| {
                found
                    .iter()
                    .all(|other| other == m || self.more_specific(*m, *other, receiver))
            })
            .unwrap_or(found[0])
    }

    fn more_specific(&self, method: MethodId, other: MethodId, receiver: &Ty) -> bool {
        let params = self.model.parameter_types(receiver, method);
        let other_params = self.model.parameter_types(receiver, other);
        params.len() == other_params.len()
            && params.iter().zip(&other_params).all(|(p, o)| {
                self.model
                    .is_assignment_compatible(&self.erase(p), &self.erase(o))
            })
    }

    fn unify(&self, param: &Ty, arg: &Ty, vars: &[String], inferred: &mut HashMap<String, Ty>) {
        match param {
            Ty::TypeVar(var) if vars.contains(var) => {
                let ty = match arg {
                    Ty::Primitive(p) => self.model.boxed(*p),
                    Ty::Null | Ty::Unknown => None,
                    Ty::Wildcard { bound, .. } => bound.as_deref().cloned(),
                    other => Some(other.clone()),
                };
                if let Some(ty) = ty {
                    inferred.entry(var.clone()).or_insert(ty);
                }
            }
            Ty::Class { def, args } if !args.is_empty() => {
                if let Some(found) = self.model.find_supertype(arg, *def) {
                    for (p, a) in args.iter().zip(found.type_args()) {
                        self.unify(p, a, vars, inferred);
                    }
                }
            }
            Ty::Array(component) => {
                if let Some(arg) = arg.component() {
                    self.unify(component, arg, vars, inferred);
                }
            }
            Ty::Wildcard {
                bound: Some(bound), ..
            } => self.unify(bound, arg, vars, inferred),
            _ => {}
        }
    }

    fn creation(
        &mut self,
        b: &mut Body,
        node: NodeId,
        ty: NodeId,
        args: &[NodeId],
        body: Option<NodeId>,
        expected: Option<&Ty>,
    ) -> Ty {
        let tree = self.tree(b.ctx.unit);
        let mut created = self.type_of(&b.ctx, ty);
        let diamond = matches!(tree.kind(ty), NodeKind::ParameterizedType { args, .. } if args.is_empty());
        if diamond {
            if let Some(def) = created.class_def() {
                created = self.infer_diamond(def, expected);
            }
        }
        let Some(def) = created.class_def() else {
            for arg in args {
                self.expr(b, *arg, None);
            }
            return Ty::Unknown;
        };

        let interface = self.model.type_symbol(def).is_interface();
        if interface {
            for arg in args {
                self.expr(b, *arg, None);
            }
        } else {
            let constructors = self.model.constructors(def);
            self.invoke(b, node, None, &constructors, &created, args, None);
        }
        if let Some(body) = body {
            if let Some(expected) = expected {
                if self.units[b.ctx.unit].source {
                    self.model.record_target_type(node, expected.clone());
                }
            }
            self.anonymous(b, body, created.clone(), interface);
        }
        created
    }

    fn infer_diamond(&self, def: TypeId, expected: Option<&Ty>) -> Ty {
        let params = self.model.type_symbol(def).type_params.clone();
        let mut inferred = HashMap::new();
        if let Some(expected) = expected {
            if let Some(target) = expected.class_def() {
                if let Some(sup) = self.model.find_supertype(&self.this_ty(def), target) {
                    self.unify(&sup, expected, &params, &mut inferred);
                }
            }
        }
        Ty::generic(
            def,
            params
                .iter()
                .map(|p| inferred.get(p).cloned().unwrap_or_else(|| self.object()))
                .collect(),
        )
    }

    fn anonymous(&mut self, b: &mut Body, body: NodeId, created: Ty, interface: bool) {
        let unit = b.ctx.unit;
        let tree = self.tree(unit);
        let NodeKind::AnonymousBody { members } = tree.kind(body) else {
            return;
        };
        let mut symbol = TypeSymbol::new("", self.units[unit].package.clone(), TypeKind::Anonymous);
        symbol.outer = Some(b.this_type);
        symbol.decl = Some(body);
        if interface {
            symbol.interfaces = vec![created];
        } else {
            symbol.superclass = Some(created);
        }
        let id = self.model.add_type(symbol);
        self.bind(unit, body, Binding::Type(id));

        let ctx = Ctx {
            unit,
            enclosing: Some(id),
            type_vars: b.ctx.type_vars.clone(),
        };
        self.member_signatures(&ctx, id, members, false);
        self.member_bodies(&ctx, id, members, b.scopes.clone());
    }

    fn lambda(
        &mut self,
        b: &mut Body,
        node: NodeId,
        params: &[NodeId],
        body: NodeId,
        expected: Option<&Ty>,
    ) -> Ty {
        let unit = b.ctx.unit;
        let tree = self.tree(unit);
        let target = expected
            .filter(|t| self.model.functional_method(t).is_some())
            .cloned();
        let (param_tys, ret) = match target
            .as_ref()
            .and_then(|t| Some((t, self.model.functional_method(t)?)))
        {
            Some((t, method)) => (
                self.model
                    .parameter_types(t, method)
                    .into_iter()
                    .map(|p| self.wildcard_bound(p))
                    .collect(),
                Some(self.wildcard_bound(self.model.return_type(t, method))),
            ),
            None => (Vec::new(), None),
        };

        b.scopes.push(Vec::new());
        for (idx, param) in params.iter().enumerate() {
            let NodeKind::Parameter {
                ty, name, modifiers, ..
            } = tree.kind(*param)
            else {
                continue;
            };
            let declared = match ty {
                Some(ty) if !self.is_var_type(&b.ctx, *ty) => self.type_of(&b.ctx, *ty),
                _ => param_tys.get(idx).cloned().unwrap_or(Ty::Unknown),
            };
            self.declare_local(b, *param, *name, declared, modifiers.flags, VarKind::Parameter);
        }
        let saved = std::mem::replace(&mut b.return_ty, ret.clone());
        if matches!(tree.kind(body), NodeKind::Block { .. }) {
            self.stmt(b, body);
        } else {
            let expected = ret.filter(|t| !t.is_void());
            self.expr(b, body, expected.as_ref());
        }
        b.return_ty = saved;
        b.scopes.pop();

        match target {
            Some(target) => {
                if self.units[unit].source {
                    self.model.record_target_type(node, target.clone());
                }
                target
            }
            None => Ty::Unknown,
        }
    }

    fn method_ref(&mut self, b: &mut Body, node: NodeId, expected: Option<&Ty>) -> Ty {
        let unit = b.ctx.unit;
        let tree = self.tree(unit);
        let target = expected
            .filter(|t| self.model.functional_method(t).is_some())
            .cloned();
        let arity = target
            .as_ref()
            .and_then(|t| self.model.functional_method(t))
            .map(|m| self.model.method(m).param_count());

        let (method, name) = match tree.kind(node) {
            NodeKind::ExprMethodRef { expr, name, .. } => {
                let ident = tree.ident(*name).unwrap_or_default();
                let found = if tree.kind(*expr).is_name() {
                    match self.name_expr(b, *expr) {
                        Resolved::Type(def) => self.type_ref_method(def, ident, arity),
                        Resolved::Value(ty) => self.instance_ref_method(&ty, ident, arity),
                        Resolved::Package(_) | Resolved::Unknown => None,
                    }
                } else {
                    let ty = self.expr(b, *expr, None);
                    self.instance_ref_method(&ty, ident, arity)
                };
                (found, Some(*name))
            }
            NodeKind::TypeMethodRef { ty, name, .. } => {
                let ident = tree.ident(*name).unwrap_or_default();
                let ty = self.type_of(&b.ctx, *ty);
                let found = self
                    .member_owner(&ty)
                    .and_then(|def| self.type_ref_method(def, ident, arity));
                (found, Some(*name))
            }
            NodeKind::SuperMethodRef {
                qualifier, name, ..
            } => {
                let ident = tree.ident(*name).unwrap_or_default();
                let receiver = match qualifier {
                    Some(q) => self.type_name(&b.ctx, *q),
                    None => self.model.type_symbol(b.this_type).superclass.clone(),
                }
                .unwrap_or_else(|| self.object());
                (self.instance_ref_method(&receiver, ident, arity), Some(*name))
            }
            NodeKind::CreationRef { ty, .. } => {
                let ty = self.type_of(&b.ctx, *ty);
                let found = match ty {
                    Ty::Class { def, .. } => self
                        .model
                        .constructors(def)
                        .into_iter()
                        .find(|c| arity.map_or(true, |n| self.model.method(*c).param_count() == n)),
                    _ => None,
                };
                (found, None)
            }
            _ => (None, None),
        };

        if let Some(method) = method {
            if self.units[unit].source {
                self.model.record_method_binding(node, method);
            }
            if let Some(name) = name {
                self.bind(unit, name, Binding::Method(method));
            }
        }
        match target {
            Some(target) => {
                if self.units[unit].source {
                    self.model.record_target_type(node, target.clone());
                }
                target
            }
            None => Ty::Unknown,
        }
    }

    /// `Type::name`: a static method taking every functional parameter, or an
    /// instance method whose receiver is the first one.
    fn type_ref_method(&self, def: TypeId, name: &str, arity: Option<usize>) -> Option<MethodId> {
        let methods = self.named_methods(def, name);
        let Some(n) = arity else {
            return methods.first().copied();
        };
        methods
            .iter()
            .copied()
            .find(|m| {
                let symbol = self.model.method(*m);
                symbol.is_static() && symbol.param_count() == n
            })
            .or_else(|| {
                methods.iter().copied().find(|m| {
                    let symbol = self.model.method(*m);
                    !symbol.is_static() && n > 0 && symbol.param_count() == n - 1
                })
            })
    }

    fn instance_ref_method(&self, ty: &Ty, name: &str, arity: Option<usize>) -> Option<MethodId> {
        let def = self.member_owner(ty)?;
        let methods = self.named_methods(def, name);
        match arity {
            Some(n) => methods
                .into_iter()
                .find(|m| self.model.method(*m).param_count() == n),
            None => methods.first().copied(),
        }
    }
}

/// Formal parameter type matched against argument `idx` of `n`. Variable
/// arity methods spread trailing arguments over the array component unless a
/// single array is passed in the last position.
fn param_for_arg(params: &[Ty], varargs: bool, idx: usize, n: usize, arg: &Ty) -> Option<Ty> {
    let last = params.len().checked_sub(1)?;
    if varargs && idx >= last {
        let direct = n == params.len() && matches!(arg, Ty::Array(_) | Ty::Null);
        if !direct {
            return params[last].component().cloned();
        }
    }
    params.get(idx).cloned()
}

#[cfg(test)]
mod tests {
    use vega_syntax::{scope, Binding, NodeKind, ScopeFlags, Ty, VarKind};

    use crate::resolve;

    fn find_name(file: &vega_syntax::ResolvedFile, ident: &str, nth: usize) -> vega_syntax::NodeId {
        file.tree
            .preorder(file.tree.root())
            .into_iter()
            .filter(|n| file.tree.ident(*n) == Some(ident))
            .nth(nth)
            .unwrap_or_else(|| panic!("no occurrence {nth} of `{ident}`"))
    }

    #[test]
    fn locals_resolve_to_their_declaration() {
        let file = resolve(
            "class A {\n    int f;\n    void m(int p) {\n        int x = p + f;\n        x++;\n    }\n}\n",
        );
        let decl = file.model.var_binding(find_name(&file, "x", 0)).unwrap();
        let usage = file.model.var_binding(find_name(&file, "x", 1)).unwrap();
        assert_eq!(decl, usage);
        assert_eq!(file.model.var(decl).kind, VarKind::Local);
        assert_eq!(file.model.var(decl).ty, Ty::INT);

        let p = file.model.var_binding(find_name(&file, "p", 1)).unwrap();
        assert!(file.model.var(p).is_parameter());
        let f = file.model.var_binding(find_name(&file, "f", 1)).unwrap();
        assert!(file.model.var(f).is_field());
    }

    #[test]
    fn generic_calls_substitute_receiver_arguments() {
        let file = resolve(
            "import java.util.*;\nclass A {\n    void m(List<String> names) {\n        var first = names.get(0);\n    }\n}\n",
        );
        let first = file.model.var_binding(find_name(&file, "first", 0)).unwrap();
        assert_eq!(file.model.display(&file.model.var(first).ty), "String");
        let call = file.tree.parent(find_name(&file, "get", 0)).unwrap();
        assert!(file.model.method_binding(call).is_some());
    }

    #[test]
    fn diamond_takes_arguments_from_the_declared_type() {
        let file = resolve(
            "import java.util.*;\nclass A {\n    Map<String, Integer> counts = new HashMap<>();\n}\n",
        );
        let creation = file
            .tree
            .ids()
            .find(|n| matches!(file.tree.kind(*n), NodeKind::New { .. }))
            .unwrap();
        let ty = file.model.expr_type(creation).unwrap();
        assert_eq!(file.model.display(ty), "HashMap<String, Integer>");
    }

    #[test]
    fn lambdas_record_their_target_type() {
        let file = resolve(
            "import java.util.function.*;\nclass A {\n    Function<String, Integer> f = s -> s.length();\n}\n",
        );
        let lambda = file
            .tree
            .ids()
            .find(|n| matches!(file.tree.kind(*n), NodeKind::Lambda { .. }))
            .unwrap();
        let target = file.model.target_type(lambda).unwrap();
        assert_eq!(file.model.display(target), "Function<String, Integer>");
        let s = file.model.var_binding(find_name(&file, "s", 1)).unwrap();
        assert_eq!(file.model.display(&file.model.var(s).ty), "String");
    }

    #[test]
    fn anonymous_creations_record_their_target_type() {
        let file = resolve(
            "class A {\n    Object o = new Runnable() {\n        public void run() {}\n    };\n    void m() {\n        new Thread(new Runnable() {\n            public void run() {}\n        });\n        new Runnable() {\n            public void run() {}\n        };\n    }\n}\n",
        );
        let targets: Vec<Option<String>> = file
            .tree
            .ids()
            .filter(|n| {
                matches!(
                    file.tree.kind(*n),
                    NodeKind::New { body: Some(_), .. }
                )
            })
            .map(|n| file.model.target_type(n).map(|t| file.model.display(t)))
            .collect();
        assert_eq!(
            targets,
            vec![Some("Object".to_string()), Some("Runnable".to_string()), None]
        );
    }

    #[test]
    fn static_method_refs_bind_by_arity() {
        let file = resolve(
            "import java.util.*;\nclass A {\n    Comparator<Integer> c = Integer::compare;\n}\n",
        );
        let name = find_name(&file, "compare", 0);
        let Some(Binding::Method(method)) = file.model.binding(name) else {
            panic!("method reference did not bind");
        };
        assert!(file.model.method(*method).is_static());
    }

    #[test]
    fn anonymous_classes_extend_their_created_type() {
        let file = resolve(
            "class A {\n    Runnable r = new Runnable() {\n        public void run() {}\n    };\n}\n",
        );
        let body = file
            .tree
            .ids()
            .find(|n| matches!(file.tree.kind(*n), NodeKind::AnonymousBody { .. }))
            .unwrap();
        let anon = file.model.type_binding(body).unwrap();
        let symbol = file.model.type_symbol(anon);
        assert!(symbol.is_anonymous());
        assert_eq!(symbol.interfaces.len(), 1);
    }

    #[test]
    fn overloads_prefer_the_most_specific_candidate() {
        let file = resolve(
            "class A {\n    void m(String s) {\n        System.out.println(s);\n    }\n}\n",
        );
        let call = file.tree.parent(find_name(&file, "println", 0)).unwrap();
        let method = file.model.method_binding(call).unwrap();
        let param = &file.model.method(method).params[0].ty;
        assert_eq!(file.model.display(param), "String");
    }

    #[test]
    fn multi_catch_parameters_get_the_common_superclass() {
        let file = resolve(
            "import java.io.*;\nclass A {\n    void m() {\n        try {\n            new FileInputStream(\"f\");\n        } catch (FileNotFoundException | EOFException e) {\n        }\n    }\n}\n",
        );
        let e = file.model.var_binding(find_name(&file, "e", 0)).unwrap();
        assert_eq!(file.model.display(&file.model.var(e).ty), "IOException");
    }

    #[test]
    fn scope_lists_declarations_visible_at_an_offset() {
        let file = resolve(
            "class A {\n    int f;\n    void m(int p) {\n        int a = 1;\n        int b = a;\n        int c = 2;\n    }\n}\n",
        );
        let offset = file.tree.range(find_name(&file, "a", 1)).start();
        let names: Vec<String> = scope::declarations_in_scope(&file, offset, ScopeFlags::VARIABLES)
            .iter()
            .map(|b| scope::binding_name(&file.model, b))
            .collect();
        for visible in ["a", "p", "f"] {
            assert!(names.iter().any(|n| n == visible), "{visible} missing from {names:?}");
        }
        assert!(!names.iter().any(|n| n == "b" || n == "c"), "{names:?}");
    }
}
