//! Resolved symbols and the node-keyed lookup tables produced by the front end.
//!
//! The model is read-only for consumers: the front end populates it once per
//! file and assists only query it.

use std::collections::HashMap;
use std::fmt;

use crate::tree::{ModifierFlags, NodeId};
use crate::ty::Ty;

macro_rules! symbol_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_raw(raw: u32) -> Self {
                $name(raw)
            }

            #[must_use]
            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

symbol_id!(TypeId);
symbol_id!(MethodId);
symbol_id!(VarId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Anonymous,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSymbol {
    /// Simple name; empty for anonymous classes.
    pub name: String,
    pub package: String,
    pub kind: TypeKind,
    pub modifiers: ModifierFlags,
    pub type_params: Vec<String>,
    pub superclass: Option<Ty>,
    pub interfaces: Vec<Ty>,
    pub fields: Vec<VarId>,
    pub methods: Vec<MethodId>,
    pub member_types: Vec<TypeId>,
    pub outer: Option<TypeId>,
    pub decl: Option<NodeId>,
}

impl TypeSymbol {
    pub fn new(name: impl Into<String>, package: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            kind,
            modifiers: ModifierFlags::NONE,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
            outer: None,
            decl: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == TypeKind::Anonymous
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(ModifierFlags::PRIVATE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: Ty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSymbol {
    pub name: String,
    pub declaring: TypeId,
    pub type_params: Vec<String>,
    pub params: Vec<ParamInfo>,
    pub return_ty: Ty,
    pub modifiers: ModifierFlags,
    pub is_constructor: bool,
    pub varargs: bool,
    pub thrown: Vec<Ty>,
    pub decl: Option<NodeId>,
}

impl MethodSymbol {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(ModifierFlags::STATIC)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Local,
    Parameter,
    Field,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarSymbol {
    pub name: String,
    pub kind: VarKind,
    pub declaring_type: Option<TypeId>,
    pub ty: Ty,
    pub modifiers: ModifierFlags,
    pub decl: Option<NodeId>,
}

impl VarSymbol {
    pub fn is_field(&self) -> bool {
        self.kind == VarKind::Field
    }

    pub fn is_parameter(&self) -> bool {
        self.kind == VarKind::Parameter
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(ModifierFlags::STATIC)
    }
}

/// What a name or declaration node resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Type(TypeId),
    Method(MethodId),
    Var(VarId),
    Package(String),
    TypeParam(String),
}

impl Binding {
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Binding::Var(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Binding::Type(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<MethodId> {
        match self {
            Binding::Method(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SemanticModel {
    types: Vec<TypeSymbol>,
    methods: Vec<MethodSymbol>,
    vars: Vec<VarSymbol>,
    type_index: HashMap<String, TypeId>,
    bindings: HashMap<NodeId, Binding>,
    expr_types: HashMap<NodeId, Ty>,
    method_bindings: HashMap<NodeId, MethodId>,
    target_types: HashMap<NodeId, Ty>,
}

impl SemanticModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, symbol: TypeSymbol) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        let outer = symbol.outer;
        let anonymous = symbol.is_anonymous();
        self.types.push(symbol);
        if !anonymous {
            if let Some(outer) = outer {
                self.types[outer.idx()].member_types.push(id);
            }
            let qualified = self.qualified_name(id);
            self.type_index.insert(qualified, id);
        }
        id
    }

    /// Registers a method and attaches it to its declaring type.
    pub fn add_method(&mut self, symbol: MethodSymbol) -> MethodId {
        let id = MethodId::from_raw(self.methods.len() as u32);
        self.types[symbol.declaring.idx()].methods.push(id);
        self.methods.push(symbol);
        id
    }

    /// Registers a variable; fields are attached to their declaring type.
    pub fn add_var(&mut self, symbol: VarSymbol) -> VarId {
        let id = VarId::from_raw(self.vars.len() as u32);
        if let (VarKind::Field, Some(owner)) = (symbol.kind, symbol.declaring_type) {
            self.types[owner.idx()].fields.push(id);
        }
        self.vars.push(symbol);
        id
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.idx()]
    }

    pub fn type_symbol_mut(&mut self, id: TypeId) -> &mut TypeSymbol {
        &mut self.types[id.idx()]
    }

    pub fn method(&self, id: MethodId) -> &MethodSymbol {
        &self.methods[id.idx()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodSymbol {
        &mut self.methods[id.idx()]
    }

    pub fn var(&self, id: VarId) -> &VarSymbol {
        &self.vars[id.idx()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut VarSymbol {
        &mut self.vars[id.idx()]
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(|idx| TypeId::from_raw(idx as u32))
    }

    pub fn lookup_type(&self, qualified_name: &str) -> Option<TypeId> {
        self.type_index.get(qualified_name).copied()
    }

    /// Dotted name (`java.util.Map.Entry`); anonymous classes yield their
    /// enclosing type's name.
    pub fn qualified_name(&self, id: TypeId) -> String {
        let symbol = self.type_symbol(id);
        match symbol.outer {
            Some(outer) if symbol.is_anonymous() => self.qualified_name(outer),
            Some(outer) => format!("{}.{}", self.qualified_name(outer), symbol.name),
            None if symbol.package.is_empty() => symbol.name.clone(),
            None => format!("{}.{}", symbol.package, symbol.name),
        }
    }

    /// Name as written in source when the type is in scope (`Map.Entry`).
    pub fn source_name(&self, id: TypeId) -> String {
        let symbol = self.type_symbol(id);
        match symbol.outer {
            Some(outer) if !symbol.is_anonymous() => {
                format!("{}.{}", self.source_name(outer), symbol.name)
            }
            _ => symbol.name.clone(),
        }
    }

    /// Outermost enclosing type.
    pub fn top_level(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let Some(outer) = self.type_symbol(current).outer {
            current = outer;
        }
        current
    }

    pub fn record_binding(&mut self, node: NodeId, binding: Binding) {
        self.bindings.insert(node, binding);
    }

    pub fn binding(&self, node: NodeId) -> Option<&Binding> {
        self.bindings.get(&node)
    }

    pub fn var_binding(&self, node: NodeId) -> Option<VarId> {
        self.binding(node).and_then(Binding::as_var)
    }

    pub fn type_binding(&self, node: NodeId) -> Option<TypeId> {
        self.binding(node).and_then(Binding::as_type)
    }

    pub fn record_expr_type(&mut self, node: NodeId, ty: Ty) {
        self.expr_types.insert(node, ty);
    }

    pub fn expr_type(&self, node: NodeId) -> Option<&Ty> {
        self.expr_types.get(&node)
    }

    pub fn record_method_binding(&mut self, node: NodeId, method: MethodId) {
        self.method_bindings.insert(node, method);
    }

    /// Method behind an invocation, method reference or constructor call.
    pub fn method_binding(&self, node: NodeId) -> Option<MethodId> {
        self.method_bindings.get(&node).copied()
    }

    pub fn record_target_type(&mut self, node: NodeId, ty: Ty) {
        self.target_types.insert(node, ty);
    }

    /// Type a lambda, method reference or anonymous class creation is
    /// assigned to, passed as or returned as. Absent outside such contexts.
    pub fn target_type(&self, node: NodeId) -> Option<&Ty> {
        self.target_types.get(&node)
    }

    /// Declaration node of a binding, if it was declared in this file.
    pub fn declaring_node(&self, binding: &Binding) -> Option<NodeId> {
        match binding {
            Binding::Type(id) => self.type_symbol(*id).decl,
            Binding::Method(id) => self.method(*id).decl,
            Binding::Var(id) => self.var(*id).decl,
            Binding::Package(_) | Binding::TypeParam(_) => None,
        }
    }

    /// Source rendering of `ty` using simple names.
    pub fn display(&self, ty: &Ty) -> String {
        match ty {
            Ty::Primitive(p) => p.keyword().to_string(),
            Ty::Null => "null".to_string(),
            Ty::Class { def, args } => {
                let mut out = self.source_name(*def);
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| self.display(a)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
            Ty::Array(component) => format!("{}[]", self.display(component)),
            Ty::TypeVar(name) => name.clone(),
            Ty::Wildcard { bound: None, .. } => "?".to_string(),
            Ty::Wildcard {
                upper,
                bound: Some(bound),
            } => {
                let keyword = if *upper { "extends" } else { "super" };
                format!("? {keyword} {}", self.display(bound))
            }
            Ty::Intersection(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| self.display(p)).collect();
                parts.join(" & ")
            }
            Ty::Unknown => "<unknown>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_types_get_dotted_names() {
        let mut model = SemanticModel::new();
        let map = model.add_type(TypeSymbol::new("Map", "java.util", TypeKind::Interface));
        let mut entry = TypeSymbol::new("Entry", "java.util", TypeKind::Interface);
        entry.outer = Some(map);
        let entry = model.add_type(entry);

        assert_eq!(model.qualified_name(entry), "java.util.Map.Entry");
        assert_eq!(model.source_name(entry), "Map.Entry");
        assert_eq!(model.lookup_type("java.util.Map.Entry"), Some(entry));
        assert_eq!(model.type_symbol(map).member_types, vec![entry]);
        assert_eq!(model.top_level(entry), map);
    }

    #[test]
    fn display_renders_generic_and_wildcard_types() {
        let mut model = SemanticModel::new();
        let list = model.add_type(TypeSymbol::new("List", "java.util", TypeKind::Interface));
        let number = model.add_type(TypeSymbol::new("Number", "java.lang", TypeKind::Class));
        let ty = Ty::generic(
            list,
            vec![Ty::Wildcard {
                upper: true,
                bound: Some(Box::new(Ty::class(number))),
            }],
        );
        assert_eq!(model.display(&ty), "List<? extends Number>");
        assert_eq!(model.display(&Ty::array_of(Ty::INT)), "int[]");
    }
}
