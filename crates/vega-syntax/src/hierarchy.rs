//! Type hierarchy queries over the semantic model: supertypes, subtyping,
//! assignment compatibility and functional interface lookup.

use std::collections::{HashSet, VecDeque};

use crate::model::{MethodId, SemanticModel, TypeId, VarId};
use crate::tree::{ModifierFlags, Primitive};
use crate::ty::Ty;

pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";
pub const JAVA_LANG_ITERABLE: &str = "java.lang.Iterable";

const BOXES: [(Primitive, &str); 8] = [
    (Primitive::Boolean, "java.lang.Boolean"),
    (Primitive::Byte, "java.lang.Byte"),
    (Primitive::Short, "java.lang.Short"),
    (Primitive::Char, "java.lang.Character"),
    (Primitive::Int, "java.lang.Integer"),
    (Primitive::Long, "java.lang.Long"),
    (Primitive::Float, "java.lang.Float"),
    (Primitive::Double, "java.lang.Double"),
];

fn widens_to(from: Primitive, to: Primitive) -> bool {
    use Primitive::*;
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short | Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => matches!(to, Double),
        Boolean | Double | Void => false,
    }
}

impl SemanticModel {
    pub fn object_type(&self) -> Option<TypeId> {
        self.lookup_type(JAVA_LANG_OBJECT)
    }

    fn is_object(&self, def: TypeId) -> bool {
        self.object_type() == Some(def)
    }

    /// Direct supertypes with the receiver's type arguments substituted.
    pub fn direct_supertypes(&self, ty: &Ty) -> Vec<Ty> {
        match ty {
            Ty::Class { def, args } => {
                let symbol = self.type_symbol(*def);
                let subst = |t: &Ty| t.substitute(&symbol.type_params, args);
                let mut out = Vec::new();
                match &symbol.superclass {
                    Some(superclass) => out.push(subst(superclass)),
                    None => {
                        if let Some(object) = self.object_type() {
                            if object != *def && (symbol.interfaces.is_empty() || !symbol.is_interface()) {
                                out.push(Ty::class(object));
                            }
                        }
                    }
                }
                out.extend(symbol.interfaces.iter().map(subst));
                out
            }
            Ty::Array(_) | Ty::TypeVar(_) => self.object_type().map(Ty::class).into_iter().collect(),
            Ty::Intersection(parts) => parts.clone(),
            _ => Vec::new(),
        }
    }

    /// Supertype of `ty` (including `ty` itself) whose declaration is `target`.
    pub fn find_supertype(&self, ty: &Ty, target: TypeId) -> Option<Ty> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            if let Some(def) = current.class_def() {
                if def == target {
                    return Some(current);
                }
                if !seen.insert(def) {
                    continue;
                }
            }
            queue.extend(self.direct_supertypes(&current));
        }
        None
    }

    /// Finds `qualified_name` in the supertype hierarchy of `ty`, with type
    /// arguments substituted along the way.
    pub fn find_type_in_hierarchy(&self, ty: &Ty, qualified_name: &str) -> Option<Ty> {
        let target = self.lookup_type(qualified_name)?;
        self.find_supertype(ty, target)
    }

    /// Every type declaration in the hierarchy of `def`, nearest first.
    pub fn hierarchy(&self, def: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([Ty::class(def)]);
        while let Some(current) = queue.pop_front() {
            let Some(id) = current.class_def() else {
                continue;
            };
            if out.contains(&id) {
                continue;
            }
            out.push(id);
            queue.extend(self.direct_supertypes(&current));
        }
        out
    }

    pub fn is_subclass_of(&self, def: TypeId, sup: TypeId) -> bool {
        self.hierarchy(def).contains(&sup)
    }

    pub fn is_subtype(&self, sub: &Ty, sup: &Ty) -> bool {
        if sub == sup {
            return !sub.is_unknown();
        }
        match (sub, sup) {
            (Ty::Unknown, _) | (_, Ty::Unknown) => false,
            (Ty::Null, _) => sup.is_reference(),
            (Ty::Primitive(_), _) | (_, Ty::Primitive(_)) => false,
            (_, Ty::Class { def, .. }) if self.is_object(*def) => sub.is_reference(),
            (Ty::Array(a), Ty::Array(b)) => {
                a.is_reference() && b.is_reference() && self.is_subtype(a, b)
            }
            (Ty::Intersection(parts), _) => parts.iter().any(|p| self.is_subtype(p, sup)),
            (_, Ty::Intersection(parts)) => parts.iter().all(|p| self.is_subtype(sub, p)),
            (Ty::Class { .. }, Ty::Class { def, args }) => {
                let Some(found) = self.find_supertype(sub, *def) else {
                    return false;
                };
                let found_args = found.type_args();
                if args.is_empty() || found_args.is_empty() {
                    return true;
                }
                args.len() == found_args.len()
                    && args
                        .iter()
                        .zip(found_args)
                        .all(|(s, f)| self.contains_type_argument(s, f))
            }
            _ => false,
        }
    }

    /// Type argument containment (`? extends Number` contains `Integer`).
    fn contains_type_argument(&self, outer: &Ty, inner: &Ty) -> bool {
        if outer == inner {
            return true;
        }
        match outer {
            Ty::Wildcard { bound: None, .. } => true,
            Ty::Wildcard {
                upper: true,
                bound: Some(bound),
            } => match inner {
                Ty::Wildcard {
                    upper: true,
                    bound: Some(inner_bound),
                } => self.is_subtype(inner_bound, bound),
                Ty::Wildcard { .. } => false,
                _ => self.is_subtype(inner, bound),
            },
            Ty::Wildcard {
                upper: false,
                bound: Some(bound),
            } => match inner {
                Ty::Wildcard {
                    upper: false,
                    bound: Some(inner_bound),
                } => self.is_subtype(bound, inner_bound),
                Ty::Wildcard { .. } => false,
                _ => self.is_subtype(bound, inner),
            },
            _ => false,
        }
    }

    pub fn boxed(&self, primitive: Primitive) -> Option<Ty> {
        BOXES
            .iter()
            .find(|(p, _)| *p == primitive)
            .and_then(|(_, name)| self.lookup_type(name))
            .map(Ty::class)
    }

    pub fn unboxed(&self, ty: &Ty) -> Option<Primitive> {
        let def = ty.class_def()?;
        let name = self.qualified_name(def);
        BOXES.iter().find(|(_, n)| *n == name).map(|(p, _)| *p)
    }

    /// Assignment conversion: subtyping, primitive widening, boxing and
    /// unboxing.
    pub fn is_assignment_compatible(&self, from: &Ty, to: &Ty) -> bool {
        if self.is_subtype(from, to) {
            return true;
        }
        match (from, to) {
            (Ty::Primitive(a), Ty::Primitive(b)) => widens_to(*a, *b),
            (Ty::Primitive(p), _) if from.is_primitive() => self
                .boxed(*p)
                .is_some_and(|boxed| self.is_subtype(&boxed, to)),
            (_, Ty::Primitive(p)) if to.is_primitive() => self
                .unboxed(from)
                .is_some_and(|unboxed| unboxed == *p || widens_to(unboxed, *p)),
            _ => false,
        }
    }

    /// Methods declared in `def` and its supertypes, nearest first.
    pub fn methods_in_hierarchy(&self, def: TypeId) -> Vec<MethodId> {
        self.hierarchy(def)
            .into_iter()
            .flat_map(|id| self.type_symbol(id).methods.iter().copied())
            .filter(|m| !self.method(*m).is_constructor)
            .collect()
    }

    /// Fields declared in `def` and its supertypes, nearest first.
    pub fn fields_in_hierarchy(&self, def: TypeId) -> Vec<VarId> {
        self.hierarchy(def)
            .into_iter()
            .flat_map(|id| self.type_symbol(id).fields.iter().copied())
            .collect()
    }

    pub fn constructors(&self, def: TypeId) -> Vec<MethodId> {
        self.type_symbol(def)
            .methods
            .iter()
            .copied()
            .filter(|m| self.method(*m).is_constructor)
            .collect()
    }

    pub fn is_abstract(&self, method: MethodId) -> bool {
        let symbol = self.method(method);
        if symbol.modifiers.contains(ModifierFlags::ABSTRACT) {
            return true;
        }
        self.type_symbol(symbol.declaring).is_interface()
            && !symbol
                .modifiers
                .contains(ModifierFlags::DEFAULT)
            && !symbol.is_static()
    }

    fn is_object_method(&self, method: MethodId) -> bool {
        let symbol = self.method(method);
        matches!(
            (symbol.name.as_str(), symbol.params.len()),
            ("equals", 1) | ("hashCode", 0) | ("toString", 0)
        )
    }

    /// The single abstract method of a functional interface type.
    pub fn functional_method(&self, ty: &Ty) -> Option<MethodId> {
        let def = ty.class_def()?;
        if !self.type_symbol(def).is_interface() {
            return None;
        }
        let mut found: Vec<MethodId> = Vec::new();
        for id in self.hierarchy(def) {
            if !self.type_symbol(id).is_interface() {
                continue;
            }
            for &method in &self.type_symbol(id).methods {
                if !self.is_abstract(method) || self.is_object_method(method) {
                    continue;
                }
                let symbol = self.method(method);
                let overridden = found.iter().any(|m| {
                    let other = self.method(*m);
                    other.name == symbol.name && other.params.len() == symbol.params.len()
                });
                if !overridden {
                    found.push(method);
                }
            }
        }
        match found.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// `member_ty` as seen through `receiver`, where `member_ty` was declared
    /// in `declaring`.
    pub fn member_type(&self, receiver: &Ty, declaring: TypeId, member_ty: &Ty) -> Ty {
        match self.find_supertype(receiver, declaring) {
            Some(Ty::Class { args, .. }) => {
                member_ty.substitute(&self.type_symbol(declaring).type_params, &args)
            }
            _ => member_ty.clone(),
        }
    }

    /// Parameter types of `method` as seen through `receiver`.
    pub fn parameter_types(&self, receiver: &Ty, method: MethodId) -> Vec<Ty> {
        let symbol = self.method(method);
        symbol
            .params
            .iter()
            .map(|p| self.member_type(receiver, symbol.declaring, &p.ty))
            .collect()
    }

    /// Return type of `method` as seen through `receiver`.
    pub fn return_type(&self, receiver: &Ty, method: MethodId) -> Ty {
        let symbol = self.method(method);
        self.member_type(receiver, symbol.declaring, &symbol.return_ty)
    }

    /// Element type produced by iterating `ty` in a for-each loop.
    pub fn iteration_element_type(&self, ty: &Ty) -> Option<Ty> {
        if let Ty::Array(component) = ty {
            return Some((**component).clone());
        }
        let iterable = self.find_type_in_hierarchy(ty, JAVA_LANG_ITERABLE)?;
        match iterable.type_args() {
            [element] => element.normalize_for_declaration(),
            _ => None,
        }
    }
}
