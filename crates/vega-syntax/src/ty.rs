use crate::model::TypeId;
use crate::tree::Primitive;

/// Structural Java type as seen by the semantic model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Primitive(Primitive),
    Null,
    Class { def: TypeId, args: Vec<Ty> },
    Array(Box<Ty>),
    TypeVar(String),
    Wildcard { upper: bool, bound: Option<Box<Ty>> },
    Intersection(Vec<Ty>),
    Unknown,
}

impl Ty {
    pub const VOID: Ty = Ty::Primitive(Primitive::Void);
    pub const INT: Ty = Ty::Primitive(Primitive::Int);
    pub const BOOLEAN: Ty = Ty::Primitive(Primitive::Boolean);

    pub fn class(def: TypeId) -> Ty {
        Ty::Class {
            def,
            args: Vec::new(),
        }
    }

    pub fn generic(def: TypeId, args: Vec<Ty>) -> Ty {
        Ty::Class { def, args }
    }

    pub fn array_of(element: Ty) -> Ty {
        Ty::Array(Box::new(element))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Primitive(Primitive::Void))
    }

    /// Primitive value type (`void` excluded).
    pub fn is_primitive(&self) -> bool {
        matches!(self, Ty::Primitive(p) if *p != Primitive::Void)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Ty::Class { .. } | Ty::Array(_) | Ty::TypeVar(_) | Ty::Null | Ty::Intersection(_)
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Ty::Unknown)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Ty::Wildcard { .. })
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self, Ty::Intersection(_))
    }

    pub fn class_def(&self) -> Option<TypeId> {
        match self {
            Ty::Class { def, .. } => Some(*def),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[Ty] {
        match self {
            Ty::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Component type of an array, one level down.
    pub fn component(&self) -> Option<&Ty> {
        match self {
            Ty::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Innermost element type and number of dimensions.
    pub fn element_and_dims(&self) -> (&Ty, usize) {
        let mut ty = self;
        let mut dims = 0;
        while let Ty::Array(component) = ty {
            ty = component;
            dims += 1;
        }
        (ty, dims)
    }

    /// `true` if any part of the type could not be resolved.
    pub fn contains_unknown(&self) -> bool {
        match self {
            Ty::Unknown => true,
            Ty::Class { args, .. } => args.iter().any(Ty::contains_unknown),
            Ty::Array(component) => component.contains_unknown(),
            Ty::Wildcard { bound, .. } => bound.as_deref().is_some_and(Ty::contains_unknown),
            Ty::Intersection(parts) => parts.iter().any(Ty::contains_unknown),
            Ty::Primitive(_) | Ty::Null | Ty::TypeVar(_) => false,
        }
    }

    /// Replaces type variables named in `params` with the matching `args`.
    /// Raw references (`args` shorter than `params`) are left untouched.
    pub fn substitute(&self, params: &[String], args: &[Ty]) -> Ty {
        if params.is_empty() || params.len() != args.len() {
            return self.clone();
        }
        match self {
            Ty::TypeVar(name) => params
                .iter()
                .position(|p| p == name)
                .map(|idx| args[idx].clone())
                .unwrap_or_else(|| self.clone()),
            Ty::Class { def, args: inner } => Ty::Class {
                def: *def,
                args: inner.iter().map(|a| a.substitute(params, args)).collect(),
            },
            Ty::Array(component) => Ty::Array(Box::new(component.substitute(params, args))),
            Ty::Wildcard { upper, bound } => Ty::Wildcard {
                upper: *upper,
                bound: bound
                    .as_ref()
                    .map(|b| Box::new(b.substitute(params, args))),
            },
            Ty::Intersection(parts) => {
                Ty::Intersection(parts.iter().map(|p| p.substitute(params, args)).collect())
            }
            Ty::Primitive(_) | Ty::Null | Ty::Unknown => self.clone(),
        }
    }

    /// Type usable in a declaration: wildcards collapse to their upper bound.
    pub fn normalize_for_declaration(&self) -> Option<Ty> {
        match self {
            Ty::Wildcard {
                upper: true,
                bound: Some(bound),
            } => Some((**bound).clone()),
            Ty::Wildcard { .. } | Ty::Null | Ty::Unknown => None,
            _ => Some(self.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_declared_variables() {
        let list = TypeId::from_raw(3);
        let string = TypeId::from_raw(4);
        let ty = Ty::generic(list, vec![Ty::TypeVar("E".into())]);
        let substituted = ty.substitute(&["E".to_string()], &[Ty::class(string)]);
        assert_eq!(substituted, Ty::generic(list, vec![Ty::class(string)]));
    }

    #[test]
    fn substitute_ignores_raw_references() {
        let ty = Ty::TypeVar("T".into());
        assert_eq!(ty.substitute(&["T".to_string()], &[]), ty);
    }

    #[test]
    fn element_and_dims_unwraps_nested_arrays() {
        let ty = Ty::array_of(Ty::array_of(Ty::INT));
        assert_eq!(ty.element_and_dims(), (&Ty::INT, 2));
    }
}
