//! Collision-free names for introduced variables, fields and parameters.

use std::collections::HashSet;

use vega_syntax::scope::{declared_local_names, visible_variable_names};
use vega_syntax::{NodeId, NodeKind, ResolvedFile, Ty};

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "var", "void", "volatile", "while",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// `candidate`, or `candidate` followed by the smallest positive integer that
/// is not in `taken`.
pub fn unique_name(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) && !is_keyword(candidate) {
        return candidate.to_string();
    }
    (1u32..)
        .map(|n| format!("{candidate}{n}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Renames `originals` so that none collides with `visible`, with another
/// original, or with a name chosen earlier in the list.
pub fn unique_parameter_names(originals: &[String], visible: &HashSet<String>) -> Vec<String> {
    let mut chosen: Vec<String> = Vec::with_capacity(originals.len());
    for (idx, original) in originals.iter().enumerate() {
        let mut excluded = visible.clone();
        excluded.extend(
            originals
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, name)| name.clone()),
        );
        excluded.extend(chosen.iter().cloned());
        chosen.push(unique_name(original, &excluded));
    }
    chosen
}

/// Variables visible at `node` plus every local declared in its enclosing
/// body, so a new local neither shadows nor is shadowed.
pub fn taken_variable_names(file: &ResolvedFile, node: NodeId) -> HashSet<String> {
    let tree = &file.tree;
    let mut taken = visible_variable_names(file, node);
    let body = tree.ancestors_with_self(node).find(|n| {
        matches!(
            tree.kind(*n),
            NodeKind::MethodDecl { .. } | NodeKind::Initializer { .. } | NodeKind::Lambda { .. }
        )
    });
    if let Some(body) = body {
        taken.extend(declared_local_names(file, body));
    }
    taken
}

/// A variable name describing `expr`: the invoked method without its
/// accessor prefix, the instantiated class, or the expression's type.
pub fn suggest_variable_name(file: &ResolvedFile, expr: NodeId) -> String {
    let tree = &file.tree;
    let from_syntax = match tree.kind(expr) {
        NodeKind::MethodCall { name, .. } => tree.ident(*name).and_then(strip_accessor),
        NodeKind::FieldAccess { name, .. } | NodeKind::QualifiedName { name, .. } => {
            tree.ident(*name).map(str::to_string)
        }
        NodeKind::Paren { expr } | NodeKind::Cast { expr, .. } => {
            return suggest_variable_name(file, *expr);
        }
        _ => None,
    };
    from_syntax
        .filter(|name| !name.is_empty())
        .map(|name| decapitalize(&name))
        .or_else(|| {
            file.model
                .expr_type(expr)
                .and_then(|ty| name_for_type(file, ty))
        })
        .unwrap_or_else(|| "value".to_string())
}

fn strip_accessor(name: &str) -> Option<String> {
    for prefix in ["get", "is", "to"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                return Some(rest.to_string());
            }
        }
    }
    Some(name.to_string())
}

fn name_for_type(file: &ResolvedFile, ty: &Ty) -> Option<String> {
    match ty {
        Ty::Primitive(primitive) => primitive.keyword().chars().next().map(String::from),
        Ty::Class { def, .. } => {
            let symbol = file.model.type_symbol(*def);
            (!symbol.is_anonymous()).then(|| decapitalize(&symbol.name))
        }
        Ty::Array(component) => name_for_type(file, component).map(|name| format!("{name}s")),
        Ty::TypeVar(name) => Some(name.to_lowercase()),
        _ => None,
    }
}

/// `fooBar` from `FooBar`; leading acronyms are lowered as a unit (`URL` to
/// `url`, `URLPath` to `urlPath`).
pub fn decapitalize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lowered = match upper_run {
        0 => return name.to_string(),
        n if n == chars.len() => n,
        1 => 1,
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            if idx < lowered {
                c.to_lowercase().next().unwrap_or(*c)
            } else {
                *c
            }
        })
        .collect()
}

/// `maxValue` to `MAX_VALUE`.
pub fn constant_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.extend(c.to_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vega_test_utils::Fixture;

    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn unique_name_appends_smallest_free_suffix() {
        assert_eq!(unique_name("a", &set(&[])), "a");
        assert_eq!(unique_name("a", &set(&["a", "a1"])), "a2");
        assert_eq!(unique_name("int", &set(&[])), "int1");
    }

    #[test]
    fn parameter_names_avoid_each_other_and_visible_names() {
        let names = unique_parameter_names(
            &["a".to_string(), "a".to_string(), "b".to_string()],
            &set(&["b"]),
        );
        assert_eq!(names, vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn unique_originals_stay_untouched() {
        let names = unique_parameter_names(&["s".to_string(), "t".to_string()], &set(&["x"]));
        assert_eq!(names, vec!["s", "t"]);
    }

    #[test]
    fn case_conversions() {
        assert_eq!(decapitalize("FooBar"), "fooBar");
        assert_eq!(decapitalize("URL"), "url");
        assert_eq!(decapitalize("URLPath"), "urlPath");
        assert_eq!(constant_name("maxValue"), "MAX_VALUE");
        assert_eq!(constant_name("i"), "I");
    }

    #[test]
    fn suggestions_follow_method_names_and_types() {
        let fixture = Fixture::parse(
            "import java.util.List;\nclass A { void m(List<String> l) { int n = /*[*/l.size()/*]*/; } }",
        );
        let file = &fixture.file;
        let call = fixture.covering_node();
        assert_eq!(suggest_variable_name(file, call), "size");
        let literal = Fixture::parse("class A { void m() { int x = /*[*/0/*]*/; } }");
        assert_eq!(suggest_variable_name(&literal.file, literal.covering_node()), "i");
    }

    #[test]
    fn taken_names_include_later_locals() {
        let fixture = Fixture::parse(
            "class A { int f; void m(int p) { int a = /*[*/1/*]*/; int b = 2; } }",
        );
        let taken = taken_variable_names(&fixture.file, fixture.covering_node());
        assert!(taken.contains("p"));
        assert!(taken.contains("f"));
        assert!(taken.contains("b"));
    }
}
