//! Resolved Java tree model consumed by the quick-assist engine.
//!
//! A front end produces a [`ResolvedFile`]: the arena [`SyntaxTree`], the
//! [`SemanticModel`] with bindings and types for its nodes, and the language
//! level the file is compiled at. Everything here is read-only once built.

pub mod diagnostics;
pub mod hierarchy;
pub mod language_level;
pub mod model;
pub mod printer;
pub mod scope;
pub mod tree;
pub mod ty;

pub use text_size::{TextRange, TextSize};

pub use crate::diagnostics::{Diagnostic, DiagnosticSource, Severity};
pub use crate::language_level::{FeatureAvailability, JavaFeature, JavaLanguageLevel};
pub use crate::model::{
    Binding, MethodId, MethodSymbol, ParamInfo, SemanticModel, TypeId, TypeKind, TypeSymbol,
    VarId, VarKind, VarSymbol,
};
pub use crate::printer::SyntaxView;
pub use crate::scope::ScopeFlags;
pub use crate::tree::{
    AssignOp, BinaryOp, LiteralKind, ModifierFlags, Modifiers, NodeId, NodeKind, PostfixOp,
    PrefixOp, Primitive, Prop, Role, SyntaxTree, TreeBuilder, TreeError, TypeDeclKind,
};
pub use crate::ty::Ty;

/// A parsed and resolved compilation unit.
#[derive(Clone, Debug)]
pub struct ResolvedFile {
    pub tree: SyntaxTree,
    pub model: SemanticModel,
    pub language_level: JavaLanguageLevel,
}

impl ResolvedFile {
    pub fn new(tree: SyntaxTree, model: SemanticModel, language_level: JavaLanguageLevel) -> Self {
        Self {
            tree,
            model,
            language_level,
        }
    }

    pub fn text(&self) -> &str {
        self.tree.text()
    }

    /// Source rendering of `node` in normalized form.
    pub fn print(&self, node: NodeId) -> String {
        printer::print(&self.tree, node)
    }
}
