//! Utilities shared by Vega tests.
//!
//! This crate contains a small Java front end for fixture-based tests: a
//! parser for the subset of Java the assists operate on, a binding resolver,
//! and stub sources for the handful of JDK types fixtures reference.
//!
//! ```ignore
//! let fixture = vega_test_utils::Fixture::parse("class A { int x = /*[*/1/*]*/; }");
//! ```

pub mod jdk;
pub mod lexer;
pub mod parser;
pub mod resolver;

mod fixture;

use std::sync::OnceLock;

use vega_syntax::{JavaLanguageLevel, ResolvedFile, SyntaxTree};

pub use fixture::{extract_selection, Fixture};
pub use parser::{parse, ParseError};

/// Caret marker for an empty selection.
pub const CARET: &str = "<|>";

fn stubs() -> &'static [SyntaxTree] {
    static STUBS: OnceLock<Vec<SyntaxTree>> = OnceLock::new();
    STUBS.get_or_init(|| {
        jdk::STUBS
            .iter()
            .map(|source| {
                parse(source).unwrap_or_else(|err| panic!("JDK stub failed to parse: {err}"))
            })
            .collect()
    })
}

/// Parses and resolves `text` at the latest supported language level.
pub fn resolve(text: &str) -> ResolvedFile {
    resolve_with_level(text, JavaLanguageLevel::JAVA_21)
}

pub fn resolve_with_level(text: &str, level: JavaLanguageLevel) -> ResolvedFile {
    try_resolve(text, level).unwrap_or_else(|err| panic!("fixture failed to parse: {err}\n{text}"))
}

pub fn try_resolve(text: &str, level: JavaLanguageLevel) -> Result<ResolvedFile, ParseError> {
    let tree = parse(text)?;
    let model = resolver::resolve(stubs(), &tree);
    tracing::debug!(
        target: "vega.test_utils",
        len = text.len(),
        nodes = tree.len(),
        "resolved fixture"
    );
    Ok(ResolvedFile::new(tree, model, level))
}
