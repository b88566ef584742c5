//! Compilation errors.
//!
//! [`CompileError`] aggregates every stage of the pipeline so hosts deal
//! with a single error type: lexing, parsing, resolution and backend
//! failures all surface here with their positions intact.

use thiserror::Error;

use vexpr_ast::{SourceText, Span};
use vexpr_lexer::LexError;
use vexpr_parser::ParseError;
use vexpr_resolve::ResolveError;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// The code generator rejected the function. There is no interpreter
    /// fallback; this aborts program construction.
    #[error("code generation failed: {0}")]
    Backend(#[from] cranelift_module::ModuleError),
}

impl CompileError {
    /// Span of the offending construct, when the failure maps to source.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex(err) => Some(err.span),
            CompileError::Parse(err) => Some(err.span),
            CompileError::Resolve(err) => Some(err.span()),
            CompileError::Backend(_) => None,
        }
    }

    /// 1-based (line, column) of the error within `source`.
    ///
    /// Spans always index the original source text (directive stripping
    /// preserves byte offsets), so the host passes the string it compiled.
    pub fn line_col(&self, source: &str) -> Option<(u32, u32)> {
        let span = self.span()?;
        Some(SourceText::new(source.to_string()).line_col(span.start))
    }
}
