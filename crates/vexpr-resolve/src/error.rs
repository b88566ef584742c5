//! Resolution errors.
//!
//! Every failure carries the span of the offending construct and maps onto
//! one of four reporting categories so hosts can prefix messages uniformly
//! (name lookup, typing, definite assignment, clip metadata).

use thiserror::Error;

use vexpr_ast::{Mode, Span};

/// Reporting category of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    Name,
    Type,
    DefiniteAssignment,
    InvalidMetadata,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unknown module `{module}`")]
    UnknownModule { module: String, span: Span },

    #[error("unknown identifier `{name}`")]
    UnknownIdent { name: String, span: Span },

    #[error("clip {index} is not bound")]
    ClipNotBound { index: u32, span: Span },

    #[error("`{name}` requires `@requires {module}`")]
    MissingModule {
        name: String,
        module: &'static str,
        span: Span,
    },

    #[error("`{name}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("`{name}` is not available in {mode:?} mode")]
    ModeViolation {
        name: String,
        mode: Mode,
        span: Span,
    },

    #[error("`{name}` does not produce a value")]
    NoValue { name: String, span: Span },

    #[error("argument to `{name}` must be a compile-time integer constant")]
    NonConstIndex { name: String, span: Span },

    #[error("negative index {value} passed to `{name}`")]
    NegativeIndex {
        name: String,
        value: i64,
        span: Span,
    },

    #[error("property key for `{name}` must be a bare identifier")]
    PropKeyNotIdent { name: String, span: Span },

    #[error("cannot assign to reserved name `{name}`")]
    AssignReserved { name: String, span: Span },

    #[error("function `{name}` shadows a builtin")]
    ShadowsBuiltin { name: String, span: Span },

    #[error("function `{name}` is declared more than once")]
    DuplicateFunction { name: String, span: Span },

    #[error("function `{name}` is recursive")]
    RecursiveFunction { name: String, span: Span },

    #[error("variable `{name}` may be read before assignment")]
    ReadUnassigned { name: String, span: Span },

    #[error("RESULT is not assigned on every path")]
    ResultUnassigned { span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnknownModule { span, .. }
            | ResolveError::UnknownIdent { span, .. }
            | ResolveError::ClipNotBound { span, .. }
            | ResolveError::MissingModule { span, .. }
            | ResolveError::ArityMismatch { span, .. }
            | ResolveError::ModeViolation { span, .. }
            | ResolveError::NoValue { span, .. }
            | ResolveError::NonConstIndex { span, .. }
            | ResolveError::NegativeIndex { span, .. }
            | ResolveError::PropKeyNotIdent { span, .. }
            | ResolveError::AssignReserved { span, .. }
            | ResolveError::ShadowsBuiltin { span, .. }
            | ResolveError::DuplicateFunction { span, .. }
            | ResolveError::RecursiveFunction { span, .. }
            | ResolveError::ReadUnassigned { span, .. }
            | ResolveError::ResultUnassigned { span } => *span,
        }
    }

    pub fn kind(&self) -> ResolveErrorKind {
        match self {
            ResolveError::UnknownModule { .. }
            | ResolveError::UnknownIdent { .. }
            | ResolveError::ClipNotBound { .. }
            | ResolveError::MissingModule { .. } => ResolveErrorKind::Name,

            ResolveError::ArityMismatch { .. }
            | ResolveError::ModeViolation { .. }
            | ResolveError::NoValue { .. }
            | ResolveError::NonConstIndex { .. }
            | ResolveError::PropKeyNotIdent { .. }
            | ResolveError::AssignReserved { .. }
            | ResolveError::ShadowsBuiltin { .. }
            | ResolveError::DuplicateFunction { .. }
            | ResolveError::RecursiveFunction { .. } => ResolveErrorKind::Type,

            ResolveError::ReadUnassigned { .. } | ResolveError::ResultUnassigned { .. } => {
                ResolveErrorKind::DefiniteAssignment
            }

            ResolveError::NegativeIndex { .. } => ResolveErrorKind::InvalidMetadata,
        }
    }
}
