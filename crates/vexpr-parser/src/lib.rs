// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Dual-grammar parser for the vexpr expression language.
//!
//! Two front-ends produce the same AST:
//!
//! - [`infix::parse_program`] — recursive-descent/Pratt parser over the
//!   token stream from `vexpr-lexer`.
//! - [`postfix::parse_postfix`] — symbolic stack replay of the
//!   whitespace-delimited postfix grammar.
//!
//! [`directives::strip_directives`] runs before either front-end and
//! extracts `@requires` lines while keeping byte offsets stable.

pub mod directives;
pub mod error;
pub mod infix;
pub mod postfix;
pub mod stream;

pub use directives::strip_directives;
pub use error::{ParseError, ParseErrorKind};
pub use infix::{parse_expr, parse_expr_all, parse_program};
pub use postfix::parse_postfix;
pub use stream::TokenStream;
