// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Name resolution and validation for vexpr programs.
//!
//! The resolver turns the grammar-agnostic AST into a fully bound IR:
//! identifiers become variable slots or input indices, builtin calls are
//! checked against the signature table (arity, mode, `@requires` gating),
//! clip metadata queries are folded to constants against the bound
//! [`ClipDescriptor`]s, user functions are inlined, and definite assignment
//! is enforced.
//!
//! [`ClipDescriptor`]: vexpr_types::ClipDescriptor

pub mod error;
pub mod ir;
pub mod modules;
pub mod resolver;

pub use error::{ResolveError, ResolveErrorKind};
pub use ir::{PropKeyId, RExpr, RStmt, ResolvedProgram, VarId};
pub use resolver::resolve;
