//! Shared syntax tree for the vexpr expression language.
//!
//! Both grammar front-ends (infix and postfix) produce this AST; resolution
//! and code generation consume it. The builtin signature table lives here so
//! the parser and the resolver agree on arities without a dependency cycle.

pub mod ast;
pub mod builtins;
pub mod span;

pub use ast::{
    BinaryOp, Directive, Expr, ExprKind, FnDecl, Mode, SourceProgram, Stmt, StmtKind, Syntax,
    UnaryOp, RESULT,
};
pub use span::{SourceText, Span};
