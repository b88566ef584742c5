//! Untyped AST produced by both parser front-ends.
//!
//! The infix parser and the postfix stack replayer emit the same node types,
//! so everything downstream of parsing (resolution, code generation) is
//! grammar-agnostic.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Evaluation mode of a program.
///
/// `PerPixel` programs run once per output sample and yield the sample value
/// through the reserved `RESULT` variable. `PerFrame` programs run once per
/// frame and produce output through frame property writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    PerPixel,
    PerFrame,
}

/// Which grammar the source text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Syntax {
    Infix,
    Postfix,
}

/// Binary operators. All operate on f32 values; comparisons and logical
/// operators yield 0.0 / 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// An expression node with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal.
    Number(f64),
    /// Identifier reference: a user variable, a context scalar (`X`, `Y`,
    /// `N`) or a clip sample (`srcN`). Classified during resolution.
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `cond ? then : else` (postfix `?`); infix has no ternary token but
    /// resolution may still see these from the postfix front-end.
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        other: Box<Expr>,
    },
    /// Call of a builtin or user function by name.
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = expr;` — declares `name` on first assignment.
    Assign { name: String, value: Expr },
    /// Expression in statement position (property writers, discarded calls).
    Expr(Expr),
    /// `if cond { ... } else { ... }`; `else_body` empty when absent.
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
}

/// A user function declaration: `fn name(p, q) { expr }`.
///
/// Bodies are single expressions over the parameters; calls are inlined
/// during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub span: Span,
}

/// A `@requires <module>` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub module: String,
    pub span: Span,
}

/// A parsed program: directives, user function declarations and the
/// top-level statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceProgram {
    pub directives: Vec<Directive>,
    pub functions: Vec<FnDecl>,
    pub stmts: Vec<Stmt>,
}

/// Name of the reserved per-pixel output variable.
pub const RESULT: &str = "RESULT";
