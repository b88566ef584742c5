//! Resolved program IR.
//!
//! Every name is bound: variables are numeric slots, clip samples are input
//! indices, metadata queries are already folded to constants and user
//! functions are gone (inlined). This is the form the code generator
//! consumes; no symbol table survives past this point.

use vexpr_ast::builtins::{MathFn, PropWrite};
use vexpr_ast::{BinaryOp, Mode, UnaryOp};

/// Numeric slot of a user variable.
pub type VarId = u32;

/// Index into [`ResolvedProgram::prop_keys`].
pub type PropKeyId = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum RExpr {
    Const(f32),
    ReadVar(VarId),
    /// Clip `i`'s sample at the current coordinate.
    Input(u32),
    CoordX,
    CoordY,
    FrameIndex,
    Unary {
        op: UnaryOp,
        operand: Box<RExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<RExpr>,
        right: Box<RExpr>,
    },
    Ternary {
        cond: Box<RExpr>,
        then: Box<RExpr>,
        other: Box<RExpr>,
    },
    Math {
        f: MathFn,
        args: Vec<RExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RStmt {
    Assign {
        var: VarId,
        value: RExpr,
    },
    /// Evaluate and discard (expression statement).
    Eval(RExpr),
    If {
        cond: RExpr,
        then_body: Vec<RStmt>,
        else_body: Vec<RStmt>,
    },
    /// Frame property write (per-frame mode only).
    Prop {
        key: PropKeyId,
        write: PropWrite,
        /// `None` for removals.
        value: Option<RExpr>,
    },
}

/// Fully resolved program, ready for code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProgram {
    pub mode: Mode,
    pub stmts: Vec<RStmt>,
    /// Number of user variable slots.
    pub var_count: u32,
    /// Slot of `RESULT`; always `Some` for per-pixel programs.
    pub result: Option<VarId>,
    /// Interned property keys, indexed by [`PropKeyId`].
    pub prop_keys: Vec<String>,
    /// Number of bound input clips.
    pub num_inputs: u32,
}
