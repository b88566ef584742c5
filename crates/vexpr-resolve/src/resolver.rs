//! The resolution pass.
//!
//! Walks the AST once, binding every identifier, enforcing arity/mode/module
//! rules, folding clip metadata queries into constants, inlining user
//! functions and tracking definite assignment. All failures here are
//! compile-time; nothing is deferred to evaluation.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use vexpr_ast::builtins::{self, BuiltinKind, BuiltinSig, MetaQuery, PropWrite};
use vexpr_ast::{
    BinaryOp, Expr, ExprKind, FnDecl, Mode, SourceProgram, Span, Stmt, StmtKind, UnaryOp, RESULT,
};
use vexpr_types::ClipDescriptor;

use crate::error::ResolveError;
use crate::ir::{RExpr, RStmt, ResolvedProgram, VarId};
use crate::modules;

/// Resolve a parsed program against the bound clip formats.
pub fn resolve(
    program: &SourceProgram,
    mode: Mode,
    clips: &[ClipDescriptor],
) -> Result<ResolvedProgram, ResolveError> {
    debug!(
        ?mode,
        clips = clips.len(),
        functions = program.functions.len(),
        stmts = program.stmts.len(),
        "resolving program"
    );

    let mut resolver = Resolver {
        mode,
        clips,
        active_std: false,
        functions: IndexMap::new(),
        vars: IndexMap::new(),
        assigned: IndexSet::new(),
        inline_stack: Vec::new(),
        param_frames: Vec::new(),
        prop_keys: IndexMap::new(),
    };

    for directive in &program.directives {
        if !modules::is_module(&directive.module) {
            return Err(ResolveError::UnknownModule {
                module: directive.module.clone(),
                span: directive.span,
            });
        }
    }
    let active_std = program.directives.iter().any(|d| d.module == "std");

    for func in &program.functions {
        if builtins::is_builtin(&func.name) {
            return Err(ResolveError::ShadowsBuiltin {
                name: func.name.clone(),
                span: func.span,
            });
        }
        if resolver
            .functions
            .insert(func.name.clone(), func)
            .is_some()
        {
            return Err(ResolveError::DuplicateFunction {
                name: func.name.clone(),
                span: func.span,
            });
        }
    }

    resolver.active_std = active_std;
    let stmts = resolver.resolve_stmts(&program.stmts)?;

    let result = match mode {
        Mode::PerPixel => {
            let end_span = program
                .stmts
                .last()
                .map(|s| s.span)
                .unwrap_or_else(Span::zero);
            let id = resolver
                .vars
                .get(RESULT)
                .copied()
                .ok_or(ResolveError::ResultUnassigned { span: end_span })?;
            if !resolver.assigned.contains(&id) {
                return Err(ResolveError::ResultUnassigned { span: end_span });
            }
            Some(id)
        }
        Mode::PerFrame => None,
    };

    trace!(
        vars = resolver.vars.len(),
        prop_keys = resolver.prop_keys.len(),
        "resolution complete"
    );

    Ok(ResolvedProgram {
        mode,
        stmts,
        var_count: resolver.vars.len() as u32,
        result,
        prop_keys: resolver.prop_keys.keys().cloned().collect(),
        num_inputs: clips.len() as u32,
    })
}

struct Resolver<'a> {
    mode: Mode,
    clips: &'a [ClipDescriptor],
    /// Whether `@requires std` was seen.
    active_std: bool,
    functions: IndexMap<String, &'a FnDecl>,
    vars: IndexMap<String, VarId>,
    /// Variables assigned on every path to the current program point.
    assigned: IndexSet<VarId>,
    /// Function names currently being inlined (recursion detection).
    inline_stack: Vec<String>,
    /// Parameter substitutions while inlining; only the innermost frame is
    /// visible, function bodies are hygienic against caller locals.
    param_frames: Vec<IndexMap<String, RExpr>>,
    prop_keys: IndexMap<String, u32>,
}

impl<'a> Resolver<'a> {
    fn resolve_stmts(&mut self, stmts: &[Stmt]) -> Result<Vec<RStmt>, ResolveError> {
        stmts.iter().map(|stmt| self.resolve_stmt(stmt)).collect()
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<RStmt, ResolveError> {
        match &stmt.kind {
            StmtKind::Assign { name, value } => {
                if self.is_reserved(name) {
                    return Err(ResolveError::AssignReserved {
                        name: name.clone(),
                        span: stmt.span,
                    });
                }
                // Resolve the value first so `x = x + 1` on unassigned x
                // reports the read, not the write.
                let value = self.resolve_expr(value)?;
                let var = self.intern_var(name);
                self.assigned.insert(var);
                Ok(RStmt::Assign { var, value })
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.resolve_expr(cond)?;

                let before = self.assigned.clone();
                let then_body = self.resolve_stmts(then_body)?;
                let after_then = std::mem::replace(&mut self.assigned, before.clone());
                let else_body_r = self.resolve_stmts(else_body)?;
                let after_else = std::mem::replace(&mut self.assigned, before);

                // A variable is definitely assigned after the branch only
                // if both arms assign it (an absent else arm assigns
                // nothing beyond what was already assigned).
                for var in after_then.intersection(&after_else) {
                    self.assigned.insert(*var);
                }

                Ok(RStmt::If {
                    cond,
                    then_body,
                    else_body: else_body_r,
                })
            }
            StmtKind::Expr(expr) => {
                if let ExprKind::Call { name, args } = &expr.kind {
                    if let Some(sig) = prop_writer(name) {
                        return self.resolve_prop_write(sig, args, expr.span);
                    }
                }
                Ok(RStmt::Eval(self.resolve_expr(expr)?))
            }
        }
    }

    fn resolve_prop_write(
        &mut self,
        sig: &'static BuiltinSig,
        args: &[Expr],
        span: Span,
    ) -> Result<RStmt, ResolveError> {
        let write = match sig.kind {
            BuiltinKind::Prop(w) => w,
            _ => unreachable!("prop_writer returned a non-prop builtin"),
        };
        if self.mode != Mode::PerFrame {
            return Err(ResolveError::ModeViolation {
                name: sig.name.to_string(),
                mode: self.mode,
                span,
            });
        }
        if args.len() != sig.arity {
            return Err(ResolveError::ArityMismatch {
                name: sig.name.to_string(),
                expected: sig.arity,
                found: args.len(),
                span,
            });
        }
        let key = match &args[0].kind {
            ExprKind::Var(key) => key.clone(),
            _ => {
                return Err(ResolveError::PropKeyNotIdent {
                    name: sig.name.to_string(),
                    span: args[0].span,
                })
            }
        };
        let next_id = self.prop_keys.len() as u32;
        let key_id = *self.prop_keys.entry(key).or_insert(next_id);

        let value = match write {
            PropWrite::Remove => None,
            PropWrite::SetFloat
            | PropWrite::SetInt
            | PropWrite::AppendFloat
            | PropWrite::AppendInt => Some(self.resolve_expr(&args[1])?),
        };
        Ok(RStmt::Prop {
            key: key_id,
            write,
            value,
        })
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<RExpr, ResolveError> {
        match &expr.kind {
            ExprKind::Number(value) => Ok(RExpr::Const(*value as f32)),
            ExprKind::Var(name) => self.resolve_var(name, expr.span),
            ExprKind::Unary { op, operand } => Ok(RExpr::Unary {
                op: *op,
                operand: Box::new(self.resolve_expr(operand)?),
            }),
            ExprKind::Binary { op, left, right } => Ok(RExpr::Binary {
                op: *op,
                left: Box::new(self.resolve_expr(left)?),
                right: Box::new(self.resolve_expr(right)?),
            }),
            ExprKind::Ternary { cond, then, other } => Ok(RExpr::Ternary {
                cond: Box::new(self.resolve_expr(cond)?),
                then: Box::new(self.resolve_expr(then)?),
                other: Box::new(self.resolve_expr(other)?),
            }),
            ExprKind::Call { name, args } => self.resolve_call(name, args, expr.span),
        }
    }

    fn resolve_var(&mut self, name: &str, span: Span) -> Result<RExpr, ResolveError> {
        // Innermost parameter frame shadows everything while inlining.
        if let Some(frame) = self.param_frames.last() {
            if let Some(substitution) = frame.get(name) {
                return Ok(substitution.clone());
            }
        }

        if let Some(index) = src_index(name) {
            if self.mode != Mode::PerPixel {
                return Err(ResolveError::ModeViolation {
                    name: name.to_string(),
                    mode: self.mode,
                    span,
                });
            }
            if index as usize >= self.clips.len() {
                return Err(ResolveError::ClipNotBound { index, span });
            }
            return Ok(RExpr::Input(index));
        }
        match name {
            "X" | "Y" => {
                if self.mode != Mode::PerPixel {
                    return Err(ResolveError::ModeViolation {
                        name: name.to_string(),
                        mode: self.mode,
                        span,
                    });
                }
                return Ok(if name == "X" {
                    RExpr::CoordX
                } else {
                    RExpr::CoordY
                });
            }
            "N" => return Ok(RExpr::FrameIndex),
            _ => {}
        }

        // Function bodies see only their parameters and context scalars.
        if self.param_frames.is_empty() {
            if let Some(var) = self.vars.get(name).copied() {
                if !self.assigned.contains(&var) {
                    return Err(ResolveError::ReadUnassigned {
                        name: name.to_string(),
                        span,
                    });
                }
                return Ok(RExpr::ReadVar(var));
            }
        }

        Err(ResolveError::UnknownIdent {
            name: name.to_string(),
            span,
        })
    }

    fn resolve_call(&mut self, name: &str, args: &[Expr], span: Span) -> Result<RExpr, ResolveError> {
        if let Some(func) = self.functions.get(name).copied() {
            return self.inline_function(func, args, span);
        }

        let overloads = builtins::lookup(name);
        if overloads.is_empty() {
            return Err(ResolveError::UnknownIdent {
                name: name.to_string(),
                span,
            });
        }

        // Module gating comes before arity/mode so the error names the
        // missing directive, not a confusing signature mismatch.
        if let Some(module) = overloads[0].module {
            if !self.active_std {
                return Err(ResolveError::MissingModule {
                    name: name.to_string(),
                    module,
                    span,
                });
            }
        }

        let usable: Vec<&BuiltinSig> = overloads
            .iter()
            .filter(|sig| sig.mode.is_none() || sig.mode == Some(self.mode))
            .copied()
            .collect();
        if usable.is_empty() {
            return Err(ResolveError::ModeViolation {
                name: name.to_string(),
                mode: self.mode,
                span,
            });
        }

        let sig = match usable.iter().find(|sig| sig.arity == args.len()) {
            Some(sig) => *sig,
            None => {
                return Err(ResolveError::ArityMismatch {
                    name: name.to_string(),
                    expected: usable[0].arity,
                    found: args.len(),
                    span,
                })
            }
        };

        match sig.kind {
            BuiltinKind::Math(f) => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RExpr::Math { f, args })
            }
            BuiltinKind::Meta(query) => self.fold_meta(sig, query, args),
            BuiltinKind::Prop(_) => Err(ResolveError::NoValue {
                name: name.to_string(),
                span,
            }),
        }
    }

    fn inline_function(
        &mut self,
        func: &'a FnDecl,
        args: &[Expr],
        span: Span,
    ) -> Result<RExpr, ResolveError> {
        if self.inline_stack.iter().any(|f| f == &func.name) {
            return Err(ResolveError::RecursiveFunction {
                name: func.name.clone(),
                span,
            });
        }
        if args.len() != func.params.len() {
            return Err(ResolveError::ArityMismatch {
                name: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
                span,
            });
        }

        // Arguments are resolved in the caller's scope before the
        // parameter frame is pushed.
        let mut frame = IndexMap::new();
        for (param, arg) in func.params.iter().zip(args) {
            frame.insert(param.clone(), self.resolve_expr(arg)?);
        }

        trace!(name = %func.name, "inlining function");
        self.inline_stack.push(func.name.clone());
        self.param_frames.push(frame);
        let body = self.resolve_expr(&func.body);
        self.param_frames.pop();
        self.inline_stack.pop();
        body
    }

    fn fold_meta(
        &mut self,
        sig: &'static BuiltinSig,
        query: MetaQuery,
        args: &[Expr],
    ) -> Result<RExpr, ResolveError> {
        let mut indices = Vec::with_capacity(args.len());
        for arg in args {
            let resolved = self.resolve_expr(arg)?;
            let value = fold_const(&resolved).ok_or_else(|| ResolveError::NonConstIndex {
                name: sig.name.to_string(),
                span: arg.span,
            })?;
            if value.fract() != 0.0 {
                return Err(ResolveError::NonConstIndex {
                    name: sig.name.to_string(),
                    span: arg.span,
                });
            }
            let value = value as i64;
            if value < 0 {
                return Err(ResolveError::NegativeIndex {
                    name: sig.name.to_string(),
                    value,
                    span: arg.span,
                });
            }
            indices.push(value as u32);
        }

        let (clip, plane) = match (query, indices.as_slice()) {
            // Per-pixel geometry queries imply clip 0.
            (MetaQuery::Width | MetaQuery::Height, [plane]) => (0u32, *plane),
            (MetaQuery::Width | MetaQuery::Height, [clip, plane]) => (*clip, *plane),
            (MetaQuery::BitDepth | MetaQuery::Fmt, [clip]) => (*clip, 0),
            _ => unreachable!("arity already validated against the signature table"),
        };

        let value = self.meta_value(query, clip, plane);
        trace!(name = sig.name, clip, plane, value, "folded metadata query");
        Ok(RExpr::Const(value as f32))
    }

    /// Sentinel rules: unbound clip index yields -1 (0 for `get_fmt`);
    /// out-of-range plane on a bound clip yields -1. Never an error.
    fn meta_value(&self, query: MetaQuery, clip: u32, plane: u32) -> i64 {
        let desc = match self.clips.get(clip as usize) {
            Some(desc) => desc,
            None => {
                return match query {
                    MetaQuery::Fmt => 0,
                    _ => -1,
                }
            }
        };
        match query {
            MetaQuery::Width => desc
                .plane_dimensions(plane)
                .map(|(w, _)| w as i64)
                .unwrap_or(-1),
            MetaQuery::Height => desc
                .plane_dimensions(plane)
                .map(|(_, h)| h as i64)
                .unwrap_or(-1),
            MetaQuery::BitDepth => desc.bit_depth as i64,
            MetaQuery::Fmt => desc.sample_type.fmt_code() as i64,
        }
    }

    fn intern_var(&mut self, name: &str) -> VarId {
        let next = self.vars.len() as VarId;
        *self.vars.entry(name.to_string()).or_insert(next)
    }

    fn is_reserved(&self, name: &str) -> bool {
        matches!(name, "X" | "Y" | "N")
            || src_index(name).is_some()
            || builtins::is_builtin(name)
            || self.functions.contains_key(name)
    }
}

/// `srcN` → N; `None` if the name is not a clip reference.
fn src_index(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("src")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn prop_writer(name: &str) -> Option<&'static BuiltinSig> {
    builtins::lookup(name)
        .into_iter()
        .find(|sig| matches!(sig.kind, BuiltinKind::Prop(_)))
}

/// Fold an already-resolved expression to a constant, if it is one.
/// Only arithmetic over literals participates; anything touching inputs,
/// variables or calls is non-constant.
fn fold_const(expr: &RExpr) -> Option<f64> {
    match expr {
        RExpr::Const(v) => Some(*v as f64),
        RExpr::Unary { op, operand } => {
            let v = fold_const(operand)?;
            Some(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Not => {
                    if v == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
        }
        RExpr::Binary { op, left, right } => {
            let l = fold_const(left)?;
            let r = fold_const(right)?;
            Some(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Rem => l % r,
                BinaryOp::Pow => l.powf(r),
                _ => return None,
            })
        }
        _ => None,
    }
}
