//! Cranelift lowering of the resolved IR.
//!
//! One compiled function per program. User variables live in f32 stack
//! slots (definite assignment already guarantees no slot is read before a
//! store on any path); expression-level control flow (`and`/`or`/ternary)
//! uses block parameters for the merged value.

use std::collections::HashMap;

use cranelift::codegen::ir::StackSlot;
use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};
use tracing::trace;

use vexpr_ast::builtins::{MathFn, PropWrite};
use vexpr_ast::{BinaryOp, Mode, UnaryOp};
use vexpr_resolve::{RExpr, RStmt, ResolvedProgram};

use crate::error::CompileError;
use crate::program::{OutputKind, Program};
use crate::shims;

/// Lower a resolved program to native code.
///
/// `output` drives the per-pixel conversion epilogue; it is ignored for
/// per-frame programs.
pub(crate) fn codegen(
    resolved: &ResolvedProgram,
    output: Option<OutputKind>,
) -> Result<Program, CompileError> {
    let mut jit_builder = JITBuilder::new(cranelift_module::default_libcall_names())?;
    for (name, addr) in shims::symbols() {
        jit_builder.symbol(name, addr);
    }
    let mut module = JITModule::new(jit_builder);
    let mut ctx = module.make_context();

    let ptr_type = module.target_config().pointer_type();
    match resolved.mode {
        Mode::PerPixel => {
            ctx.func.signature.params.push(AbiParam::new(ptr_type));
            for _ in 0..3 {
                ctx.func.signature.params.push(AbiParam::new(types::F32));
            }
            ctx.func.signature.returns.push(AbiParam::new(types::F32));
        }
        Mode::PerFrame => {
            ctx.func.signature.params.push(AbiParam::new(ptr_type));
            ctx.func.signature.params.push(AbiParam::new(types::F32));
        }
    }

    let mut func_ctx = FunctionBuilderContext::new();
    {
        let mut builder = FunctionBuilder::new(&mut ctx.func, &mut func_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let params = builder.block_params(entry).to_vec();
        let slots: Vec<StackSlot> = (0..resolved.var_count)
            .map(|_| {
                builder.create_sized_stack_slot(StackSlotData::new(
                    StackSlotKind::ExplicitSlot,
                    4,
                    2,
                ))
            })
            .collect();

        let (inputs_ptr, coord_x, coord_y, frame_n, sink_ptr) = match resolved.mode {
            Mode::PerPixel => (
                Some(params[0]),
                Some(params[1]),
                Some(params[2]),
                params[3],
                None,
            ),
            Mode::PerFrame => (None, None, None, params[1], Some(params[0])),
        };

        let mut translator = Translator {
            builder: &mut builder,
            module: &mut module,
            slots: &slots,
            inputs_ptr,
            coord_x,
            coord_y,
            frame_n,
            sink_ptr,
            shim_funcs: HashMap::new(),
        };
        translator.emit_stmts(&resolved.stmts)?;

        match (resolved.mode, resolved.result) {
            (Mode::PerPixel, Some(result)) => {
                let value = translator.read_slot(result);
                let value = translator.emit_output_conversion(value, output)?;
                translator.builder.ins().return_(&[value]);
            }
            (Mode::PerPixel, None) => {
                unreachable!("per-pixel programs always carry a result slot")
            }
            (Mode::PerFrame, _) => {
                translator.builder.ins().return_(&[]);
            }
        }

        builder.finalize();
    }

    let func_id = module.declare_function("vexpr_entry", Linkage::Export, &ctx.func.signature)?;
    module.define_function(func_id, &mut ctx)?;
    module.clear_context(&mut ctx);
    module.finalize_definitions()?;
    let entry = module.get_finalized_function(func_id);
    trace!(mode = ?resolved.mode, vars = resolved.var_count, "generated entry point");

    Ok(Program::new(
        module,
        entry,
        resolved.mode,
        resolved.prop_keys.clone(),
    ))
}

struct Translator<'a, 'b> {
    builder: &'a mut FunctionBuilder<'b>,
    module: &'a mut JITModule,
    slots: &'a [StackSlot],
    inputs_ptr: Option<Value>,
    coord_x: Option<Value>,
    coord_y: Option<Value>,
    frame_n: Value,
    sink_ptr: Option<Value>,
    shim_funcs: HashMap<&'static str, FuncId>,
}

impl<'a, 'b> Translator<'a, 'b> {
    fn emit_stmts(&mut self, stmts: &[RStmt]) -> Result<(), CompileError> {
        for stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &RStmt) -> Result<(), CompileError> {
        match stmt {
            RStmt::Assign { var, value } => {
                let value = self.emit_expr(value)?;
                self.builder
                    .ins()
                    .stack_store(value, self.slots[*var as usize], 0);
                Ok(())
            }
            RStmt::Eval(expr) => {
                self.emit_expr(expr)?;
                Ok(())
            }
            RStmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.emit_expr(cond)?;
                let cond = self.bool_from_value(cond);

                let then_block = self.builder.create_block();
                let else_block = self.builder.create_block();
                let merge_block = self.builder.create_block();

                self.builder
                    .ins()
                    .brif(cond, then_block, &[], else_block, &[]);

                self.builder.switch_to_block(then_block);
                self.emit_stmts(then_body)?;
                self.builder.ins().jump(merge_block, &[]);
                self.builder.seal_block(then_block);

                self.builder.switch_to_block(else_block);
                self.emit_stmts(else_body)?;
                self.builder.ins().jump(merge_block, &[]);
                self.builder.seal_block(else_block);

                self.builder.switch_to_block(merge_block);
                self.builder.seal_block(merge_block);
                Ok(())
            }
            RStmt::Prop { key, write, value } => self.emit_prop(*key, *write, value.as_ref()),
        }
    }

    fn emit_prop(
        &mut self,
        key: u32,
        write: PropWrite,
        value: Option<&RExpr>,
    ) -> Result<(), CompileError> {
        // The resolver only emits Prop statements in per-frame mode, where
        // the sink pointer is the first parameter.
        let sink = self
            .sink_ptr
            .unwrap_or_else(|| unreachable!("property write without a sink parameter"));
        let key = self.builder.ins().iconst(types::I32, key as i64);

        let (name, args) = match (write, value) {
            (PropWrite::SetFloat, Some(value)) => {
                let value = self.emit_expr(value)?;
                ("vexpr_prop_set_float", vec![sink, key, value])
            }
            (PropWrite::SetInt, Some(value)) => {
                let value = self.emit_expr(value)?;
                ("vexpr_prop_set_int", vec![sink, key, value])
            }
            (PropWrite::AppendFloat, Some(value)) => {
                let value = self.emit_expr(value)?;
                ("vexpr_prop_append_float", vec![sink, key, value])
            }
            (PropWrite::AppendInt, Some(value)) => {
                let value = self.emit_expr(value)?;
                ("vexpr_prop_append_int", vec![sink, key, value])
            }
            (PropWrite::Remove, _) => ("vexpr_prop_remove", vec![sink, key]),
            (_, None) => unreachable!("set writers always carry a value"),
        };

        let func_id = self.ensure_prop_shim(name, args.len())?;
        let func_ref = self.module.declare_func_in_func(func_id, self.builder.func);
        self.builder.ins().call(func_ref, &args);
        Ok(())
    }

    fn emit_expr(&mut self, expr: &RExpr) -> Result<Value, CompileError> {
        match expr {
            RExpr::Const(value) => Ok(self.const_f32(*value)),
            RExpr::ReadVar(var) => Ok(self.read_slot(*var)),
            RExpr::Input(index) => {
                let ptr = self
                    .inputs_ptr
                    .unwrap_or_else(|| unreachable!("clip input without an inputs parameter"));
                let offset = (*index as usize * std::mem::size_of::<f32>()) as i32;
                Ok(self
                    .builder
                    .ins()
                    .load(types::F32, MemFlags::new(), ptr, offset))
            }
            RExpr::CoordX => Ok(self
                .coord_x
                .unwrap_or_else(|| unreachable!("X outside per-pixel mode"))),
            RExpr::CoordY => Ok(self
                .coord_y
                .unwrap_or_else(|| unreachable!("Y outside per-pixel mode"))),
            RExpr::FrameIndex => Ok(self.frame_n),
            RExpr::Unary { op, operand } => {
                let value = self.emit_expr(operand)?;
                Ok(match op {
                    UnaryOp::Neg => self.builder.ins().fneg(value),
                    UnaryOp::Not => {
                        let zero = self.const_f32(0.0);
                        let is_zero = self.builder.ins().fcmp(FloatCC::Equal, value, zero);
                        self.float_from_bool(is_zero)
                    }
                })
            }
            RExpr::Binary { op, left, right } => self.emit_binary(*op, left, right),
            RExpr::Ternary { cond, then, other } => self.emit_select(cond, then, other),
            RExpr::Math { f, args } => self.emit_math(*f, args),
        }
    }

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        left: &RExpr,
        right: &RExpr,
    ) -> Result<Value, CompileError> {
        match op {
            BinaryOp::And => return self.emit_logical_and(left, right),
            BinaryOp::Or => return self.emit_logical_or(left, right),
            _ => {}
        }
        let l = self.emit_expr(left)?;
        let r = self.emit_expr(right)?;
        Ok(match op {
            BinaryOp::Add => self.builder.ins().fadd(l, r),
            BinaryOp::Sub => self.builder.ins().fsub(l, r),
            BinaryOp::Mul => self.builder.ins().fmul(l, r),
            BinaryOp::Div => self.builder.ins().fdiv(l, r),
            BinaryOp::Rem => self.call_math_shim("vexpr_fmodf", &[l, r])?,
            BinaryOp::Pow => self.call_math_shim("vexpr_powf", &[l, r])?,
            BinaryOp::Eq => self.emit_comparison(FloatCC::Equal, l, r),
            BinaryOp::Ne => self.emit_comparison(FloatCC::NotEqual, l, r),
            BinaryOp::Lt => self.emit_comparison(FloatCC::LessThan, l, r),
            BinaryOp::Le => self.emit_comparison(FloatCC::LessThanOrEqual, l, r),
            BinaryOp::Gt => self.emit_comparison(FloatCC::GreaterThan, l, r),
            BinaryOp::Ge => self.emit_comparison(FloatCC::GreaterThanOrEqual, l, r),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        })
    }

    fn emit_comparison(&mut self, cond: FloatCC, left: Value, right: Value) -> Value {
        let cmp = self.builder.ins().fcmp(cond, left, right);
        self.float_from_bool(cmp)
    }

    fn emit_logical_and(&mut self, left: &RExpr, right: &RExpr) -> Result<Value, CompileError> {
        let left_val = self.emit_expr(left)?;
        let condition = self.bool_from_value(left_val);
        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        let result_param = self.builder.append_block_param(merge_block, types::F32);

        self.builder
            .ins()
            .brif(condition, then_block, &[], else_block, &[]);

        self.builder.switch_to_block(then_block);
        let right_val = self.emit_expr(right)?;
        let right_bool = self.bool_from_value(right_val);
        let right_float = self.float_from_bool(right_bool);
        self.builder.ins().jump(merge_block, &[right_float]);
        self.builder.seal_block(then_block);

        self.builder.switch_to_block(else_block);
        let zero = self.const_f32(0.0);
        self.builder.ins().jump(merge_block, &[zero]);
        self.builder.seal_block(else_block);

        self.builder.switch_to_block(merge_block);
        self.builder.seal_block(merge_block);
        Ok(result_param)
    }

    fn emit_logical_or(&mut self, left: &RExpr, right: &RExpr) -> Result<Value, CompileError> {
        let left_val = self.emit_expr(left)?;
        let condition = self.bool_from_value(left_val);
        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        let result_param = self.builder.append_block_param(merge_block, types::F32);

        self.builder
            .ins()
            .brif(condition, then_block, &[], else_block, &[]);

        self.builder.switch_to_block(then_block);
        let one = self.const_f32(1.0);
        self.builder.ins().jump(merge_block, &[one]);
        self.builder.seal_block(then_block);

        self.builder.switch_to_block(else_block);
        let right_val = self.emit_expr(right)?;
        let right_bool = self.bool_from_value(right_val);
        let right_float = self.float_from_bool(right_bool);
        self.builder.ins().jump(merge_block, &[right_float]);
        self.builder.seal_block(else_block);

        self.builder.switch_to_block(merge_block);
        self.builder.seal_block(merge_block);
        Ok(result_param)
    }

    fn emit_select(
        &mut self,
        cond: &RExpr,
        then: &RExpr,
        other: &RExpr,
    ) -> Result<Value, CompileError> {
        let cond_val = self.emit_expr(cond)?;
        let cond_bool = self.bool_from_value(cond_val);

        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        let result_param = self.builder.append_block_param(merge_block, types::F32);

        self.builder
            .ins()
            .brif(cond_bool, then_block, &[], else_block, &[]);

        self.builder.switch_to_block(then_block);
        let then_val = self.emit_expr(then)?;
        self.builder.ins().jump(merge_block, &[then_val]);
        self.builder.seal_block(then_block);

        self.builder.switch_to_block(else_block);
        let else_val = self.emit_expr(other)?;
        self.builder.ins().jump(merge_block, &[else_val]);
        self.builder.seal_block(else_block);

        self.builder.switch_to_block(merge_block);
        self.builder.seal_block(merge_block);
        Ok(result_param)
    }

    fn emit_math(&mut self, f: MathFn, args: &[RExpr]) -> Result<Value, CompileError> {
        let values = args
            .iter()
            .map(|arg| self.emit_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match f {
            MathFn::Sqrt => self.builder.ins().sqrt(values[0]),
            MathFn::Abs => self.builder.ins().fabs(values[0]),
            MathFn::Floor => self.builder.ins().floor(values[0]),
            MathFn::Ceil => self.builder.ins().ceil(values[0]),
            MathFn::Trunc => self.builder.ins().trunc(values[0]),
            MathFn::Min => self.builder.ins().fmin(values[0], values[1]),
            MathFn::Max => self.builder.ins().fmax(values[0], values[1]),
            MathFn::Copysign => self.builder.ins().fcopysign(values[0], values[1]),
            MathFn::Clamp => {
                let lo = self.builder.ins().fmax(values[0], values[1]);
                self.builder.ins().fmin(lo, values[2])
            }
            MathFn::Sgn => {
                let zero = self.const_f32(0.0);
                let gt = self.builder.ins().fcmp(FloatCC::GreaterThan, values[0], zero);
                let lt = self.builder.ins().fcmp(FloatCC::LessThan, values[0], zero);
                let gt_f = self.float_from_bool(gt);
                let lt_f = self.float_from_bool(lt);
                self.builder.ins().fsub(gt_f, lt_f)
            }
            MathFn::Sin => self.call_math_shim("vexpr_sinf", &values)?,
            MathFn::Cos => self.call_math_shim("vexpr_cosf", &values)?,
            MathFn::Tan => self.call_math_shim("vexpr_tanf", &values)?,
            MathFn::Asin => self.call_math_shim("vexpr_asinf", &values)?,
            MathFn::Acos => self.call_math_shim("vexpr_acosf", &values)?,
            MathFn::Atan => self.call_math_shim("vexpr_atanf", &values)?,
            MathFn::Atan2 => self.call_math_shim("vexpr_atan2f", &values)?,
            MathFn::Exp => self.call_math_shim("vexpr_expf", &values)?,
            MathFn::Exp2 => self.call_math_shim("vexpr_exp2f", &values)?,
            MathFn::Log => self.call_math_shim("vexpr_logf", &values)?,
            MathFn::Log2 => self.call_math_shim("vexpr_log2f", &values)?,
            MathFn::Log10 => self.call_math_shim("vexpr_log10f", &values)?,
            MathFn::Pow => self.call_math_shim("vexpr_powf", &values)?,
            MathFn::Round => self.call_math_shim("vexpr_roundf", &values)?,
            MathFn::Fma => self.call_math_shim("vexpr_fmaf", &values)?,
        })
    }

    /// Integer outputs are rounded half away from zero, then clamped to
    /// the representable range; float outputs pass through.
    fn emit_output_conversion(
        &mut self,
        value: Value,
        output: Option<OutputKind>,
    ) -> Result<Value, CompileError> {
        match output {
            Some(OutputKind::Integer { depth }) => {
                let rounded = self.call_math_shim("vexpr_roundf", &[value])?;
                let zero = self.const_f32(0.0);
                let peak = self.const_f32(((1u64 << depth) - 1) as f32);
                let low = self.builder.ins().fmax(rounded, zero);
                Ok(self.builder.ins().fmin(low, peak))
            }
            Some(OutputKind::Float) | None => Ok(value),
        }
    }

    fn read_slot(&mut self, var: u32) -> Value {
        self.builder
            .ins()
            .stack_load(types::F32, self.slots[var as usize], 0)
    }

    fn bool_from_value(&mut self, value: Value) -> Value {
        let zero = self.const_f32(0.0);
        self.builder.ins().fcmp(FloatCC::NotEqual, value, zero)
    }

    fn float_from_bool(&mut self, value: Value) -> Value {
        let int_value = self.builder.ins().uextend(types::I32, value);
        self.builder.ins().fcvt_from_sint(types::F32, int_value)
    }

    fn const_f32(&mut self, value: f32) -> Value {
        self.builder.ins().f32const(Ieee32::with_float(value))
    }

    fn call_math_shim(&mut self, name: &'static str, args: &[Value]) -> Result<Value, CompileError> {
        let func_id = self.ensure_math_shim(name, args.len())?;
        let func_ref = self.module.declare_func_in_func(func_id, self.builder.func);
        let call = self.builder.ins().call(func_ref, args);
        let results = self.builder.inst_results(call);
        Ok(results[0])
    }

    fn ensure_math_shim(&mut self, name: &'static str, arity: usize) -> Result<FuncId, CompileError> {
        if let Some(id) = self.shim_funcs.get(name) {
            return Ok(*id);
        }
        let mut sig = self.module.make_signature();
        for _ in 0..arity {
            sig.params.push(AbiParam::new(types::F32));
        }
        sig.returns.push(AbiParam::new(types::F32));
        let func_id = self.module.declare_function(name, Linkage::Import, &sig)?;
        self.shim_funcs.insert(name, func_id);
        Ok(func_id)
    }

    fn ensure_prop_shim(&mut self, name: &'static str, arity: usize) -> Result<FuncId, CompileError> {
        if let Some(id) = self.shim_funcs.get(name) {
            return Ok(*id);
        }
        let ptr_type = self.module.target_config().pointer_type();
        let mut sig = self.module.make_signature();
        sig.params.push(AbiParam::new(ptr_type));
        sig.params.push(AbiParam::new(types::I32));
        if arity == 3 {
            sig.params.push(AbiParam::new(types::F32));
        }
        let func_id = self.module.declare_function(name, Linkage::Import, &sig)?;
        self.shim_funcs.insert(name, func_id);
        Ok(func_id)
    }
}
