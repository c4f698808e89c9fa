//! Cranelift JIT compiler for Expr trees.
//!
//! Compiles expressions into native function pointers operating on a flat
//! `*const i64` argument buffer:
//!
//! ```text
//! value = load(args + arg_idx * 8)
//! ```
//!
//! Every expression is type checked against the parameter kinds first, so
//! code generation itself never meets an unsupported node.

use cranelift_codegen::ir::condcodes::IntCC;
use cranelift_codegen::ir::types::I64;
use cranelift_codegen::ir::{AbiParam, Function, InstBuilder, MemFlags, UserFuncName, Value};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};
use querygen_core::Type;

use crate::error::CompileError;
use crate::expr::Expr;
use crate::value;

/// Native representation of a parameter or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Long,
    Bool,
}

impl NativeKind {
    /// Maps integral and boolean types, primitive or boxed.
    pub fn of(ty: &Type) -> Option<Self> {
        match ty.full_name() {
            "byte" | "short" | "int" | "long" | "java.lang.Byte" | "java.lang.Short"
            | "java.lang.Integer" | "java.lang.Long" => Some(NativeKind::Long),
            "boolean" | "java.lang.Boolean" => Some(NativeKind::Bool),
            _ => None,
        }
    }

    /// Converts an argument to its slot value.
    pub fn encode(self, value: &value::Value) -> Option<i64> {
        match (self, value) {
            (NativeKind::Long, value::Value::Long(n)) => Some(*n),
            (NativeKind::Bool, value::Value::Bool(b)) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Converts a native result back to a value.
    pub fn decode(self, raw: i64) -> value::Value {
        match self {
            NativeKind::Long => value::Value::Long(raw),
            NativeKind::Bool => value::Value::Bool(raw != 0),
        }
    }
}

/// A JIT-compiled function. Owns the Cranelift module (code memory) and holds
/// the raw function pointer.
pub struct JitFn {
    _module: JITModule,
    ptr: *const u8,
    arity: usize,
    returns: NativeKind,
}

// SAFETY: JITModule owns the code memory. ptr is valid for the module's lifetime.
unsafe impl Send for JitFn {}
unsafe impl Sync for JitFn {}

impl std::fmt::Debug for JitFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitFn")
            .field("arity", &self.arity)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl JitFn {
    /// Calls the compiled function with one slot per parameter.
    ///
    /// # Panics
    ///
    /// Panics if `args` holds fewer slots than the function's arity.
    #[inline]
    pub fn call(&self, args: &[i64]) -> i64 {
        assert!(
            args.len() >= self.arity,
            "JitFn::call: expected {} args, got {}",
            self.arity,
            args.len()
        );
        // SAFETY: ptr was finalized by the owned module with the signature
        // extern "C" fn(*const i64) -> i64, and args covers every load.
        let f: unsafe extern "C" fn(*const i64) -> i64 = unsafe { std::mem::transmute(self.ptr) };
        unsafe { f(args.as_ptr()) }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn returns(&self) -> NativeKind {
        self.returns
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Infers the result kind of `expr`, rejecting anything outside the native
/// subset.
pub fn check(expr: &Expr, params: &[NativeKind]) -> Result<NativeKind, CompileError> {
    use Expr::*;
    use NativeKind::{Bool, Long};

    let both = |l: &Expr, r: &Expr| -> Result<(NativeKind, NativeKind), CompileError> {
        Ok((check(l, params)?, check(r, params)?))
    };
    let mismatch = |op: &str| CompileError::Unsupported(format!("operand kinds of '{op}'"));

    match expr {
        Literal(value::Value::Long(_)) => Ok(Long),
        Literal(value::Value::Bool(_)) => Ok(Bool),
        Literal(v) => Err(CompileError::Unsupported(format!(
            "{} literal",
            v.type_name()
        ))),
        Arg(idx) => params.get(*idx).copied().ok_or_else(|| {
            CompileError::Unsupported(format!("argument {idx} of {}", params.len()))
        }),

        Eq(l, r) | Ne(l, r) => match both(l, r)? {
            (a, b) if a == b => Ok(Bool),
            _ => Err(mismatch("==")),
        },
        Lt(l, r) | Le(l, r) | Gt(l, r) | Ge(l, r) => match both(l, r)? {
            (Long, Long) => Ok(Bool),
            _ => Err(mismatch("<")),
        },
        And(l, r) | Or(l, r) => match both(l, r)? {
            (Bool, Bool) => Ok(Bool),
            _ => Err(mismatch("&&")),
        },
        Not(inner) => match check(inner, params)? {
            Bool => Ok(Bool),
            Long => Err(mismatch("!")),
        },

        Add(l, r) | Sub(l, r) | Mul(l, r) | Min(l, r) | Max(l, r) => match both(l, r)? {
            (Long, Long) => Ok(Long),
            _ => Err(mismatch("+")),
        },
        Neg(inner) | Abs(inner) => match check(inner, params)? {
            Long => Ok(Long),
            Bool => Err(mismatch("-")),
        },

        If {
            cond,
            then_expr,
            else_expr,
        } => match (check(cond, params)?, both(then_expr, else_expr)?) {
            (Bool, (a, b)) if a == b => Ok(a),
            _ => Err(mismatch("?:")),
        },

        Div(..) | Mod(..) => Err(CompileError::Unsupported(
            "division needs a zero check".to_string(),
        )),
        Len(_) | Lower(_) | Upper(_) | Contains(..) | StartsWith(..) | EndsWith(..)
        | Concat(_) => Err(CompileError::Unsupported("string operation".to_string())),
    }
}

/// Compiles `expr` for the given parameter kinds.
pub fn compile(expr: &Expr, params: &[NativeKind]) -> Result<JitFn, CompileError> {
    let returns = check(expr, params)?;
    let (module, ptr) = compile_function(expr)?;
    Ok(JitFn {
        _module: module,
        ptr,
        arity: params.len(),
        returns,
    })
}

// ---------------------------------------------------------------------------
// Internal codegen
// ---------------------------------------------------------------------------

fn make_jit_module() -> Result<JITModule, CompileError> {
    let setting = |e: settings::SetError| CompileError::Target(e.to_string());
    let mut flag_builder = settings::builder();
    flag_builder
        .set("use_colocated_libcalls", "false")
        .map_err(setting)?;
    flag_builder.set("is_pic", "false").map_err(setting)?;
    let isa_builder =
        cranelift_native::builder().map_err(|e| CompileError::Target(e.to_string()))?;
    let isa = isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(|e| CompileError::Target(e.to_string()))?;
    let builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    Ok(JITModule::new(builder))
}

fn compile_function(expr: &Expr) -> Result<(JITModule, *const u8), CompileError> {
    let mut module = make_jit_module()?;
    let ptr_type = module.target_config().pointer_type();

    // Single parameter: *const i64 (argument buffer)
    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(ptr_type));
    sig.returns.push(AbiParam::new(I64));

    let func_id = module.declare_function("eval", Linkage::Local, &sig)?;
    let mut func = Function::with_name_signature(UserFuncName::user(0, 0), sig);
    let mut func_ctx = FunctionBuilderContext::new();

    {
        let mut builder = FunctionBuilder::new(&mut func, &mut func_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let args_ptr = builder.block_params(entry)[0];
        let result = emit_expr(&mut builder, expr, args_ptr);
        builder.ins().return_(&[result]);
        builder.finalize();
    }

    let mut ctx = Context::for_function(func);
    module
        .define_function(func_id, &mut ctx)
        .map_err(|e| CompileError::Codegen(e.to_string()))?;
    module.clear_context(&mut ctx);
    module
        .finalize_definitions()
        .map_err(|e| CompileError::Codegen(e.to_string()))?;

    let ptr = module.get_finalized_function(func_id);
    Ok((module, ptr))
}

/// Emit Cranelift IR for a checked expression. All values are i64
/// internally; booleans are 0 or 1.
fn emit_expr(builder: &mut FunctionBuilder, expr: &Expr, args_ptr: Value) -> Value {
    use Expr::*;
    match expr {
        Literal(value::Value::Long(n)) => builder.ins().iconst(I64, *n),
        Literal(value::Value::Bool(b)) => builder.ins().iconst(I64, i64::from(*b)),

        Arg(idx) => {
            let offset = (*idx as i32) * 8;
            builder.ins().load(I64, MemFlags::trusted(), args_ptr, offset)
        }

        Eq(l, r) => icmp_op(builder, IntCC::Equal, l, r, args_ptr),
        Ne(l, r) => icmp_op(builder, IntCC::NotEqual, l, r, args_ptr),
        Lt(l, r) => icmp_op(builder, IntCC::SignedLessThan, l, r, args_ptr),
        Le(l, r) => icmp_op(builder, IntCC::SignedLessThanOrEqual, l, r, args_ptr),
        Gt(l, r) => icmp_op(builder, IntCC::SignedGreaterThan, l, r, args_ptr),
        Ge(l, r) => icmp_op(builder, IntCC::SignedGreaterThanOrEqual, l, r, args_ptr),

        And(l, r) => bin_op(builder, |b, x, y| b.ins().band(x, y), l, r, args_ptr),
        Or(l, r) => bin_op(builder, |b, x, y| b.ins().bor(x, y), l, r, args_ptr),
        Not(inner) => {
            let v = emit_expr(builder, inner, args_ptr);
            let one = builder.ins().iconst(I64, 1);
            builder.ins().bxor(v, one)
        }

        Add(l, r) => bin_op(builder, |b, x, y| b.ins().iadd(x, y), l, r, args_ptr),
        Sub(l, r) => bin_op(builder, |b, x, y| b.ins().isub(x, y), l, r, args_ptr),
        Mul(l, r) => bin_op(builder, |b, x, y| b.ins().imul(x, y), l, r, args_ptr),
        Neg(inner) => {
            let v = emit_expr(builder, inner, args_ptr);
            builder.ins().ineg(v)
        }
        Abs(inner) => {
            let v = emit_expr(builder, inner, args_ptr);
            let neg = builder.ins().ineg(v);
            let zero = builder.ins().iconst(I64, 0);
            let is_neg = builder.ins().icmp(IntCC::SignedLessThan, v, zero);
            builder.ins().select(is_neg, neg, v)
        }
        Min(l, r) => select_op(builder, IntCC::SignedLessThan, l, r, args_ptr),
        Max(l, r) => select_op(builder, IntCC::SignedGreaterThan, l, r, args_ptr),

        If {
            cond,
            then_expr,
            else_expr,
        } => {
            let c = emit_expr(builder, cond, args_ptr);
            let t = emit_expr(builder, then_expr, args_ptr);
            let e = emit_expr(builder, else_expr, args_ptr);
            let zero = builder.ins().iconst(I64, 0);
            let is_true = builder.ins().icmp(IntCC::NotEqual, c, zero);
            builder.ins().select(is_true, t, e)
        }

        // Rejected by `check`; keeps the match total.
        _ => builder.ins().iconst(I64, 0),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn icmp_op(
    builder: &mut FunctionBuilder,
    cc: IntCC,
    left: &Expr,
    right: &Expr,
    args_ptr: Value,
) -> Value {
    let l = emit_expr(builder, left, args_ptr);
    let r = emit_expr(builder, right, args_ptr);
    let cmp = builder.ins().icmp(cc, l, r);
    builder.ins().uextend(I64, cmp)
}

fn bin_op(
    builder: &mut FunctionBuilder,
    op: impl FnOnce(&mut FunctionBuilder, Value, Value) -> Value,
    left: &Expr,
    right: &Expr,
    args_ptr: Value,
) -> Value {
    let l = emit_expr(builder, left, args_ptr);
    let r = emit_expr(builder, right, args_ptr);
    op(builder, l, r)
}

fn select_op(
    builder: &mut FunctionBuilder,
    cc: IntCC,
    left: &Expr,
    right: &Expr,
    args_ptr: Value,
) -> Value {
    let l = emit_expr(builder, left, args_ptr);
    let r = emit_expr(builder, right, args_ptr);
    let cmp = builder.ins().icmp(cc, l, r);
    builder.ins().select(cmp, l, r)
}
