//! JIT compilation of Expr trees to native machine code via Cranelift.
//!
//! Covers the integer and boolean subset of the expression language:
//! literals, arguments, comparisons, logic, `+ - *`, negation, `abs`,
//! `min`, `max` and the conditional. Anything else is rejected with
//! [`CompileError::Unsupported`](crate::CompileError::Unsupported) before
//! code generation starts.
//!
//! # Argument Layout
//!
//! Arguments are passed as a flat `*const i64` buffer with one slot per
//! parameter. Booleans are 0 or 1.
//!
//! # Function Signature
//!
//! `extern "C" fn(args: *const i64) -> i64`


mod compiler;

pub use compiler::{check, compile, JitFn, NativeKind};
