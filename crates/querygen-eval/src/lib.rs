//! Dynamic evaluators for querygen expressions.
//!
//! An [`EvaluatorFactory`] fingerprints each request (source, projection
//! type, argument types, runtime types of constants), synthesizes a wrapper
//! unit on a cache miss, hands it to a [`CompileBackend`] exactly once and
//! caches the unit's entry point in a bounded LRU [`EntryCache`].
//!
//! - [`syntax`] - Expression and wrapper unit parsing
//! - [`interp`] - Tree-walking evaluation
//! - [`jit`] - Cranelift native compilation of the integer/boolean subset
//! - [`backend`] - Interpreting, JIT and tiered compile backends
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use querygen_config::EvaluatorConfig;
//! use querygen_core::Types;
//! use querygen_eval::{EvaluatorFactory, Value};
//!
//! let factory = EvaluatorFactory::from_config(&EvaluatorConfig::default());
//! let mut constants = IndexMap::new();
//! constants.insert("offset".to_string(), Value::Long(10));
//!
//! let evaluator = factory
//!     .create_evaluator::<i64>("return a * 2 + offset;", &Types::long(), &["a"], &[Types::long()], constants)
//!     .unwrap();
//!
//! assert_eq!(evaluator.evaluate(&[Value::Long(5)]).unwrap(), 20);
//! ```

pub mod backend;
pub mod cache;
pub mod error;
pub mod expr;
pub mod factory;
pub mod fingerprint;
pub mod interp;
pub mod jit;
pub mod syntax;
pub mod unit;
pub mod value;

pub use backend::{
    backend_for, CompileBackend, CompileRequest, InterpretingBackend, JitBackend, TieredBackend,
};
pub use cache::EntryCache;
pub use error::{CompileError, EvalError, Result};
pub use expr::Expr;
pub use factory::{Evaluator, EvaluatorFactory};
pub use fingerprint::fingerprint;
pub use unit::{CompiledUnit, EntryPoint, UnitStore};
pub use value::{FromValue, Value};
