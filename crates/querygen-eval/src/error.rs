//! Error types for expression evaluators

use querygen_core::CodegenError;
use thiserror::Error;

/// Errors raised while creating or invoking an evaluator
#[derive(Debug, Error)]
pub enum EvalError {
    /// Expression or wrapper source could not be parsed
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Argument names and argument types differ in length
    #[error("Signature error: {names} argument name(s) but {types} argument type(s)")]
    Signature { names: usize, types: usize },

    /// The backend rejected the synthesized unit
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// A unit reported as compiled could not be loaded afterwards
    #[error("Resolve error: compiled unit {id} could not be loaded")]
    Resolve { id: String },

    /// Staging synthesized source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Synthesizing the wrapper failed
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// A constant without a runtime type cannot take part in a fingerprint
    #[error("Constant '{name}' is null and has no runtime type")]
    NullConstant { name: String },

    /// Evaluation failed
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The result does not convert into the requested Rust type
    #[error("Conversion error: expected {expected}, found {found}")]
    Conversion {
        expected: &'static str,
        found: String,
    },
}

impl EvalError {
    pub fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime(message.into())
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }
}

/// Reasons a backend fails to turn a unit into native code
#[derive(Debug, Error)]
pub enum CompileError {
    /// The expression uses a construct outside the native subset
    #[error("unsupported for native compilation: {0}")]
    Unsupported(String),

    /// Host ISA detection or configuration failed
    #[error("target: {0}")]
    Target(String),

    /// Cranelift module error
    #[error("module: {0}")]
    Module(String),

    /// Cranelift code generation error
    #[error("codegen: {0}")]
    Codegen(String),
}

impl From<cranelift_module::ModuleError> for CompileError {
    fn from(e: cranelift_module::ModuleError) -> Self {
        CompileError::Module(e.to_string())
    }
}

/// Result type alias for evaluator operations
pub type Result<T> = std::result::Result<T, EvalError>;
