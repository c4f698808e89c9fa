//! querygen - Query types and compiled evaluators in Rust
//!
//! Generates the source of companion query types from entity metamodels and
//! turns expression text into cached, reusable evaluators.
//!
//! # Example
//!
//! ```rust
//! use querygen::prelude::*;
//!
//! let factory = EvaluatorFactory::from_config(&EvaluatorConfig::default());
//! let evaluator = factory
//!     .create_evaluator::<bool>(
//!         "starts_with(name, \"A\")",
//!         &Types::boolean(),
//!         &["name"],
//!         &[Types::string()],
//!         Default::default(),
//!     )
//!     .unwrap();
//! assert!(evaluator.evaluate(&[Value::str("Ada")]).unwrap());
//! ```

// Type model and metamodel
pub use querygen_core::{
    Annotation, CodegenError, Constructor, Delegate, EntityType, Parameter, Property,
    QueryTypeFactory, Supertype, Type, TypeCategory, TypeMappings, Types,
};

// Configuration
pub use querygen_config::{
    BackendKind, ConfigError, EvaluatorConfig, GenerationConfig, QueryTypeConfig, QuerygenConfig,
};

// Query type generation
pub use querygen_codegen::{
    CodeWriter, DefaultNamingStrategy, EntitySerializer, GeneratedSource, GenerationMode,
    GenerationTarget, Generator, JavaWriter, NamingStrategy,
};

// Evaluators
pub use querygen_eval::{
    backend_for, CompileBackend, EntryCache, EvalError, Evaluator, EvaluatorFactory, FromValue,
    UnitStore, Value,
};

/// Installs the colored console subscriber.
#[cfg(feature = "console")]
pub use querygen_console::init as init_console;

/// Lower-level modules for custom backends and writers.
pub mod codegen {
    pub use querygen_codegen::{naming, pipeline, serializer, writer};
}

pub mod eval {
    pub use querygen_eval::{backend, cache, expr, fingerprint, interp, jit, syntax, unit, value};
}

pub mod prelude {
    pub use super::{EntityType, Property, Supertype, Type, TypeCategory, TypeMappings, Types};
    pub use super::{EvaluatorConfig, GenerationConfig, QuerygenConfig};
    pub use super::{GenerationTarget, Generator};
    pub use super::{EvalError, Evaluator, EvaluatorFactory, Value};
}
