//! querygen Core - Type model and entity metamodel for query type generation
//!
//! This crate provides the fundamental abstractions for querygen:
//! - Declared types and their categories
//! - The entity metamodel (properties, supertypes, delegates, markers)
//! - The type-mapping registry linking entities to generated query types
//! - Error types shared by the generator and the evaluator

pub mod entity;
pub mod error;
pub mod mappings;
pub mod query_type;
pub mod types;

pub use entity::{Annotation, Constructor, Delegate, EntityType, Property, Supertype};
pub use error::{CodegenError, Result};
pub use mappings::TypeMappings;
pub use query_type::QueryTypeFactory;
pub use types::{Parameter, Type, TypeCategory, Types};
