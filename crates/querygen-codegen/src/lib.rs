//! Query type generation for querygen.
//!
//! Turns entity metamodels into the source of their companion query types:
//!
//! - [`writer`] - The text sink and type rendering
//! - [`serializer`] - Root and embedded query type serialization
//! - [`naming`] - Schema identifier to code identifier conversion
//! - [`pipeline`] - Two-pass generation over a whole model
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use querygen_codegen::{GenerationTarget, Generator};
//! use querygen_config::GenerationConfig;
//! use querygen_core::{EntityType, Property, Type, TypeCategory, TypeMappings, Types};
//!
//! let mut customer = EntityType::new(Type::class(TypeCategory::Entity, "com.example.Customer"));
//! let name = Property::new(&customer, "name", Types::string());
//! customer.add_property(name).unwrap();
//!
//! let generator = Generator::new(Arc::new(TypeMappings::new()), GenerationConfig::default());
//! let sources = generator.generate(&[GenerationTarget::root(customer)]).unwrap();
//!
//! assert!(sources[0].content.contains("public final StringPath name = createString(\"name\");"));
//! ```

pub mod naming;
pub mod pipeline;
pub mod serializer;
pub mod writer;

pub use naming::{DefaultNamingStrategy, NamingStrategy};
pub use pipeline::{GeneratedSource, GenerationTarget, Generator};
pub use serializer::{EntitySerializer, GenerationMode};
pub use writer::{CodeWriter, JavaWriter};
