//! Error types for querygen

use thiserror::Error;

/// Main error type for metamodel and code generation operations
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A referenced supertype, embedded or entity type has no generated
    /// query type in the type mappings
    #[error("Configuration error: {referenced} referenced from {entity} is not registered")]
    Unregistered { entity: String, referenced: String },

    /// Property names must be unique within an entity
    #[error("Domain model error: duplicate property '{property}' on {entity}")]
    DuplicateProperty { entity: String, property: String },

    /// Pre-flight validation collected one or more errors
    #[error("Validation failed with {} error(s): {}", .0.len(), join_errors(.0))]
    Validation(Vec<CodegenError>),

    /// Writing generated source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Formatting into a text sink failed
    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl CodegenError {
    pub fn unregistered(entity: impl Into<String>, referenced: impl Into<String>) -> Self {
        CodegenError::Unregistered {
            entity: entity.into(),
            referenced: referenced.into(),
        }
    }
}

fn join_errors(errors: &[CodegenError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for querygen operations
pub type Result<T> = std::result::Result<T, CodegenError>;
