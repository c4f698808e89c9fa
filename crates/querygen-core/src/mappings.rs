//! Type-mapping registry.
//!
//! Associates every entity with the generated query type that represents
//! it, and maps property types to the accessor wrappers generated for them.
//! A generation pass typically registers entities in one order and resolves
//! cross references in another, so the registry is safe for concurrent
//! inserts and lookups.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::entity::EntityType;
use crate::error::{CodegenError, Result};
use crate::types::{Type, TypeCategory, Types};

/// Package of the accessor wrapper types referenced by generated code.
pub const PATH_PACKAGE: &str = "com.mysema.query.types.path";

/// Registry from entity type to generated query type.
#[derive(Debug)]
pub struct TypeMappings {
    query_types: RwLock<HashMap<Type, Type>>,
    path_package: String,
}

impl Default for TypeMappings {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMappings {
    pub fn new() -> Self {
        Self::with_path_package(PATH_PACKAGE)
    }

    /// Creates a registry whose accessor wrappers live in `package`.
    pub fn with_path_package(package: impl Into<String>) -> Self {
        Self {
            query_types: RwLock::new(HashMap::new()),
            path_package: package.into(),
        }
    }

    pub fn path_package(&self) -> &str {
        &self.path_package
    }

    /// Registers the generated type of `entity`. Re-registering replaces
    /// the previous mapping.
    pub fn register(&self, entity: &EntityType, query_type: Type) {
        debug!(
            entity = entity.ty().full_name(),
            query_type = query_type.full_name(),
            "Registered query type"
        );
        self.query_types.write().insert(entity.ty().clone(), query_type);
    }

    /// Returns the generated type registered for `ty`.
    pub fn lookup(&self, ty: &Type) -> Option<Type> {
        self.query_types.read().get(ty).cloned()
    }

    pub fn is_registered(&self, ty: &Type) -> bool {
        self.query_types.read().contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.query_types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.query_types.read().is_empty()
    }

    /// Like [`lookup`](Self::lookup), but a missing registration is a
    /// configuration error attributed to `owner`.
    pub fn require(&self, ty: &Type, owner: &Type) -> Result<Type> {
        self.lookup(ty)
            .ok_or_else(|| CodegenError::unregistered(owner.full_name(), ty.full_name()))
    }

    /// Returns the accessor wrapper type generated for a property of type
    /// `ty` declared on `owner`.
    pub fn path_type(&self, ty: &Type, owner: &Type) -> Result<Type> {
        let value = Types::boxed(ty);
        let path = |name: &str, params: Vec<Type>| {
            Type::class(TypeCategory::Simple, &format!("{}.{name}", self.path_package))
                .with_parameters(params)
        };
        let path_type = match ty.category() {
            TypeCategory::String => path("StringPath", vec![]),
            TypeCategory::Boolean => path("BooleanPath", vec![]),
            TypeCategory::Comparable => path("ComparablePath", vec![value]),
            TypeCategory::Enum => path("EnumPath", vec![value]),
            TypeCategory::Date => path("DatePath", vec![value]),
            TypeCategory::DateTime => path("DateTimePath", vec![value]),
            TypeCategory::Time => path("TimePath", vec![value]),
            TypeCategory::Numeric => path("NumberPath", vec![value]),
            TypeCategory::Array if ty.is_primitive_array() => path("SimplePath", vec![value]),
            TypeCategory::Array => path("ArrayPath", vec![value]),
            TypeCategory::Entity => self.require(ty, owner)?,
            TypeCategory::Simple | TypeCategory::Custom => path("SimplePath", vec![value]),
            TypeCategory::Collection | TypeCategory::Set | TypeCategory::List => {
                let element = element_type(ty, 0);
                let element_path = self.path_type(&element, owner)?;
                let name = match ty.category() {
                    TypeCategory::Set => "SetPath",
                    TypeCategory::List => "ListPath",
                    _ => "CollectionPath",
                };
                path(name, vec![element, element_path])
            }
            TypeCategory::Map => {
                let key = element_type(ty, 0);
                let value = element_type(ty, 1);
                let value_path = self.path_type(&value, owner)?;
                path("MapPath", vec![key, value, value_path])
            }
        };
        Ok(path_type)
    }
}

fn element_type(ty: &Type, index: usize) -> Type {
    ty.parameter(index)
        .map(Types::boxed)
        .unwrap_or_else(Types::object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_type::QueryTypeFactory;
    use std::sync::Arc;
    use std::thread;

    fn entity(name: &str) -> EntityType {
        EntityType::new(Type::class(TypeCategory::Entity, name))
    }

    #[test]
    fn test_register_and_lookup() {
        let mappings = TypeMappings::new();
        let e = entity("com.example.Customer");
        assert!(mappings.lookup(e.ty()).is_none());

        mappings.register(&e, QueryTypeFactory::default().create(e.ty()));
        assert_eq!(
            mappings.lookup(e.ty()).unwrap().full_name(),
            "com.example.QCustomer"
        );
        assert_eq!(mappings.len(), 1);
    }

    #[test]
    fn test_require_reports_owner() {
        let mappings = TypeMappings::new();
        let owner = entity("Owner");
        let missing = entity("Missing");
        let err = mappings.require(missing.ty(), owner.ty()).unwrap_err();
        match err {
            CodegenError::Unregistered { entity, referenced } => {
                assert_eq!(entity, "Owner");
                assert_eq!(referenced, "Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_path_types_by_category() {
        let mappings = TypeMappings::new();
        let owner = Types::object();

        let string = mappings.path_type(&Types::string(), &owner).unwrap();
        assert_eq!(string.simple_name(), "StringPath");
        assert!(string.parameters().is_empty());

        let number = mappings.path_type(&Types::int_p(), &owner).unwrap();
        assert_eq!(number.simple_name(), "NumberPath");
        assert_eq!(number.parameters()[0].full_name(), "java.lang.Integer");

        let bytes = mappings
            .path_type(&Type::array_of(Types::byte_p()), &owner)
            .unwrap();
        assert_eq!(bytes.simple_name(), "SimplePath");
        assert_eq!(bytes.parameters()[0].full_name(), "byte[]");
    }

    #[test]
    fn test_collection_path_uses_element_path() {
        let mappings = TypeMappings::new();
        let list = mappings
            .path_type(&Types::list(Types::string()), &Types::object())
            .unwrap();
        assert_eq!(list.simple_name(), "ListPath");
        assert_eq!(list.parameters()[0].full_name(), "java.lang.String");
        assert_eq!(list.parameters()[1].simple_name(), "StringPath");

        let map = mappings
            .path_type(&Types::map(Types::string(), Types::long()), &Types::object())
            .unwrap();
        assert_eq!(map.simple_name(), "MapPath");
        assert_eq!(map.parameters().len(), 3);
        assert_eq!(map.parameters()[2].simple_name(), "NumberPath");
        assert_eq!(map.parameters()[2].parameters()[0].full_name(), "java.lang.Long");
    }

    #[test]
    fn test_entity_path_requires_registration() {
        let mappings = TypeMappings::new();
        let other = entity("Other");
        let owner = Types::object();
        assert!(mappings.path_type(other.ty(), &owner).is_err());

        mappings.register(&other, QueryTypeFactory::default().create(other.ty()));
        assert_eq!(
            mappings.path_type(other.ty(), &owner).unwrap().full_name(),
            "QOther"
        );
    }

    #[test]
    fn test_concurrent_register_and_lookup() {
        let mappings = Arc::new(TypeMappings::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mappings = Arc::clone(&mappings);
                thread::spawn(move || {
                    let e = entity(&format!("com.example.E{i}"));
                    mappings.register(&e, QueryTypeFactory::default().create(e.ty()));
                    mappings.lookup(e.ty()).is_some()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(mappings.len(), 8);
    }
}
