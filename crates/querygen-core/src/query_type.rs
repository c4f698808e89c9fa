//! Naming of generated query types.

use crate::types::{Type, TypeCategory};

/// Creates the generated query type for an entity type.
///
/// The generated type is named `prefix + simple name + suffix` and lives in
/// the entity's package with `package_suffix` appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTypeFactory {
    prefix: String,
    suffix: String,
    package_suffix: String,
}

impl Default for QueryTypeFactory {
    fn default() -> Self {
        Self::new("Q", "", "")
    }
}

impl QueryTypeFactory {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        package_suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            package_suffix: package_suffix.into(),
        }
    }

    /// Returns the generated query type for `ty`.
    pub fn create(&self, ty: &Type) -> Type {
        let package = if ty.in_default_package() {
            self.package_suffix.trim_start_matches('.').to_string()
        } else {
            format!("{}{}", ty.package_name(), self.package_suffix)
        };
        let simple_name = format!("{}{}{}", self.prefix, ty.simple_name(), self.suffix);
        let full_name = if package.is_empty() {
            simple_name.clone()
        } else {
            format!("{package}.{simple_name}")
        };
        Type::new(TypeCategory::Entity, full_name, package, simple_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let factory = QueryTypeFactory::default();
        let q = factory.create(&Type::class(TypeCategory::Entity, "com.example.Customer"));
        assert_eq!(q.full_name(), "com.example.QCustomer");
        assert_eq!(q.package_name(), "com.example");
        assert_eq!(q.simple_name(), "QCustomer");
    }

    #[test]
    fn test_default_package() {
        let q = QueryTypeFactory::default().create(&Type::class(TypeCategory::Entity, "Entity"));
        assert_eq!(q.full_name(), "QEntity");
        assert!(q.in_default_package());
    }

    #[test]
    fn test_suffix_and_package_suffix() {
        let factory = QueryTypeFactory::new("", "Type", ".query");
        let q = factory.create(&Type::class(TypeCategory::Entity, "com.example.Customer"));
        assert_eq!(q.full_name(), "com.example.query.CustomerType");

        let q = factory.create(&Type::class(TypeCategory::Entity, "Entity"));
        assert_eq!(q.full_name(), "query.EntityType");
    }
}
