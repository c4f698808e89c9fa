//! Declared types and their categories.
//!
//! A [`Type`] is an immutable description of a type referenced by an entity
//! metamodel: its qualified name, package, simple name, generic parameters
//! and a [`TypeCategory`] that drives which accessor wrapper is generated for
//! it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed classification of declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TypeCategory {
    Simple,
    Entity,
    Comparable,
    Enum,
    Date,
    DateTime,
    Time,
    Numeric,
    String,
    Boolean,
    Custom,
    Array,
    Collection,
    Set,
    List,
    Map,
}

impl TypeCategory {
    /// Returns the enclosing category, `None` for the lattice roots.
    pub fn supertype(self) -> Option<TypeCategory> {
        use TypeCategory::*;
        match self {
            Simple => None,
            Entity | Comparable | Custom | Array | Collection | Map => Some(Simple),
            Enum | Date | DateTime | Time | Numeric | String => Some(Comparable),
            Boolean => Some(Comparable),
            Set | List => Some(Collection),
        }
    }

    /// Returns true if `self` is `other` or one of its descendants.
    pub fn is_subcategory_of(self, other: TypeCategory) -> bool {
        let mut current = Some(self);
        while let Some(category) = current {
            if category == other {
                return true;
            }
            current = category.supertype();
        }
        false
    }

    /// Collection, set and list categories.
    pub fn is_collection_like(self) -> bool {
        matches!(
            self,
            TypeCategory::Collection | TypeCategory::Set | TypeCategory::List
        )
    }
}

/// A declared type.
///
/// Two types are equal iff their qualified names and generic parameters
/// match; category and flags do not take part in identity.
#[derive(Debug, Clone)]
pub struct Type {
    category: TypeCategory,
    full_name: Arc<str>,
    package: Arc<str>,
    simple_name: Arc<str>,
    parameters: Vec<Type>,
    component: Option<Box<Type>>,
    primitive: bool,
}

impl Type {
    /// Creates a type from its already split name parts.
    pub fn new(
        category: TypeCategory,
        full_name: impl Into<Arc<str>>,
        package: impl Into<Arc<str>>,
        simple_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            category,
            full_name: full_name.into(),
            package: package.into(),
            simple_name: simple_name.into(),
            parameters: Vec::new(),
            component: None,
            primitive: false,
        }
    }

    /// Creates a type from a qualified name, splitting off the package at
    /// the last `.`.
    pub fn class(category: TypeCategory, full_name: &str) -> Self {
        let (package, simple) = match full_name.rfind('.') {
            Some(pos) => (&full_name[..pos], &full_name[pos + 1..]),
            None => ("", full_name),
        };
        Self::new(category, full_name, package, simple)
    }

    /// Creates a primitive type such as `int` or `byte`.
    pub fn primitive(category: TypeCategory, name: &str) -> Self {
        Self {
            primitive: true,
            ..Self::new(category, name, "", name)
        }
    }

    /// Creates an array type with the given component.
    pub fn array_of(component: Type) -> Self {
        let full_name = format!("{}[]", component.full_name);
        let simple_name = format!("{}[]", component.simple_name);
        Self {
            category: TypeCategory::Array,
            full_name: full_name.into(),
            package: component.package.clone(),
            simple_name: simple_name.into(),
            parameters: Vec::new(),
            component: Some(Box::new(component)),
            primitive: false,
        }
    }

    /// Returns a copy with the given generic parameters.
    pub fn with_parameters(mut self, parameters: Vec<Type>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns a copy with a different category.
    pub fn with_category(mut self, category: TypeCategory) -> Self {
        self.category = category;
        self
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn package_name(&self) -> &str {
        &self.package
    }

    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    /// Returns the generic parameter at `index`, if declared.
    pub fn parameter(&self, index: usize) -> Option<&Type> {
        self.parameters.get(index)
    }

    pub fn component_type(&self) -> Option<&Type> {
        self.component.as_deref()
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    pub fn is_array(&self) -> bool {
        self.component.is_some()
    }

    /// Returns true for arrays of primitives such as `byte[]`.
    pub fn is_primitive_array(&self) -> bool {
        self.component.as_deref().is_some_and(Type::is_primitive)
    }

    /// Returns true if the type lives in the default package.
    pub fn in_default_package(&self) -> bool {
        self.package.is_empty()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name && self.parameters == other.parameters
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
        self.parameters.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)?;
        if !self.parameters.is_empty() {
            f.write_str("<")?;
            for (i, param) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: Arc<str>,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<Arc<str>>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Well-known types used by generated sources and evaluators.
pub struct Types;

impl Types {
    pub fn object() -> Type {
        Type::class(TypeCategory::Simple, "java.lang.Object")
    }

    pub fn string() -> Type {
        Type::class(TypeCategory::String, "java.lang.String")
    }

    pub fn boolean() -> Type {
        Type::class(TypeCategory::Boolean, "java.lang.Boolean")
    }

    pub fn long() -> Type {
        Type::class(TypeCategory::Numeric, "java.lang.Long")
    }

    pub fn integer() -> Type {
        Type::class(TypeCategory::Numeric, "java.lang.Integer")
    }

    pub fn double() -> Type {
        Type::class(TypeCategory::Numeric, "java.lang.Double")
    }

    pub fn big_decimal() -> Type {
        Type::class(TypeCategory::Numeric, "java.math.BigDecimal")
    }

    pub fn date() -> Type {
        Type::class(TypeCategory::DateTime, "java.util.Date")
    }

    pub fn sql_date() -> Type {
        Type::class(TypeCategory::Date, "java.sql.Date")
    }

    pub fn sql_time() -> Type {
        Type::class(TypeCategory::Time, "java.sql.Time")
    }

    pub fn locale() -> Type {
        Type::class(TypeCategory::Simple, "java.util.Locale")
    }

    pub fn byte_p() -> Type {
        Type::primitive(TypeCategory::Numeric, "byte")
    }

    pub fn int_p() -> Type {
        Type::primitive(TypeCategory::Numeric, "int")
    }

    pub fn long_p() -> Type {
        Type::primitive(TypeCategory::Numeric, "long")
    }

    pub fn boolean_p() -> Type {
        Type::primitive(TypeCategory::Boolean, "boolean")
    }

    pub fn collection(element: Type) -> Type {
        Type::class(TypeCategory::Collection, "java.util.Collection").with_parameters(vec![element])
    }

    pub fn set(element: Type) -> Type {
        Type::class(TypeCategory::Set, "java.util.Set").with_parameters(vec![element])
    }

    pub fn list(element: Type) -> Type {
        Type::class(TypeCategory::List, "java.util.List").with_parameters(vec![element])
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::class(TypeCategory::Map, "java.util.Map").with_parameters(vec![key, value])
    }

    /// Returns the wrapper type of a primitive, or the type itself.
    pub fn boxed(ty: &Type) -> Type {
        if !ty.is_primitive() {
            return ty.clone();
        }
        let full_name = match ty.full_name() {
            "byte" => "java.lang.Byte",
            "short" => "java.lang.Short",
            "int" => "java.lang.Integer",
            "long" => "java.lang.Long",
            "float" => "java.lang.Float",
            "double" => "java.lang.Double",
            "boolean" => "java.lang.Boolean",
            "char" => "java.lang.Character",
            _ => return ty.clone(),
        };
        Type::class(ty.category(), full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_splits_package() {
        let ty = Type::class(TypeCategory::Simple, "java.util.Locale");
        assert_eq!(ty.package_name(), "java.util");
        assert_eq!(ty.simple_name(), "Locale");

        let ty = Type::class(TypeCategory::Entity, "Entity");
        assert!(ty.in_default_package());
        assert_eq!(ty.simple_name(), "Entity");
    }

    #[test]
    fn test_equality_ignores_category() {
        let a = Type::class(TypeCategory::String, "java.lang.String");
        let b = Type::class(TypeCategory::Comparable, "java.lang.String");
        assert_eq!(a, b);
        assert_ne!(Types::list(Types::string()), Types::list(Types::long()));
    }

    #[test]
    fn test_primitive_array() {
        let bytes = Type::array_of(Types::byte_p());
        assert_eq!(bytes.full_name(), "byte[]");
        assert_eq!(bytes.category(), TypeCategory::Array);
        assert!(bytes.is_primitive_array());
        assert!(!Type::array_of(Types::string()).is_primitive_array());
    }

    #[test]
    fn test_category_lattice() {
        assert!(TypeCategory::Numeric.is_subcategory_of(TypeCategory::Comparable));
        assert!(TypeCategory::List.is_subcategory_of(TypeCategory::Collection));
        assert!(TypeCategory::Entity.is_subcategory_of(TypeCategory::Simple));
        assert!(!TypeCategory::Map.is_subcategory_of(TypeCategory::Collection));
    }

    #[test]
    fn test_display_includes_parameters() {
        let ty = Types::map(Types::string(), Types::long());
        assert_eq!(
            ty.to_string(),
            "java.util.Map<java.lang.String, java.lang.Long>"
        );
    }
}
