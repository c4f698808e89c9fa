//! Entity metamodel.
//!
//! An [`EntityType`] describes one data entity: its ordered properties, the
//! supertypes it descends from, the delegate operations it forwards and the
//! declarative markers attached to it. The metamodel is built once, then
//! handed read-only to the serializer.

use std::sync::Arc;

use indexmap::IndexMap;
use xxhash_rust::xxh3::Xxh3;

use crate::error::{CodegenError, Result};
use crate::types::{Parameter, Type, TypeCategory};

/// A declarative marker copied verbatim onto generated sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    ty: Type,
    values: IndexMap<Arc<str>, Arc<str>>,
}

impl Annotation {
    /// Creates a marker from the qualified name of its type.
    pub fn new(full_name: &str) -> Self {
        Self {
            ty: Type::class(TypeCategory::Simple, full_name),
            values: IndexMap::new(),
        }
    }

    /// Adds a member value. The value is literal source text, so string
    /// members must carry their own quotes.
    pub fn with_value(mut self, key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn annotation_type(&self) -> &Type {
        &self.ty
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(AsRef::as_ref)
    }
}

/// A property of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    declaring_type: Type,
    name: Arc<str>,
    ty: Type,
    annotations: Vec<Annotation>,
}

impl Property {
    /// Creates a property owned by `entity`.
    pub fn new(entity: &EntityType, name: impl Into<Arc<str>>, ty: Type) -> Self {
        Self {
            declaring_type: entity.ty.clone(),
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn declaring_type(&self) -> &Type {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn has_annotation(&self, full_name: &str) -> bool {
        self.annotations
            .iter()
            .any(|a| a.annotation_type().full_name() == full_name)
    }
}

/// "Is descended from" relation to another entity.
#[derive(Debug, Clone)]
pub struct Supertype {
    ty: Type,
    entity: Option<Arc<EntityType>>,
}

impl Supertype {
    /// Creates a supertype whose metamodel is not known.
    pub fn new(ty: Type) -> Self {
        Self { ty, entity: None }
    }

    /// Creates a supertype backed by its own metamodel.
    pub fn of(entity: Arc<EntityType>) -> Self {
        Self {
            ty: entity.ty.clone(),
            entity: Some(entity),
        }
    }

    pub fn with_entity(mut self, entity: Arc<EntityType>) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn entity_type(&self) -> Option<&EntityType> {
        self.entity.as_deref()
    }

    /// The type used to look up the generated supertype.
    pub fn mapping_key(&self) -> &Type {
        self.entity.as_deref().map(EntityType::ty).unwrap_or(&self.ty)
    }
}

/// An operation forwarded from the generated type to an external helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    declaring_type: Type,
    delegate_type: Type,
    name: Arc<str>,
    parameters: Vec<Parameter>,
    return_type: Type,
}

impl Delegate {
    pub fn new(
        declaring_type: Type,
        delegate_type: Type,
        name: impl Into<Arc<str>>,
        parameters: Vec<Parameter>,
        return_type: Type,
    ) -> Self {
        Self {
            declaring_type,
            delegate_type,
            name: name.into(),
            parameters,
            return_type,
        }
    }

    pub fn declaring_type(&self) -> &Type {
        &self.declaring_type
    }

    pub fn delegate_type(&self) -> &Type {
        &self.delegate_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }
}

/// A projection constructor, rendered as a static factory helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    parameters: Vec<Parameter>,
}

impl Constructor {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// In-memory description of one entity.
#[derive(Debug, Clone)]
pub struct EntityType {
    ty: Type,
    properties: Vec<Property>,
    supertypes: Vec<Supertype>,
    delegates: Vec<Delegate>,
    annotations: Vec<Annotation>,
    constructors: Vec<Constructor>,
    has_lists: bool,
    has_maps: bool,
}

impl EntityType {
    /// Creates an entity with no properties or supertypes.
    pub fn new(ty: Type) -> Self {
        EntityType {
            ty,
            properties: Vec::new(),
            supertypes: Vec::new(),
            delegates: Vec::new(),
            annotations: Vec::new(),
            constructors: Vec::new(),
            has_lists: false,
            has_maps: false,
        }
    }

    /// Creates an entity descending from the given supertypes.
    pub fn with_supertypes(ty: Type, supertypes: impl IntoIterator<Item = Supertype>) -> Self {
        let mut entity = Self::new(ty);
        for supertype in supertypes {
            entity.include(supertype);
        }
        entity
    }

    /// Adds a property. Names must be unique within the entity.
    pub fn add_property(&mut self, property: Property) -> Result<()> {
        if self.property(property.name()).is_some() {
            return Err(CodegenError::DuplicateProperty {
                entity: self.ty.full_name().to_string(),
                property: property.name().to_string(),
            });
        }
        self.properties.push(property);
        self.has_lists = self
            .properties
            .iter()
            .any(|p| p.ty.category() == TypeCategory::List);
        self.has_maps = self
            .properties
            .iter()
            .any(|p| p.ty.category() == TypeCategory::Map);
        Ok(())
    }

    pub fn add_delegate(&mut self, delegate: Delegate) {
        self.delegates.push(delegate);
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub fn add_constructor(&mut self, constructor: Constructor) {
        self.constructors.push(constructor);
    }

    /// Adds a supertype; including the same type twice is a no-op.
    pub fn include(&mut self, supertype: Supertype) {
        if !self.supertypes.iter().any(|s| s.ty == supertype.ty) {
            self.supertypes.push(supertype);
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The category the entity's own type was declared with.
    pub fn original_category(&self) -> TypeCategory {
        self.ty.category()
    }

    pub fn simple_name(&self) -> &str {
        self.ty.simple_name()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Finds a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn supertypes(&self) -> &[Supertype] {
        &self.supertypes
    }

    pub fn delegates(&self) -> &[Delegate] {
        &self.delegates
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Finds a marker by its simple or qualified name.
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| {
            a.annotation_type().full_name() == name || a.annotation_type().simple_name() == name
        })
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn has_lists(&self) -> bool {
        self.has_lists
    }

    pub fn has_maps(&self) -> bool {
        self.has_maps
    }

    /// The simple name with its first character lower-cased.
    pub fn uncapitalized_name(&self) -> String {
        let mut chars = self.simple_name().chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Hash over the entity's shape: its name, properties and supertypes.
    ///
    /// Stable across runs; used as the generated identity token.
    pub fn structural_hash(&self) -> i64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.ty.full_name().as_bytes());
        for property in &self.properties {
            hasher.update(b"\0");
            hasher.update(property.name().as_bytes());
            hasher.update(b":");
            hasher.update(property.ty().to_string().as_bytes());
        }
        for supertype in &self.supertypes {
            hasher.update(b"\0^");
            hasher.update(supertype.ty().full_name().as_bytes());
        }
        hasher.digest() as i64
    }
}

#[cfg(test)]
mod tests;
