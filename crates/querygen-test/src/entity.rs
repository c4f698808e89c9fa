//! Builders for ad hoc entity metamodels.

use querygen_core::{EntityType, Property, QueryTypeFactory, Type, TypeCategory, TypeMappings};

/// Creates an entity of category `Entity` from a qualified name.
pub fn entity(full_name: &str) -> EntityType {
    entity_with_category(full_name, TypeCategory::Entity)
}

/// Creates an entity whose own type has the given category.
pub fn entity_with_category(full_name: &str, category: TypeCategory) -> EntityType {
    EntityType::new(Type::class(category, full_name))
}

/// Adds a property, panicking on duplicate names.
pub fn with_property(mut entity: EntityType, name: &str, ty: Type) -> EntityType {
    let property = Property::new(&entity, name, ty);
    entity
        .add_property(property)
        .expect("fixture property names are unique");
    entity
}

/// Registers `entity` under its default query type and returns that type.
pub fn register(mappings: &TypeMappings, entity: &EntityType) -> Type {
    let query_type = QueryTypeFactory::default().create(entity.ty());
    mappings.register(entity, query_type.clone());
    query_type
}

/// Registers every entity under its default query type.
pub fn register_all<'a>(
    mappings: &TypeMappings,
    entities: impl IntoIterator<Item = &'a EntityType>,
) {
    for entity in entities {
        register(mappings, entity);
    }
}
