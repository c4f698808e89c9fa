//! A small domain model.
//!
//! Mirrors the shapes generation has to cope with: a plain supertype, an
//! abstract generic base with a concrete subtype, embedded types inside
//! collections and maps, and an entity holding one property per category.

use std::sync::Arc;

use querygen_core::{Delegate, EntityType, Parameter, Supertype, Type, TypeCategory, Types};

use crate::entity::{entity, with_property};

pub const PACKAGE: &str = "com.example.domain";

fn qualified(simple_name: &str) -> String {
    format!("{PACKAGE}.{simple_name}")
}

/// Plain supertype with a single string property.
pub fn supertype() -> EntityType {
    with_property(
        entity(&qualified("Supertype")),
        "supertypeProperty",
        Types::string(),
    )
}

/// Entity without own properties descending from [`supertype`].
pub fn simple_entity() -> EntityType {
    EntityType::with_supertypes(
        Type::class(TypeCategory::Entity, &qualified("SimpleEntity")),
        [Supertype::of(Arc::new(supertype()))],
    )
}

/// Abstract base with an id and a name.
pub fn abstract_entity() -> EntityType {
    let base = entity(&qualified("AbstractEntity"));
    let base = with_property(base, "id", Types::long());
    with_property(base, "first", Types::string())
}

/// Concrete subtype of [`abstract_entity`].
pub fn sub_entity() -> EntityType {
    let sub = EntityType::with_supertypes(
        Type::class(TypeCategory::Entity, &qualified("SubEntity")),
        [Supertype::of(Arc::new(abstract_entity()))],
    );
    with_property(sub, "second", Types::string())
}

/// Embedded comparable value type.
pub fn complex() -> EntityType {
    with_property(entity(&qualified("Complex")), "a", Types::string())
}

/// Entity holding embedded [`complex`] values in a list and a map.
pub fn complex_collections() -> EntityType {
    let complex = complex().ty().clone();
    let owner = entity(&qualified("ComplexCollections"));
    let owner = with_property(owner, "list", Types::list(complex.clone()));
    with_property(owner, "map", Types::map(Types::string(), complex))
}

/// Entity with a list of opaque ordering values.
pub fn order_bys() -> EntityType {
    let order = Type::class(TypeCategory::Simple, "com.mysema.query.types.OrderSpecifier");
    with_property(entity(&qualified("OrderBys")), "orderBy", Types::list(order))
}

/// Entity with one property per scalar category, in declaration order.
pub fn all_categories() -> EntityType {
    let custom = Type::class(TypeCategory::Custom, &qualified("PropertyType"));
    let enumeration = Type::class(TypeCategory::Enum, &qualified("PropertyType"));
    let properties = [
        ("b", Types::boolean()),
        ("c", Types::string().with_category(TypeCategory::Comparable)),
        ("cu", custom),
        ("d", Types::sql_date()),
        ("e", enumeration),
        ("dt", Types::date()),
        ("i", Types::integer()),
        ("s", Types::string()),
        ("t", Types::sql_time()),
    ];
    properties
        .into_iter()
        .fold(entity("Entity"), |e, (name, ty)| with_property(e, name, ty))
}

/// Entity forwarding `test()` to a static helper on itself.
pub fn delegating_entity() -> EntityType {
    let mut e = entity("Entity");
    let ty = e.ty().clone();
    e.add_delegate(Delegate::new(
        ty.clone(),
        ty,
        "test",
        Vec::<Parameter>::new(),
        Types::string(),
    ));
    e
}
