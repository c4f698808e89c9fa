//! Tests for the entity metamodel.

use super::*;
use crate::types::Types;

fn entity(name: &str) -> EntityType {
    EntityType::new(Type::class(TypeCategory::Entity, name))
}

#[test]
fn test_add_property_keeps_order() {
    let mut e = entity("Entity");
    for name in ["b", "a", "c"] {
        let p = Property::new(&e, name, Types::string());
        e.add_property(p).unwrap();
    }
    let names: Vec<_> = e.properties().iter().map(Property::name).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
    assert_eq!(e.properties()[0].declaring_type(), e.ty());
}

#[test]
fn test_duplicate_property_rejected() {
    let mut e = entity("Entity");
    let p = Property::new(&e, "name", Types::string());
    e.add_property(p.clone()).unwrap();

    let err = e.add_property(p).unwrap_err();
    assert!(matches!(err, CodegenError::DuplicateProperty { .. }));
    assert_eq!(e.properties().len(), 1);
}

#[test]
fn test_derived_list_and_map_flags() {
    let mut e = entity("Entity");
    assert!(!e.has_lists());
    assert!(!e.has_maps());

    let list = Property::new(&e, "items", Types::list(Types::string()));
    e.add_property(list).unwrap();
    assert!(e.has_lists());
    assert!(!e.has_maps());

    let map = Property::new(&e, "index", Types::map(Types::string(), Types::long()));
    e.add_property(map).unwrap();
    assert!(e.has_maps());
}

#[test]
fn test_set_is_not_a_list() {
    let mut e = entity("Entity");
    let set = Property::new(&e, "tags", Types::set(Types::string()));
    e.add_property(set).unwrap();
    assert!(!e.has_lists());
}

#[test]
fn test_include_deduplicates() {
    let parent = Arc::new(entity("Parent"));
    let mut e = entity("Child");
    e.include(Supertype::of(parent.clone()));
    e.include(Supertype::of(parent));
    assert_eq!(e.supertypes().len(), 1);
    assert_eq!(e.supertypes()[0].mapping_key().full_name(), "Parent");
}

#[test]
fn test_structural_hash_tracks_shape() {
    let mut a = entity("Entity");
    let b = entity("Entity");
    assert_eq!(a.structural_hash(), b.structural_hash());

    let p = Property::new(&a, "name", Types::string());
    a.add_property(p).unwrap();
    assert_ne!(a.structural_hash(), b.structural_hash());
}

#[test]
fn test_uncapitalized_name() {
    assert_eq!(entity("com.example.Customer").uncapitalized_name(), "customer");
    assert_eq!(entity("QEntity").uncapitalized_name(), "qEntity");
}

#[test]
fn test_annotation_lookup() {
    let mut e = entity("Entity");
    e.add_annotation(Annotation::new("com.example.Table").with_value("value", "\"OBJECT\""));
    assert_eq!(e.annotation("Table").unwrap().value("value"), Some("\"OBJECT\""));
    assert!(e.annotation("com.example.Table").is_some());
    assert!(e.annotation("Missing").is_none());
}
