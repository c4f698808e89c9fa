//! End-to-end tests: configuration, generation and evaluation together.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use querygen::prelude::*;
use querygen::{BackendKind, GenerationMode};
use querygen_test::domain;

const CONFIG: &str = r#"
[generation]
use_list_accessors = true

[generation.query_type]
package_suffix = ".query"

[evaluator]
cache_capacity = 8
backend = "tiered"
"#;

#[test]
fn test_generate_domain_from_config() {
    let config = QuerygenConfig::from_toml_str(CONFIG).unwrap();
    let generator = Generator::new(Arc::new(TypeMappings::new()), config.generation);

    let sub = domain::sub_entity();
    let base = sub.supertypes()[0].entity_type().unwrap().clone();
    let targets = vec![
        GenerationTarget::root(sub),
        GenerationTarget::root(base),
        GenerationTarget::root(domain::complex_collections()),
        GenerationTarget::embedded(domain::complex()),
    ];
    let sources = generator.generate(&targets).unwrap();

    let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
    assert_eq!(
        paths,
        [
            "com/example/domain/query/QSubEntity.java",
            "com/example/domain/query/QAbstractEntity.java",
            "com/example/domain/query/QComplexCollections.java",
            "com/example/domain/query/QComplex.java",
        ]
        .map(PathBuf::from)
    );
    assert_eq!(targets[3].mode, GenerationMode::Embedded);

    let sub_source = &sources[0].content;
    assert!(sub_source.starts_with("package com.example.domain.query;"));
    assert!(sub_source.contains("QAbstractEntity(this);"));
    assert!(sub_source.contains("public final StringPath first = _super.first;"));

    // List accessors are switched on by the loaded configuration.
    let collections = &sources[2].content;
    assert!(collections.contains(" list(int index) {"));
    assert!(collections.contains("return list.get(index);"));
}

#[test]
fn test_evaluators_from_config() {
    let config = QuerygenConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.evaluator.backend, BackendKind::Tiered);
    let factory = EvaluatorFactory::from_config(&config.evaluator);

    let mut limits = IndexMap::new();
    limits.insert("min".to_string(), Value::Long(18));
    let adult = factory
        .create_evaluator::<bool>("age >= min", &Types::boolean(), &["age"], &[Types::int_p()], limits)
        .unwrap();
    assert!(adult.evaluate(&[Value::Long(30)]).unwrap());
    assert!(!adult.evaluate(&[Value::Long(12)]).unwrap());

    let greeting = factory
        .create_evaluator::<String>(
            "\"Hello, \" + name",
            &Types::string(),
            &["name"],
            &[Types::string()],
            IndexMap::new(),
        )
        .unwrap();
    assert_eq!(greeting.evaluate(&[Value::str("Ada")]).unwrap(), "Hello, Ada");

    // A second request with the same shape reuses the cached entry.
    let mut limits = IndexMap::new();
    limits.insert("min".to_string(), Value::Long(21));
    let drinking = factory
        .create_evaluator::<bool>("age >= min", &Types::boolean(), &["age"], &[Types::int_p()], limits)
        .unwrap();
    assert!(Arc::ptr_eq(adult.entry_point(), drinking.entry_point()));
    assert!(!drinking.evaluate(&[Value::Long(18)]).unwrap());
    assert_eq!(factory.cache().len(), 2);
    assert_eq!(factory.loader().len(), 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = QuerygenConfig::from_toml_str("[evaluator]\ncache_capacity = 0\n").unwrap_err();
    assert!(matches!(err, querygen::ConfigError::Invalid(_)));
}
