//! Two-pass generation over a whole model.
//!
//! Pass one registers the query type of every entity; a pre-flight check
//! then resolves every supertype and entity reference against the
//! registrations. Pass two serializes the entities in parallel. Cross
//! references can therefore appear in any order in the input.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use querygen_config::GenerationConfig;
use querygen_core::{CodegenError, EntityType, Result, Type, TypeMappings};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::serializer::{self, EntitySerializer, GenerationMode};
use crate::writer::JavaWriter;

/// An entity scheduled for generation.
#[derive(Debug, Clone)]
pub struct GenerationTarget {
    pub entity: Arc<EntityType>,
    pub mode: GenerationMode,
}

impl GenerationTarget {
    pub fn root(entity: impl Into<Arc<EntityType>>) -> Self {
        Self {
            entity: entity.into(),
            mode: GenerationMode::Root,
        }
    }

    pub fn embedded(entity: impl Into<Arc<EntityType>>) -> Self {
        Self {
            entity: entity.into(),
            mode: GenerationMode::Embedded,
        }
    }
}

/// Source text of one generated query type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    pub query_type: Type,
    /// Path relative to an output directory, e.g. `com/example/QCustomer.java`.
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedSource {
    /// Writes the source below `dir`, creating parent directories.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let target = dir.as_ref().join(&self.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &self.content)?;
        debug!(path = %target.display(), "Wrote generated source");
        Ok(target)
    }
}

/// Generates query types for a set of entities.
#[derive(Debug)]
pub struct Generator {
    serializer: EntitySerializer,
    config: GenerationConfig,
}

impl Generator {
    pub fn new(mappings: Arc<TypeMappings>, config: GenerationConfig) -> Self {
        Self {
            serializer: EntitySerializer::with_reserved_words(mappings),
            config,
        }
    }

    pub fn with_serializer(serializer: EntitySerializer, config: GenerationConfig) -> Self {
        Self { serializer, config }
    }

    pub fn mappings(&self) -> &TypeMappings {
        self.serializer.mappings()
    }

    /// Pass one: registers a query type for every target not registered yet.
    pub fn register(&self, targets: &[GenerationTarget]) {
        let factory = self.config.query_type.factory();
        for target in targets {
            if !self.mappings().is_registered(target.entity.ty()) {
                self.mappings()
                    .register(&target.entity, factory.create(target.entity.ty()));
            }
        }
    }

    /// Pre-flight check of every cross reference.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Validation`] listing every unresolved
    /// reference.
    pub fn validate(&self, targets: &[GenerationTarget]) -> Result<()> {
        let errors: Vec<CodegenError> = targets
            .iter()
            .flat_map(|t| serializer::validate(&t.entity, self.mappings()))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodegenError::Validation(errors))
        }
    }

    /// Runs both passes and returns the generated sources in input order.
    pub fn generate(&self, targets: &[GenerationTarget]) -> Result<Vec<GeneratedSource>> {
        info!(event = "generation_start", entity_count = targets.len());

        self.register(targets);
        self.validate(targets)?;

        let sources = targets
            .par_iter()
            .map(|target| self.serialize(target))
            .collect::<Result<Vec<_>>>()?;

        info!(event = "generation_end", source_count = sources.len());
        Ok(sources)
    }

    /// Generates every target and writes the sources below `dir`.
    pub fn generate_into(
        &self,
        targets: &[GenerationTarget],
        dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        self.generate(targets)?
            .iter()
            .map(|source| source.write_to(dir))
            .collect()
    }

    fn serialize(&self, target: &GenerationTarget) -> Result<GeneratedSource> {
        let mut writer = JavaWriter::default();
        self.serializer
            .serialize(&target.entity, &self.config, target.mode, &mut writer)?;
        let query_type = self
            .serializer
            .context(&target.entity, &self.config)
            .query_type;
        Ok(GeneratedSource {
            path: source_path(&query_type),
            query_type,
            content: writer.into_inner(),
        })
    }
}

fn source_path(query_type: &Type) -> PathBuf {
    let mut path: PathBuf = query_type
        .package_name()
        .split('.')
        .filter(|s| !s.is_empty())
        .collect();
    path.push(format!("{}.java", query_type.simple_name()));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygen_test::domain;
    use querygen_test::entity::{entity, with_property};

    fn generator() -> Generator {
        Generator::new(Arc::new(TypeMappings::new()), GenerationConfig::default())
    }

    #[test]
    fn test_forward_references_resolve() {
        let generator = generator();
        let sub = domain::sub_entity();
        let base = sub.supertypes()[0].entity_type().unwrap().clone();

        // Subtype listed before its supertype.
        let targets = vec![
            GenerationTarget::root(sub),
            GenerationTarget::root(base),
        ];
        let sources = generator.generate(&targets).unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].query_type.simple_name(), "QSubEntity");
        assert!(sources[0].content.contains("_super = new com.example.domain.QAbstractEntity(this);"));
        assert_eq!(
            sources[0].path,
            PathBuf::from("com/example/domain/QSubEntity.java")
        );
    }

    #[test]
    fn test_validation_reports_every_error() {
        let generator = generator();
        let complex = domain::complex_collections();
        let orphan = EntityType::with_supertypes(
            entity("Orphan").ty().clone(),
            [querygen_core::Supertype::new(entity("Missing").ty().clone())],
        );

        let err = generator
            .generate(&[GenerationTarget::root(complex), GenerationTarget::root(orphan)])
            .unwrap_err();
        match err {
            CodegenError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inherited_reference_fails_validation() {
        let generator = generator();
        let owner = entity("com.example.Owner").ty().clone();
        let base = Arc::new(with_property(entity("com.example.Base"), "owner", owner));
        querygen_test::register(generator.mappings(), &base);
        let sub = EntityType::with_supertypes(
            entity("com.example.Sub").ty().clone(),
            [querygen_core::Supertype::of(base)],
        );

        match generator.generate(&[GenerationTarget::root(sub)]).unwrap_err() {
            CodegenError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_embedded_targets_resolve() {
        let generator = generator();
        let targets = vec![
            GenerationTarget::root(domain::complex_collections()),
            GenerationTarget::embedded(domain::complex()),
        ];
        let sources = generator.generate(&targets).unwrap();
        assert!(sources[1]
            .content
            .contains("public class QComplex extends BeanPath<com.example.domain.Complex> {"));
        assert!(!sources[1].content.contains("String variable"));
    }

    #[test]
    fn test_default_package_path() {
        let generator = generator();
        let sources = generator
            .generate(&[GenerationTarget::embedded(entity("Entity"))])
            .unwrap();
        assert_eq!(sources[0].path, PathBuf::from("QEntity.java"));
    }

    #[test]
    fn test_write_to() {
        let dir = std::env::temp_dir().join(format!("querygen-pipeline-{}", std::process::id()));
        let generator = generator();
        let written = generator
            .generate_into(&[GenerationTarget::root(domain::abstract_entity())], &dir)
            .unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("com/example/domain/QAbstractEntity.java"));
        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("public class QAbstractEntity extends EntityPathBase"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
