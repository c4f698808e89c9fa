//! Entity serializer.
//!
//! Emits the source of the query type generated for one entity. A single
//! serializer covers both root entities and embedded types; the
//! [`GenerationMode`] decides the header rule and whether the standalone
//! construction members are emitted.
//!
//! Each step of the output is a free function over a [`Context`] and can be
//! exercised on its own:
//!
//! 1. [`package`] and [`imports`]
//! 2. [`class_header`]: javadoc, markers, header line and identity token
//! 3. [`default_instance`] (root only)
//! 4. [`property_fields`] and list/map accessor methods
//! 5. [`supertype_fields`] with inherited delegating fields
//! 6. [`constructors`] and [`factory_methods`] (root only)
//! 7. [`delegate_methods`]

use std::collections::HashSet;
use std::sync::Arc;

use querygen_config::GenerationConfig;
use querygen_core::{
    CodegenError, EntityType, Property, Result, Supertype, Type, TypeCategory, TypeMappings,
    Types,
};
use tracing::debug;

use crate::naming::RESERVED_WORDS;
use crate::writer::{declare_params, CodeWriter};

/// Package of `Path`, `PathMetadata` and friends.
pub const METADATA_PACKAGE: &str = "com.mysema.query.types";

/// Package of the comparable expression types used by accessor methods.
pub const EXPR_PACKAGE: &str = "com.mysema.query.types.expr";

const PATH_METADATA_FACTORY: &str = "com.mysema.query.types.PathMetadataFactory";

/// Kind of query type being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationMode {
    /// Standalone entity: root constructors, a default instance and static
    /// factory helpers.
    Root,
    /// Embedded type, always constructed relative to a containing path.
    Embedded,
}

/// Serializes entity metamodels into query type sources.
#[derive(Debug)]
pub struct EntitySerializer {
    mappings: Arc<TypeMappings>,
    keywords: HashSet<String>,
}

impl EntitySerializer {
    /// Creates a serializer escaping the given keywords in field names.
    pub fn new<I, K>(mappings: Arc<TypeMappings>, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            mappings,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a serializer escaping the reserved words of the target
    /// language.
    pub fn with_reserved_words(mappings: Arc<TypeMappings>) -> Self {
        Self::new(mappings, RESERVED_WORDS.iter().copied())
    }

    pub fn mappings(&self) -> &TypeMappings {
        &self.mappings
    }

    /// Writes the complete query type of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Unregistered`] if a supertype or a referenced
    /// entity type has no registered query type.
    pub fn serialize(
        &self,
        entity: &EntityType,
        config: &GenerationConfig,
        mode: GenerationMode,
        writer: &mut dyn CodeWriter,
    ) -> Result<()> {
        let ctx = self.context(entity, config);

        package(&ctx, writer)?;
        imports(&ctx, mode, writer)?;
        class_header(&ctx, mode, writer)?;
        default_instance(&ctx, mode, writer)?;
        property_fields(&ctx, writer)?;
        supertype_fields(&ctx, writer)?;
        constructors(&ctx, mode, writer)?;
        factory_methods(&ctx, mode, writer)?;
        delegate_methods(&ctx, writer)?;
        writer.end()?;

        debug!(
            entity = entity.ty().full_name(),
            query_type = ctx.query_type.full_name(),
            ?mode,
            "Serialized query type"
        );
        Ok(())
    }

    /// Builds the context the step functions run against.
    pub fn context<'a>(
        &'a self,
        entity: &'a EntityType,
        config: &'a GenerationConfig,
    ) -> Context<'a> {
        let query_type = self
            .mappings
            .lookup(entity.ty())
            .unwrap_or_else(|| config.query_type.factory().create(entity.ty()));
        Context {
            entity,
            config,
            mappings: &self.mappings,
            keywords: &self.keywords,
            query_type,
        }
    }
}

/// Inputs shared by the serialization steps of one entity.
#[derive(Debug)]
pub struct Context<'a> {
    pub entity: &'a EntityType,
    pub config: &'a GenerationConfig,
    pub mappings: &'a TypeMappings,
    keywords: &'a HashSet<String>,
    /// The generated type; the registered one, or a fresh name if the entity
    /// itself was never registered.
    pub query_type: Type,
}

impl Context<'_> {
    /// Field name for a property, with a `$` suffix on keywords.
    pub fn escape(&self, name: &str) -> String {
        if self.keywords.contains(name) || self.config.keywords.iter().any(|k| k == name) {
            format!("{name}$")
        } else {
            name.to_string()
        }
    }

    fn path(&self, simple_name: &str) -> Type {
        Type::class(
            TypeCategory::Simple,
            &format!("{}.{simple_name}", self.mappings.path_package()),
        )
    }

    fn is_generic_category(&self) -> bool {
        !matches!(
            self.entity.original_category(),
            TypeCategory::String | TypeCategory::Boolean
        )
    }
}

/// Superclass of the generated type.
pub fn superclass(ctx: &Context<'_>, mode: GenerationMode) -> Type {
    let entity_type = ctx.entity.ty().clone();
    if mode == GenerationMode::Root {
        return ctx.path("EntityPathBase").with_parameters(vec![entity_type]);
    }
    let path = if ctx.entity.properties().is_empty() {
        match ctx.entity.original_category() {
            TypeCategory::Comparable => "ComparablePath",
            TypeCategory::Enum => "EnumPath",
            TypeCategory::Date => "DatePath",
            TypeCategory::DateTime => "DateTimePath",
            TypeCategory::Time => "TimePath",
            TypeCategory::Numeric => "NumberPath",
            TypeCategory::String => "StringPath",
            TypeCategory::Boolean => "BooleanPath",
            _ => "BeanPath",
        }
    } else {
        "BeanPath"
    };
    if ctx.is_generic_category() {
        ctx.path(path).with_parameters(vec![entity_type])
    } else {
        ctx.path(path)
    }
}

pub fn package(ctx: &Context<'_>, writer: &mut dyn CodeWriter) -> Result<()> {
    writer.package(ctx.query_type.package_name())
}

/// Writes the import list and registers it with the writer.
pub fn imports(ctx: &Context<'_>, mode: GenerationMode, writer: &mut dyn CodeWriter) -> Result<()> {
    let entity = ctx.entity;
    let config = ctx.config;
    let mut packages = vec![METADATA_PACKAGE, ctx.mappings.path_package()];
    if (entity.has_lists() && config.use_list_accessors)
        || (entity.has_maps() && config.use_map_accessors)
        || !entity.delegates().is_empty()
    {
        packages.push(EXPR_PACKAGE);
    }
    for delegate in entity.delegates() {
        let package = delegate.delegate_type().package_name();
        if !package.is_empty()
            && package != "java.lang"
            && package != ctx.query_type.package_name()
            && !packages.contains(&package)
        {
            packages.push(package);
        }
    }
    writer.import_packages(&packages)?;
    if mode == GenerationMode::Root {
        writer.static_imports(&[PATH_METADATA_FACTORY])?;
    }
    Ok(())
}

/// Writes the javadoc, the copied markers, the header line and the identity
/// token.
pub fn class_header(
    ctx: &Context<'_>,
    mode: GenerationMode,
    writer: &mut dyn CodeWriter,
) -> Result<()> {
    let doc = format!(
        "{} is a query type for {}",
        ctx.query_type.simple_name(),
        ctx.entity.simple_name()
    );
    writer.javadoc(&[&doc])?;
    for annotation in ctx.entity.annotations() {
        writer.annotation(annotation)?;
    }
    writer.begin_class(&ctx.query_type, Some(&superclass(ctx, mode)))?;

    // Placeholder identity, stable for an unchanged entity shape.
    writer.private_static_final(
        "long",
        "serialVersionUID",
        &format!("{}L", ctx.entity.structural_hash()),
    )
}

pub fn default_instance(
    ctx: &Context<'_>,
    mode: GenerationMode,
    writer: &mut dyn CodeWriter,
) -> Result<()> {
    if mode != GenerationMode::Root || !ctx.config.create_default_variable {
        return Ok(());
    }
    let variable = ctx.escape(&ctx.entity.uncapitalized_name());
    let query_type = ctx.query_type.simple_name();
    writer.public_static_final(
        query_type,
        &variable,
        &format!("new {query_type}(\"{variable}\")"),
    )
}

/// Writes one field per own property, plus list and map accessor methods
/// where enabled.
pub fn property_fields(ctx: &Context<'_>, writer: &mut dyn CodeWriter) -> Result<()> {
    for property in ctx.entity.properties() {
        let path_type = ctx.mappings.path_type(property.ty(), ctx.entity.ty())?;
        let field = ctx.escape(property.name());
        let initializer = initializer(property, &path_type, writer);
        let field_type = writer.generic_name(&path_type);
        writer.public_final(&field_type, &field, &initializer)?;

        match property.ty().category() {
            TypeCategory::List if ctx.config.use_list_accessors => {
                list_accessors(&field, &path_type, writer)?;
            }
            TypeCategory::Map if ctx.config.use_map_accessors => {
                map_accessors(&field, &path_type, writer)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn initializer(property: &Property, path_type: &Type, writer: &dyn CodeWriter) -> String {
    let name = property.name();
    let value = Types::boxed(property.ty());
    let class = |ty: &Type| format!("{}.class", writer.raw_name(ty));
    let typed = |factory: &str| format!("{factory}(\"{name}\", {})", class(&value));
    let type_args = || {
        path_type
            .parameters()
            .iter()
            .map(|p| writer.generic_name(p))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let class_args = || {
        path_type
            .parameters()
            .iter()
            .map(|p| class(p))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match property.ty().category() {
        TypeCategory::String => format!("createString(\"{name}\")"),
        TypeCategory::Boolean => format!("createBoolean(\"{name}\")"),
        TypeCategory::Comparable => typed("createComparable"),
        TypeCategory::Enum => typed("createEnum"),
        TypeCategory::Date => typed("createDate"),
        TypeCategory::DateTime => typed("createDateTime"),
        TypeCategory::Time => typed("createTime"),
        TypeCategory::Numeric => typed("createNumber"),
        TypeCategory::Array if property.ty().is_primitive_array() => typed("createSimple"),
        TypeCategory::Array => typed("createArray"),
        TypeCategory::Simple | TypeCategory::Custom => typed("createSimple"),
        TypeCategory::Entity => {
            format!("new {}(forProperty(\"{name}\"))", writer.raw_name(path_type))
        }
        category @ (TypeCategory::Collection | TypeCategory::Set | TypeCategory::List) => {
            let factory = match category {
                TypeCategory::Set => "createSet",
                TypeCategory::List => "createList",
                _ => "createCollection",
            };
            format!(
                "this.<{}>{factory}(\"{name}\", {})",
                type_args(),
                class_args()
            )
        }
        TypeCategory::Map => format!(
            "this.<{}>createMap(\"{name}\", {})",
            type_args(),
            class_args()
        ),
    }
}

fn list_accessors(field: &str, path_type: &Type, writer: &mut dyn CodeWriter) -> Result<()> {
    let Some(element_path) = path_type.parameter(1) else {
        return Ok(());
    };
    let returns = writer.generic_name(element_path);
    for param in ["int index", "Expression<Integer> index"] {
        writer.begin_public_method(&returns, field, &[param.to_string()])?;
        writer.line(&format!("return {field}.get(index);"))?;
        writer.end()?;
    }
    Ok(())
}

fn map_accessors(field: &str, path_type: &Type, writer: &mut dyn CodeWriter) -> Result<()> {
    let [key, _, value_path] = path_type.parameters() else {
        return Ok(());
    };
    let returns = writer.generic_name(value_path);
    let key = writer.generic_name(key);
    for param in [format!("{key} key"), format!("Expression<{key}> key")] {
        writer.begin_public_method(&returns, field, &[param])?;
        writer.line(&format!("return {field}.get(key);"))?;
        writer.end()?;
    }
    Ok(())
}

/// Writes one delegation field per supertype, followed by delegating fields
/// for the supertype's properties not shadowed by own properties.
pub fn supertype_fields(ctx: &Context<'_>, writer: &mut dyn CodeWriter) -> Result<()> {
    let mut emitted: HashSet<&str> = ctx.entity.properties().iter().map(Property::name).collect();

    for (i, supertype) in ctx.entity.supertypes().iter().enumerate() {
        let field = match i {
            0 => "_super".to_string(),
            n => format!("_super{}", n + 1),
        };
        let query_type = ctx.mappings.require(supertype.mapping_key(), ctx.entity.ty())?;
        let name = writer.raw_name(&query_type);
        writer.public_final(&name, &field, &format!("new {name}(this)"))?;

        let Some(super_entity) = supertype.entity_type() else {
            continue;
        };
        for property in inherited_properties(super_entity) {
            if !emitted.insert(property.name()) {
                continue;
            }
            let path_type = ctx
                .mappings
                .path_type(property.ty(), property.declaring_type())?;
            let escaped = ctx.escape(property.name());
            let field_type = writer.generic_name(&path_type);
            writer.public_final(&field_type, &escaped, &format!("{field}.{escaped}"))?;
        }
    }
    Ok(())
}

/// Properties visible on the query type of `entity`, own first.
fn inherited_properties(entity: &EntityType) -> Vec<&Property> {
    let mut properties: Vec<&Property> = entity.properties().iter().collect();
    for supertype in entity.supertypes() {
        if let Some(super_entity) = supertype.entity_type() {
            properties.extend(inherited_properties(super_entity));
        }
    }
    properties
}

/// Writes the constructors: by variable (root only), by parent path and by
/// metadata.
pub fn constructors(
    ctx: &Context<'_>,
    mode: GenerationMode,
    writer: &mut dyn CodeWriter,
) -> Result<()> {
    let name = ctx.query_type.simple_name();
    let entity_class = format!("{}.class", writer.raw_name(ctx.entity.ty()));
    let generic = !superclass(ctx, mode).parameters().is_empty();

    if mode == GenerationMode::Root {
        writer.begin_constructor(name, &["String variable".to_string()])?;
        writer.line(&format!("super({entity_class}, forVariable(variable));"))?;
        writer.end()?;
    }

    let entity_path = format!("Path<? extends {}> entity", writer.generic_name(ctx.entity.ty()));
    writer.begin_constructor(name, &[entity_path])?;
    if generic {
        writer.line("super(entity.getType(), entity.getMetadata());")?;
    } else {
        writer.line("super(entity.getMetadata());")?;
    }
    writer.end()?;

    writer.begin_constructor(name, &["PathMetadata<?> metadata".to_string()])?;
    if generic {
        writer.line(&format!("super({entity_class}, metadata);"))?;
    } else {
        writer.line("super(metadata);")?;
    }
    writer.end()
}

/// Writes one static `create` helper per declared factory constructor.
pub fn factory_methods(
    ctx: &Context<'_>,
    mode: GenerationMode,
    writer: &mut dyn CodeWriter,
) -> Result<()> {
    if mode != GenerationMode::Root {
        return Ok(());
    }
    let entity = writer.generic_name(ctx.entity.ty());
    let entity_class = writer.raw_name(ctx.entity.ty());
    for constructor in ctx.entity.constructors() {
        let params: Vec<String> = constructor
            .parameters()
            .iter()
            .map(|p| {
                let boxed = Types::boxed(&p.ty);
                format!("Expression<{}> {}", writer.generic_name(&boxed), p.name)
            })
            .collect();
        let classes: Vec<String> = constructor
            .parameters()
            .iter()
            .map(|p| format!("{}.class", writer.raw_name(&p.ty)))
            .collect();
        let mut args = vec![format!("{entity_class}.class")];
        args.push(format!("new Class[]{{{}}}", classes.join(", ")));
        args.extend(constructor.parameters().iter().map(|p| p.name.to_string()));

        writer.begin_static_method(&format!("ConstructorExpression<{entity}>"), "create", &params)?;
        writer.line(&format!(
            "return new ConstructorExpression<{entity}>({});",
            args.join(", ")
        ))?;
        writer.end()?;
    }
    Ok(())
}

/// Writes one forwarding method per delegate, passing `this` first.
pub fn delegate_methods(ctx: &Context<'_>, writer: &mut dyn CodeWriter) -> Result<()> {
    for delegate in ctx.entity.delegates() {
        let params = declare_params(&*writer, delegate.parameters());
        let mut args = vec!["this".to_string()];
        args.extend(delegate.parameters().iter().map(|p| p.name.to_string()));

        let returns = writer.generic_name(delegate.return_type());
        let target = writer.raw_name(delegate.delegate_type());
        writer.begin_public_method(&returns, delegate.name(), &params)?;
        writer.line(&format!(
            "return {target}.{}({});",
            delegate.name(),
            args.join(", ")
        ))?;
        writer.end()?;
    }
    Ok(())
}

/// Checks that every cross reference of `entity` resolves, collecting all
/// failures instead of stopping at the first.
pub fn validate(entity: &EntityType, mappings: &TypeMappings) -> Vec<CodegenError> {
    let mut errors = Vec::new();
    for supertype in entity.supertypes() {
        if let Err(e) = mappings.require(supertype.mapping_key(), entity.ty()) {
            errors.push(e);
        }
    }
    for property in entity.properties() {
        if let Err(e) = mappings.path_type(property.ty(), entity.ty()) {
            errors.push(e);
        }
    }

    // Inherited properties become delegating fields, see `supertype_fields`.
    let mut seen: HashSet<&str> = entity.properties().iter().map(Property::name).collect();
    for super_entity in entity.supertypes().iter().filter_map(Supertype::entity_type) {
        for property in inherited_properties(super_entity) {
            if !seen.insert(property.name()) {
                continue;
            }
            if let Err(e) = mappings.path_type(property.ty(), property.declaring_type()) {
                errors.push(e);
            }
        }
    }
    errors
}
