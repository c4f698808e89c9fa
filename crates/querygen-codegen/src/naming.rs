//! Naming strategies.
//!
//! A [`NamingStrategy`] converts raw schema identifiers (table, column and
//! key names) into identifiers usable in generated code. Implementations are
//! pure string transforms and hold no state.

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use querygen_core::EntityType;

/// Reserved words of the generated language.
pub const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "null", "package", "private", "protected", "public", "return",
    "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

/// Returns true if `name` is a reserved word.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Conversion from schema identifiers to generated identifiers.
pub trait NamingStrategy: Send + Sync {
    /// Converts a table name to a simple class name.
    fn class_name(&self, table_name: &str) -> String;

    fn default_alias(&self, entity: &EntityType) -> String;

    fn default_variable_name(&self, entity: &EntityType) -> String;

    /// Class name of the foreign keys inner class.
    fn foreign_keys_class_name(&self) -> String;

    /// Field name of the foreign keys instance.
    fn foreign_keys_variable(&self, entity: &EntityType) -> String;

    /// Class name of the primary keys inner class.
    fn primary_keys_class_name(&self) -> String;

    /// Field name of the primary keys instance.
    fn primary_keys_variable(&self, entity: &EntityType) -> String;

    /// Converts a column name to a property name.
    fn property_name(&self, column_name: &str, entity: &EntityType) -> String;

    fn property_name_for_foreign_key(&self, foreign_key_name: &str, entity: &EntityType)
        -> String;

    /// Property name of a foreign key seen from the referenced side.
    fn property_name_for_inverse_foreign_key(
        &self,
        foreign_key_name: &str,
        entity: &EntityType,
    ) -> String;

    fn property_name_for_primary_key(&self, primary_key_name: &str, entity: &EntityType)
        -> String;

    /// Hook for quoting column names; identity unless overridden.
    fn normalize_column_name(&self, column_name: &str) -> String {
        column_name.to_string()
    }

    /// Hook for quoting table names; identity unless overridden.
    fn normalize_table_name(&self, table_name: &str) -> String {
        table_name.to_string()
    }

    /// Hook for quoting schema names; identity unless overridden.
    fn normalize_schema_name(&self, schema_name: &str) -> String {
        schema_name.to_string()
    }
}

/// Camel-case conversion of underscore separated names.
///
/// Reserved words get a `Col` suffix; foreign and primary key names have a
/// leading `fk_`/`pk_` marker moved to the end before conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl DefaultNamingStrategy {
    pub fn new() -> Self {
        Self
    }

    fn table_name(entity: &EntityType) -> Option<&str> {
        let value = entity.annotation("Table")?.value("value")?;
        Some(value.trim_matches('"'))
    }

    fn key_property_name(&self, name: &str, marker: &str, entity: &EntityType) -> String {
        let rotated = match name.get(..marker.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(marker) => {
                format!("{}_{}", &name[marker.len()..], &prefix[..prefix.len() - 1])
            }
            _ => name.to_string(),
        };
        self.property_name(&rotated, entity)
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn class_name(&self, table_name: &str) -> String {
        table_name.to_upper_camel_case()
    }

    fn default_alias(&self, entity: &EntityType) -> String {
        Self::table_name(entity)
            .map(str::to_string)
            .unwrap_or_else(|| entity.simple_name().to_string())
    }

    fn default_variable_name(&self, entity: &EntityType) -> String {
        match Self::table_name(entity) {
            Some(table) => self.property_name(table, entity),
            None => entity.uncapitalized_name(),
        }
    }

    fn foreign_keys_class_name(&self) -> String {
        "ForeignKeys".to_string()
    }

    fn foreign_keys_variable(&self, _entity: &EntityType) -> String {
        "fk".to_string()
    }

    fn primary_keys_class_name(&self) -> String {
        "PrimaryKeys".to_string()
    }

    fn primary_keys_variable(&self, _entity: &EntityType) -> String {
        "pk".to_string()
    }

    fn property_name(&self, column_name: &str, _entity: &EntityType) -> String {
        let name = column_name.to_lower_camel_case();
        if is_reserved(&name) {
            format!("{name}Col")
        } else {
            name
        }
    }

    fn property_name_for_foreign_key(&self, foreign_key_name: &str, entity: &EntityType) -> String {
        self.key_property_name(foreign_key_name, "fk_", entity)
    }

    fn property_name_for_inverse_foreign_key(
        &self,
        foreign_key_name: &str,
        entity: &EntityType,
    ) -> String {
        format!("_{}", self.property_name_for_foreign_key(foreign_key_name, entity))
    }

    fn property_name_for_primary_key(&self, primary_key_name: &str, entity: &EntityType) -> String {
        self.key_property_name(primary_key_name, "pk_", entity)
    }
}
