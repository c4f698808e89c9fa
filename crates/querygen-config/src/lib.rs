//! Configuration system for querygen.
//!
//! Load generation and evaluator settings from TOML or YAML to control
//! accessor methods, query type naming and compiled-entry caching without
//! code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use querygen_config::{BackendKind, QuerygenConfig};
//!
//! let config = QuerygenConfig::from_toml_str(r#"
//!     [generation]
//!     use_list_accessors = true
//!
//!     [generation.query_type]
//!     prefix = "Q"
//!     package_suffix = ".query"
//!
//!     [evaluator]
//!     cache_capacity = 64
//!     backend = "interpreter"
//! "#).unwrap();
//!
//! assert!(config.generation.use_list_accessors);
//! assert!(!config.generation.use_map_accessors);
//! assert_eq!(config.evaluator.cache_capacity, 64);
//! assert_eq!(config.evaluator.backend, BackendKind::Interpreter);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use querygen_config::QuerygenConfig;
//!
//! let config = QuerygenConfig::load("querygen.toml").unwrap_or_default();
//! assert!(config.generation.create_default_variable);
//! ```

use std::path::{Path, PathBuf};

use querygen_core::QueryTypeFactory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main querygen configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QuerygenConfig {
    /// Query type generation settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Evaluator factory settings.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

impl QuerygenConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot rule out on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        self.evaluator.validate()
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_evaluator(mut self, evaluator: EvaluatorConfig) -> Self {
        self.evaluator = evaluator;
        self
    }
}

/// Options consumed by the entity serializer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Emit convenience accessor methods for list-typed properties.
    #[serde(default)]
    pub use_list_accessors: bool,

    /// Emit convenience accessor methods for map-typed properties.
    #[serde(default)]
    pub use_map_accessors: bool,

    /// Emit the default singleton instance on root query types.
    #[serde(default = "default_true")]
    pub create_default_variable: bool,

    /// Naming of generated query types.
    #[serde(default)]
    pub query_type: QueryTypeConfig,

    /// Extra reserved words escaped in generated field names.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            use_list_accessors: false,
            use_map_accessors: false,
            create_default_variable: true,
            query_type: QueryTypeConfig::default(),
            keywords: Vec::new(),
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_accessors(mut self, enabled: bool) -> Self {
        self.use_list_accessors = enabled;
        self
    }

    pub fn with_map_accessors(mut self, enabled: bool) -> Self {
        self.use_map_accessors = enabled;
        self
    }

    pub fn with_default_variable(mut self, enabled: bool) -> Self {
        self.create_default_variable = enabled;
        self
    }

    pub fn with_query_type(mut self, query_type: QueryTypeConfig) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.query_type.prefix.is_empty() && self.query_type.suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "query type prefix and suffix cannot both be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Naming of generated query types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryTypeConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub suffix: String,

    /// Appended to the entity package, e.g. `.query`.
    #[serde(default)]
    pub package_suffix: String,
}

impl Default for QueryTypeConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: String::new(),
            package_suffix: String::new(),
        }
    }
}

impl QueryTypeConfig {
    /// Returns the factory naming generated types per this configuration.
    pub fn factory(&self) -> QueryTypeFactory {
        QueryTypeFactory::new(&*self.prefix, &*self.suffix, &*self.package_suffix)
    }
}

/// Options consumed by the evaluator factory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluatorConfig {
    /// Maximum number of compiled entries kept in the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Backend compiling synthesized wrappers.
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory where synthesized wrapper sources are staged, if any.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            backend: BackendKind::default(),
            staging_dir: None,
        }
    }
}

impl EvaluatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "evaluator cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compile backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Evaluate the parsed expression tree.
    Interpreter,

    /// Compile to native code; rejects expressions outside the integer and
    /// boolean subset.
    Jit,

    /// Native code when eligible, interpreter otherwise.
    #[default]
    Tiered,
}

fn default_true() -> bool {
    true
}

fn default_prefix() -> String {
    "Q".to_string()
}

fn default_cache_capacity() -> usize {
    256
}
