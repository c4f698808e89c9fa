//! Evaluator factory.
//!
//! Turns expression text plus typed arguments and constants into a cached,
//! reusable [`Evaluator`]:
//!
//! 1. fingerprint the request;
//! 2. reuse the cached entry point on a hit;
//! 3. on a miss, load the unit from the [`UnitStore`], or synthesize the
//!    wrapper unit, stage it, compile it once and load it again;
//! 4. cache the unit's first operation under the fingerprint.

use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use querygen_codegen::writer::{declare_params, CodeWriter, JavaWriter};
use querygen_config::EvaluatorConfig;
use querygen_core::{Parameter, Type, TypeCategory};
use tracing::{debug, info};

use crate::backend::{backend_for, CompileBackend, CompileRequest};
use crate::cache::EntryCache;
use crate::error::{EvalError, Result};
use crate::fingerprint::fingerprint;
use crate::unit::{CompiledUnit, EntryPoint, UnitStore};
use crate::value::{FromValue, Value};

/// Name of the synthesized operation.
pub const OPERATION_NAME: &str = "eval";

/// Creates evaluators, compiling each distinct request shape once.
#[derive(Debug)]
pub struct EvaluatorFactory {
    backend: Arc<dyn CompileBackend>,
    loader: Arc<UnitStore>,
    cache: EntryCache,
    staging_dir: Option<PathBuf>,
}

impl EvaluatorFactory {
    pub fn new(
        backend: Arc<dyn CompileBackend>,
        loader: Arc<UnitStore>,
        config: &EvaluatorConfig,
    ) -> Self {
        Self {
            backend,
            loader,
            cache: EntryCache::new(config.cache_capacity),
            staging_dir: config.staging_dir.clone(),
        }
    }

    /// Creates a factory with the configured backend and a private store.
    pub fn from_config(config: &EvaluatorConfig) -> Self {
        Self::new(backend_for(config.backend), Arc::new(UnitStore::new()), config)
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    pub fn loader(&self) -> &Arc<UnitStore> {
        &self.loader
    }

    /// Creates an evaluator for `source`.
    ///
    /// `names` and `types` declare the arguments in order. Each constant
    /// becomes a trailing parameter typed by its runtime type and is passed
    /// on every evaluation.
    ///
    /// # Errors
    ///
    /// - [`EvalError::Signature`] if `names` and `types` differ in length
    /// - [`EvalError::NullConstant`] for a null constant
    /// - [`EvalError::Io`] if staging the wrapper fails
    /// - [`EvalError::Syntax`] or [`EvalError::Compile`] if the backend
    ///   rejects the wrapper
    /// - [`EvalError::Resolve`] if the compiled unit cannot be loaded
    pub fn create_evaluator<T: FromValue>(
        &self,
        source: &str,
        projection: &Type,
        names: &[&str],
        types: &[Type],
        constants: IndexMap<String, Value>,
    ) -> Result<Evaluator<T>> {
        if names.len() != types.len() {
            return Err(EvalError::Signature {
                names: names.len(),
                types: types.len(),
            });
        }
        let id = fingerprint(source, projection, types, &constants)?;

        let entry = match self.cache.get(&id) {
            Some(entry) => {
                debug!(fingerprint = %id, "Entry cache hit");
                entry
            }
            None => {
                let unit = match self.loader.load(&id) {
                    Some(unit) => {
                        debug!(fingerprint = %id, "Unit loaded");
                        unit
                    }
                    None => self.compile(&id, source, projection, names, types, &constants)?,
                };
                let entry = unit
                    .entry_point()
                    .ok_or_else(|| EvalError::Resolve { id: id.clone() })?;
                self.cache.insert(&id, entry)
            }
        };

        Ok(Evaluator {
            entry,
            constants,
            projection: projection.clone(),
            _marker: PhantomData,
        })
    }

    fn compile(
        &self,
        id: &str,
        source: &str,
        projection: &Type,
        names: &[&str],
        types: &[Type],
        constants: &IndexMap<String, Value>,
    ) -> Result<Arc<CompiledUnit>> {
        let mut parameters: Vec<Parameter> = names
            .iter()
            .zip(types)
            .map(|(name, ty)| Parameter::new(*name, ty.clone()))
            .collect();
        for (name, value) in constants {
            let ty = value
                .runtime_type()
                .ok_or_else(|| EvalError::NullConstant { name: name.clone() })?;
            parameters.push(Parameter::new(name.as_str(), ty));
        }

        let unit_source = synthesize(id, source, projection, &parameters)?;
        if let Some(dir) = &self.staging_dir {
            fs::create_dir_all(dir)?;
            let path = dir.join(format!("{id}.java"));
            fs::write(&path, &unit_source)?;
            debug!(path = %path.display(), "Wrapper staged");
        }

        info!(
            event = "compile",
            fingerprint = %id,
            backend = self.backend.name(),
            parameters = parameters.len()
        );
        let request = CompileRequest {
            id,
            source,
            unit_source: &unit_source,
            projection,
            parameters: &parameters,
            constants,
        };
        self.backend.compile(&request, &self.loader)?;

        self.loader
            .load(id)
            .ok_or_else(|| EvalError::Resolve { id: id.to_string() })
    }
}

/// Writes the wrapper unit: one public class named `id` holding one static
/// operation whose body is `source`, byte for byte.
pub fn synthesize(
    id: &str,
    source: &str,
    projection: &Type,
    parameters: &[Parameter],
) -> Result<String> {
    let mut writer = JavaWriter::default();
    writer.begin_class(&Type::class(TypeCategory::Simple, id), None)?;
    let params = declare_params(&writer, parameters);
    let returns = writer.generic_name(projection);
    writer.begin_static_method(&returns, OPERATION_NAME, &params)?;
    writer.verbatim(source)?;
    writer.end()?;
    writer.end()?;
    Ok(writer.into_inner())
}

/// A compiled expression bound to its constants.
pub struct Evaluator<T> {
    entry: Arc<dyn EntryPoint>,
    constants: IndexMap<String, Value>,
    projection: Type,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromValue> Evaluator<T> {
    /// Invokes the compiled operation with `args` followed by the constant
    /// values.
    pub fn evaluate(&self, args: &[Value]) -> Result<T> {
        let mut values = Vec::with_capacity(args.len() + self.constants.len());
        values.extend_from_slice(args);
        values.extend(self.constants.values().cloned());
        T::from_value(self.entry.invoke(&values)?)
    }
}

impl<T> Evaluator<T> {
    pub fn projection(&self) -> &Type {
        &self.projection
    }

    pub fn constants(&self) -> &IndexMap<String, Value> {
        &self.constants
    }

    pub fn entry_point(&self) -> &Arc<dyn EntryPoint> {
        &self.entry
    }
}

impl<T> Clone for Evaluator<T> {
    fn clone(&self) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
            constants: self.constants.clone(),
            projection: self.projection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Evaluator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("entry", &self.entry.name())
            .field("projection", &self.projection.full_name())
            .field("constants", &self.constants)
            .finish()
    }
}

#[cfg(test)]
mod tests;
