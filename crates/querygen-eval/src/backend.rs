//! Compile backends.
//!
//! A backend turns a synthesized wrapper unit into a [`CompiledUnit`] and
//! makes it loadable from a [`UnitStore`] under the request's identifier.

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use querygen_config::BackendKind;
use querygen_core::{Parameter, Type, TypeCategory, Types};
use tracing::debug;

use crate::error::{CompileError, EvalError, Result};
use crate::expr::Expr;
use crate::jit::{self, NativeKind};
use crate::syntax::{parse_expr, parse_unit, OperationSource};
use crate::unit::{CompiledUnit, EntryPoint, InterpretedOperation, NativeOperation, UnitStore};
use crate::value::Value;

/// Everything a backend receives for one cache miss.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Fingerprint; also the class name of the wrapper unit.
    pub id: &'a str,
    /// Raw expression source.
    pub source: &'a str,
    /// Synthesized wrapper unit.
    pub unit_source: &'a str,
    pub projection: &'a Type,
    /// Arguments followed by one parameter per constant.
    pub parameters: &'a [Parameter],
    pub constants: &'a IndexMap<String, Value>,
}

/// Compile hook of the evaluator factory.
pub trait CompileBackend: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Compiles the request's unit and stores it under `request.id`.
    fn compile(&self, request: &CompileRequest<'_>, store: &UnitStore) -> Result<()>;
}

/// Returns the backend configured by `kind`.
pub fn backend_for(kind: BackendKind) -> Arc<dyn CompileBackend> {
    match kind {
        BackendKind::Interpreter => Arc::new(InterpretingBackend),
        BackendKind::Jit => Arc::new(JitBackend),
        BackendKind::Tiered => Arc::new(TieredBackend),
    }
}

/// Evaluates parsed expression trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretingBackend;

impl CompileBackend for InterpretingBackend {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn compile(&self, request: &CompileRequest<'_>, store: &UnitStore) -> Result<()> {
        let operations = parse_operations(request)?
            .into_iter()
            .map(|op| Arc::new(op.interpreted()) as Arc<dyn EntryPoint>)
            .collect();
        store.insert(CompiledUnit::new(request.id, operations));
        Ok(())
    }
}

/// Compiles every operation to native code; fails on anything outside the
/// integer and boolean subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct JitBackend;

impl CompileBackend for JitBackend {
    fn name(&self) -> &'static str {
        "jit"
    }

    fn compile(&self, request: &CompileRequest<'_>, store: &UnitStore) -> Result<()> {
        let operations = parse_operations(request)?
            .into_iter()
            .map(|op| -> Result<Arc<dyn EntryPoint>> {
                Ok(Arc::new(op.native()?) as Arc<dyn EntryPoint>)
            })
            .collect::<Result<Vec<_>>>()?;
        store.insert(CompiledUnit::new(request.id, operations));
        Ok(())
    }
}

/// Native code where eligible, interpreter otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredBackend;

impl CompileBackend for TieredBackend {
    fn name(&self) -> &'static str {
        "tiered"
    }

    fn compile(&self, request: &CompileRequest<'_>, store: &UnitStore) -> Result<()> {
        let mut operations: Vec<Arc<dyn EntryPoint>> = Vec::new();
        for op in parse_operations(request)? {
            match op.native() {
                Ok(native) => operations.push(Arc::new(native)),
                Err(CompileError::Unsupported(reason)) => {
                    debug!(
                        unit = request.id,
                        operation = %op.name,
                        %reason,
                        "Falling back to interpreter"
                    );
                    operations.push(Arc::new(op.interpreted()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        store.insert(CompiledUnit::new(request.id, operations));
        Ok(())
    }
}

/// An operation of the wrapper unit with its body parsed.
#[derive(Debug)]
struct ParsedOperation {
    name: String,
    expr: Expr,
    params: Vec<Type>,
    returns: Type,
}

impl ParsedOperation {
    fn interpreted(self) -> InterpretedOperation {
        InterpretedOperation::new(self.name, self.expr, self.params.len(), self.returns)
    }

    fn native(&self) -> std::result::Result<NativeOperation, CompileError> {
        let kinds = self
            .params
            .iter()
            .map(|ty| {
                NativeKind::of(ty).ok_or_else(|| {
                    CompileError::Unsupported(format!("parameter type {}", ty.full_name()))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let declared = NativeKind::of(&self.returns).ok_or_else(|| {
            CompileError::Unsupported(format!("result type {}", self.returns.full_name()))
        })?;
        if jit::check(&self.expr, &kinds)? != declared {
            return Err(CompileError::Unsupported(format!(
                "expression does not produce {}",
                self.returns.full_name()
            )));
        }
        let func = jit::compile(&self.expr, &kinds)?;
        Ok(NativeOperation::new(self.name.clone(), func, kinds))
    }
}

/// Parses the wrapper unit of `request`.
///
/// The first operation takes its types from the request; further operations
/// resolve their declared type names.
fn parse_operations(request: &CompileRequest<'_>) -> Result<Vec<ParsedOperation>> {
    let unit = parse_unit(request.unit_source)?;
    if unit.name != request.id {
        return Err(EvalError::syntax(format!(
            "unit declares class {}, expected {}",
            unit.name, request.id
        )));
    }

    unit.operations
        .iter()
        .enumerate()
        .map(|(i, op)| -> Result<ParsedOperation> {
            let (params, returns) = if i == 0 {
                entry_signature(op, request)?
            } else {
                let params = op.params.iter().map(|p| declared_type(&p.ty)).collect();
                (params, declared_type(&op.return_type))
            };
            Ok(ParsedOperation {
                name: op.name.clone(),
                expr: parse_expr(&op.body, &op.param_names())?,
                params,
                returns,
            })
        })
        .collect()
}

fn entry_signature(
    op: &OperationSource,
    request: &CompileRequest<'_>,
) -> Result<(Vec<Type>, Type)> {
    let declared = op.param_names();
    let expected: Vec<&str> = request.parameters.iter().map(|p| &*p.name).collect();
    if declared != expected {
        return Err(EvalError::syntax(format!(
            "operation {} declares ({}), expected ({})",
            op.name,
            declared.join(", "),
            expected.join(", ")
        )));
    }
    let params = request.parameters.iter().map(|p| p.ty.clone()).collect();
    Ok((params, request.projection.clone()))
}

/// Resolves a type name as written in a unit.
fn declared_type(name: &str) -> Type {
    match name {
        "byte" => Types::byte_p(),
        "int" => Types::int_p(),
        "long" => Types::long_p(),
        "boolean" => Types::boolean_p(),
        "short" | "float" | "double" | "char" => Type::primitive(TypeCategory::Numeric, name),
        "Object" => Types::object(),
        "String" => Types::string(),
        "Boolean" => Types::boolean(),
        "Long" => Types::long(),
        "Integer" => Types::integer(),
        "Double" => Types::double(),
        _ => Type::class(TypeCategory::Simple, name),
    }
}
