//! Compiled units and the store they are loaded from.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use querygen_core::Type;
use tracing::debug;

use crate::error::{EvalError, Result};
use crate::expr::Expr;
use crate::interp::eval_expr;
use crate::jit::{JitFn, NativeKind};
use crate::value::Value;

/// A callable operation of a compiled unit.
pub trait EntryPoint: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Number of parameters, arguments and constants together.
    fn arity(&self) -> usize;

    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

fn check_arity(entry: &dyn EntryPoint, args: &[Value]) -> Result<()> {
    if args.len() == entry.arity() {
        Ok(())
    } else {
        Err(EvalError::runtime(format!(
            "{} expects {} argument(s), got {}",
            entry.name(),
            entry.arity(),
            args.len()
        )))
    }
}

/// Operation evaluated by walking its expression tree.
#[derive(Debug)]
pub struct InterpretedOperation {
    name: String,
    expr: Expr,
    arity: usize,
    returns: Type,
}

impl InterpretedOperation {
    pub fn new(name: impl Into<String>, expr: Expr, arity: usize, returns: Type) -> Self {
        Self {
            name: name.into(),
            expr,
            arity,
            returns,
        }
    }
}

impl EntryPoint for InterpretedOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        check_arity(self, args)?;
        eval_expr(&self.expr, args)?.coerce(&self.returns)
    }
}

/// Operation backed by JIT-compiled native code.
#[derive(Debug)]
pub struct NativeOperation {
    name: String,
    func: JitFn,
    params: Vec<NativeKind>,
}

impl NativeOperation {
    pub fn new(name: impl Into<String>, func: JitFn, params: Vec<NativeKind>) -> Self {
        Self {
            name: name.into(),
            func,
            params,
        }
    }
}

impl EntryPoint for NativeOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        check_arity(self, args)?;
        let slots = self
            .params
            .iter()
            .zip(args)
            .map(|(kind, value)| {
                kind.encode(value).ok_or_else(|| {
                    EvalError::runtime(format!(
                        "{} argument passed where {kind:?} is declared",
                        value.type_name()
                    ))
                })
            })
            .collect::<Result<Vec<i64>>>()?;
        Ok(self.func.returns().decode(self.func.call(&slots)))
    }
}

/// A loaded unit: its identifier and operations in declaration order.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    id: String,
    operations: Vec<Arc<dyn EntryPoint>>,
}

impl CompiledUnit {
    pub fn new(id: impl Into<String>, operations: Vec<Arc<dyn EntryPoint>>) -> Self {
        Self {
            id: id.into(),
            operations,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operations(&self) -> &[Arc<dyn EntryPoint>] {
        &self.operations
    }

    /// The first declared operation.
    pub fn entry_point(&self) -> Option<Arc<dyn EntryPoint>> {
        self.operations.first().cloned()
    }
}

/// Loading environment for compiled units.
///
/// Shared between factories, so a unit compiled through one factory is
/// found by every other factory using the same store.
#[derive(Debug, Default)]
pub struct UnitStore {
    units: RwLock<HashMap<String, Arc<CompiledUnit>>>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, id: &str) -> Option<Arc<CompiledUnit>> {
        self.units.read().get(id).cloned()
    }

    /// Adds a unit, replacing any unit with the same identifier.
    pub fn insert(&self, unit: CompiledUnit) {
        debug!(unit = unit.id(), operations = unit.operations().len(), "Unit stored");
        self.units.write().insert(unit.id.clone(), Arc::new(unit));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygen_core::Types;

    fn add_operation() -> InterpretedOperation {
        InterpretedOperation::new(
            "eval",
            Expr::add(Expr::arg(0), Expr::arg(1)),
            2,
            Types::long(),
        )
    }

    #[test]
    fn test_interpreted_operation() {
        let op = add_operation();
        assert_eq!(op.invoke(&[Value::Long(1), Value::Long(2)]).unwrap(), Value::Long(3));
        assert!(matches!(
            op.invoke(&[Value::Long(1)]),
            Err(EvalError::Runtime(_))
        ));
        // Concatenation is not assignable to the declared Long.
        assert!(op.invoke(&[Value::str("a"), Value::Long(2)]).is_err());
    }

    #[test]
    fn test_native_operation_checks_argument_kinds() {
        let expr = Expr::add(Expr::arg(0), Expr::long(1));
        let func = crate::jit::compile(&expr, &[NativeKind::Long]).unwrap();
        let op = NativeOperation::new("eval", func, vec![NativeKind::Long]);

        assert_eq!(op.invoke(&[Value::Long(41)]).unwrap(), Value::Long(42));
        assert!(op.invoke(&[Value::Bool(true)]).is_err());
        assert!(op.invoke(&[Value::Null]).is_err());
        assert!(op.invoke(&[]).is_err());
    }

    #[test]
    fn test_store_load() {
        let store = UnitStore::new();
        assert!(store.is_empty());
        assert!(store.load("Q_1").is_none());

        store.insert(CompiledUnit::new("Q_1", vec![Arc::new(add_operation())]));

        let unit = store.load("Q_1").unwrap();
        assert_eq!(unit.id(), "Q_1");
        assert_eq!(unit.entry_point().unwrap().name(), "eval");
        assert!(store.contains("Q_1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_entry_point_is_first_operation() {
        let second = InterpretedOperation::new("second", Expr::long(2), 0, Types::long());
        let first = InterpretedOperation::new("first", Expr::long(1), 0, Types::long());
        let unit = CompiledUnit::new("U", vec![Arc::new(first), Arc::new(second)]);
        let entry = unit.entry_point().unwrap();
        assert_eq!(entry.name(), "first");
        assert_eq!(entry.invoke(&[]).unwrap(), Value::Long(1));
        assert!(CompiledUnit::new("E", Vec::new()).entry_point().is_none());
    }
}
