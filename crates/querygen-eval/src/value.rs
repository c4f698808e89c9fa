//! Runtime values passed to and returned from evaluators.

use std::fmt;
use std::sync::Arc;

use querygen_core::{Type, Types};

use crate::error::{EvalError, Result};

/// A dynamically typed runtime value.
///
/// Every non-null value has a runtime type; constants bound to an
/// evaluator contribute that type, never their value, to the fingerprint.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(Arc<str>),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract an f64, widening longs.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Long(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the runtime type, or `None` for null.
    pub fn runtime_type(&self) -> Option<Type> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(Types::boolean()),
            Value::Long(_) => Some(Types::long()),
            Value::Double(_) => Some(Types::double()),
            Value::Str(_) => Some(Types::string()),
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "Boolean",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Str(_) => "String",
        }
    }

    /// Converts a value to the declared type of a result.
    ///
    /// Longs widen to doubles. Types outside the built-in value types
    /// accept any value.
    pub fn coerce(self, ty: &Type) -> Result<Value> {
        let primitive = ty.is_primitive();
        let converted = match (ty.full_name(), self) {
            (_, Value::Null) if primitive => None,
            (_, Value::Null) => Some(Value::Null),
            ("boolean" | "java.lang.Boolean", v @ Value::Bool(_)) => Some(v),
            (
                "byte" | "short" | "int" | "long" | "java.lang.Byte" | "java.lang.Short"
                | "java.lang.Integer" | "java.lang.Long",
                v @ Value::Long(_),
            ) => Some(v),
            ("float" | "double" | "java.lang.Float" | "java.lang.Double", Value::Long(n)) => {
                Some(Value::Double(n as f64))
            }
            ("float" | "double" | "java.lang.Float" | "java.lang.Double", v @ Value::Double(_)) => {
                Some(v)
            }
            ("java.lang.String", v @ Value::Str(_)) => Some(v),
            (
                "boolean" | "java.lang.Boolean" | "byte" | "short" | "int" | "long"
                | "java.lang.Byte" | "java.lang.Short" | "java.lang.Integer" | "java.lang.Long"
                | "float" | "double" | "java.lang.Float" | "java.lang.Double"
                | "java.lang.String",
                _,
            ) => None,
            (_, v) => Some(v),
        };
        converted.ok_or_else(|| {
            EvalError::runtime(format!("result is not assignable to {}", ty.full_name()))
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n:?}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Long(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

/// Conversion from an evaluator result into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T> {
    Err(EvalError::Conversion {
        expected,
        found: value.type_name().to_string(),
    })
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("Boolean", &other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Long(n) => Ok(n),
            other => mismatch("Long", &other),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Long(n) => i32::try_from(n).map_err(|_| EvalError::Conversion {
                expected: "Integer",
                found: format!("Long {n}"),
            }),
            other => mismatch("Integer", &other),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value.as_f64() {
            Some(n) => Ok(n),
            None => mismatch("Double", &value),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => mismatch("String", &other),
        }
    }
}

impl FromValue for Arc<str> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => mismatch("String", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_types() {
        assert_eq!(Value::Long(1).runtime_type(), Some(Types::long()));
        assert_eq!(Value::str("a").runtime_type(), Some(Types::string()));
        assert_eq!(Value::Double(1.5).runtime_type(), Some(Types::double()));
        assert_eq!(Value::Bool(true).runtime_type(), Some(Types::boolean()));
        assert_eq!(Value::Null.runtime_type(), None);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            Value::Long(2).coerce(&Types::double()).unwrap(),
            Value::Double(2.0)
        );
        assert_eq!(Value::Long(2).coerce(&Types::int_p()).unwrap(), Value::Long(2));
        assert_eq!(Value::Null.coerce(&Types::string()).unwrap(), Value::Null);
        assert_eq!(Value::Long(2).coerce(&Types::object()).unwrap(), Value::Long(2));
        assert!(Value::Null.coerce(&Types::long_p()).is_err());
        assert!(Value::str("x").coerce(&Types::long()).is_err());
        assert!(Value::Double(1.0).coerce(&Types::integer()).is_err());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i64::from_value(Value::Long(3)).unwrap(), 3);
        assert_eq!(f64::from_value(Value::Long(3)).unwrap(), 3.0);
        assert_eq!(String::from_value(Value::str("x")).unwrap(), "x");
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert!(i32::from_value(Value::Long(i64::MAX)).is_err());

        match bool::from_value(Value::Long(1)) {
            Err(EvalError::Conversion { expected, found }) => {
                assert_eq!(expected, "Boolean");
                assert_eq!(found, "Long");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
