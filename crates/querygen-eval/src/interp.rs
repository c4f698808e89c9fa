//! Tree-walking evaluation of expression bodies.
//!
//! Long arithmetic wraps on overflow, matching the native backend.

use std::cmp::Ordering;

use crate::error::{EvalError, Result};
use crate::expr::Expr;
use crate::value::Value;

/// Evaluates `expr` with `args` bound to the argument positions.
pub fn eval_expr(expr: &Expr, args: &[Value]) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Arg(idx) => args
            .get(*idx)
            .cloned()
            .ok_or_else(|| EvalError::runtime(format!("argument {idx} not bound"))),

        Expr::Eq(l, r) => Ok(Value::Bool(values_equal(
            &eval_expr(l, args)?,
            &eval_expr(r, args)?,
        ))),
        Expr::Ne(l, r) => Ok(Value::Bool(!values_equal(
            &eval_expr(l, args)?,
            &eval_expr(r, args)?,
        ))),
        Expr::Lt(l, r) => compare(l, r, args, Ordering::is_lt),
        Expr::Le(l, r) => compare(l, r, args, Ordering::is_le),
        Expr::Gt(l, r) => compare(l, r, args, Ordering::is_gt),
        Expr::Ge(l, r) => compare(l, r, args, Ordering::is_ge),

        Expr::And(l, r) => {
            if !as_bool(eval_expr(l, args)?, "&&")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(as_bool(eval_expr(r, args)?, "&&")?))
        }
        Expr::Or(l, r) => {
            if as_bool(eval_expr(l, args)?, "||")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(as_bool(eval_expr(r, args)?, "||")?))
        }
        Expr::Not(inner) => Ok(Value::Bool(!as_bool(eval_expr(inner, args)?, "!")?)),

        Expr::Add(l, r) => {
            let (l, r) = (eval_expr(l, args)?, eval_expr(r, args)?);
            match (&l, &r) {
                (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::str(format!("{l}{r}"))),
                _ => arithmetic("+", l, r, |a, b| Some(a.wrapping_add(b)), |a, b| a + b),
            }
        }
        Expr::Sub(l, r) => arithmetic(
            "-",
            eval_expr(l, args)?,
            eval_expr(r, args)?,
            |a, b| Some(a.wrapping_sub(b)),
            |a, b| a - b,
        ),
        Expr::Mul(l, r) => arithmetic(
            "*",
            eval_expr(l, args)?,
            eval_expr(r, args)?,
            |a, b| Some(a.wrapping_mul(b)),
            |a, b| a * b,
        ),
        Expr::Div(l, r) => arithmetic(
            "/",
            eval_expr(l, args)?,
            eval_expr(r, args)?,
            |a, b| (b != 0).then(|| a.wrapping_div(b)),
            |a, b| a / b,
        ),
        Expr::Mod(l, r) => arithmetic(
            "%",
            eval_expr(l, args)?,
            eval_expr(r, args)?,
            |a, b| (b != 0).then(|| a.wrapping_rem(b)),
            |a, b| a % b,
        ),
        Expr::Neg(inner) => match eval_expr(inner, args)? {
            Value::Long(n) => Ok(Value::Long(n.wrapping_neg())),
            Value::Double(n) => Ok(Value::Double(-n)),
            other => Err(bad_operand("-", &other)),
        },
        Expr::Abs(inner) => match eval_expr(inner, args)? {
            Value::Long(n) => Ok(Value::Long(n.wrapping_abs())),
            Value::Double(n) => Ok(Value::Double(n.abs())),
            other => Err(bad_operand("abs", &other)),
        },
        Expr::Min(l, r) => pick(l, r, args, Ordering::is_le, "min"),
        Expr::Max(l, r) => pick(l, r, args, Ordering::is_ge, "max"),

        Expr::If {
            cond,
            then_expr,
            else_expr,
        } => {
            if as_bool(eval_expr(cond, args)?, "?:")? {
                eval_expr(then_expr, args)
            } else {
                eval_expr(else_expr, args)
            }
        }

        Expr::Len(inner) => {
            let s = as_str(eval_expr(inner, args)?, "len")?;
            Ok(Value::Long(s.chars().count() as i64))
        }
        Expr::Lower(inner) => {
            let s = as_str(eval_expr(inner, args)?, "lower")?;
            Ok(Value::str(s.to_lowercase()))
        }
        Expr::Upper(inner) => {
            let s = as_str(eval_expr(inner, args)?, "upper")?;
            Ok(Value::str(s.to_uppercase()))
        }
        Expr::Contains(l, r) => string_test(l, r, args, "contains", |a, b| a.contains(b)),
        Expr::StartsWith(l, r) => string_test(l, r, args, "starts_with", |a, b| a.starts_with(b)),
        Expr::EndsWith(l, r) => string_test(l, r, args, "ends_with", |a, b| a.ends_with(b)),
        Expr::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&eval_expr(part, args)?.to_string());
            }
            Ok(Value::str(out))
        }
    }
}

/// Equality with numeric widening; null equals only null.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Long(x), Value::Double(y)) | (Value::Double(y), Value::Long(x)) => {
            *x as f64 == *y
        }
        _ => a == b,
    }
}

/// Orders numbers and strings; other pairs are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Long(x), Value::Long(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn bad_operand(op: &str, value: &Value) -> EvalError {
    EvalError::runtime(format!("bad operand type {} for '{op}'", value.type_name()))
}

fn as_bool(value: Value, op: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| bad_operand(op, &value))
}

fn as_str(value: Value, op: &str) -> Result<std::sync::Arc<str>> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(bad_operand(op, &other)),
    }
}

fn compare(l: &Expr, r: &Expr, args: &[Value], test: fn(Ordering) -> bool) -> Result<Value> {
    let (l, r) = (eval_expr(l, args)?, eval_expr(r, args)?);
    compare_values(&l, &r).map(|o| Value::Bool(test(o))).ok_or_else(|| {
        EvalError::runtime(format!(
            "cannot compare {} with {}",
            l.type_name(),
            r.type_name()
        ))
    })
}

fn pick(
    l: &Expr,
    r: &Expr,
    args: &[Value],
    keep_left: fn(Ordering) -> bool,
    op: &str,
) -> Result<Value> {
    let (l, r) = (eval_expr(l, args)?, eval_expr(r, args)?);
    let ordering = match (&l, &r) {
        (Value::Long(a), Value::Long(b)) => a.cmp(b),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => {
                let picked = if keep_left(a.total_cmp(&b)) { a } else { b };
                return Ok(Value::Double(picked));
            }
            (None, _) => return Err(bad_operand(op, &l)),
            (_, None) => return Err(bad_operand(op, &r)),
        },
    };
    Ok(if keep_left(ordering) { l } else { r })
}

fn arithmetic(
    op: &str,
    l: Value,
    r: Value,
    long_op: fn(i64, i64) -> Option<i64>,
    double_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (&l, &r) {
        (Value::Long(a), Value::Long(b)) => long_op(*a, *b)
            .map(Value::Long)
            .ok_or_else(|| EvalError::runtime(format!("division by zero in '{op}'"))),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(double_op(a, b))),
            (None, _) => Err(bad_operand(op, &l)),
            (_, None) => Err(bad_operand(op, &r)),
        },
    }
}

fn string_test(
    l: &Expr,
    r: &Expr,
    args: &[Value],
    op: &str,
    test: fn(&str, &str) -> bool,
) -> Result<Value> {
    let text = as_str(eval_expr(l, args)?, op)?;
    let needle = as_str(eval_expr(r, args)?, op)?;
    Ok(Value::Bool(test(&text, &needle)))
}

#[cfg(test)]
mod tests;
