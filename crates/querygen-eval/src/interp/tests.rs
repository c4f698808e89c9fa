use super::*;
use crate::syntax::parse_expr;

fn eval(source: &str, names: &[&str], args: &[Value]) -> Result<Value> {
    eval_expr(&parse_expr(source, names).unwrap(), args)
}

#[test]
fn test_long_arithmetic() {
    let args = [Value::Long(7), Value::Long(2)];
    assert_eq!(eval("a + b * 3", &["a", "b"], &args).unwrap(), Value::Long(13));
    assert_eq!(eval("a / b", &["a", "b"], &args).unwrap(), Value::Long(3));
    assert_eq!(eval("a % b", &["a", "b"], &args).unwrap(), Value::Long(1));
    assert_eq!(eval("-a", &["a"], &args).unwrap(), Value::Long(-7));
}

#[test]
fn test_mixed_arithmetic_widens() {
    let args = [Value::Long(3), Value::Double(0.5)];
    assert_eq!(eval("a * b", &["a", "b"], &args).unwrap(), Value::Double(1.5));
    assert_eq!(eval("a / 2.0", &["a"], &args).unwrap(), Value::Double(1.5));
}

#[test]
fn test_overflow_wraps() {
    let args = [Value::Long(i64::MAX)];
    assert_eq!(eval("a + 1", &["a"], &args).unwrap(), Value::Long(i64::MIN));
}

#[test]
fn test_division_by_zero() {
    match eval("a / 0", &["a"], &[Value::Long(1)]) {
        Err(EvalError::Runtime(msg)) => assert!(msg.contains("division by zero")),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(eval("a % 0", &["a"], &[Value::Long(1)]).is_err());
    assert_eq!(
        eval("a / 0", &["a"], &[Value::Double(1.0)]).unwrap(),
        Value::Double(f64::INFINITY)
    );
}

#[test]
fn test_string_concatenation() {
    let args = [Value::str("n"), Value::Long(4)];
    assert_eq!(eval("s + \"=\" + n", &["s", "n"], &args).unwrap(), Value::str("n=4"));
    assert_eq!(
        eval("concat(s, null, true)", &["s"], &args).unwrap(),
        Value::str("nnulltrue")
    );
}

#[test]
fn test_string_functions() {
    let args = [Value::str("Hello")];
    assert_eq!(eval("len(s)", &["s"], &args).unwrap(), Value::Long(5));
    assert_eq!(eval("lower(s)", &["s"], &args).unwrap(), Value::str("hello"));
    assert_eq!(eval("upper(s)", &["s"], &args).unwrap(), Value::str("HELLO"));
    assert_eq!(eval("contains(s, \"ell\")", &["s"], &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("starts_with(s, \"He\")", &["s"], &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("ends_with(s, \"x\")", &["s"], &args).unwrap(), Value::Bool(false));
}

#[test]
fn test_comparisons() {
    let args = [Value::Long(2), Value::Double(2.0), Value::str("a")];
    let names = ["i", "d", "s"];
    assert_eq!(eval("i == d", &names, &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("i < 3", &names, &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("s >= \"a\"", &names, &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("s == null", &names, &args).unwrap(), Value::Bool(false));
    assert!(eval("s < i", &names, &args).is_err());
}

#[test]
fn test_logic_short_circuits() {
    // The right operand would fail if evaluated.
    let args = [Value::Long(0)];
    assert_eq!(eval("false && 1 / a > 0", &["a"], &args).unwrap(), Value::Bool(false));
    assert_eq!(eval("true || 1 / a > 0", &["a"], &args).unwrap(), Value::Bool(true));
    assert_eq!(eval("a == 0 ? 1 : 1 / a", &["a"], &args).unwrap(), Value::Long(1));
}

#[test]
fn test_min_max_abs() {
    let args = [Value::Long(-4), Value::Long(3)];
    let names = ["a", "b"];
    assert_eq!(eval("min(a, b)", &names, &args).unwrap(), Value::Long(-4));
    assert_eq!(eval("max(a, b)", &names, &args).unwrap(), Value::Long(3));
    assert_eq!(eval("abs(a)", &names, &args).unwrap(), Value::Long(4));
    assert_eq!(eval("max(a, 2.5)", &names, &args).unwrap(), Value::Double(2.5));
}

#[test]
fn test_type_mismatch() {
    let args = [Value::str("x"), Value::Null];
    assert!(matches!(eval("!s", &["s"], &args), Err(EvalError::Runtime(_))));
    assert!(matches!(eval("s - 1", &["s"], &args), Err(EvalError::Runtime(_))));
    assert!(matches!(eval("n + 1", &["s", "n"], &args), Err(EvalError::Runtime(_))));
    assert!(matches!(eval("len(n)", &["s", "n"], &args), Err(EvalError::Runtime(_))));
}

#[test]
fn test_unbound_argument() {
    assert!(matches!(eval("b", &["a", "b"], &[Value::Long(1)]), Err(EvalError::Runtime(_))));
}
