//! Expression trees for evaluator bodies.

use crate::value::Value;

/// An expression tree node.
///
/// Arguments are referenced by position in the parameter list of the
/// wrapping operation: declared arguments first, then constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Arg(usize),

    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Abs(Box<Expr>),
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),

    If {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// Length of a string in characters.
    Len(Box<Expr>),
    Lower(Box<Expr>),
    Upper(Box<Expr>),
    Contains(Box<Expr>, Box<Expr>),
    StartsWith(Box<Expr>, Box<Expr>),
    EndsWith(Box<Expr>, Box<Expr>),
    Concat(Vec<Expr>),
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    pub fn literal(value: Value) -> Self {
        Expr::Literal(value)
    }

    pub fn long(value: i64) -> Self {
        Expr::Literal(Value::Long(value))
    }

    pub fn double(value: f64) -> Self {
        Expr::Literal(Value::Double(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Value::Bool(value))
    }

    pub fn str(value: &str) -> Self {
        Expr::Literal(Value::str(value))
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    pub fn arg(idx: usize) -> Self {
        Expr::Arg(idx)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::Eq(Box::new(left), Box::new(right))
    }

    pub fn ne(left: Expr, right: Expr) -> Self {
        Expr::Ne(Box::new(left), Box::new(right))
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Expr::Lt(Box::new(left), Box::new(right))
    }

    pub fn le(left: Expr, right: Expr) -> Self {
        Expr::Le(Box::new(left), Box::new(right))
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Expr::Gt(Box::new(left), Box::new(right))
    }

    pub fn ge(left: Expr, right: Expr) -> Self {
        Expr::Ge(Box::new(left), Box::new(right))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Expr::Add(Box::new(left), Box::new(right))
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Expr::Sub(Box::new(left), Box::new(right))
    }

    pub fn mul(left: Expr, right: Expr) -> Self {
        Expr::Mul(Box::new(left), Box::new(right))
    }

    pub fn div(left: Expr, right: Expr) -> Self {
        Expr::Div(Box::new(left), Box::new(right))
    }

    pub fn rem(left: Expr, right: Expr) -> Self {
        Expr::Mod(Box::new(left), Box::new(right))
    }

    pub fn neg(expr: Expr) -> Self {
        Expr::Neg(Box::new(expr))
    }

    pub fn abs(expr: Expr) -> Self {
        Expr::Abs(Box::new(expr))
    }

    pub fn min(left: Expr, right: Expr) -> Self {
        Expr::Min(Box::new(left), Box::new(right))
    }

    pub fn max(left: Expr, right: Expr) -> Self {
        Expr::Max(Box::new(left), Box::new(right))
    }

    pub fn if_then_else(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn len(expr: Expr) -> Self {
        Expr::Len(Box::new(expr))
    }

    pub fn lower(expr: Expr) -> Self {
        Expr::Lower(Box::new(expr))
    }

    pub fn upper(expr: Expr) -> Self {
        Expr::Upper(Box::new(expr))
    }

    pub fn contains(haystack: Expr, needle: Expr) -> Self {
        Expr::Contains(Box::new(haystack), Box::new(needle))
    }

    pub fn starts_with(text: Expr, prefix: Expr) -> Self {
        Expr::StartsWith(Box::new(text), Box::new(prefix))
    }

    pub fn ends_with(text: Expr, suffix: Expr) -> Self {
        Expr::EndsWith(Box::new(text), Box::new(suffix))
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat(parts)
    }

    /// Highest argument index referenced, if any.
    pub fn max_arg(&self) -> Option<usize> {
        let mut max = None;
        self.visit(&mut |e| {
            if let Expr::Arg(idx) = e {
                max = Some(max.map_or(*idx, |m: usize| m.max(*idx)));
            }
        });
        max
    }

    /// Calls `f` on this node and every descendant, parents first.
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Arg(_) => {}
            Expr::Not(e)
            | Expr::Neg(e)
            | Expr::Abs(e)
            | Expr::Len(e)
            | Expr::Lower(e)
            | Expr::Upper(e) => e.visit(f),
            Expr::Eq(l, r)
            | Expr::Ne(l, r)
            | Expr::Lt(l, r)
            | Expr::Le(l, r)
            | Expr::Gt(l, r)
            | Expr::Ge(l, r)
            | Expr::And(l, r)
            | Expr::Or(l, r)
            | Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Mod(l, r)
            | Expr::Min(l, r)
            | Expr::Max(l, r)
            | Expr::Contains(l, r)
            | Expr::StartsWith(l, r)
            | Expr::EndsWith(l, r) => {
                l.visit(f);
                r.visit(f);
            }
            Expr::If {
                cond,
                then_expr,
                else_expr,
            } => {
                cond.visit(f);
                then_expr.visit(f);
                else_expr.visit(f);
            }
            Expr::Concat(parts) => parts.iter().for_each(|p| p.visit(f)),
        }
    }
}
