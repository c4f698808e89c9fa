//! Recursive-descent parser for expression bodies.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, `== !=`, `< <= > >=`,
//! `+ -`, `* / %`, unary `! -`.

use crate::error::{EvalError, Result};
use crate::expr::Expr;
use crate::value::Value;

use super::lexer::{tokenize, Spanned, Token};

type Unary = fn(Expr) -> Expr;
type Binary = fn(Expr, Expr) -> Expr;

/// Deepest nesting accepted, counted both as parser recursion and as the
/// height of the resulting tree.
pub const MAX_DEPTH: usize = 256;

/// Parses an expression body, resolving identifiers against `params`.
///
/// A leading `return` and a trailing `;` are accepted. Input nested deeper
/// than [`MAX_DEPTH`] is a syntax error.
pub fn parse_expr(source: &str, params: &[&str]) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        params,
        end: source.len(),
        depth: 0,
    };

    if matches!(parser.peek(), Some(Token::Ident(kw)) if kw == "return") {
        parser.pos += 1;
    }
    let (expr, _) = parser.ternary()?;
    if parser.peek() == Some(&Token::Semi) {
        parser.pos += 1;
    }
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(extra) => Err(EvalError::syntax(format!(
            "unexpected {:?} at {}",
            extra.token, extra.pos
        ))),
    }
}

/// An expression with the height of its tree.
type Node = (Expr, usize);

fn too_deep(pos: usize) -> EvalError {
    EvalError::syntax(format!("expression nested too deeply at {pos}"))
}

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    params: &'a [&'a str],
    end: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let pos = self.offset();
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(EvalError::syntax(format!(
                "expected {expected:?}, found {t:?} at {pos}"
            ))),
            None => Err(EvalError::syntax(format!(
                "expected {expected:?}, found end of input"
            ))),
        }
    }

    /// Runs `parse` one recursion level deeper.
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Node>) -> Result<Node> {
        if self.depth == MAX_DEPTH {
            return Err(too_deep(self.offset()));
        }
        self.depth += 1;
        let node = parse(self);
        self.depth -= 1;
        node
    }

    /// Wraps children of height `height` in one more node.
    fn node(&self, expr: Expr, height: usize, pos: usize) -> Result<Node> {
        if height >= MAX_DEPTH {
            return Err(too_deep(pos));
        }
        Ok((expr, height + 1))
    }

    fn ternary(&mut self) -> Result<Node> {
        self.nested(|p| {
            let (cond, h1) = p.binary(0)?;
            if p.peek() != Some(&Token::Question) {
                return Ok((cond, h1));
            }
            let pos = p.offset();
            p.pos += 1;
            let (then_expr, h2) = p.ternary()?;
            p.expect(Token::Colon)?;
            let (else_expr, h3) = p.ternary()?;
            p.node(
                Expr::if_then_else(cond, then_expr, else_expr),
                h1.max(h2).max(h3),
                pos,
            )
        })
    }

    /// Parses left-associative binary operators of `level` and tighter.
    fn binary(&mut self, level: usize) -> Result<Node> {
        if level == LEVELS.len() {
            return self.unary();
        }
        let (mut left, mut height) = self.binary(level + 1)?;
        loop {
            let pos = self.offset();
            let Some(constructor) = self.peek().and_then(|t| operator(LEVELS[level], t)) else {
                return Ok((left, height));
            };
            self.pos += 1;
            let (right, right_height) = self.binary(level + 1)?;
            (left, height) = self.node(constructor(left, right), height.max(right_height), pos)?;
        }
    }

    fn unary(&mut self) -> Result<Node> {
        let pos = self.offset();
        match self.peek() {
            Some(Token::Bang) => {
                self.pos += 1;
                let (inner, height) = self.nested(Self::unary)?;
                self.node(Expr::not(inner), height, pos)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                if let Some(&Token::Long(n)) = self.peek() {
                    if n == i64::MIN.unsigned_abs() {
                        self.pos += 1;
                        return Ok((Expr::long(i64::MIN), 1));
                    }
                }
                let (inner, height) = self.nested(Self::unary)?;
                self.node(Expr::neg(inner), height, pos)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Node> {
        let pos = self.offset();
        match self.next() {
            Some(Token::Long(n)) => i64::try_from(n)
                .map(|n| (Expr::long(n), 1))
                .map_err(|_| EvalError::syntax(format!("integer {n} out of range at {pos}"))),
            Some(Token::Double(n)) => Ok((Expr::double(n), 1)),
            Some(Token::Str(s)) => Ok((Expr::literal(Value::str(s)), 1)),
            Some(Token::LParen) => {
                let node = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(node)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok((Expr::bool(true), 1)),
                "false" => Ok((Expr::bool(false), 1)),
                "null" => Ok((Expr::null(), 1)),
                _ if self.peek() == Some(&Token::LParen) => self.call(&name, pos),
                _ => self
                    .params
                    .iter()
                    .position(|p| *p == name)
                    .map(|idx| (Expr::arg(idx), 1))
                    .ok_or_else(|| {
                        EvalError::syntax(format!("unknown identifier '{name}' at {pos}"))
                    }),
            },
            Some(t) => Err(EvalError::syntax(format!("unexpected {t:?} at {pos}"))),
            None => Err(EvalError::syntax("unexpected end of input")),
        }
    }

    fn call(&mut self, name: &str, pos: usize) -> Result<Node> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        let mut height = 0;
        if self.peek() != Some(&Token::RParen) {
            loop {
                let (arg, arg_height) = self.ternary()?;
                args.push(arg);
                height = height.max(arg_height);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        self.node(function(name, args, pos)?, height, pos)
    }
}

#[derive(Clone, Copy)]
enum Level {
    Or,
    And,
    Equality,
    Relational,
    Additive,
    Multiplicative,
}

const LEVELS: &[Level] = &[
    Level::Or,
    Level::And,
    Level::Equality,
    Level::Relational,
    Level::Additive,
    Level::Multiplicative,
];

fn operator(level: Level, token: &Token) -> Option<Binary> {
    let constructor = match (level, token) {
        (Level::Or, Token::OrOr) => Expr::or as Binary,
        (Level::And, Token::AndAnd) => Expr::and,
        (Level::Equality, Token::EqEq) => Expr::eq,
        (Level::Equality, Token::Ne) => Expr::ne,
        (Level::Relational, Token::Lt) => Expr::lt,
        (Level::Relational, Token::Le) => Expr::le,
        (Level::Relational, Token::Gt) => Expr::gt,
        (Level::Relational, Token::Ge) => Expr::ge,
        (Level::Additive, Token::Plus) => Expr::add,
        (Level::Additive, Token::Minus) => Expr::sub,
        (Level::Multiplicative, Token::Star) => Expr::mul,
        (Level::Multiplicative, Token::Slash) => Expr::div,
        (Level::Multiplicative, Token::Percent) => Expr::rem,
        _ => return None,
    };
    Some(constructor)
}

fn check_arity(name: &str, given: usize, expected: usize, pos: usize) -> Result<()> {
    if given == expected {
        Ok(())
    } else {
        Err(EvalError::syntax(format!(
            "{name}() takes {expected} argument(s), {given} given at {pos}"
        )))
    }
}

fn function(name: &str, mut args: Vec<Expr>, pos: usize) -> Result<Expr> {
    let unary = match name {
        "abs" => Some(Expr::abs as Unary),
        "len" => Some(Expr::len as Unary),
        "lower" => Some(Expr::lower as Unary),
        "upper" => Some(Expr::upper as Unary),
        _ => None,
    };
    if let Some(constructor) = unary {
        check_arity(name, args.len(), 1, pos)?;
        let arg = args.remove(0);
        return Ok(constructor(arg));
    }

    let binary = match name {
        "min" => Some(Expr::min as Binary),
        "max" => Some(Expr::max as Binary),
        "contains" => Some(Expr::contains as Binary),
        "starts_with" => Some(Expr::starts_with as Binary),
        "ends_with" => Some(Expr::ends_with as Binary),
        _ => None,
    };
    if let Some(constructor) = binary {
        check_arity(name, args.len(), 2, pos)?;
        let right = args.remove(1);
        let left = args.remove(0);
        return Ok(constructor(left, right));
    }

    if name == "concat" {
        if args.is_empty() {
            return Err(EvalError::syntax(format!(
                "concat() takes at least one argument at {pos}"
            )));
        }
        return Ok(Expr::concat(args));
    }

    Err(EvalError::syntax(format!(
        "unknown function '{name}' at {pos}"
    )))
}
