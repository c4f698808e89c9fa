//! Tokenizer for expression bodies.

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Magnitude of an integer literal; the sign is applied by the parser.
    Long(u64),
    Double(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Semi,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
}

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = if c.is_ascii_digit() {
            let (token, end) = number(source, start)?;
            i = end;
            token
        } else if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            Token::Ident(source[start..i].to_string())
        } else if c == b'"' {
            let (text, end) = string(source, start)?;
            i = end;
            Token::Str(text)
        } else {
            let next = bytes.get(i + 1).copied();
            let (token, width) = match (c, next) {
                (b'<', Some(b'=')) => (Token::Le, 2),
                (b'>', Some(b'=')) => (Token::Ge, 2),
                (b'=', Some(b'=')) => (Token::EqEq, 2),
                (b'!', Some(b'=')) => (Token::Ne, 2),
                (b'&', Some(b'&')) => (Token::AndAnd, 2),
                (b'|', Some(b'|')) => (Token::OrOr, 2),
                (b'(', _) => (Token::LParen, 1),
                (b')', _) => (Token::RParen, 1),
                (b',', _) => (Token::Comma, 1),
                (b'?', _) => (Token::Question, 1),
                (b':', _) => (Token::Colon, 1),
                (b';', _) => (Token::Semi, 1),
                (b'!', _) => (Token::Bang, 1),
                (b'+', _) => (Token::Plus, 1),
                (b'-', _) => (Token::Minus, 1),
                (b'*', _) => (Token::Star, 1),
                (b'/', _) => (Token::Slash, 1),
                (b'%', _) => (Token::Percent, 1),
                (b'<', _) => (Token::Lt, 1),
                (b'>', _) => (Token::Gt, 1),
                _ => {
                    let ch = source[start..].chars().next().unwrap_or('?');
                    return Err(EvalError::syntax(format!(
                        "unexpected character '{ch}' at {start}"
                    )));
                }
            };
            i += width;
            token
        };

        tokens.push(Spanned { token, pos: start });
    }

    Ok(tokens)
}

/// Scans an integer or decimal literal with an optional `L`/`D` suffix.
fn number(source: &str, start: usize) -> Result<(Token, usize)> {
    let bytes = source.as_bytes();
    let mut i = start;
    let mut is_double = false;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        is_double = true;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    let text = &source[start..i];

    match bytes.get(i) {
        Some(b'L' | b'l') if !is_double => i += 1,
        Some(b'D' | b'd') => {
            is_double = true;
            i += 1;
        }
        _ => {}
    }

    let token = if is_double {
        text.parse()
            .map(Token::Double)
            .map_err(|_| EvalError::syntax(format!("invalid number '{text}' at {start}")))?
    } else {
        text.parse()
            .map(Token::Long)
            .map_err(|_| EvalError::syntax(format!("integer '{text}' out of range at {start}")))?
    };
    Ok((token, i))
}

/// Scans a double-quoted string literal, returning its unescaped text and
/// the offset after the closing quote.
pub(crate) fn string(source: &str, start: usize) -> Result<(String, usize)> {
    let mut text = String::new();
    let mut chars = source[start + 1..].char_indices();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '"' => return Ok((text, start + 1 + offset + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, '0')) => text.push('\0'),
                Some((_, c @ ('"' | '\\' | '\''))) => text.push(c),
                Some((_, c)) => {
                    return Err(EvalError::syntax(format!(
                        "unknown escape '\\{c}' in string at {start}"
                    )))
                }
                None => break,
            },
            c => text.push(c),
        }
    }

    Err(EvalError::syntax(format!(
        "unterminated string literal at {start}"
    )))
}
