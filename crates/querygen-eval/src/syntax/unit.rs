//! Reader for synthesized wrapper units.
//!
//! A unit is one public class holding static operations whose bodies are
//! single expressions:
//!
//! ```text
//! public class Q_1_2 {
//!
//!     public static Long eval(Long a, Long b) {
//!         return a + b;
//!     }
//!
//! }
//! ```

use crate::error::{EvalError, Result};

use super::lexer;

const MODIFIERS: &[&str] = &["public", "private", "protected", "static", "final"];

/// A parsed wrapper unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSource {
    pub name: String,
    /// Operations in declaration order.
    pub operations: Vec<OperationSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSource {
    pub name: String,
    pub return_type: String,
    pub params: Vec<ParamSource>,
    pub body: String,
}

impl OperationSource {
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSource {
    pub ty: String,
    pub name: String,
}

/// Splits a wrapper unit into its class name and operations.
pub fn parse_unit(source: &str) -> Result<UnitSource> {
    let class_pos = find_word(source, "class")
        .ok_or_else(|| EvalError::syntax("unit declares no class"))?;
    let after = &source[class_pos + "class".len()..];
    let name: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    if name.is_empty() {
        return Err(EvalError::syntax("class name missing"));
    }

    let open = source[class_pos..]
        .find('{')
        .map(|p| class_pos + p)
        .ok_or_else(|| EvalError::syntax(format!("class {name} has no body")))?;
    let close = matching(source, open, '{', '}')?;

    let mut operations = Vec::new();
    let mut cursor = open + 1;
    while let Some(offset) = source[cursor..close].find('{') {
        let body_open = cursor + offset;
        let body_close = matching(source, body_open, '{', '}')?;
        operations.push(operation(
            &source[cursor..body_open],
            &source[body_open + 1..body_close],
        )?);
        cursor = body_close + 1;
    }

    if !source[cursor..close].trim().is_empty() {
        return Err(EvalError::syntax(format!(
            "unexpected declaration in class {name}"
        )));
    }

    Ok(UnitSource { name, operations })
}

fn operation(header: &str, body: &str) -> Result<OperationSource> {
    let header = header.trim();
    let paren = header
        .find('(')
        .ok_or_else(|| EvalError::syntax(format!("malformed operation header '{header}'")))?;
    let paren_close = matching(header, paren, '(', ')')?;
    if !header[paren_close + 1..].trim().is_empty() {
        return Err(EvalError::syntax(format!(
            "malformed operation header '{header}'"
        )));
    }

    let mut words: Vec<&str> = header[..paren]
        .split_whitespace()
        .skip_while(|w| MODIFIERS.contains(w))
        .collect();
    let name = words
        .pop()
        .ok_or_else(|| EvalError::syntax(format!("operation name missing in '{header}'")))?;
    if words.is_empty() {
        return Err(EvalError::syntax(format!(
            "return type missing in '{header}'"
        )));
    }

    let params = split_top_level(&header[paren + 1..paren_close])
        .into_iter()
        .map(|param| {
            param
                .rsplit_once(char::is_whitespace)
                .map(|(ty, name)| ParamSource {
                    ty: ty.trim().to_string(),
                    name: name.to_string(),
                })
                .ok_or_else(|| EvalError::syntax(format!("malformed parameter '{param}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(OperationSource {
        name: name.to_string(),
        return_type: words.join(" "),
        params,
        body: body.trim().to_string(),
    })
}

/// Splits a parameter list at commas outside generic brackets.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = list[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// Finds the close delimiter matching the one at `open`, skipping string
/// literals.
fn matching(text: &str, open: usize, open_ch: char, close_ch: char) -> Result<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < text.len() {
        let Some(c) = text[i..].chars().next() else {
            break;
        };
        if c == '"' {
            let (_, end) = lexer::string(text, i)?;
            i = end;
            continue;
        }
        if c == open_ch {
            depth += 1;
        } else if c == close_ch {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
        i += c.len_utf8();
    }
    Err(EvalError::syntax(format!(
        "unbalanced '{open_ch}' at {open}"
    )))
}

/// Position of `word` delimited by non-identifier characters.
fn find_word(text: &str, word: &str) -> Option<usize> {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    text.match_indices(word).map(|(i, _)| i).find(|&i| {
        let before = text[..i].chars().next_back().map_or(true, |c| !is_ident(c));
        let after = text[i + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident(c));
        before && after
    })
}
