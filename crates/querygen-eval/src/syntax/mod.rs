//! Expression and wrapper unit syntax.

mod lexer;
mod parser;
mod unit;


pub use parser::{parse_expr, MAX_DEPTH};
pub use unit::{parse_unit, OperationSource, ParamSource, UnitSource};
