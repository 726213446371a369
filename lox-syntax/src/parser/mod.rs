use ast::Stmt;
use parser::Parser;

use crate::{errors::Error, Token};

pub(crate) mod ast;
mod token_stream;
pub(crate) mod parser;

/// Parses a token sequence into statements, collecting every syntax error
/// instead of stopping at the first one.
pub fn parse_program(tokens: &[Token]) -> (Vec<Stmt>, Vec<Error>) {
    Parser::new(tokens).parse()
}
