mod tokenizer;
mod parser;
mod errors;

pub use errors::{Error, Result};
pub use tokenizer::Lexer;
pub use tokenizer::token::{Literal, Token, TokenType};
pub use parser::parse_program;
pub use parser::ast::{Expr, ExprVisitor, FunctionDecl, Stmt, StmtVisitor};

/// Scans `source` into tokens terminated by a single EOF token, along with
/// any lexical diagnostics found on the way.
pub fn scan(source: &str) -> (Vec<Token>, Vec<Error>) {
    Lexer::new(source).scan_tokens()
}
