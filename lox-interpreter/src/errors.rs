use derive_more::From;
use lox_syntax::Token;

use crate::value::Value;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
    RuntimeError { token: Token, message: String },

    /// The print sink refused the output.
    #[from]
    Output(std::io::Error),
}

impl Error {
    pub fn runtime_error(token: &Token, message: impl std::fmt::Display) -> Self {
        Self::RuntimeError {
            token: token.clone(),
            message: message.to_string(),
        }
    }

    /// Line of the token the error was raised at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::RuntimeError { token, .. } => Some(token.line),
            Self::Output(_) => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::RuntimeError { token, message } => write!(fmt, "{}\n[line {}]", message, token.line),
            Self::Output(e) => write!(fmt, "Could not write output: {}", e),
        }
    }
}

impl std::error::Error for Error {}

/// How a statement finished. `return` unwinds through enclosing blocks and
/// loops as a value, not as an error.
#[derive(Debug)]
pub enum Completion {
    Normal,
    Return(Value),
}

pub type ResultExec = Result<Completion>;
