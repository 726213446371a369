use derive_more::From;

use crate::tokenizer::{Token, TokenType};

pub type Result<T> = core::result::Result<T, Error>;

/// A syntax diagnostic. Neither kind is fatal: the lexer and the parser keep
/// going after reporting one and hand every diagnostic back to the caller.
#[derive(Debug, From, Clone, PartialEq)]
pub enum Error {
    ScanError {
        line: usize,
        message: String,
    },

    ParseError {
        token: Token,
        message: String,
    },
}

impl Error {
    pub fn scan_error(line: usize, message: impl std::fmt::Display) -> Self {
        Self::ScanError {
            line,
            message: message.to_string(),
        }
    }

    pub fn parse_error(token: Token, message: impl std::fmt::Display) -> Self {
        Self::ParseError {
            token,
            message: message.to_string(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::ScanError { line, .. } => *line,
            Self::ParseError { token, .. } => token.line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ScanError { message, .. } | Self::ParseError { message, .. } => message,
        }
    }

    /// Where on the line the error points, empty for lexer errors.
    pub fn location(&self) -> String {
        match self {
            Self::ScanError { .. } => String::new(),
            Self::ParseError { token, .. } if token.token_type == TokenType::EOF => {
                " at end".to_string()
            }
            Self::ParseError { token, .. } => format!(" at '{}'", token.lexeme),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(
            fmt,
            "[line {}] Error{}: {}",
            self.line(),
            self.location(),
            self.message()
        )
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scan_error() {
        let err = Error::scan_error(3, "Unexpected character '@'.");
        assert_eq!(err.to_string(), "[line 3] Error: Unexpected character '@'.");
    }

    #[test]
    fn renders_parse_error_location() {
        let token = Token::new(TokenType::IDENTIFIER, "foo", None, 7);
        let err = Error::parse_error(token, "Expect ';' after expression.");
        assert_eq!(
            err.to_string(),
            "[line 7] Error at 'foo': Expect ';' after expression."
        );

        let err = Error::parse_error(Token::eof(9), "Expect '}' after block.");
        assert_eq!(err.to_string(), "[line 9] Error at end: Expect '}' after block.");
    }
}
