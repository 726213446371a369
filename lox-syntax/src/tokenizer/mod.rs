pub(crate) mod token;

use std::{iter::Peekable, str::Chars};

use phf::phf_map;

use crate::errors::Error;
pub use crate::tokenizer::token::{Literal, Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map!(
    "and" => TokenType::AND,
    "class" => TokenType::CLASS,
    "else" => TokenType::ELSE,
    "false" => TokenType::FALSE,
    "for" => TokenType::FOR,
    "fun" => TokenType::FUN,
    "if" => TokenType::IF,
    "nil" => TokenType::NIL,
    "or" => TokenType::OR,
    "print" => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super" => TokenType::SUPER,
    "this" => TokenType::THIS,
    "true" => TokenType::TRUE,
    "var" => TokenType::VAR,
    "while" => TokenType::WHILE
);

// just iterator stuff, no token logic
struct Scanner<'a> {
    iter: Peekable<Chars<'a>>,
    lexeme: String,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            iter: source.chars().peekable(),
            lexeme: String::new(),
            line: 1,
        }
    }

    fn start_lexeme(&mut self) {
        self.lexeme.clear();
    }

    fn next(&mut self) -> Option<char> {
        let next = self.iter.next();
        if let Some(ch) = next {
            self.lexeme.push(ch);
        }
        next
    }

    fn peek(&mut self) -> Option<&char> {
        self.iter.peek()
    }

    // one character past `peek`, without consuming anything
    fn peek_next(&self) -> Option<char> {
        let mut ahead = self.iter.clone();
        ahead.next();
        ahead.next()
    }

    fn consume_if<F>(&mut self, x: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        match self.peek() {
            Some(&next) if x(next) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    fn consume_while<F>(&mut self, x: F) -> Vec<char>
    where
        F: Fn(char) -> bool,
    {
        let mut values = Vec::new();
        while let Some(&next) = self.iter.peek() {
            if !x(next) {
                break;
            }
            self.next();
            values.push(next);
        }
        values
    }
}

// token logic goes here
pub struct Lexer<'a> {
    iter: Scanner<'a>,
    errors: Vec<Error>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            iter: Scanner::new(source),
            errors: Vec::new(),
        }
    }

    /// Scans the whole source. The returned tokens always end with exactly one
    /// EOF token; the diagnostics collected on the way come back alongside.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<Error>) {
        let mut tokens = Vec::new();
        loop {
            self.iter.start_lexeme();
            let ch = match self.iter.next() {
                Some(ch) => ch,
                None => break,
            };

            if let Some(token) = self.match_token(ch) {
                tokens.push(token);
            }
        }

        tokens.push(Token::eof(self.iter.line));
        (tokens, self.errors)
    }

    fn match_token(&mut self, ch: char) -> Option<Token> {
        match ch {
            '(' => self.create_token(TokenType::LEFT_PAREN, None),
            ')' => self.create_token(TokenType::RIGHT_PAREN, None),
            '{' => self.create_token(TokenType::LEFT_BRACE, None),
            '}' => self.create_token(TokenType::RIGHT_BRACE, None),
            ',' => self.create_token(TokenType::COMMA, None),
            '.' => self.create_token(TokenType::DOT, None),
            '-' => self.create_token(TokenType::MINUS, None),
            '+' => self.create_token(TokenType::PLUS, None),
            ';' => self.create_token(TokenType::SEMICOLON, None),
            '*' => self.create_token(TokenType::STAR, None),
            '!' => {
                let token_type = self.either('=', TokenType::BANG_EQUAL, TokenType::BANG);
                self.create_token(token_type, None)
            }
            '=' => {
                let token_type = self.either('=', TokenType::EQUAL_EQUAL, TokenType::EQUAL);
                self.create_token(token_type, None)
            }
            '<' => {
                let token_type = self.either('=', TokenType::LESS_EQUAL, TokenType::LESS);
                self.create_token(token_type, None)
            }
            '>' => {
                let token_type = self.either('=', TokenType::GREATER_EQUAL, TokenType::GREATER);
                self.create_token(token_type, None)
            }
            '/' => {
                if self.iter.consume_if(|ch| ch == '/') {
                    // single line comment, the newline is left for the line counter
                    self.iter.consume_while(|ch| ch != '\n');
                    None
                } else {
                    self.create_token(TokenType::SLASH, None)
                }
            }
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.iter.line += 1;
                None
            }
            '"' => self.string(),
            _ => {
                if ch.is_ascii_digit() {
                    self.number()
                } else if ch.is_ascii_alphabetic() || ch == '_' {
                    self.identifier()
                } else {
                    self.error(format!("Unexpected character '{}'.", ch));
                    None
                }
            }
        }
    }

    fn create_token(&self, token_type: TokenType, literal: Option<Literal>) -> Option<Token> {
        Some(Token::new(
            token_type,
            self.iter.lexeme.as_str(),
            literal,
            self.iter.line,
        ))
    }

    fn error(&mut self, message: impl std::fmt::Display) {
        self.errors.push(Error::scan_error(self.iter.line, message));
    }

    fn either(&mut self, to_match: char, matched: TokenType, unmatched: TokenType) -> TokenType {
        if self.iter.consume_if(|ch| ch == to_match) {
            matched
        } else {
            unmatched
        }
    }

    fn string(&mut self) -> Option<Token> {
        let chars = self.iter.consume_while(|ch| ch != '"');
        self.iter.line += chars.iter().filter(|&&c| c == '\n').count();

        if !self.iter.consume_if(|ch| ch == '"') {
            self.error("Unterminated string.");
            return None;
        }

        let value = String::from_iter(chars);
        self.create_token(TokenType::STRING, Some(Literal::String(value)))
    }

    fn number(&mut self) -> Option<Token> {
        self.iter.consume_while(|ch| ch.is_ascii_digit());

        // a trailing '.' belongs to the number only when a digit follows it
        let fraction = self.iter.peek() == Some(&'.')
            && self.iter.peek_next().is_some_and(|ch| ch.is_ascii_digit());
        if fraction {
            self.iter.next();
            self.iter.consume_while(|ch| ch.is_ascii_digit());
        }

        match self.iter.lexeme.parse::<f64>() {
            Ok(value) => self.create_token(TokenType::NUMBER, Some(Literal::Number(value))),
            Err(e) => {
                self.error(format!("Invalid number '{}': {}.", self.iter.lexeme, e));
                None
            }
        }
    }

    fn identifier(&mut self) -> Option<Token> {
        self.iter
            .consume_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');

        let token_type = KEYWORDS
            .get(self.iter.lexeme.as_str())
            .copied()
            .unwrap_or(TokenType::IDENTIFIER);

        self.create_token(token_type, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, Vec<Error>) {
        Lexer::new(source).scan_tokens()
    }

    fn types(source: &str) -> Vec<TokenType> {
        scan(source).0.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let (tokens, errors) = scan("");
        assert!(errors.is_empty());
        assert_eq!(tokens, vec![Token::eof(1)]);
    }

    #[test]
    fn one_and_two_character_operators() {
        assert_eq!(
            types("! != = == < <= > >= /"),
            vec![
                TokenType::BANG,
                TokenType::BANG_EQUAL,
                TokenType::EQUAL,
                TokenType::EQUAL_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::SLASH,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let (tokens, _) = scan("1 // ignored ( }\n2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].literal, Some(Literal::Number(2.0)));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn numbers() {
        let (tokens, errors) = scan("12 3.25");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.25)));
        assert_eq!(tokens[1].lexeme, "3.25");
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let (tokens, _) = scan("1.");
        assert_eq!(tokens[0].token_type, TokenType::NUMBER);
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
    }

    #[test]
    fn strings_keep_lexeme_and_track_lines() {
        let (tokens, errors) = scan("\"a\nb\" x");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].lexeme, "\"a\nb\"");
        assert_eq!(tokens[0].literal, Some(Literal::String("a\nb".to_string())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_and_emits_nothing() {
        let (tokens, errors) = scan("\"oops");
        assert_eq!(tokens, vec![Token::eof(1)]);
        assert_eq!(errors, vec![Error::scan_error(1, "Unterminated string.")]);
    }

    #[test]
    fn keywords_and_identifiers() {
        let (tokens, _) = scan("var _foo1 = nil or orchid;");
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::VAR,
                TokenType::IDENTIFIER,
                TokenType::EQUAL,
                TokenType::NIL,
                TokenType::OR,
                TokenType::IDENTIFIER,
                TokenType::SEMICOLON,
                TokenType::EOF,
            ]
        );
        assert_eq!(tokens[1].lexeme, "_foo1");
        assert_eq!(tokens[5].lexeme, "orchid");
    }

    #[test]
    fn unexpected_characters_do_not_stop_scanning() {
        let (tokens, errors) = scan("1 @\n# 2");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line(), 1);
        assert_eq!(errors[1].line(), 2);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.last().map(|t| t.line), Some(2));
    }

    #[test]
    fn lexemes_reproduce_source_order() {
        let (tokens, _) = scan("1 + 2");
        let joined: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(joined.concat(), "1+2");
    }
}
