use crate::tokenizer::{Token, TokenType};

pub(crate) struct TokenStream<'a> {
    tokens: &'a [Token],
    current: usize,
    // stands in for a missing trailing EOF so the parser never runs off the end
    eof: Token,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let line = tokens.last().map_or(1, |t| t.line);
        Self {
            tokens,
            current: 0,
            eof: Token::eof(line),
        }
    }

    pub fn peek_token(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    pub fn peek(&self) -> TokenType {
        self.peek_token().into()
    }

    pub fn is_eof(&self) -> bool {
        self.peek() == TokenType::EOF
    }

    pub fn check(&self, token_type: TokenType) -> bool {
        !self.is_eof() && self.peek() == token_type
    }

    /// Moves past the current token, never beyond EOF, and returns it.
    pub fn advance(&mut self) -> &Token {
        if !self.is_eof() {
            self.current += 1;
        }
        self.previous()
    }

    pub fn previous(&self) -> &Token {
        self.current
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .unwrap_or(&self.eof)
    }

    pub fn match_tokens(&mut self, token_types: &[TokenType]) -> bool {
        for token_type in token_types {
            if self.check(*token_type) {
                self.advance();
                return true;
            }
        }

        false
    }
}
