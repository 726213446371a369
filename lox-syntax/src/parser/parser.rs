use std::rc::Rc;

use crate::{
    errors::{Error, Result},
    tokenizer::{Literal, Token, TokenType},
    Expr,
};

use super::{
    ast::{FunctionDecl, Stmt},
    token_stream::TokenStream,
};

const MAX_ARITY: usize = 255;

pub struct Parser<'a> {
    stream: TokenStream<'a>,
    errors: Vec<Error>,
    function_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            stream: TokenStream::new(tokens),
            errors: Vec::new(),
            function_depth: 0,
        }
    }

    fn error(&self, token: &Token, message: impl std::fmt::Display) -> Error {
        Error::parse_error(token.clone(), message)
    }

    // for problems that do not leave the parser confused, no synchronization needed
    fn report(&mut self, err: Error) {
        self.errors.push(err);
    }

    fn consume(&mut self, token_type: TokenType, message: impl std::fmt::Display) -> Result<&Token> {
        if self.stream.check(token_type) {
            Ok(self.stream.advance())
        } else {
            Err(self.error(self.stream.peek_token(), message))
        }
    }

    // Synchronize the panic point
    fn synchronize(&mut self) {
        self.stream.advance();

        while !self.stream.is_eof() {
            // after a semicolon, we are done with the statement
            if self.stream.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            // discard tokens until we have found a statement boundary
            match self.stream.peek() {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {
                    self.stream.advance();
                }
            }
        }
    }

    /// Parses declarations until EOF. Statements that failed to parse are
    /// dropped and their diagnostics returned; everything else is kept.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<Error>) {
        let mut statements = Vec::new();
        while !self.stream.is_eof() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        (statements, self.errors)
    }

    // ----- Expression parsing methods -----

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if self.stream.match_tokens(&[TokenType::EQUAL]) {
            let equals = self.stream.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }

            let err = self.error(&equals, "Invalid assignment target.");
            self.report(err);
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.stream.match_tokens(&[TokenType::OR]) {
            let operator = self.stream.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.stream.match_tokens(&[TokenType::AND]) {
            let operator = self.stream.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    // one left-associative precedence level
    fn binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr = operand(self)?;

        while self.stream.match_tokens(operators) {
            let operator = self.stream.previous().clone();
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self
            .stream
            .match_tokens(&[TokenType::BANG, TokenType::MINUS])
        {
            let operator = self.stream.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        while self.stream.match_tokens(&[TokenType::LEFT_PAREN]) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments = Vec::new();
        if !self.stream.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let err = self.error(
                        self.stream.peek_token(),
                        "Can't have more than 255 arguments.",
                    );
                    self.report(err);
                }
                arguments.push(self.expression()?);
                if !self.stream.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self
            .consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.stream.match_tokens(&[TokenType::FALSE]) {
            return Ok(Expr::Literal {
                value: Literal::Bool(false),
            });
        }
        if self.stream.match_tokens(&[TokenType::TRUE]) {
            return Ok(Expr::Literal {
                value: Literal::Bool(true),
            });
        }
        if self.stream.match_tokens(&[TokenType::NIL]) {
            return Ok(Expr::Literal {
                value: Literal::Nil,
            });
        }

        if self
            .stream
            .match_tokens(&[TokenType::NUMBER, TokenType::STRING])
        {
            let prev = self.stream.previous();
            return match &prev.literal {
                Some(value) => Ok(Expr::Literal {
                    value: value.clone(),
                }),
                None => Err(self.error(prev, "Literal token carries no value.")),
            };
        }

        if self.stream.match_tokens(&[TokenType::IDENTIFIER]) {
            let name = self.stream.previous().clone();
            return Ok(Expr::Variable { name });
        }

        if self.stream.match_tokens(&[TokenType::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                expression: Box::new(expr),
            });
        }

        Err(self.error(self.stream.peek_token(), "Expect statement."))
    }

    // ----- Statement parsing methods -----

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.stream.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else if self.stream.match_tokens(&[TokenType::FUN]) {
            self.fun_declaration("function")
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.report(err);
                self.synchronize();
                None
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.stream.match_tokens(&[TokenType::FOR]) {
            return self.for_stmt();
        }

        if self.stream.match_tokens(&[TokenType::IF]) {
            return self.if_stmt();
        }

        if self.stream.match_tokens(&[TokenType::PRINT]) {
            return self.print_stmt();
        }

        if self.stream.match_tokens(&[TokenType::RETURN]) {
            return self.return_stmt();
        }

        if self.stream.match_tokens(&[TokenType::WHILE]) {
            return self.while_stmt();
        }

        if self.stream.match_tokens(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block {
                statements: self.block()?,
            });
        }

        self.expr_stmt()
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.stream.is_eof() && !self.stream.check(TokenType::RIGHT_BRACE) {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self
            .consume(TokenType::IDENTIFIER, "Expect variable name.")?
            .clone();

        let initializer = match self.stream.match_tokens(&[TokenType::EQUAL]) {
            true => Some(self.expression()?),
            false => None,
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn fun_declaration(&mut self, kind: &str) -> Result<Stmt> {
        let name = self
            .consume(TokenType::IDENTIFIER, format!("Expect {} name.", kind))?
            .clone();

        self.consume(
            TokenType::LEFT_PAREN,
            format!("Expect '(' after {} name.", kind),
        )?;
        let mut params = Vec::new();
        if !self.stream.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let err = self.error(
                        self.stream.peek_token(),
                        "Can't have more than 255 parameters.",
                    );
                    self.report(err);
                }

                let param = self
                    .consume(TokenType::IDENTIFIER, "Expect parameter name.")?
                    .clone();
                params.push(param);

                if !self.stream.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            format!("Expect '{{' before {} body.", kind),
        )?;
        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body: body?,
        })))
    }

    fn print_stmt(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print { expression })
    }

    fn return_stmt(&mut self) -> Result<Stmt> {
        let keyword = self.stream.previous().clone();
        if self.function_depth == 0 {
            let err = self.error(&keyword, "Can't return from top-level code.");
            self.report(err);
        }

        let mut value = None;
        if !self.stream.check(TokenType::SEMICOLON) {
            value = Some(self.expression()?);
        }

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_stmt(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body = self.statement()?;
        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }

    // desugars into `{ initializer; while (condition) { body; increment; } }`
    fn for_stmt(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;
        let initializer = if self.stream.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.stream.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expr_stmt()?)
        };

        let mut condition = None;
        if !self.stream.check(TokenType::SEMICOLON) {
            condition = Some(self.expression()?);
        }
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let mut increment = None;
        if !self.stream.check(TokenType::RIGHT_PAREN) {
            increment = Some(self.expression()?);
        }
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block {
                statements: vec![
                    body,
                    Stmt::Expression {
                        expression: increment,
                    },
                ],
            };
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: Literal::Bool(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block {
                statements: vec![initializer, body],
            };
        }

        Ok(body)
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = match self.stream.match_tokens(&[TokenType::ELSE]) {
            true => Some(Box::new(self.statement()?)),
            false => None,
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn expr_stmt(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expression })
    }
}
