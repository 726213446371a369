use crate::{
    callable::LoxCallable,
    environment::{EnvId, Environments},
    errors::{Completion, Error, Result, ResultExec},
    function::{Function, NativeFn},
    sink::PrintSink,
    value::Value,
};
use log::debug;
use lox_syntax::{Expr, ExprVisitor, FunctionDecl, Literal, Stmt, StmtVisitor, Token, TokenType};
use std::{io, rc::Rc};

/// Nested calls allowed before "Stack overflow." is reported. Each level
/// costs a few dozen host frames, so hosts run the interpreter on a thread
/// with at least [`INTERPRETER_STACK_SIZE`] bytes of stack.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Stack size for the thread an [`Interpreter`] runs on.
pub const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

// longest string `*` may build
const MAX_REPEAT_LEN: usize = 1 << 28;

pub struct Interpreter {
    environments: Environments,
    environment: EnvId,
    sink: Box<dyn PrintSink>,
    call_depth: usize,
}

impl ExprVisitor<Result<Value>> for Interpreter {
    fn visit_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value } => self.visit_literal_expr(value),
            Expr::Grouping { expression } => self.visit_grouping_expr(expression),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.visit_binary_expr(left, operator, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => self.visit_logical_expr(left, operator, right),
            Expr::Unary { operator, right } => self.visit_unary_expr(operator, right),
            Expr::Variable { name } => self.visit_var_expr(name),
            Expr::Assign { name, value } => self.visit_assign_expr(name, value),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.visit_call_expr(callee, paren, arguments),
        }
    }
}

impl StmtVisitor<ResultExec> for Interpreter {
    fn visit_stmt(&mut self, stmt: &Stmt) -> ResultExec {
        match stmt {
            Stmt::Print { expression } => self.visit_print_stmt(expression),
            Stmt::Expression { expression } => self.visit_expr_stmt(expression),
            Stmt::Var { name, initializer } => self.visit_var_stmt(name, initializer.as_ref()),
            Stmt::Block { statements } => self.visit_block_stmt(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.visit_if_stmt(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => self.visit_while_stmt(condition, body),
            Stmt::Function(declaration) => self.visit_function_stmt(declaration),
            Stmt::Return { value, .. } => self.visit_return_stmt(value.as_ref()),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    pub fn with_sink(sink: Box<dyn PrintSink>) -> Self {
        Self {
            environments: Environments::new(),
            environment: Environments::GLOBAL,
            sink,
            call_depth: 0,
        }
    }

    pub fn set_global_fn(&mut self, name: &'static str, arity: usize, body: NativeFn) {
        let function = Function::Native { name, arity, body };
        self.environments
            .define(Environments::GLOBAL, name, Some(Value::Callable(function)));
    }

    /// Runs `statements` in order against the global scope and stops at the
    /// first runtime error. Globals defined before the error survive it, so
    /// the same interpreter can keep running later input.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("interpreting {} statement(s)", statements.len());
        for stmt in statements {
            self.execute(stmt)?;
        }

        Ok(())
    }

    pub(crate) fn environments_mut(&mut self) -> &mut Environments {
        &mut self.environments
    }

    // ----- Expression interpreting methods ----

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        expr.accept(self)
    }

    fn visit_assign_expr(&mut self, name: &Token, value: &Expr) -> Result<Value> {
        let value = self.evaluate(value)?;
        self.environments
            .assign(self.environment, name, value.clone())?;
        Ok(value)
    }

    fn visit_var_expr(&self, name: &Token) -> Result<Value> {
        self.environments.get(self.environment, name)
    }

    fn visit_literal_expr(&self, value: &Literal) -> Result<Value> {
        Ok(value.into())
    }

    fn visit_grouping_expr(&mut self, value: &Expr) -> Result<Value> {
        self.evaluate(value)
    }

    fn visit_unary_expr(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => {
                let value = self.check_number_operand(operator, &right)?;
                Ok(Value::Number(-value))
            }
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(Error::runtime_error(operator, "Unknown unary operator.")),
        }
    }

    fn visit_logical_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;

        let short_circuit = match operator.token_type {
            TokenType::OR => left.is_truthy(),
            _ => !left.is_truthy(),
        };
        if short_circuit {
            return Ok(left);
        }

        self.evaluate(right)
    }

    fn visit_binary_expr(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(l - r))
            }
            TokenType::SLASH => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                if r == 0.0 {
                    return Err(Error::runtime_error(operator, "Division by zero."));
                }
                Ok(Value::Number(l / r))
            }
            TokenType::STAR => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
                (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                    self.repeat(operator, &s, n)
                }
                _ => Err(Error::runtime_error(
                    operator,
                    "Operands must be two numbers or a number and a string.",
                )),
            },
            TokenType::PLUS => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
                _ => Err(Error::runtime_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenType::GREATER => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l > r))
            }
            TokenType::GREATER_EQUAL => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l >= r))
            }
            TokenType::LESS => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l < r))
            }
            TokenType::LESS_EQUAL => {
                let (l, r) = self.check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l <= r))
            }
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),
            _ => Err(Error::runtime_error(operator, "Unknown binary operator.")),
        }
    }

    fn visit_call_expr(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee = self.evaluate(callee)?;

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        let Value::Callable(function) = callee else {
            return Err(Error::runtime_error(paren, "Can only call functions."));
        };

        if values.len() != function.arity() {
            return Err(Error::runtime_error(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    function.arity(),
                    values.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Error::runtime_error(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = function.call(self, values);
        self.call_depth -= 1;
        result
    }

    // `count` copies of `s`, fractional counts round down and negative ones give ""
    fn repeat(&self, operator: &Token, s: &str, count: f64) -> Result<Value> {
        if !count.is_finite() {
            return Err(Error::runtime_error(
                operator,
                "String repeat count must be a finite number.",
            ));
        }

        // `as` saturates, checked_mul catches what is left
        let count = count.floor().max(0.0) as usize;
        match s.len().checked_mul(count) {
            Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::String(s.repeat(count))),
            _ => Err(Error::runtime_error(
                operator,
                "String repeat result is too long.",
            )),
        }
    }

    fn check_number_operands(&self, operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
        match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
            _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
        }
    }

    fn check_number_operand(&self, operator: &Token, operand: &Value) -> Result<f64> {
        match operand {
            Value::Number(n) => Ok(*n),
            _ => Err(Error::runtime_error(operator, "Operands must be numbers.")),
        }
    }

    // ----- Statement interpreting methods ----

    fn execute(&mut self, stmt: &Stmt) -> ResultExec {
        stmt.accept(self)
    }

    fn visit_expr_stmt(&mut self, expr: &Expr) -> ResultExec {
        self.evaluate(expr)?;
        Ok(Completion::Normal)
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> ResultExec {
        let value = self.evaluate(expr)?;
        self.sink.print(&value.to_string())?;
        Ok(Completion::Normal)
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> ResultExec {
        let value = match initializer {
            Some(expr) => Some(self.evaluate(expr)?),
            None => None,
        };

        self.environments
            .define(self.environment, &name.lexeme, value);
        Ok(Completion::Normal)
    }

    fn visit_block_stmt(&mut self, stmts: &[Stmt]) -> ResultExec {
        let environment = self.environments.push(self.environment);
        self.execute_block(stmts, environment)
    }

    /// Runs `stmts` with `environment` active. The previous scope is restored
    /// and `environment` released on every exit, errors and returns included.
    pub(crate) fn execute_block(&mut self, stmts: &[Stmt], environment: EnvId) -> ResultExec {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(stmts);
        self.environment = previous;
        self.environments.release(environment);

        result
    }

    fn execute_all(&mut self, stmts: &[Stmt]) -> ResultExec {
        for stmt in stmts {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal)
    }

    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> ResultExec {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.execute(else_branch)
        } else {
            Ok(Completion::Normal)
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> ResultExec {
        while self.evaluate(condition)?.is_truthy() {
            if let Completion::Return(value) = self.execute(body)? {
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal)
    }

    fn visit_function_stmt(&mut self, declaration: &Rc<FunctionDecl>) -> ResultExec {
        let function = Function::Custom {
            declaration: Rc::clone(declaration),
            closure: self.environments.capture(self.environment),
        };

        self.environments.define(
            self.environment,
            &declaration.name.lexeme,
            Some(Value::Callable(function)),
        );
        Ok(Completion::Normal)
    }

    fn visit_return_stmt(&mut self, value: Option<&Expr>) -> ResultExec {
        let value = match value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };

        Ok(Completion::Return(value))
    }
}
