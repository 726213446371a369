use std::{fmt::Debug, fmt::Display, rc::Rc};

use lox_syntax::FunctionDecl;
use log::trace;

use crate::{
    callable::LoxCallable,
    environment::EnvId,
    errors::{Completion, Result},
    value::Value,
    Interpreter,
};

pub type NativeFn = fn(&[Value]) -> Value;

#[derive(Clone)]
pub enum Function {
    Native {
        name: &'static str,
        arity: usize,
        body: NativeFn,
    },
    Custom {
        declaration: Rc<FunctionDecl>,
        // keeps the defining scope alive, see `Environments::capture`
        closure: Rc<EnvId>,
    },
}

impl Function {
    /// The scope a user function was declared in.
    pub(crate) fn closure(&self) -> Option<EnvId> {
        match self {
            Function::Native { .. } => None,
            Function::Custom { closure, .. } => Some(**closure),
        }
    }
}

impl LoxCallable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        match self {
            Function::Native { body, .. } => Ok(body(&arguments)),
            Function::Custom {
                declaration,
                closure,
            } => {
                trace!("calling {} with {} argument(s)", self, arguments.len());
                let environment = interpreter.environments_mut().push(**closure);
                for (param, argument) in declaration.params.iter().zip(arguments) {
                    interpreter
                        .environments_mut()
                        .define(environment, &param.lexeme, Some(argument));
                }

                match interpreter.execute_block(&declaration.body, environment)? {
                    Completion::Normal => Ok(Value::Nil),
                    Completion::Return(value) => Ok(value),
                }
            }
        }
    }

    fn arity(&self) -> usize {
        match self {
            Function::Native { arity, .. } => *arity,
            Function::Custom { declaration, .. } => declaration.params.len(),
        }
    }
}

// a function is only equal to itself
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Native { name: a, .. }, Self::Native { name: b, .. }) => a == b,
            (
                Self::Custom {
                    declaration: a,
                    closure: x,
                },
                Self::Custom {
                    declaration: b,
                    closure: y,
                },
            ) => Rc::ptr_eq(a, b) && Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native { .. } => write!(f, "<native fn>"),
            Self::Custom { declaration, .. } => write!(f, "<fn {}>", declaration.name.lexeme),
        }
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native { name, arity, .. } => f
                .debug_struct("Native")
                .field("name", name)
                .field("arity", arity)
                .finish(),
            Self::Custom {
                declaration,
                closure,
            } => f
                .debug_struct("Custom")
                .field("name", &declaration.name.lexeme)
                .field("params", &declaration.params.len())
                .field("closure", &**closure)
                .finish(),
        }
    }
}
