use crate::{errors::Result, value::Value, Interpreter};

pub trait LoxCallable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}
