mod callable;
mod environment;
mod errors;
mod function;
mod interpreter;
mod sink;
mod value;

pub use crate::errors::{Error, Result};
pub use crate::function::{Function, NativeFn};
pub use crate::interpreter::{Interpreter, INTERPRETER_STACK_SIZE, MAX_CALL_DEPTH};
pub use crate::sink::PrintSink;
pub use crate::value::Value;
