use std::time::{SystemTime, UNIX_EPOCH};

use lox_interpreter::{Interpreter, Value};

// standard library injection
// for now there is only clock()
pub fn set_stdlib(interpreter: &mut Interpreter) {
    interpreter.set_global_fn("clock", 0, clock);
}

/// Seconds since the Unix epoch, with sub-second precision.
fn clock(_args: &[Value]) -> Value {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Value::Number(elapsed.as_secs_f64())
}
