//! Host functions exposed to every Lox program without a `fun` declaration.

use std::io::{self, BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::callable::NativeFunction;
use crate::diagnostics::RuntimeError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Builds the name → callable table installed into the global scope before
/// a program runs.
pub fn globals() -> Vec<(&'static str, NativeFunction)> {
    vec![
        ("clock", NativeFunction { name: "clock".to_string(), arity: 0, func: clock }),
        ("input", NativeFunction { name: "input".to_string(), arity: 1, func: input }),
        ("str", NativeFunction { name: "str".to_string(), arity: 1, func: str_of }),
        ("num", NativeFunction { name: "num".to_string(), arity: 1, func: num_of }),
        ("len", NativeFunction { name: "len".to_string(), arity: 1, func: len_of }),
    ]
}

fn clock(_interpreter: &mut Interpreter<'_>, call_site: &Token, _args: &[Value]) -> Result<Value, RuntimeError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| RuntimeError::new(call_site.clone(), "System clock is before the Unix epoch."))?;
    Ok(Value::Number(now.as_secs_f64()))
}

/// Writes the stringified prompt through the interpreter's output sink,
/// then reads a line from stdin.
fn input(interpreter: &mut Interpreter<'_>, _call_site: &Token, args: &[Value]) -> Result<Value, RuntimeError> {
    let sink = interpreter.output();
    let _ = write!(sink, "{}", args[0].stringify());
    let _ = sink.flush();

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok();
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::string(line))
}

fn str_of(_interpreter: &mut Interpreter<'_>, _call_site: &Token, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::string(args[0].stringify()))
}

fn num_of(_interpreter: &mut Interpreter<'_>, call_site: &Token, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| RuntimeError::new(call_site.clone(), format!("Cannot convert '{s}' to a number."))),
        other => Err(RuntimeError::new(
            call_site.clone(),
            format!("Cannot convert a {} to a number.", other.type_name()),
        )),
    }
}

fn len_of(_interpreter: &mut Interpreter<'_>, call_site: &Token, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.len() as f64)),
        other => Err(RuntimeError::new(call_site.clone(), format!("Cannot take the length of a {}.", other.type_name()))),
    }
}
