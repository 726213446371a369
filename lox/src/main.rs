use error::{report, Error, Result, SyntaxErrors};
use lox_interpreter::{Interpreter, INTERPRETER_STACK_SIZE};
use lox_std::set_stdlib;
use std::{
    fs,
    io::{self, BufRead, Write},
    process, thread,
};

use log::{debug, trace};

mod error;

use lox_syntax::{parse_program, scan};

fn run_file(path: &str) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let mut interpreter = Interpreter::new();
    set_stdlib(&mut interpreter);

    run(&content, &mut interpreter)
}

fn run_prompt() -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();

    // one interpreter for the whole session so globals survive between lines
    let mut interpreter = Interpreter::new();
    set_stdlib(&mut interpreter);

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = handle.read_line(&mut line)?;

        if bytes_read == 0 {
            // EOF (Ctrl+D or similar)
            break;
        }

        // a failed line is reported and forgotten, the session goes on
        if let Err(e) = run(line.trim(), &mut interpreter) {
            report(&e);
        }
    }

    Ok(())
}

fn run(code: &str, interpreter: &mut Interpreter) -> Result<()> {
    debug!("Running: \n{}\n", code);

    let (tokens, mut diagnostics) = scan(code);
    for token in &tokens {
        trace!("{}", token);
    }

    let (statements, parse_errors) = parse_program(&tokens);
    diagnostics.extend(parse_errors);
    if !diagnostics.is_empty() {
        return Err(Error::Syntax(SyntaxErrors(diagnostics)));
    }

    interpreter.interpret(&statements)?;
    Ok(())
}

fn session(arguments: &[String]) -> Result<()> {
    match arguments {
        [] => run_prompt(),
        [path] => run_file(path),
        _ => Err(Error::custom("Usage: lox [script]")),
    }
}

fn main() {
    env_logger::init();

    let arguments: Vec<String> = std::env::args().skip(1).collect();

    // deep recursion in scripts needs more stack than the main thread has
    let spawned = thread::Builder::new()
        .name("lox".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || session(&arguments));
    let result = match spawned {
        Ok(handle) => match handle.join() {
            Ok(result) => result,
            // the panic message is already on stderr
            Err(_) => process::exit(70),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        report(&e);
        process::exit(e.exit_code());
    }
}
