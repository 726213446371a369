use std::{cell::RefCell, rc::Rc};

use lox_interpreter::{Error, Interpreter, Value, INTERPRETER_STACK_SIZE, MAX_CALL_DEPTH};
use lox_syntax::{parse_program, scan};

type Output = Rc<RefCell<Vec<String>>>;

fn interpreter() -> (Interpreter, Output) {
    let output: Output = Rc::new(RefCell::new(Vec::new()));
    let interpreter = Interpreter::with_sink(Box::new(output.clone()));
    (interpreter, output)
}

fn run_with(interpreter: &mut Interpreter, source: &str) -> Result<(), Error> {
    let (tokens, scan_errors) = scan(source);
    assert!(scan_errors.is_empty(), "scan errors: {:?}", scan_errors);
    let (statements, parse_errors) = parse_program(&tokens);
    assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
    interpreter.interpret(&statements)
}

fn assert_prints(source: &str, expected: &[&str]) {
    let (mut interpreter, output) = interpreter();
    if let Err(e) = run_with(&mut interpreter, source) {
        panic!("program failed:\n{}\nError: {}", source, e);
    }
    assert_eq!(*output.borrow(), expected);
}

// runs `f` on a thread with the stack a host gives the interpreter
fn on_interpreter_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

// returns what was printed before the failure, the message and its line
fn assert_fails(source: &str) -> (Vec<String>, String, usize) {
    let (mut interpreter, output) = interpreter();
    match run_with(&mut interpreter, source) {
        Err(Error::RuntimeError { token, message }) => {
            let printed = output.borrow().clone();
            (printed, message, token.line)
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(()) => panic!("program should have failed:\n{}", source),
    }
}

#[test]
fn arithmetic_follows_float_semantics() {
    assert_prints(
        "print 1 + 2 * 3 - 4 / 2; print 7 / 2; print -(3 - 5); print 0.1 + 0.2;",
        &["5", "3.5", "2", "0.30000000000000004"],
    );
}

#[test]
fn comparison_and_equality() {
    assert_prints(
        r#"
        print 1 < 2;
        print 2 <= 2;
        print 3 > 4;
        print 1 == 1;
        print "a" != "a";
        print nil == nil;
        print nil == false;
        print 1 == "1";
        print !nil;
        "#,
        &["true", "true", "false", "true", "false", "true", "false", "false", "true"],
    );
}

#[test]
fn string_concatenation_is_associative() {
    assert_prints(
        r#"print ("a" + "b") + "c"; print "a" + ("b" + "c");"#,
        &["abc", "abc"],
    );
}

#[test]
fn string_repetition() {
    assert_prints(
        r#"print 3 * "ab"; print "ab" * 2.7; print 0 * "x"; print -2 * "x";"#,
        &["ababab", "abab", "", ""],
    );

    let (_, message, _) = assert_fails(r#"print "a" * "b";"#);
    assert_eq!(message, "Operands must be two numbers or a number and a string.");
}

#[test]
fn oversized_repetition_is_an_error() {
    let (printed, message, line) =
        assert_fails("print 1;\nprint \"ab\" * 100000000000000000000000;");
    assert_eq!(printed, vec!["1"]);
    assert_eq!(message, "String repeat result is too long.");
    assert_eq!(line, 2);

    let (_, message, _) = assert_fails(r#"print "x" * 1000000000000;"#);
    assert_eq!(message, "String repeat result is too long.");

    // nothing to repeat, so any finite count is fine
    assert_prints(r#"print "" * 100000000000000000000000;"#, &[""]);
}

#[test]
fn infinite_repetition_count_is_an_error() {
    // too many digits for an f64, the literal scans as infinity
    let source = format!("print \"x\" * 1{};", "0".repeat(310));
    let (_, message, _) = assert_fails(&source);
    assert_eq!(message, "String repeat count must be a finite number.");

    let source = format!("print -1{} * \"x\";", "0".repeat(310));
    let (_, message, _) = assert_fails(&source);
    assert_eq!(message, "String repeat count must be a finite number.");
}

#[test]
fn mixed_operands_are_rejected() {
    let (_, message, _) = assert_fails(r#"print 1 + "a";"#);
    assert_eq!(message, "Operands must be two numbers or two strings.");

    let (_, message, _) = assert_fails(r#"print "a" < 1;"#);
    assert_eq!(message, "Operands must be numbers.");

    let (_, message, _) = assert_fails(r#"print -"a";"#);
    assert_eq!(message, "Operands must be numbers.");
}

#[test]
fn division_by_zero_is_an_error() {
    let (printed, message, line) = assert_fails("print 1;\nprint 1 / 0;\nprint 2;");
    assert_eq!(printed, vec!["1"]);
    assert_eq!(message, "Division by zero.");
    assert_eq!(line, 2);

    let (_, message, _) = assert_fails("print 0 / 0;");
    assert_eq!(message, "Division by zero.");
}

#[test]
fn undefined_variables() {
    let (_, message, line) = assert_fails("var a = 1;\n\nprint b;");
    assert_eq!(message, "Undefined variable 'b'");
    assert_eq!(line, 3);

    let (_, message, line) = assert_fails("\nc = 2;");
    assert_eq!(message, "Undefined variable 'c'");
    assert_eq!(line, 2);
}

#[test]
fn uninitialized_variable_is_not_nil() {
    let (_, message, _) = assert_fails("var a; print a;");
    assert_eq!(message, "Uninitialized variable 'a'");

    assert_prints("var a; a = 3; print a;", &["3"]);
}

#[test]
fn block_scoping() {
    let (_, message, _) = assert_fails("{ var x = 1; } print x;");
    assert_eq!(message, "Undefined variable 'x'");

    assert_prints("var x = 1; { x = 2; } print x;", &["2"]);
}

#[test]
fn shadowing() {
    assert_prints(
        "var x = 1; { var x = 2; print x; } print x;",
        &["2", "1"],
    );
}

#[test]
fn redeclaring_in_same_scope_overwrites() {
    assert_prints("var a = 1; var a = a + 1; print a;", &["2"]);
}

#[test]
fn logical_operators_short_circuit() {
    assert_prints(
        r#"
        fun boom() { return undefined_name; }
        print false and boom();
        print true or boom();
        print nil or "fallback";
        print 1 and 2;
        "#,
        &["false", "true", "fallback", "2"],
    );

    let (_, message, _) = assert_fails("fun boom() { return missing; } print true and boom();");
    assert_eq!(message, "Undefined variable 'missing'");
}

#[test]
fn if_else() {
    assert_prints(
        r#"
        if (0) print "zero is truthy"; else print "unreachable";
        if (nil) print "unreachable"; else print "nil is falsy";
        if (false) print "unreachable";
        "#,
        &["zero is truthy", "nil is falsy"],
    );
}

#[test]
fn while_and_for_loops() {
    assert_prints(
        r#"
        var i = 0;
        while (i < 3) { print i; i = i + 1; }
        for (var j = 10; j > 7; j = j - 1) print j;
        "#,
        &["0", "1", "2", "10", "9", "8"],
    );
}

#[test]
fn functions_and_recursion() {
    assert_prints(
        r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
        fun noop() {}
        print noop();
        print fib;
        "#,
        &["55", "nil", "<fn fib>"],
    );
}

#[test]
fn return_unwinds_loops_and_blocks() {
    assert_prints(
        r#"
        fun find(limit) {
            var i = 0;
            while (true) {
                {
                    if (i == limit) return i * 10;
                }
                i = i + 1;
            }
        }
        print find(4);
        fun first() {
            for (var k = 0; k < 100; k = k + 1) {
                if (k > 1) return k;
            }
            return -1;
        }
        print first();
        var after = "scope restored";
        print after;
        "#,
        &["40", "2", "scope restored"],
    );
}

#[test]
fn functions_see_their_defining_scope() {
    assert_prints(
        r#"
        var greeting = "outer";
        fun make() {
            var greeting = "inner";
            fun show() { print greeting; }
            return show;
        }
        var show = make();
        show();
        fun counter() {
            var count = 0;
            fun next() { count = count + 1; return count; }
            return next;
        }
        var next = counter();
        next();
        print next();
        "#,
        &["inner", "2"],
    );
}

#[test]
fn parameters_are_local() {
    let (_, message, _) = assert_fails("fun f(a) { return a; } f(1); print a;");
    assert_eq!(message, "Undefined variable 'a'");
}

#[test]
fn call_errors() {
    let (_, message, line) = assert_fails("var x = 1;\nx();");
    assert_eq!(message, "Can only call functions.");
    assert_eq!(line, 2);

    let (_, message, _) = assert_fails("fun f(a, b) {} f(1);");
    assert_eq!(message, "Expected 2 arguments but got 1.");
}

#[test]
fn deep_recursion_succeeds() {
    on_interpreter_stack(|| {
        assert_prints(
            r#"
            fun count(n) { if (n > 0) return count(n - 1); return "done"; }
            print count(500);
            "#,
            &["done"],
        );

        let source = format!(
            "fun sum(n) {{ if (n == 0) return 0; return n + sum(n - 1); }} print sum({});",
            MAX_CALL_DEPTH - 1
        );
        let expected = ((MAX_CALL_DEPTH - 1) * MAX_CALL_DEPTH / 2).to_string();
        assert_prints(&source, &[expected.as_str()]);
    });
}

#[test]
fn runaway_recursion_is_reported() {
    let message = on_interpreter_stack(|| {
        let (_, message, _) = assert_fails("fun f() { return f(); } f();");
        message
    });
    assert_eq!(message, "Stack overflow.");
}

#[test]
fn errors_abort_the_run_but_keep_state() {
    let (mut interpreter, output) = interpreter();

    let result = run_with(
        &mut interpreter,
        "var kept = 1; { var local = 2; print nope; } kept = 5;",
    );
    assert!(result.is_err());

    let err = run_with(&mut interpreter, "print kept; print local == nil;").unwrap_err();
    assert_eq!(err.to_string(), "Undefined variable 'local'\n[line 1]");
    assert_eq!(*output.borrow(), vec!["1"]);

    run_with(&mut interpreter, "kept = kept + 1; print kept;").unwrap();
    assert_eq!(*output.borrow(), vec!["1", "2"]);
}

#[test]
fn native_functions() {
    fn double(args: &[Value]) -> Value {
        match args {
            [Value::Number(n)] => Value::Number(n * 2.0),
            _ => Value::Nil,
        }
    }

    let (mut interpreter, output) = interpreter();
    interpreter.set_global_fn("double", 1, double);
    run_with(&mut interpreter, "print double(21); print double;").unwrap();
    assert_eq!(*output.borrow(), vec!["42", "<native fn>"]);
}

#[test]
fn independent_interpreters_share_nothing() {
    let (mut first, _) = interpreter();
    let (mut second, _) = interpreter();

    run_with(&mut first, "var only_here = 1;").unwrap();
    assert!(run_with(&mut second, "print only_here;").is_err());
}
