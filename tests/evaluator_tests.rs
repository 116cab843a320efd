// End-to-end tests: source text in, values and printed output out.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tinylang::value::Arity;
use tinylang::{execute, Builtins, ErrorKind, Evaluator, TinyError, Value};

/// Writer whose contents stay readable after it is boxed into an evaluator.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn evaluator() -> (Evaluator, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Evaluator::with_output(Box::new(buffer.clone())), buffer)
}

fn eval(source: &str) -> Value {
    let (mut evaluator, _) = evaluator();
    execute(source, &mut evaluator).unwrap_or_else(|e| panic!("{} failed: {}", source, e))
}

fn output(source: &str) -> String {
    let (mut evaluator, buffer) = evaluator();
    execute(source, &mut evaluator).unwrap_or_else(|e| panic!("{} failed: {}", source, e));
    buffer.contents()
}

fn runtime_error(source: &str) -> TinyError {
    let (mut evaluator, _) = evaluator();
    let error = execute(source, &mut evaluator).expect_err("expected a runtime error");
    assert_eq!(error.kind, ErrorKind::RuntimeError, "{}", error);
    error
}

fn assert_error(source: &str, expected: &str) {
    let error = runtime_error(source);
    assert!(
        error.message.contains(expected),
        "'{}' does not contain '{}'",
        error.message,
        expected
    );
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
    assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
    assert_eq!(eval("-2 * -3"), Value::Number(6.0));
    assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
    assert_eq!(eval("7 / 2"), Value::Number(3.5));
}

#[test]
fn last_expression_is_the_program_value() {
    assert_eq!(eval("let x := 1"), Value::Void);
    assert_eq!(eval("let x := 1\nx + 1"), Value::Number(2.0));
}

#[test]
fn inner_declaration_shadows_without_touching_outer() {
    let (mut evaluator, _) = evaluator();
    execute("let x := 1\nif true { let x := 2 }", &mut evaluator).unwrap();
    assert_eq!(evaluator.get("x"), Some(Value::Number(1.0)));
}

#[test]
fn inner_assignment_updates_outer_binding() {
    let (mut evaluator, _) = evaluator();
    execute("let x := 1\nif true { x = 2 }", &mut evaluator).unwrap();
    assert_eq!(evaluator.get("x"), Some(Value::Number(2.0)));
}

#[test]
fn redeclaration_in_same_scope_fails() {
    assert_error("let x := 1\nlet x := 2", "variable already declared: x");
    assert_eq!(eval("let x := 1\nx = 2\nx"), Value::Number(2.0));
}

#[test]
fn undefined_names() {
    assert_error("y", "undefined variable: y");
    assert_error("y = 1", "undefined variable: y");
    assert_error("nope()", "undefined function: nope");
}

#[test]
fn array_element_assignment() {
    let (mut evaluator, _) = evaluator();
    execute("let a := [1, 2, 3]\na[1] = 9", &mut evaluator).unwrap();
    assert_eq!(execute("a[1]", &mut evaluator).unwrap(), Value::Number(9.0));
}

#[test]
fn arrays_are_shared_between_bindings() {
    assert_eq!(eval("let a := [1, 2]\nlet b := a\nb[0] = 5\na[0]"), Value::Number(5.0));
}

#[test]
fn arrays_passed_to_functions_are_shared() {
    let source = "
        func fill: xs { xs[0] = \"filled\" }
        let a := [0]
        fill(a)
        a[0]
    ";
    assert_eq!(eval(source), string("filled"));
}

#[test]
fn nested_arrays() {
    let source = "let m := [[1, 2], [3, 4]]\nm[1][0] = 9\nprint(m)";
    assert_eq!(output(source), "[[1, 2], [9, 4]]\n");
}

#[test]
fn index_errors() {
    assert_error("let a := [1, 2, 3]\na[5]", "index out of bounds: 5");
    assert_error("[1, 2][-1]", "index out of bounds: -1");
    assert_error("[1, 2][0.5]", "index must be an integer");
    assert_error("let a := [1]\na[\"x\"]", "index must be a Number, got String");
    assert_error("let n := 5\nn[0]", "cannot index into Number");
    assert_error("let n := 5\nn[0] = 1", "left side of index assignment must be an Array, got Number");
    assert_error("let a := [1]\na[1] = 2", "index out of bounds: 1");
}

#[test]
fn function_call_and_arity() {
    let add = "func add: a, b { return a + b }\n";
    assert_eq!(eval(&format!("{}add(2, 3)", add)), Value::Number(5.0));
    assert_error(&format!("{}add(2)", add), "too few arguments for function add: expected 2, got 1");
    assert_error(&format!("{}add(1, 2, 3)", add), "too many arguments for function add: expected 2, got 3");
}

#[test]
fn arguments_are_evaluated_in_the_caller_scope() {
    let source = "
        let n := 10
        func f: n { return n + 1 }
        f(n + 1)
    ";
    assert_eq!(eval(source), Value::Number(12.0));
}

#[test]
fn division_by_zero() {
    assert_error("1 / 0", "division by zero");
}

#[test]
fn truthiness() {
    let branch = |condition: &str| output(&format!("if {} {{ print(\"yes\") }} else {{ print(\"no\") }}", condition));
    assert_eq!(branch("[]"), "no\n");
    assert_eq!(branch("\"\""), "no\n");
    assert_eq!(branch("0"), "no\n");
    assert_eq!(branch("false"), "no\n");
    assert_eq!(branch("3"), "yes\n");
    assert_eq!(branch("\"a\""), "yes\n");
    assert_eq!(branch("[0]"), "yes\n");
    assert_eq!(branch("print"), "yes\n");
}

#[test]
fn else_if_chain() {
    let source = "
        func classify: n {
            if n < 0 { return \"negative\" } else if n == 0 { return \"zero\" } else { return \"positive\" }
        }
        print(classify(-5), classify(0), classify(7))
    ";
    assert_eq!(output(source), "negative zero positive\n");
}

#[test]
fn while_loop() {
    let source = "
        let a := 0
        let b := 1
        let i := 0
        while i < 10 {
            let next := a + b
            a = b
            b = next
            i = i + 1
        }
        a
    ";
    assert_eq!(eval(source), Value::Number(55.0));
}

#[test]
fn recursion() {
    let source = "
        func fact: n {
            if n <= 1 { return 1 }
            return n * fact(n - 1)
        }
        fact(5)
    ";
    assert_eq!(eval(source), Value::Number(120.0));
}

#[test]
fn return_unwinds_loops_and_blocks() {
    let source = "
        func find: xs, target {
            let i := 0
            while i < len(xs) {
                if xs[i] == target { return i }
                i = i + 1
            }
            return -1
        }
        print(find([4, 5, 6], 6), find([4, 5, 6], 9))
    ";
    assert_eq!(output(source), "2 -1\n");
}

#[test]
fn missing_return_value_is_void() {
    assert_eq!(eval("func f { return }\nf()"), Value::Void);
    assert_eq!(eval("func g { let x := 1 }\ng()"), Value::Void);
    assert_eq!(output("func f { return }\nprint(f())"), "void\n");
}

#[test]
fn return_outside_function_fails() {
    assert_error("return 1", "return statement outside of function");
    assert_error("if true { return }", "return statement outside of function");
}

#[test]
fn callee_sees_caller_bindings() {
    let source = "
        func get_x { return x }
        func caller { let x := 42 return get_x() }
        caller()
    ";
    assert_eq!(eval(source), Value::Number(42.0));
}

#[test]
fn function_definition_replaces_outer_binding() {
    let source = "
        func f { return 1 }
        if true { func f { return 2 } }
        f()
    ";
    assert_eq!(eval(source), Value::Number(2.0));
    assert_error("if true { func g { return 1 } }\ng()", "undefined function: g");
}

#[test]
fn calling_a_non_function() {
    assert_error("let x := 1\nx()", "'x' is not a function, it is a Number");
}

#[test]
fn print_formatting() {
    assert_eq!(output("print(1, \"a\", true, [1, 2.5, \"x\"])"), "1 a true [1, 2.5, x]\n");
    assert_eq!(output("print(0.1 + 0.2)"), "0.30000000000000004\n");
    assert_eq!(output("func add: a, b { return a + b }\nprint(add)"), "<fn add>\n");
    assert_eq!(output("print(print)"), "<native fn print>\n");
    assert_error("print()", "print expects at least 1 argument, got 0");
}

#[test]
fn len_and_type() {
    assert_eq!(eval("len(\"héllo\")"), Value::Number(5.0));
    assert_eq!(eval("len([1, 2, 3])"), Value::Number(3.0));
    assert_eq!(eval("type(1)"), string("Number"));
    assert_eq!(eval("type([])"), string("Array"));
    assert_eq!(eval("type(type)"), string("NativeFunction"));
    assert_error("len(1)", "len() not supported for type Number");
    assert_error("len(1, 2)", "len expects exactly 1 argument, got 2");
}

#[test]
fn string_operations() {
    assert_eq!(eval("\"foo\" + \"bar\""), string("foobar"));
    assert_eq!(eval("\"a\" == \"a\""), Value::Boolean(true));
    assert_eq!(eval("\"a\" != \"b\""), Value::Boolean(true));
    assert_error("\"a\" - \"b\"", "unsupported operator '-' for String and String");
    assert_error("\"a\" < \"b\"", "unsupported operator '<' for String and String");
}

#[test]
fn type_mismatch() {
    assert_error("1 + \"a\"", "type mismatch: Number and String");
    assert_error("1 == true", "type mismatch: Number and Boolean");
}

#[test]
fn logical_operators() {
    assert_eq!(eval("1 < 2 && 3 < 4"), Value::Boolean(true));
    assert_eq!(eval("true || false"), Value::Boolean(true));
    assert_eq!(eval("false || false"), Value::Boolean(false));
    assert_eq!(eval("!true"), Value::Boolean(false));
    assert_eq!(eval("![]"), Value::Boolean(true));
    assert_eq!(eval("[1] == [2]"), Value::Boolean(true));
    assert_error("!0", "unsupported operator '!' for Number");
    assert_error("1 && 2", "unsupported operator '&&' for Number and Number");
    assert_error("-true", "unsupported operator '-' for Boolean");
    assert_error("true + false", "unsupported operator '+' for Boolean and Boolean");
}

#[test]
fn error_inside_block_restores_scope() {
    let (mut evaluator, _) = evaluator();
    execute("let x := 1", &mut evaluator).unwrap();
    assert!(execute("if true { let y := 2\nmissing }", &mut evaluator).is_err());
    execute("let y := 3", &mut evaluator).unwrap();
    assert_eq!(evaluator.get("y"), Some(Value::Number(3.0)));
    assert_eq!(evaluator.get("x"), Some(Value::Number(1.0)));
}

#[test]
fn runtime_errors_point_at_the_operator() {
    let error = runtime_error("let x := 1\nlet y := x + \"s\"");
    assert_eq!((error.line(), error.column()), (2, 12));
}

#[test]
fn custom_builtins() {
    fn double(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
        match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Err("double() needs a Number".to_string()),
        }
    }

    let buffer = SharedBuffer::default();
    let mut builtins = Builtins::new();
    builtins.register("double", Arity::Exact(1), double);
    let mut evaluator = Evaluator::with_builtins(&builtins, Box::new(buffer));

    assert_eq!(execute("double(21)", &mut evaluator).unwrap(), Value::Number(42.0));
    let error = execute("double(\"x\")", &mut evaluator).unwrap_err();
    assert_eq!(error.message, "double() needs a Number");
    let error = execute("print(1)", &mut evaluator).unwrap_err();
    assert_eq!(error.message, "undefined function: print");
}

#[test]
fn program_value_comes_from_expression_statements_only() {
    assert_eq!(eval("5\nlet y := 2"), Value::Number(5.0));
    assert_eq!(eval("if true { 7 }"), Value::Void);
    assert_eq!(eval("let a := [1]\na[0] = 3\na[0] + 1\nwhile false { }"), Value::Number(4.0));
}

/// Accepts writes but cannot flush them.
struct BrokenFlush;

impl Write for BrokenFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

#[test]
fn failed_output_flush_is_a_runtime_error() {
    let mut evaluator = Evaluator::with_output(Box::new(BrokenFlush));
    let error = execute("let x := 1\nprint(x)", &mut evaluator).unwrap_err();
    assert_eq!(error.kind, ErrorKind::RuntimeError);
    assert_eq!(error.message, "failed to write output: pipe closed");
    assert_eq!((error.line(), error.column()), (2, 1));
}
