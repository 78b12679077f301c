use wisp::value::Value;

fn run_ok(src: &str) -> Value {
    let (value, error) = wisp::run("<test>", src);
    assert!(error.is_none(), "unexpected error: {:?}", error.map(|e| e.to_string()));
    value.expect("expected a value")
}

fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64(),
        other => panic!("expected a number, got {}", other.type_name()),
    }
}

#[test]
fn identity_function() {
    assert_eq!(as_number(&run_ok("func id(a) -> a\nid(7)")), 7.0);
}

#[test]
fn named_function_and_call() {
    assert_eq!(as_number(&run_ok("func sq(x) -> x * x\nsq(6)")), 36.0);
}

#[test]
fn block_body_function_returns_null() {
    assert_eq!(as_number(&run_ok("func f()\n  var x = 5\nend\nf()")), 0.0);
}

#[test]
fn closures_capture_definition_context() {
    let src = "func make_adder(n) -> func adder(x) -> x + n\nvar add5 = make_adder(5)\nadd5(10)";
    assert_eq!(as_number(&run_ok(src)), 15.0);
}

#[test]
fn late_binding_through_lexical_scope() {
    let src = "func f() -> g()\nfunc g() -> 1\nf()";
    assert_eq!(as_number(&run_ok(src)), 1.0);
}

#[test]
fn argument_count_mismatch_is_runtime_error() {
    let (value, error) = wisp::run("<test>", "func f(a, b) -> a + b\nf(1)");
    assert!(value.is_none());
    let message = error.unwrap().to_string();
    assert!(message.contains("arguments"));
}

#[test]
fn anonymous_function_is_callable_immediately() {
    assert_eq!(as_number(&run_ok("(func (a) -> a)(42)")), 42.0);
}
