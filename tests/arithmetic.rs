use wisp::value::{Number, Value};

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
fn operator_precedence() {
    assert_eq!(as_number(&run_ok("1 + 2 * 3")), 7.0);
}

#[test]
fn parens_and_power() {
    assert_eq!(as_number(&run_ok("(1 + 2) * 3 ^ 2")), 27.0);
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let (value, error) = wisp::run("<test>", "1 / 0");
    assert!(value.is_none());
    let message = error.unwrap().to_string();
    assert!(message.contains("Division by zero"));
}

#[test]
fn unary_minus_on_non_number_is_illegal() {
    let (value, error) = wisp::run("<test>", "-\"a\"");
    assert!(value.is_none());
    assert!(error.is_some());
}

#[test]
fn float_division_promotes_integers() {
    match run_ok("7 / 2") {
        Value::Number(Number::Float(f)) => assert!((f - 3.5).abs() < f64::EPSILON),
        other => panic!("expected a float, got {other:?}"),
    }
}
