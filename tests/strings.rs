use wisp::value::Value;

fn run_ok(src: &str) -> Value {
    let (value, error) = wisp::run("<test>", src);
    assert!(error.is_none(), "unexpected error: {:?}", error.map(|e| e.to_string()));
    value.expect("expected a value")
}

fn as_str(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => panic!("expected a string, got {}", other.type_name()),
    }
}

#[test]
fn concatenation() {
    assert_eq!(as_str(&run_ok("\"foo\" + \"bar\"")), "foobar");
}

#[test]
fn repetition() {
    assert_eq!(as_str(&run_ok("\"ab\" * 3")), "ababab");
}

#[test]
fn escape_sequences() {
    assert_eq!(as_str(&run_ok("\"a\\nb\\tc\"")), "a\nb\tc");
}

#[test]
fn empty_string_is_falsy() {
    let (value, _) = wisp::run("<test>", "if \"\" then 1 else 2");
    match value.unwrap() {
        Value::Number(n) => assert_eq!(n.as_f64(), 2.0),
        other => panic!("expected a number, got {other:?}"),
    }
}
