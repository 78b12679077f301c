use wisp::value::Value;

fn run_ok(src: &str) -> Value {
    let (value, error) = wisp::run("<test>", src);
    assert!(error.is_none(), "unexpected error: {:?}", error.map(|e| e.to_string()));
    value.expect("expected a value")
}

fn as_numbers(value: &Value) -> Vec<f64> {
    match value {
        Value::List(items) => items.borrow().iter().map(|v| match v {
            Value::Number(n) => n.as_f64(),
            other => panic!("expected a number, got {}", other.type_name()),
        }).collect(),
        other => panic!("expected a list, got {}", other.type_name()),
    }
}

#[test]
fn list_literal() {
    assert_eq!(as_numbers(&run_ok("[1, 2, 3]")), vec![1.0, 2.0, 3.0]);
}

#[test]
fn indexing_with_divide() {
    let (value, _) = wisp::run("<test>", "[10, 20, 30] / 1");
    match value.unwrap() {
        Value::Number(n) => assert_eq!(n.as_f64(), 20.0),
        other => panic!("expected a number, got {other:?}"),
    }
}

#[test]
fn index_out_of_range_is_runtime_error() {
    let (value, error) = wisp::run("<test>", "[1, 2] / 5");
    assert!(value.is_none());
    assert!(error.is_some());
}

#[test]
fn removal_with_minus_does_not_mutate_original() {
    let (value, _) = wisp::run("<test>", "var a = [1, 2, 3]\nvar b = a - 1\nb");
    assert_eq!(as_numbers(&value.unwrap()), vec![1.0, 3.0]);
}

#[test]
fn append_mutates_in_place() {
    let (value, _) = wisp::run("<test>", "var a = [1, 2]\nappend(a, 3)\na");
    assert_eq!(as_numbers(&value.unwrap()), vec![1.0, 2.0, 3.0]);
}

#[test]
fn pop_removes_and_returns() {
    let (value, _) = wisp::run("<test>", "var a = [1, 2, 3]\npop(a, 0)");
    match value.unwrap() {
        Value::Number(n) => assert_eq!(n.as_f64(), 1.0),
        other => panic!("expected a number, got {other:?}"),
    }
}

#[test]
fn extend_concatenates_in_place() {
    let (value, _) = wisp::run("<test>", "var a = [1, 2]\nvar b = [3, 4]\nextend(a, b)\na");
    assert_eq!(as_numbers(&value.unwrap()), vec![1.0, 2.0, 3.0, 4.0]);
}
