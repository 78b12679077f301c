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

fn as_numbers(value: &Value) -> Vec<f64> {
    match value {
        Value::List(items) => items.borrow().iter().map(as_number).collect(),
        other => panic!("expected a list, got {}", other.type_name()),
    }
}

#[test]
fn if_else_single_line() {
    assert_eq!(as_number(&run_ok("if 1 == 2 then 10 else 20")), 20.0);
}

#[test]
fn if_without_else_returns_null() {
    assert_eq!(as_number(&run_ok("if 0 then 10")), 0.0);
}

#[test]
fn for_loop_collects_single_expression_results() {
    assert_eq!(as_numbers(&run_ok("for i = 1 to 4 do i * i")), vec![1.0, 4.0, 9.0]);
}

#[test]
fn for_loop_end_is_exclusive() {
    assert_eq!(as_numbers(&run_ok("for i = 0 to 3 do i")), vec![0.0, 1.0, 2.0]);
}

#[test]
fn for_loop_with_negative_step_counts_down() {
    assert_eq!(as_numbers(&run_ok("for i = 3 to 0 step -1 do i")), vec![3.0, 2.0, 1.0]);
}

#[test]
fn while_loop_collects_single_expression_results() {
    assert_eq!(
        as_numbers(&run_ok("var i = 0\nwhile i < 3 do var i = i + 1")),
        vec![1.0, 2.0, 3.0]
    );
}

#[test]
fn block_bodies_return_null_not_their_last_value() {
    assert_eq!(as_number(&run_ok("if 1 then\n  var x = 5\nend")), 0.0);
}

#[test]
fn and_or_are_eager_not_short_circuiting() {
    assert_eq!(as_number(&run_ok("0 and 1")), 0.0);
    assert_eq!(as_number(&run_ok("1 or 0")), 1.0);
}
