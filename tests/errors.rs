use wisp::error::Error;

#[test]
fn illegal_character_is_reported() {
    let (value, error) = wisp::run("<test>", "@");
    assert!(value.is_none());
    assert!(matches!(error.unwrap(), Error::IllegalCharacter { .. }));
}

#[test]
fn bang_without_equals_is_expected_character() {
    let (value, error) = wisp::run("<test>", "1 ! 2");
    assert!(value.is_none());
    assert!(matches!(error.unwrap(), Error::ExpectedCharacter { .. }));
}

#[test]
fn dangling_operator_is_invalid_syntax() {
    let (value, error) = wisp::run("<test>", "1 +");
    assert!(value.is_none());
    assert!(matches!(error.unwrap(), Error::InvalidSyntax { .. }));
}

#[test]
fn unbound_identifier_is_runtime_error() {
    let (value, error) = wisp::run("<test>", "undefined_name");
    assert!(value.is_none());
    let message = error.unwrap().to_string();
    assert!(message.contains("is not defined"));
}

#[test]
fn runtime_error_display_includes_traceback_header() {
    let src = "func f() -> 1 / 0\nf()";
    let (_, error) = wisp::run("<test>", src);
    let rendered = error.unwrap().to_string();
    assert!(rendered.contains("Traceback"));
    assert!(rendered.contains("Division by zero"));
}
