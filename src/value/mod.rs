mod number;

pub use number::Number;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{Error, RuntimeError};
use crate::interpreter::Interpreter;
use crate::parser::ast::Node;
use crate::position::Position;
use crate::symbol_table::SymbolTable;

pub type ValueList = Rc<RefCell<Vec<Value>>>;

/// The runtime value protocol. Every arithmetic/comparison/logical operation
/// that the interpreter needs is implemented here, variant by variant;
/// unsupported combinations surface as an `IllegalOperation` runtime error.
#[derive(Clone)]
pub enum Value {
    Number(Number),
    Str(Rc<str>),
    List(ValueList),
    Function(FunctionValue),
    BuiltIn(BuiltInValue),
}

#[derive(Clone)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub arg_names: Vec<String>,
    pub body: Rc<Node>,
    pub body_is_block: bool,
    pub context: Rc<Context>,
}

#[derive(Clone)]
pub struct BuiltInValue {
    pub name: &'static str,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::BuiltIn(_) => "built-in function",
        }
    }

    pub fn is_true(&self) -> bool {
        match self {
            Value::Number(n) => n.is_true(),
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Function(_) | Value::BuiltIn(_) => true,
        }
    }

    fn illegal_op(&self, other: &Value, pos: &(Position, Position), ctx: &Rc<Context>) -> Error {
        Error::Runtime(RuntimeError {
            message: format!(
                "illegal operation between {} and {}",
                self.type_name(),
                other.type_name()
            ),
            start: pos.0.clone(),
            end: pos.1.clone(),
            context: ctx.clone(),
        })
    }

    pub fn add(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(*b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(Rc::from(format!("{a}{b}")))),
            (Value::List(a), Value::List(b)) => {
                let mut result = a.borrow().clone();
                result.extend(b.borrow().iter().cloned());
                Ok(Value::List(Rc::new(RefCell::new(result))))
            }
            (Value::List(a), other) => {
                a.borrow_mut().push(other.clone());
                Ok(Value::List(a.clone()))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn subtract(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.subtract(*b))),
            (Value::List(a), Value::Number(n)) => {
                let idx = n.as_i64();
                let list = a.borrow();
                let len = list.len() as i64;
                let idx = if idx < 0 { idx + len } else { idx };
                if idx < 0 || idx >= len {
                    return Err(Error::Runtime(RuntimeError {
                        message: "index out of range".into(),
                        start: pos.0,
                        end: pos.1,
                        context: ctx.clone(),
                    }));
                }
                let mut rest = list.clone();
                rest.remove(idx as usize);
                Ok(Value::List(Rc::new(RefCell::new(rest))))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn multiply(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.multiply(*b))),
            (Value::Str(s), Value::Number(n)) => Ok(Value::Str(Rc::from(s.repeat(n.as_i64().max(0) as usize)))),
            (Value::List(a), Value::List(b)) => {
                let mut result = a.borrow().clone();
                result.extend(b.borrow().iter().cloned());
                Ok(Value::List(Rc::new(RefCell::new(result))))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn divide(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if b.as_f64() == 0.0 {
                    return Err(Error::Runtime(RuntimeError {
                        message: "Division by zero".into(),
                        start: pos.0,
                        end: pos.1,
                        context: ctx.clone(),
                    }));
                }
                Ok(Value::Number(a.divide(*b)))
            }
            (Value::List(a), Value::Number(n)) => {
                let idx = n.as_i64();
                let list = a.borrow();
                let len = list.len() as i64;
                let idx = if idx < 0 { idx + len } else { idx };
                if idx < 0 || idx >= len {
                    return Err(Error::Runtime(RuntimeError {
                        message: "index out of range".into(),
                        start: pos.0,
                        end: pos.1,
                        context: ctx.clone(),
                    }));
                }
                Ok(list[idx as usize].clone())
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn power(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.power(*b))),
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn compare_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    pub fn get_comparison_eq(&self, other: &Value) -> Value {
        Value::Number(Number::from_bool(self.compare_eq(other)))
    }

    pub fn get_comparison_ne(&self, other: &Value) -> Value {
        Value::Number(Number::from_bool(!self.compare_eq(other)))
    }

    pub fn ordered_compare(
        &self,
        other: &Value,
        pos: (Position, Position),
        ctx: &Rc<Context>,
        f: impl Fn(f64, f64) -> bool,
    ) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(Number::from_bool(f(a.as_f64(), b.as_f64()))))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn and(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(Number::from_bool(a.is_true() && b.is_true())))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn or(&self, other: &Value, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(Number::from_bool(a.is_true() || b.is_true())))
            }
            _ => Err(self.illegal_op(other, &pos, ctx)),
        }
    }

    pub fn not(&self) -> Value {
        Value::Number(Number::from_bool(!self.is_true()))
    }

    pub fn negate(&self, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
        match self {
            Value::Number(n) => Ok(Value::Number(n.negate())),
            other => Err(Error::Runtime(RuntimeError {
                message: format!("illegal operation: cannot negate {}", other.type_name()),
                start: pos.0,
                end: pos.1,
                context: ctx.clone(),
            })),
        }
    }

    /// Invokes a `Function` or `BuiltIn` value. Anything else is an
    /// `IllegalOperation`-style runtime error raised by the caller.
    pub fn execute(
        &self,
        args: Vec<Value>,
        call_pos: (Position, Position),
        caller_context: &Rc<Context>,
    ) -> Result<Value, Error> {
        match self {
            Value::Function(func) => Interpreter::call_function(func, args, call_pos, caller_context),
            Value::BuiltIn(builtin) => {
                crate::interpreter::builtins::call(builtin.name, args, call_pos, caller_context)
            }
            other => Err(Error::Runtime(RuntimeError {
                message: format!("{} is not callable", other.type_name()),
                start: call_pos.0,
                end: call_pos.1,
                context: caller_context.clone(),
            })),
        }
    }

    /// The form used by `print` and inside list rendering.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::Str(s) => s.to_string(),
            Value::List(items) => {
                let rendered: Vec<String> = items.borrow().iter().map(Value::to_repr_string).collect();
                rendered.join(", ")
            }
            Value::Function(f) => format!("<function {}>", f.name.as_deref().unwrap_or("<anonymous>")),
            Value::BuiltIn(b) => format!("<built-in function {}>", b.name),
        }
    }

    /// The form used by `repr` (e.g. in the shell and inside error text):
    /// strings get quoted, lists get brackets.
    pub fn to_repr_string(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            Value::List(items) => {
                let rendered: Vec<String> = items.borrow().iter().map(Value::to_repr_string).collect();
                format!("[{}]", rendered.join(", "))
            }
            other => other.to_display_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_repr_string())
    }
}

pub fn global_symbol_table() -> Rc<RefCell<SymbolTable>> {
    let table = Rc::new(RefCell::new(SymbolTable::new()));
    {
        let mut t = table.borrow_mut();
        t.set("null", Value::Number(Number::Int(0)));
        t.set("false", Value::Number(Number::Int(0)));
        t.set("true", Value::Number(Number::Int(1)));
        t.set("math_pi", Value::Number(Number::Float(std::f64::consts::PI)));
        for name in crate::interpreter::builtins::NAMES.iter().copied() {
            t.set(name, Value::BuiltIn(BuiltInValue { name }));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> (Position, Position) {
        let name: Rc<str> = Rc::from("<test>");
        let text: Rc<str> = Rc::from("");
        (
            Position::new(0, 0, 0, name.clone(), text.clone()),
            Position::new(0, 0, 0, name, text),
        )
    }

    fn ctx() -> Rc<Context> {
        Rc::new(Context::new("<test>", None, None, global_symbol_table()))
    }

    fn list_of(numbers: &[i64]) -> Value {
        let items = numbers.iter().map(|n| Value::Number(Number::Int(*n))).collect();
        Value::List(Rc::new(RefCell::new(items)))
    }

    #[test]
    fn list_divide_supports_negative_indices() {
        let list = list_of(&[10, 20, 30]);
        let result = list.divide(&Value::Number(Number::Int(-1)), pos(), &ctx()).unwrap();
        assert_eq!(as_int(&result), 30);
    }

    #[test]
    fn list_divide_out_of_range_after_negative_wrap_is_runtime_error() {
        let list = list_of(&[1, 2]);
        let err = list.divide(&Value::Number(Number::Int(-5)), pos(), &ctx());
        assert!(err.is_err());
    }

    #[test]
    fn list_subtract_by_index_does_not_mutate_the_original() {
        let items: ValueList = Rc::new(RefCell::new(vec![Value::Number(Number::Int(1)), Value::Number(Number::Int(2))]));
        let list = Value::List(items.clone());
        let remainder = list.subtract(&Value::Number(Number::Int(0)), pos(), &ctx()).unwrap();

        match remainder {
            Value::List(rest) => assert_eq!(as_int(&rest.borrow()[0]), 2),
            other => panic!("expected a list, got {}", other.type_name()),
        }
        assert_eq!(items.borrow().len(), 2, "original list must be untouched");
    }

    #[test]
    fn append_and_pop_observe_each_others_mutation_through_shared_aliasing() {
        let items: ValueList = Rc::new(RefCell::new(vec![Value::Number(Number::Int(1))]));
        let a = Value::List(items.clone());
        let b = Value::List(items.clone());

        crate::interpreter::builtins::call("append", vec![a, Value::Number(Number::Int(2))], pos(), &ctx()).unwrap();

        // `b` aliases the same underlying list, so it must see the append.
        match &b {
            Value::List(l) => assert_eq!(l.borrow().len(), 2),
            _ => unreachable!(),
        }

        let popped = crate::interpreter::builtins::call("pop", vec![b, Value::Number(Number::Int(0))], pos(), &ctx()).unwrap();
        assert_eq!(as_int(&popped), 1);
        assert_eq!(items.borrow().len(), 1);
    }

    #[test]
    fn string_multiply_repeats() {
        let s = Value::Str(Rc::from("ab"));
        let result = s.multiply(&Value::Number(Number::Int(3)), pos(), &ctx()).unwrap();
        match result {
            Value::Str(s) => assert_eq!(&*s, "ababab"),
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn power_with_negative_integer_exponent_falls_through_to_float() {
        let result = Value::Number(Number::Int(2))
            .power(&Value::Number(Number::Int(-1)), pos(), &ctx())
            .unwrap();
        match result {
            Value::Number(Number::Float(f)) => assert_eq!(f, 0.5),
            other => panic!("expected a float, got {other:?}"),
        }
    }

    #[test]
    fn and_or_are_illegal_between_non_numbers() {
        let a = Value::Str(Rc::from("x"));
        let b = Value::Str(Rc::from("y"));
        assert!(a.and(&b, pos(), &ctx()).is_err());
        assert!(a.or(&b, pos(), &ctx()).is_err());
    }

    fn as_int(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n.as_i64(),
            other => panic!("expected a number, got {}", other.type_name()),
        }
    }
}
