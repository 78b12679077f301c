use std::rc::Rc;

use log::warn;

use crate::context::Context;
use crate::error::{Error, RuntimeError};
use crate::position::Position;
use crate::value::{Number, Value};

pub const NAMES: &[&str] = &[
    "print",
    "print_ret",
    "input",
    "input_int",
    "clear",
    "cls",
    "is_num",
    "is_str",
    "is_list",
    "is_func",
    "append",
    "pop",
    "extend",
];

fn arity_error(name: &str, expected: usize, got: usize, pos: &(Position, Position), ctx: &Rc<Context>) -> Error {
    Error::Runtime(RuntimeError {
        message: format!("{name} expects {expected} argument(s), got {got}"),
        start: pos.0.clone(),
        end: pos.1.clone(),
        context: ctx.clone(),
    })
}

fn type_error(name: &str, expected: &str, pos: &(Position, Position), ctx: &Rc<Context>) -> Error {
    Error::Runtime(RuntimeError {
        message: format!("{name} expects a {expected} argument"),
        start: pos.0.clone(),
        end: pos.1.clone(),
        context: ctx.clone(),
    })
}

pub fn call(name: &str, args: Vec<Value>, pos: (Position, Position), ctx: &Rc<Context>) -> Result<Value, Error> {
    match name {
        "print" => {
            if args.len() != 1 {
                return Err(arity_error(name, 1, args.len(), &pos, ctx));
            }
            println!("{}", args[0].to_display_string());
            Ok(Value::Number(Number::Int(0)))
        }
        "print_ret" => {
            if args.len() != 1 {
                return Err(arity_error(name, 1, args.len(), &pos, ctx));
            }
            Ok(Value::Str(Rc::from(args[0].to_display_string().as_str())))
        }
        "input" => {
            if !args.is_empty() {
                return Err(arity_error(name, 0, args.len(), &pos, ctx));
            }
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok();
            Ok(Value::Str(Rc::from(line.trim_end_matches('\n'))))
        }
        "input_int" => {
            if !args.is_empty() {
                return Err(arity_error(name, 0, args.len(), &pos, ctx));
            }
            loop {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).ok();
                if let Ok(i) = line.trim().parse::<i64>() {
                    return Ok(Value::Number(Number::Int(i)));
                }
                println!("must be an integer");
            }
        }
        "clear" | "cls" => {
            print!("\x1B[2J\x1B[1;1H");
            Ok(Value::Number(Number::Int(0)))
        }
        "is_num" => Ok(Value::Number(Number::from_bool(matches!(args.first(), Some(Value::Number(_)))))),
        "is_str" => Ok(Value::Number(Number::from_bool(matches!(args.first(), Some(Value::Str(_)))))),
        "is_list" => Ok(Value::Number(Number::from_bool(matches!(args.first(), Some(Value::List(_)))))),
        "is_func" => Ok(Value::Number(Number::from_bool(matches!(
            args.first(),
            Some(Value::Function(_)) | Some(Value::BuiltIn(_))
        )))),
        "append" => {
            if args.len() != 2 {
                return Err(arity_error(name, 2, args.len(), &pos, ctx));
            }
            let Value::List(list) = &args[0] else {
                return Err(type_error(name, "list", &pos, ctx));
            };
            list.borrow_mut().push(args[1].clone());
            Ok(Value::Number(Number::Int(0)))
        }
        "pop" => {
            if args.len() != 2 {
                return Err(arity_error(name, 2, args.len(), &pos, ctx));
            }
            let Value::List(list) = &args[0] else {
                return Err(type_error(name, "list", &pos, ctx));
            };
            let Value::Number(idx) = &args[1] else {
                return Err(type_error(name, "number index", &pos, ctx));
            };
            let mut idx_val = idx.as_i64();
            if idx.as_f64().fract() != 0.0 {
                warn!("pop received a non-integer index, truncating");
            }
            let mut list = list.borrow_mut();
            let len = list.len() as i64;
            if idx_val < 0 {
                idx_val += len;
            }
            if idx_val < 0 || idx_val >= len {
                return Err(Error::Runtime(RuntimeError {
                    message: "index out of range".into(),
                    start: pos.0,
                    end: pos.1,
                    context: ctx.clone(),
                }));
            }
            Ok(list.remove(idx_val as usize))
        }
        "extend" => {
            if args.len() != 2 {
                return Err(arity_error(name, 2, args.len(), &pos, ctx));
            }
            let (Value::List(a), Value::List(b)) = (&args[0], &args[1]) else {
                return Err(type_error(name, "list", &pos, ctx));
            };
            let extra: Vec<Value> = b.borrow().clone();
            a.borrow_mut().extend(extra);
            Ok(Value::Number(Number::Int(0)))
        }
        other => Err(Error::Runtime(RuntimeError {
            message: format!("unknown built-in function '{other}'"),
            start: pos.0,
            end: pos.1,
            context: ctx.clone(),
        })),
    }
}
