pub mod builtins;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};

use crate::context::Context;
use crate::error::{Error, RuntimeError};
use crate::lexer::{Token, TokenKind};
use crate::parser::ast::Node;
use crate::position::Position;
use crate::symbol_table::SymbolTable;
use crate::value::{FunctionValue, Number, Value};

pub struct Interpreter;

impl Interpreter {
    pub fn visit(node: &Node, context: &Rc<Context>) -> Result<Value, Error> {
        trace!("visiting {}", node_kind(node));
        match node {
            Node::Number { token } => Ok(Value::Number(number_from_token(token))),
            Node::Str { token } => Ok(Value::Str(Rc::from(string_from_token(token).as_str()))),
            Node::List { elements, .. } => Self::visit_list(elements, context),
            Node::Statements { statements, .. } => Self::visit_statements(statements, context),
            Node::VarAccess { name } => Self::visit_var_access(name, context),
            Node::VarAssign { name, value } => Self::visit_var_assign(name, value, context),
            Node::BinOp { left, op, right } => Self::visit_bin_op(left, op, right, context),
            Node::UnaryOp { op, node } => Self::visit_unary_op(op, node, context),
            Node::If { cases, else_case, .. } => Self::visit_if(cases, else_case, context),
            Node::For {
                var_name,
                start_value,
                end_value,
                step_value,
                body,
                body_is_block,
            } => Self::visit_for(var_name, start_value, end_value, step_value.as_deref(), body, *body_is_block, context),
            Node::While {
                condition,
                body,
                body_is_block,
            } => Self::visit_while(condition, body, *body_is_block, context),
            Node::FuncDef {
                name,
                arg_names,
                body,
                body_is_block,
                ..
            } => Self::visit_func_def(name, arg_names, body, *body_is_block, context),
            Node::Call { callee, args, end } => Self::visit_call(callee, args, end, context),
        }
    }

    fn visit_list(elements: &[Node], context: &Rc<Context>) -> Result<Value, Error> {
        let mut values = Vec::with_capacity(elements.len());
        for el in elements {
            values.push(Self::visit(el, context)?);
        }
        Ok(Value::List(Rc::new(RefCell::new(values))))
    }

    fn visit_statements(statements: &[Node], context: &Rc<Context>) -> Result<Value, Error> {
        let mut last = Value::Number(Number::Int(0));
        for statement in statements {
            last = Self::visit(statement, context)?;
        }
        Ok(last)
    }

    fn visit_var_access(name: &Token, context: &Rc<Context>) -> Result<Value, Error> {
        let ident = string_from_token(name);
        let found = context.symbol_table.borrow().get(&ident);

        match found {
            // A present-but-falsy value (e.g. `0`) must still be returned: this
            // is an existence check, not a truthiness check.
            Some(value) => Ok(value),
            None => Err(Error::Runtime(RuntimeError {
                message: format!("'{ident}' is not defined"),
                start: name.start.clone(),
                end: name.end.clone(),
                context: context.clone(),
            })),
        }
    }

    fn visit_var_assign(name: &Token, value_node: &Node, context: &Rc<Context>) -> Result<Value, Error> {
        let value = Self::visit(value_node, context)?;
        context
            .symbol_table
            .borrow_mut()
            .set(string_from_token(name), value.clone());
        Ok(value)
    }

    fn visit_bin_op(left: &Node, op: &Token, right: &Node, context: &Rc<Context>) -> Result<Value, Error> {
        let left_val = Self::visit(left, context)?;
        let right_val = Self::visit(right, context)?;
        let pos = (left.start(), right.end());

        let is = |kw: &str| op.matches(TokenKind::Keyword, kw);

        match op.kind {
            TokenKind::Plus => left_val.add(&right_val, pos, context),
            TokenKind::Minus => left_val.subtract(&right_val, pos, context),
            TokenKind::Mul => left_val.multiply(&right_val, pos, context),
            TokenKind::Div => left_val.divide(&right_val, pos, context),
            TokenKind::Pow => left_val.power(&right_val, pos, context),
            TokenKind::Ee => Ok(left_val.get_comparison_eq(&right_val)),
            TokenKind::Ne => Ok(left_val.get_comparison_ne(&right_val)),
            TokenKind::Lt => left_val.ordered_compare(&right_val, pos, context, |a, b| a < b),
            TokenKind::Gt => left_val.ordered_compare(&right_val, pos, context, |a, b| a > b),
            TokenKind::Lte => left_val.ordered_compare(&right_val, pos, context, |a, b| a <= b),
            TokenKind::Gte => left_val.ordered_compare(&right_val, pos, context, |a, b| a >= b),
            TokenKind::Keyword if is("and") => left_val.and(&right_val, pos, context),
            TokenKind::Keyword if is("or") => left_val.or(&right_val, pos, context),
            _ => Err(Error::Runtime(RuntimeError {
                message: format!("unsupported operator {:?}", op.kind),
                start: pos.0,
                end: pos.1,
                context: context.clone(),
            })),
        }
    }

    fn visit_unary_op(op: &Token, node: &Node, context: &Rc<Context>) -> Result<Value, Error> {
        let value = Self::visit(node, context)?;
        let pos = (op.start.clone(), node.end());

        if op.matches(TokenKind::Keyword, "not") {
            return Ok(value.not());
        }

        match op.kind {
            TokenKind::Minus => value.negate(pos, context),
            TokenKind::Plus => Ok(value),
            _ => Err(Error::Runtime(RuntimeError {
                message: format!("unsupported unary operator {:?}", op.kind),
                start: pos.0,
                end: pos.1,
                context: context.clone(),
            })),
        }
    }

    fn visit_if(
        cases: &[(Node, Node, bool)],
        else_case: &Option<(Box<Node>, bool)>,
        context: &Rc<Context>,
    ) -> Result<Value, Error> {
        for (condition, body, is_block) in cases {
            let cond_value = Self::visit(condition, context)?;
            if cond_value.is_true() {
                let value = Self::visit(body, context)?;
                return Ok(if *is_block { Value::Number(Number::Int(0)) } else { value });
            }
        }

        if let Some((body, is_block)) = else_case {
            let value = Self::visit(body, context)?;
            return Ok(if *is_block { Value::Number(Number::Int(0)) } else { value });
        }

        Ok(Value::Number(Number::Int(0)))
    }

    fn visit_for(
        var_name: &Token,
        start_node: &Node,
        end_node: &Node,
        step_node: Option<&Node>,
        body: &Node,
        body_is_block: bool,
        context: &Rc<Context>,
    ) -> Result<Value, Error> {
        let start_value = expect_number(Self::visit(start_node, context)?, start_node, context)?;
        let end_value = expect_number(Self::visit(end_node, context)?, end_node, context)?;
        let step_value = match step_node {
            Some(node) => expect_number(Self::visit(node, context)?, node, context)?,
            None => 1.0,
        };

        let name = string_from_token(var_name);
        let mut results = Vec::new();
        let mut i = start_value;

        let condition = |i: f64| if step_value >= 0.0 { i < end_value } else { i > end_value };

        while condition(i) {
            context
                .symbol_table
                .borrow_mut()
                .set(&name, Value::Number(to_number(i)));

            let value = Self::visit(body, context)?;
            results.push(value);
            i += step_value;
        }

        if body_is_block {
            Ok(Value::Number(Number::Int(0)))
        } else {
            Ok(Value::List(Rc::new(RefCell::new(results))))
        }
    }

    fn visit_while(condition: &Node, body: &Node, body_is_block: bool, context: &Rc<Context>) -> Result<Value, Error> {
        let mut results = Vec::new();

        while Self::visit(condition, context)?.is_true() {
            results.push(Self::visit(body, context)?);
        }

        if body_is_block {
            Ok(Value::Number(Number::Int(0)))
        } else {
            Ok(Value::List(Rc::new(RefCell::new(results))))
        }
    }

    fn visit_func_def(
        name: &Option<Token>,
        arg_names: &[Token],
        body: &Node,
        body_is_block: bool,
        context: &Rc<Context>,
    ) -> Result<Value, Error> {
        let func_name = name.as_ref().map(string_from_token);

        let func = FunctionValue {
            name: func_name.clone(),
            arg_names: arg_names.iter().map(string_from_token).collect(),
            body: Rc::new(body.clone()),
            body_is_block,
            context: context.clone(),
        };

        let value = Value::Function(func);

        if let Some(n) = func_name {
            context.symbol_table.borrow_mut().set(n, value.clone());
        }

        Ok(value)
    }

    fn visit_call(callee: &Node, args: &[Node], end: &Position, context: &Rc<Context>) -> Result<Value, Error> {
        let callee_value = Self::visit(callee, context)?;

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(Self::visit(arg, context)?);
        }

        let call_pos = (callee.start(), end.clone());
        debug!("calling {} with {} argument(s)", callee_value.type_name(), arg_values.len());
        callee_value.execute(arg_values, call_pos, context)
    }

    /// Call semantics for a user-defined `Function` value: a fresh `Context`
    /// whose parent is the function's *definition-time* context (lexical
    /// scoping), not the caller's.
    pub fn call_function(
        func: &FunctionValue,
        args: Vec<Value>,
        call_pos: (Position, Position),
        caller_context: &Rc<Context>,
    ) -> Result<Value, Error> {
        if args.len() != func.arg_names.len() {
            return Err(Error::Runtime(RuntimeError {
                message: format!(
                    "{} too many/few arguments passed into {}",
                    args.len() as i64 - func.arg_names.len() as i64,
                    func.name.as_deref().unwrap_or("<anonymous>")
                ),
                start: call_pos.0,
                end: call_pos.1,
                context: caller_context.clone(),
            }));
        }

        let new_table = Rc::new(RefCell::new(SymbolTable::with_parent(
            func.context.symbol_table.clone(),
        )));

        let new_context = Rc::new(Context::new(
            func.name.clone().unwrap_or_else(|| "<anonymous>".into()),
            Some(func.context.clone()),
            Some(call_pos.0.clone()),
            new_table,
        ));

        for (name, value) in func.arg_names.iter().zip(args) {
            new_context.symbol_table.borrow_mut().set(name.clone(), value);
        }

        let result = Self::visit(&func.body, &new_context)?;

        if func.body_is_block {
            Ok(Value::Number(Number::Int(0)))
        } else {
            Ok(result)
        }
    }
}

fn expect_number(value: Value, node: &Node, context: &Rc<Context>) -> Result<f64, Error> {
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        other => Err(Error::Runtime(RuntimeError {
            message: format!("expected a number, found {}", other.type_name()),
            start: node.start(),
            end: node.end(),
            context: context.clone(),
        })),
    }
}

fn to_number(f: f64) -> Number {
    if f.fract() == 0.0 {
        Number::Int(f as i64)
    } else {
        Number::Float(f)
    }
}

fn number_from_token(token: &Token) -> Number {
    match &token.value {
        crate::lexer::TokenValue::Int(i) => Number::Int(*i),
        crate::lexer::TokenValue::Float(f) => Number::Float(*f),
        _ => Number::Int(0),
    }
}

fn string_from_token(token: &Token) -> String {
    match &token.value {
        crate::lexer::TokenValue::Str(s) => s.clone(),
        _ => String::new(),
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Number { .. } => "Number",
        Node::Str { .. } => "Str",
        Node::List { .. } => "List",
        Node::Statements { .. } => "Statements",
        Node::VarAccess { .. } => "VarAccess",
        Node::VarAssign { .. } => "VarAssign",
        Node::BinOp { .. } => "BinOp",
        Node::UnaryOp { .. } => "UnaryOp",
        Node::If { .. } => "If",
        Node::For { .. } => "For",
        Node::While { .. } => "While",
        Node::FuncDef { .. } => "FuncDef",
        Node::Call { .. } => "Call",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::value::global_symbol_table;

    fn eval(src: &str) -> Value {
        let tokens = Lexer::new("<test>", src).make_tokens().unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let context = Rc::new(Context::new("<main>", None, None, global_symbol_table()));
        Interpreter::visit(&ast, &context).unwrap()
    }

    fn eval_err(src: &str) -> Error {
        let tokens = Lexer::new("<test>", src).make_tokens().unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let context = Rc::new(Context::new("<main>", None, None, global_symbol_table()));
        Interpreter::visit(&ast, &context).unwrap_err()
    }

    fn as_number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64(),
            other => panic!("expected a number, got {}", other.type_name()),
        }
    }

    #[test]
    fn bin_op_dispatches_every_arithmetic_and_comparison_kind() {
        assert_eq!(as_number(&eval("2 + 3 * 4")), 14.0);
        assert_eq!(as_number(&eval("(2 + 3) == 5")), 1.0);
        assert_eq!(as_number(&eval("2 != 3")), 1.0);
        assert_eq!(as_number(&eval("3 <= 3")), 1.0);
    }

    #[test]
    fn for_loop_accumulates_one_result_per_iteration() {
        let value = eval("for i = 0 to 5 step 2 do i");
        match value {
            Value::List(items) => {
                let got: Vec<f64> = items.borrow().iter().map(as_number).collect();
                assert_eq!(got, vec![0.0, 2.0, 4.0]);
            }
            other => panic!("expected a list, got {}", other.type_name()),
        }
    }

    #[test]
    fn while_loop_returns_null_when_body_is_block_form() {
        let value = eval("var i = 0\nwhile i < 3 do\n  var i = i + 1\nend");
        assert_eq!(as_number(&value), 0.0);
    }

    #[test]
    fn call_function_rebinds_arguments_in_a_fresh_table_per_call() {
        // the same function body must see each call's own arguments, not a
        // table left over from a previous call
        let value = eval("func sq(x) -> x * x\nsq(3) + sq(4)");
        assert_eq!(as_number(&value), 25.0);
    }

    #[test]
    fn call_function_reports_exact_argument_count_mismatch() {
        let err = eval_err("func add(a, b) -> a + b\nadd(1)");
        let message = err.to_string();
        assert!(message.contains("-1") || message.contains("arguments"));
    }

    #[test]
    fn closures_keep_their_definition_time_context_alive() {
        let value = eval("func make_adder(n) -> func adder(x) -> x + n\nvar add5 = make_adder(5)\nadd5(2) + add5(3)");
        assert_eq!(as_number(&value), 15.0);
    }
}
