pub mod ast;

use log::trace;

use crate::error::Error;
use crate::lexer::{Token, TokenKind};
use ast::Node;

/// Tracks how many tokens a parse attempt actually consumed. An error raised
/// with `advance_count == 0` is *recoverable* (the caller may try another
/// alternative); one raised after at least one advancement is *committed*
/// and propagates straight to the top.
pub struct ParseResult {
    pub error: Option<Error>,
    pub node: Option<Node>,
    last_registered_advance_count: usize,
    advance_count: usize,
    to_reverse_count: usize,
}

impl ParseResult {
    fn new() -> Self {
        Self {
            error: None,
            node: None,
            last_registered_advance_count: 0,
            advance_count: 0,
            to_reverse_count: 0,
        }
    }

    fn register_advancement(&mut self) {
        self.last_registered_advance_count = 1;
        self.advance_count += 1;
    }

    fn register(&mut self, mut res: ParseResult) -> Option<Node> {
        self.last_registered_advance_count = res.advance_count;
        self.advance_count += res.advance_count;
        if res.error.is_some() {
            self.error = res.error.take();
        }
        res.node
    }

    fn try_register(&mut self, res: ParseResult) -> Option<Node> {
        if res.error.is_some() {
            self.to_reverse_count = res.last_registered_advance_count;
            return None;
        }
        self.register(res)
    }

    fn success(mut self, node: Node) -> Self {
        self.node = Some(node);
        self
    }

    fn failure(mut self, error: Error) -> Self {
        if self.error.is_none() || self.last_registered_advance_count == 0 {
            self.error = Some(error);
        }
        self
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    tok_idx: isize,
    current_tok: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let current_tok = tokens[0].clone();
        let mut parser = Self {
            tokens,
            tok_idx: -1,
            current_tok,
        };
        parser.advance();
        parser
    }

    fn advance(&mut self) -> Token {
        self.tok_idx += 1;
        self.update_current_tok();
        self.current_tok.clone()
    }

    fn reverse(&mut self, amount: isize) -> Token {
        self.tok_idx -= amount;
        self.update_current_tok();
        self.current_tok.clone()
    }

    fn update_current_tok(&mut self) {
        if self.tok_idx >= 0 && (self.tok_idx as usize) < self.tokens.len() {
            self.current_tok = self.tokens[self.tok_idx as usize].clone();
        }
    }

    pub fn parse(mut self) -> Result<Node, Error> {
        let mut res = self.statements();

        if let Some(error) = res.error.take() {
            return Err(error);
        }

        if self.current_tok.kind != TokenKind::Eof {
            return Err(Error::InvalidSyntax {
                message: "expected '+', '-', '*', '/', '^', '==', '!=', '<', '>', '<=', '>=', 'and' or 'or'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }

        match res.node.take() {
            Some(node) => Ok(node),
            None => Err(Error::InvalidSyntax {
                message: "expected an expression".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            }),
        }
    }

    fn skip_newlines(&mut self, res: &mut ParseResult) {
        while self.current_tok.kind == TokenKind::NewLine {
            res.register_advancement();
            self.advance();
        }
    }

    fn is_keyword(&self, kw: &str) -> bool {
        self.current_tok.matches(TokenKind::Keyword, kw)
    }

    fn statements(&mut self) -> ParseResult {
        trace!("entering statements");
        let mut res = ParseResult::new();
        let start = self.current_tok.start.clone();
        let mut statements = Vec::new();

        self.skip_newlines(&mut res);

        let first = match res.register(self.expr()) {
            Some(node) => node,
            None => return res,
        };
        statements.push(first);

        let mut more_statements = true;
        loop {
            let mut newline_count = 0;
            while self.current_tok.kind == TokenKind::NewLine {
                res.register_advancement();
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 {
                more_statements = false;
            }
            if !more_statements {
                break;
            }

            if matches!(self.current_tok.kind, TokenKind::Eof)
                || self.is_keyword("end")
                || self.is_keyword("elif")
                || self.is_keyword("else")
            {
                break;
            }

            let statement = res.try_register(self.expr());
            let Some(statement) = statement else {
                self.reverse(res.to_reverse_count as isize);
                more_statements = false;
                continue;
            };
            statements.push(statement);
        }

        res.success(Node::Statements {
            statements,
            start,
            end: self.current_tok.end.clone(),
        })
    }

    fn expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        if self.is_keyword("var") {
            res.register_advancement();
            self.advance();

            if self.current_tok.kind != TokenKind::Identifier {
                return res.failure(Error::InvalidSyntax {
                    message: "expected identifier".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }

            let name = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            if self.current_tok.kind != TokenKind::Eq {
                return res.failure(Error::InvalidSyntax {
                    message: "expected '='".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }

            res.register_advancement();
            self.advance();

            let value = match res.register(self.expr()) {
                Some(n) => n,
                None => return res,
            };

            return res.success(Node::VarAssign {
                name,
                value: Box::new(value),
            });
        }

        let mut left = match res.register(self.comp_expr()) {
            Some(n) => n,
            None => return res,
        };

        while self.is_keyword("and") || self.is_keyword("or") {
            let op = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            let right = match res.register(self.comp_expr()) {
                Some(n) => n,
                None => return res,
            };

            left = Node::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        res.success(left)
    }

    fn comp_expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        if self.is_keyword("not") {
            let op = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            let node = match res.register(self.comp_expr()) {
                Some(n) => n,
                None => return res,
            };

            return res.success(Node::UnaryOp {
                op,
                node: Box::new(node),
            });
        }

        let mut left = match res.register(self.arith_expr()) {
            Some(n) => n,
            None => return res,
        };

        while matches!(
            self.current_tok.kind,
            TokenKind::Ee | TokenKind::Ne | TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte
        ) {
            let op = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            let right = match res.register(self.arith_expr()) {
                Some(n) => n,
                None => return res,
            };

            left = Node::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        res.success(left)
    }

    fn arith_expr(&mut self) -> ParseResult {
        self.bin_op(Self::term, &[TokenKind::Plus, TokenKind::Minus], Self::term)
    }

    fn term(&mut self) -> ParseResult {
        self.bin_op(Self::factor, &[TokenKind::Mul, TokenKind::Div], Self::factor)
    }

    fn bin_op(
        &mut self,
        left_fn: impl Fn(&mut Self) -> ParseResult,
        ops: &[TokenKind],
        right_fn: impl Fn(&mut Self) -> ParseResult,
    ) -> ParseResult {
        let mut res = ParseResult::new();

        let mut left = match res.register(left_fn(self)) {
            Some(n) => n,
            None => return res,
        };

        while ops.contains(&self.current_tok.kind) {
            let op = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            let right = match res.register(right_fn(self)) {
                Some(n) => n,
                None => return res,
            };

            left = Node::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        res.success(left)
    }

    fn factor(&mut self) -> ParseResult {
        let mut res = ParseResult::new();
        let tok = self.current_tok.clone();

        if matches!(tok.kind, TokenKind::Plus | TokenKind::Minus) {
            res.register_advancement();
            self.advance();

            let node = match res.register(self.factor()) {
                Some(n) => n,
                None => return res,
            };

            return res.success(Node::UnaryOp {
                op: tok,
                node: Box::new(node),
            });
        }

        self.power()
    }

    fn power(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        let mut left = match res.register(self.call()) {
            Some(n) => n,
            None => return res,
        };

        while self.current_tok.kind == TokenKind::Pow {
            let op = self.current_tok.clone();
            res.register_advancement();
            self.advance();

            let right = match res.register(self.factor()) {
                Some(n) => n,
                None => return res,
            };

            left = Node::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        res.success(left)
    }

    fn call(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        let atom = match res.register(self.atom()) {
            Some(n) => n,
            None => return res,
        };

        if self.current_tok.kind != TokenKind::LParen {
            return res.success(atom);
        }

        res.register_advancement();
        self.advance();
        let mut args = Vec::new();

        if self.current_tok.kind == TokenKind::RParen {
            res.register_advancement();
            self.advance();
        } else {
            let first = match res.register(self.expr()) {
                Some(n) => n,
                None => return res,
            };
            args.push(first);

            while self.current_tok.kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                let next = match res.register(self.expr()) {
                    Some(n) => n,
                    None => return res,
                };
                args.push(next);
            }

            if self.current_tok.kind != TokenKind::RParen {
                return res.failure(Error::InvalidSyntax {
                    message: "expected ',' or ')'".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }

            res.register_advancement();
            self.advance();
        }

        let end = self.current_tok.start.clone();
        res.success(Node::Call {
            callee: Box::new(atom),
            args,
            end,
        })
    }

    fn atom(&mut self) -> ParseResult {
        let mut res = ParseResult::new();
        let tok = self.current_tok.clone();

        match tok.kind {
            TokenKind::Int | TokenKind::Float => {
                res.register_advancement();
                self.advance();
                res.success(Node::Number { token: tok })
            }
            TokenKind::String => {
                res.register_advancement();
                self.advance();
                res.success(Node::Str { token: tok })
            }
            TokenKind::Identifier => {
                res.register_advancement();
                self.advance();
                res.success(Node::VarAccess { name: tok })
            }
            TokenKind::LParen => {
                res.register_advancement();
                self.advance();

                let expr = match res.register(self.expr()) {
                    Some(n) => n,
                    None => return res,
                };

                if self.current_tok.kind != TokenKind::RParen {
                    return res.failure(Error::InvalidSyntax {
                        message: "expected ')'".into(),
                        start: self.current_tok.start.clone(),
                        end: self.current_tok.end.clone(),
                    });
                }

                res.register_advancement();
                self.advance();
                res.success(expr)
            }
            TokenKind::LSquare => self.list_expr(),
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, "if") => self.if_expr(),
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, "for") => self.for_expr(),
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, "while") => self.while_expr(),
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, "func") => self.func_def(),
            _ => res.failure(Error::InvalidSyntax {
                message: "expected int, float, identifier, '+', '-', '(', '[', 'if', 'for', 'while' or 'func'".into(),
                start: tok.start,
                end: tok.end,
            }),
        }
    }

    fn list_expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();
        let start = self.current_tok.start.clone();

        res.register_advancement();
        self.advance();
        let mut elements = Vec::new();

        if self.current_tok.kind == TokenKind::RSquare {
            res.register_advancement();
            self.advance();
        } else {
            let first = match res.register(self.expr()) {
                Some(n) => n,
                None => return res,
            };
            elements.push(first);

            while self.current_tok.kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                let next = match res.register(self.expr()) {
                    Some(n) => n,
                    None => return res,
                };
                elements.push(next);
            }

            if self.current_tok.kind != TokenKind::RSquare {
                return res.failure(Error::InvalidSyntax {
                    message: "expected ',' or ']'".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }

            res.register_advancement();
            self.advance();
        }

        let end = self.current_tok.start.clone();
        res.success(Node::List { elements, start, end })
    }

    /// Parses a body as either a single-line expression or a multi-line
    /// block terminated by `end`, speculating on the single-line form first.
    fn block_or_expr(&mut self, res: &mut ParseResult) -> Option<(Node, bool)> {
        if self.current_tok.kind == TokenKind::NewLine {
            res.register_advancement();
            self.advance();

            let statements = match res.register(self.statements()) {
                Some(n) => n,
                None => return None,
            };

            if !self.is_keyword("end") {
                res.node = None;
                res.error = Some(Error::InvalidSyntax {
                    message: "expected 'end'".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
                return None;
            }

            res.register_advancement();
            self.advance();
            Some((statements, true))
        } else {
            let expr = match res.register(self.expr()) {
                Some(n) => n,
                None => return None,
            };
            Some((expr, false))
        }
    }

    fn if_expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();
        let start = self.current_tok.start.clone();

        let mut cases = Vec::new();
        let mut else_case = None;

        res.register_advancement();
        self.advance();

        let condition = match res.register(self.expr()) {
            Some(n) => n,
            None => return res,
        };

        if !self.is_keyword("then") {
            return res.failure(Error::InvalidSyntax {
                message: "expected 'then'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let Some((body, is_block)) = self.block_or_expr(&mut res) else {
            return res;
        };
        cases.push((condition, body, is_block));

        loop {
            if self.is_keyword("elif") {
                res.register_advancement();
                self.advance();

                let condition = match res.register(self.expr()) {
                    Some(n) => n,
                    None => return res,
                };

                if !self.is_keyword("then") {
                    return res.failure(Error::InvalidSyntax {
                        message: "expected 'then'".into(),
                        start: self.current_tok.start.clone(),
                        end: self.current_tok.end.clone(),
                    });
                }
                res.register_advancement();
                self.advance();

                let Some((body, is_block)) = self.block_or_expr(&mut res) else {
                    return res;
                };
                cases.push((condition, body, is_block));
                continue;
            }

            if self.is_keyword("else") {
                res.register_advancement();
                self.advance();

                let Some((body, is_block)) = self.block_or_expr(&mut res) else {
                    return res;
                };
                else_case = Some((Box::new(body), is_block));
            }

            break;
        }

        if else_case.is_some() || cases.last().map(|(_, _, b)| *b).unwrap_or(false) {
            if self.is_keyword("end") {
                res.register_advancement();
                self.advance();
            }
        }

        let end = self.current_tok.start.clone();
        res.success(Node::If {
            cases,
            else_case,
            start,
            end,
        })
    }

    fn for_expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        res.register_advancement();
        self.advance();

        if self.current_tok.kind != TokenKind::Identifier {
            return res.failure(Error::InvalidSyntax {
                message: "expected identifier".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        let var_name = self.current_tok.clone();
        res.register_advancement();
        self.advance();

        if self.current_tok.kind != TokenKind::Eq {
            return res.failure(Error::InvalidSyntax {
                message: "expected '='".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let start_value = match res.register(self.expr()) {
            Some(n) => n,
            None => return res,
        };

        if !self.is_keyword("to") {
            return res.failure(Error::InvalidSyntax {
                message: "expected 'to'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let end_value = match res.register(self.expr()) {
            Some(n) => n,
            None => return res,
        };

        let step_value = if self.is_keyword("step") {
            res.register_advancement();
            self.advance();
            match res.register(self.expr()) {
                Some(n) => Some(Box::new(n)),
                None => return res,
            }
        } else {
            None
        };

        if !self.is_keyword("do") {
            return res.failure(Error::InvalidSyntax {
                message: "expected 'do'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let Some((body, is_block)) = self.block_or_expr(&mut res) else {
            return res;
        };

        if is_block {
            if !self.is_keyword("end") {
                return res.failure(Error::InvalidSyntax {
                    message: "expected 'end'".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }
            res.register_advancement();
            self.advance();
        }

        res.success(Node::For {
            var_name,
            start_value: Box::new(start_value),
            end_value: Box::new(end_value),
            step_value,
            body: Box::new(body),
            body_is_block: is_block,
        })
    }

    fn while_expr(&mut self) -> ParseResult {
        let mut res = ParseResult::new();

        res.register_advancement();
        self.advance();

        let condition = match res.register(self.expr()) {
            Some(n) => n,
            None => return res,
        };

        if !self.is_keyword("do") {
            return res.failure(Error::InvalidSyntax {
                message: "expected 'do'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let Some((body, is_block)) = self.block_or_expr(&mut res) else {
            return res;
        };

        if is_block {
            if !self.is_keyword("end") {
                return res.failure(Error::InvalidSyntax {
                    message: "expected 'end'".into(),
                    start: self.current_tok.start.clone(),
                    end: self.current_tok.end.clone(),
                });
            }
            res.register_advancement();
            self.advance();
        }

        res.success(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
            body_is_block: is_block,
        })
    }

    fn func_def(&mut self) -> ParseResult {
        let mut res = ParseResult::new();
        let start = self.current_tok.start.clone();

        res.register_advancement();
        self.advance();

        let name = if self.current_tok.kind == TokenKind::Identifier {
            let tok = self.current_tok.clone();
            res.register_advancement();
            self.advance();
            Some(tok)
        } else {
            None
        };

        if self.current_tok.kind != TokenKind::LParen {
            return res.failure(Error::InvalidSyntax {
                message: "expected '('".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let mut arg_names = Vec::new();

        if self.current_tok.kind == TokenKind::Identifier {
            arg_names.push(self.current_tok.clone());
            res.register_advancement();
            self.advance();

            while self.current_tok.kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();

                if self.current_tok.kind != TokenKind::Identifier {
                    return res.failure(Error::InvalidSyntax {
                        message: "expected identifier".into(),
                        start: self.current_tok.start.clone(),
                        end: self.current_tok.end.clone(),
                    });
                }
                arg_names.push(self.current_tok.clone());
                res.register_advancement();
                self.advance();
            }
        }

        if self.current_tok.kind != TokenKind::RParen {
            return res.failure(Error::InvalidSyntax {
                message: "expected ',' or ')'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        if self.current_tok.kind == TokenKind::Arrow {
            res.register_advancement();
            self.advance();

            let body = match res.register(self.expr()) {
                Some(n) => n,
                None => return res,
            };

            let end = self.current_tok.start.clone();
            return res.success(Node::FuncDef {
                name,
                arg_names,
                body: Box::new(body),
                body_is_block: false,
                start,
                end,
            });
        }

        if self.current_tok.kind != TokenKind::NewLine {
            return res.failure(Error::InvalidSyntax {
                message: "expected '->' or newline".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let body = match res.register(self.statements()) {
            Some(n) => n,
            None => return res,
        };

        if !self.is_keyword("end") {
            return res.failure(Error::InvalidSyntax {
                message: "expected 'end'".into(),
                start: self.current_tok.start.clone(),
                end: self.current_tok.end.clone(),
            });
        }
        res.register_advancement();
        self.advance();

        let end = self.current_tok.start.clone();
        res.success(Node::FuncDef {
            name,
            arg_names,
            body: Box::new(body),
            body_is_block: true,
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Node, Error> {
        let tokens = Lexer::new("<test>", src).make_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let node = parse("1 + 2 * 3").unwrap();
        match node {
            Node::Statements { statements, .. } => assert_eq!(statements.len(), 1),
            _ => panic!("expected a statements sequence"),
        }
    }

    #[test]
    fn parses_var_assign() {
        parse("var a = 5").unwrap();
    }

    #[test]
    fn parses_if_single_line() {
        parse("if 1 == 2 then 10 else 20").unwrap();
    }

    #[test]
    fn parses_for_single_line() {
        parse("for i = 1 to 4 do i * i").unwrap();
    }

    #[test]
    fn parses_func_def_and_call() {
        parse("func sq(x) -> x * x\nsq(6)").unwrap();
    }

    #[test]
    fn dangling_bang_is_a_syntax_error() {
        let tokens = Lexer::new("<test>", "1 ==").make_tokens().unwrap();
        let err = Parser::new(tokens).parse();
        assert!(err.is_err());
    }

    #[test]
    fn committed_failure_in_a_later_statement_is_not_swallowed() {
        // The second statement consumes `if`, `1`, `then` looking for a body
        // before running into EOF. That failure must propagate as an error,
        // not be silently dropped in favour of the first statement alone.
        let err = parse("1\nif 1 then");
        assert!(err.is_err());
    }
}
