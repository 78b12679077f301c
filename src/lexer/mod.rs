mod token;

pub use token::*;

use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use log::{debug, error, trace};

use crate::error::Error;
use crate::position::Position;

pub struct Lexer<'a> {
    text: Rc<str>,
    iterator: Peekable<Chars<'a>>,
    pos: Position,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(file_name: &str, text: &'a str) -> Self {
        let text_rc: Rc<str> = Rc::from(text);
        let mut iterator = text.chars().peekable();
        let current_char = iterator.next();
        let pos = Position::new(0, 0, 0, Rc::from(file_name), Rc::clone(&text_rc));

        Self {
            text: text_rc,
            iterator,
            pos,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.pos.advance(self.current_char);
        self.current_char = self.iterator.next();
    }

    pub fn make_tokens(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();

        while let Some(c) = self.current_char {
            match c {
                ' ' | '\t' => self.advance(),
                '\n' | ';' => {
                    tokens.push(Token::at(TokenKind::NewLine, TokenValue::None, &self.pos));
                    self.advance();
                }
                '"' => tokens.push(self.make_string()?),
                '0'..='9' => tokens.push(self.make_number()),
                c if c.is_ascii_alphabetic() || c == '_' => tokens.push(self.make_identifier()),
                '+' => tokens.push(self.single(TokenKind::Plus)),
                '-' => tokens.push(self.make_minus_or_arrow()),
                '*' => tokens.push(self.single(TokenKind::Mul)),
                '/' => tokens.push(self.single(TokenKind::Div)),
                '^' => tokens.push(self.single(TokenKind::Pow)),
                '(' => tokens.push(self.single(TokenKind::LParen)),
                ')' => tokens.push(self.single(TokenKind::RParen)),
                '[' => tokens.push(self.single(TokenKind::LSquare)),
                ']' => tokens.push(self.single(TokenKind::RSquare)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                '!' => tokens.push(self.make_not_equals()?),
                '=' => tokens.push(self.make_equals()),
                '<' => tokens.push(self.make_less_than()),
                '>' => tokens.push(self.make_greater_than()),
                other => {
                    let start = self.pos.clone();
                    error!("illegal character '{other}' at {}:{}", start.ln(), start.col());
                    self.advance();
                    return Err(Error::IllegalCharacter {
                        message: format!("'{other}'"),
                        start,
                        end: self.pos.clone(),
                    });
                }
            }
        }

        tokens.push(Token::at(TokenKind::Eof, TokenValue::None, &self.pos));
        debug!("lexed {} tokens from '{}'", tokens.len(), self.pos.file_name());
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos.clone();
        self.advance();
        let tok = Token::new(kind.clone(), TokenValue::None, start, self.pos.clone());
        trace!("token {kind} at {}:{}", tok.start.ln(), tok.start.col());
        tok
    }

    fn make_number(&mut self) -> Token {
        let start = self.pos.clone();
        let mut num_str = String::new();
        let mut dot_count = 0;

        while let Some(c) = self.current_char {
            if c == '.' {
                if dot_count == 1 {
                    break;
                }
                dot_count += 1;
                num_str.push('.');
            } else if c.is_ascii_digit() {
                num_str.push(c);
            } else {
                break;
            }
            self.advance();
        }

        let end = self.pos.clone();
        if dot_count == 0 {
            let value = num_str.parse::<i64>().unwrap_or(0);
            Token::new(TokenKind::Int, TokenValue::Int(value), start, end)
        } else {
            let value = num_str.parse::<f64>().unwrap_or(0.0);
            Token::new(TokenKind::Float, TokenValue::Float(value), start, end)
        }
    }

    fn make_identifier(&mut self) -> Token {
        let start = self.pos.clone();
        let mut id_str = String::new();

        while let Some(c) = self.current_char {
            if c.is_ascii_alphanumeric() || c == '_' {
                id_str.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let end = self.pos.clone();
        let kind = if KEYWORDS.contains(&id_str.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, TokenValue::Str(id_str), start, end)
    }

    fn make_string(&mut self) -> Result<Token, Error> {
        let start = self.pos.clone();
        let mut result = String::new();
        self.advance(); // consume opening quote

        let mut escaped = false;
        loop {
            match self.current_char {
                // A closing quote never arrives: the original lexer has no
                // such check either, and just yields whatever was scanned.
                None => break,
                Some('"') if !escaped => break,
                Some('\\') if !escaped => {
                    escaped = true;
                    self.advance();
                }
                Some(c) => {
                    if escaped {
                        result.push(match c {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => other,
                        });
                        escaped = false;
                    } else {
                        result.push(c);
                    }
                    self.advance();
                }
            }
        }
        self.advance();

        let end = self.pos.clone();
        Ok(Token::new(TokenKind::String, TokenValue::Str(result), start, end))
    }

    fn make_minus_or_arrow(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current_char == Some('>') {
            self.advance();
            Token::new(TokenKind::Arrow, TokenValue::None, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Minus, TokenValue::None, start, self.pos.clone())
        }
    }

    fn make_not_equals(&mut self) -> Result<Token, Error> {
        let start = self.pos.clone();
        self.advance();
        if self.current_char == Some('=') {
            self.advance();
            Ok(Token::new(TokenKind::Ne, TokenValue::None, start, self.pos.clone()))
        } else {
            let end = self.pos.clone();
            Err(Error::ExpectedCharacter {
                message: "'=' after '!'".into(),
                start,
                end,
            })
        }
    }

    fn make_equals(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current_char == Some('=') {
            self.advance();
            Token::new(TokenKind::Ee, TokenValue::None, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Eq, TokenValue::None, start, self.pos.clone())
        }
    }

    fn make_less_than(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current_char == Some('=') {
            self.advance();
            Token::new(TokenKind::Lte, TokenValue::None, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Lt, TokenValue::None, start, self.pos.clone())
        }
    }

    fn make_greater_than(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current_char == Some('=') {
            self.advance();
            Token::new(TokenKind::Gte, TokenValue::None, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Gt, TokenValue::None, start, self.pos.clone())
        }
    }
}
