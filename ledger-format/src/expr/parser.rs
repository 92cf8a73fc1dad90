//! Expression parser implementing recursive descent with operator precedence
//!
//! This module provides a Pratt parser for converting value expression text
//! into an AST. Identifiers are resolved while parsing, so an unknown name is
//! reported before any record is evaluated.

use std::iter::Peekable;
use std::str::Chars;

use ledger_math::Amount;
use rust_decimal::Decimal;

use crate::expr::{AccountMask, BinaryOp, ExprError, ExprNode, ExprResult, Ident, UnaryOp, Value};

/// Token types for lexical analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Whole number literal
    Integer(i64),
    /// Number literal with a fractional part
    Decimal(Decimal),
    /// `{...}` amount literal
    Amount(Amount),

    /// Bare name
    Identifier(String),

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`, also opening an account mask
    Slash,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,

    /// `(`
    LeftParen,
    /// `)`
    RightParen,

    /// No input left
    EndOfInput,
}

impl Token {
    /// Convert token to binary operator if possible
    pub fn to_binary_op(&self) -> Option<BinaryOp> {
        match self {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Equal => Some(BinaryOp::Eq),
            Token::NotEqual => Some(BinaryOp::Ne),
            Token::Less => Some(BinaryOp::Lt),
            Token::Greater => Some(BinaryOp::Gt),
            Token::LessEqual => Some(BinaryOp::Le),
            Token::GreaterEqual => Some(BinaryOp::Ge),
            Token::And => Some(BinaryOp::And),
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        }
    }

    /// Convert token to unary operator if possible
    pub fn to_unary_op(&self) -> Option<UnaryOp> {
        match self {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

/// Lexer for tokenizing expression strings
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over the expression text
    pub fn new(input: &'a str) -> Self {
        Lexer { input: input.chars().peekable(), column: 0 }
    }

    /// Number of characters consumed so far
    pub fn column(&self) -> usize {
        self.column
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.input.next()?;
        self.column += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    fn read_number(&mut self, first_digit: char) -> ExprResult<Token> {
        let mut number = String::new();
        number.push(first_digit);

        let mut has_decimal = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                number.push(ch);
            } else if ch == '.' && !has_decimal {
                has_decimal = true;
                number.push(ch);
            } else {
                break;
            }
            self.next_char();
        }

        if has_decimal {
            number
                .parse::<Decimal>()
                .map(Token::Decimal)
                .map_err(|_| ExprError::ParseError(format!("Invalid decimal number: {}", number)))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| ExprError::ParseError(format!("Invalid integer: {}", number)))
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut identifier = String::new();
        identifier.push(first_char);
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.next_char();
            } else {
                break;
            }
        }
        Token::Identifier(identifier)
    }

    /// Read a `{...}` amount literal; the opening brace is already consumed
    fn read_amount(&mut self) -> ExprResult<Token> {
        let mut text = String::new();
        while let Some(ch) = self.next_char() {
            if ch == '}' {
                return Amount::parse(text.trim()).map(Token::Amount).map_err(ExprError::from);
            }
            text.push(ch);
        }
        Err(ExprError::ParseError("Unterminated amount literal".to_string()))
    }

    /// Read the body of a `/mask/`; the opening slash is already consumed
    pub fn read_mask(&mut self) -> ExprResult<String> {
        let mut pattern = String::new();
        while let Some(ch) = self.next_char() {
            match ch {
                '/' => return Ok(pattern),
                '\\' if self.peek() == Some('/') => {
                    self.next_char();
                    pattern.push('/');
                }
                _ => pattern.push(ch),
            }
        }
        Err(ExprError::ParseError("Unterminated account mask".to_string()))
    }

    fn expect_pair(&mut self, second: char, token: Token) -> ExprResult<Token> {
        if self.peek() == Some(second) {
            self.next_char();
            Ok(token)
        } else {
            Err(ExprError::ParseError(format!(
                "Expected '{}' at column {}",
                second,
                self.column + 1
            )))
        }
    }

    fn with_equals(&mut self, plain: Token, with_eq: Token) -> Token {
        if self.peek() == Some('=') {
            self.next_char();
            with_eq
        } else {
            plain
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ExprResult<Token> {
        self.skip_whitespace();

        let Some(ch) = self.next_char() else {
            return Ok(Token::EndOfInput);
        };
        match ch {
            '+' => Ok(Token::Plus),
            '-' => Ok(Token::Minus),
            '*' => Ok(Token::Star),
            '/' => Ok(Token::Slash),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),
            '{' => self.read_amount(),
            '!' => Ok(self.with_equals(Token::Not, Token::NotEqual)),
            '<' => Ok(self.with_equals(Token::Less, Token::LessEqual)),
            '>' => Ok(self.with_equals(Token::Greater, Token::GreaterEqual)),
            '=' => self.expect_pair('=', Token::Equal),
            '&' => self.expect_pair('&', Token::And),
            '|' => self.expect_pair('|', Token::Or),
            ch if ch.is_ascii_digit() => self.read_number(ch),
            ch if ch.is_alphabetic() || ch == '_' => Ok(self.read_identifier(ch)),
            _ => Err(ExprError::ParseError(format!(
                "Unexpected character '{}' at column {}",
                ch, self.column
            ))),
        }
    }
}

/// Expression parser using Pratt parsing algorithm
pub struct ExprParser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> ExprParser<'a> {
    /// Create a parser positioned on the first token
    pub fn new(input: &'a str) -> ExprResult<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(ExprParser { lexer, current_token })
    }

    fn advance(&mut self) -> ExprResult<()> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> ExprResult<()> {
        if self.current_token == expected {
            self.advance()
        } else {
            Err(ExprError::ParseError(format!(
                "Expected {:?}, found {:?}",
                expected, self.current_token
            )))
        }
    }

    /// Parse a complete expression
    pub fn parse(&mut self) -> ExprResult<ExprNode> {
        let root = self.parse_expression(0)?;
        if self.current_token != Token::EndOfInput {
            return Err(ExprError::ParseError(format!(
                "Unexpected {:?} after expression at column {}",
                self.current_token,
                self.lexer.column()
            )));
        }
        Ok(root)
    }

    /// Parse expression with given minimum precedence (Pratt parsing)
    fn parse_expression(&mut self, min_precedence: u8) -> ExprResult<ExprNode> {
        let mut left = self.parse_primary()?;

        while let Some(op) = self.current_token.to_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance()?;

            // All operators are left associative
            let right = self.parse_expression(precedence + 1)?;
            left = ExprNode::Binary { op, left: Box::new(left), right: Box::new(right) };
        }

        Ok(left)
    }

    /// Parse primary expressions (literals, identifiers, masks, groups)
    fn parse_primary(&mut self) -> ExprResult<ExprNode> {
        match self.current_token.clone() {
            Token::Integer(n) => {
                self.advance()?;
                Ok(ExprNode::Value(Value::Integer(n)))
            }
            Token::Decimal(d) => {
                self.advance()?;
                Ok(ExprNode::Value(Value::Amount(Amount::new(d))))
            }
            Token::Amount(amount) => {
                self.advance()?;
                Ok(ExprNode::Value(Value::Amount(amount)))
            }
            Token::Identifier(name) => {
                self.advance()?;
                match name.as_str() {
                    "true" => Ok(ExprNode::Value(Value::Boolean(true))),
                    "false" => Ok(ExprNode::Value(Value::Boolean(false))),
                    _ => Ident::lookup(&name)
                        .map(ExprNode::Ident)
                        .ok_or(ExprError::UnknownIdentifier(name)),
                }
            }
            Token::Slash => {
                let pattern = self.lexer.read_mask()?;
                self.advance()?;
                Ok(ExprNode::Mask(AccountMask::new(&pattern)?))
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_expression(0)?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            token => match token.to_unary_op() {
                Some(op) => {
                    self.advance()?;
                    let operand = self.parse_primary()?;
                    Ok(ExprNode::Unary { op, operand: Box::new(operand) })
                }
                None => Err(ExprError::ParseError(format!(
                    "Unexpected token in primary expression: {:?}",
                    token
                ))),
            },
        }
    }
}

/// Parse an expression from a string
pub fn parse_expression(input: &str) -> ExprResult<ExprNode> {
    ExprParser::new(input)?.parse()
}
