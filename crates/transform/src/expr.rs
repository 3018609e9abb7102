//! Sandboxed arithmetic/comparison expressions
//!
//! A small recursive-descent parser and evaluator used by calculation
//! rules, conditional rules, and business-logic validation. Expressions
//! are restricted to arithmetic and comparison operators over named record
//! fields plus number/string literals; no function calls, no dynamic code.
//!
//! # Grammar
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := cmp ( "&&" cmp )*
//! cmp     := sum ( ("==" | "!=" | "<=" | ">=" | "<" | ">") sum )?
//! sum     := term ( ("+" | "-") term )*
//! term    := factor ( ("*" | "/" | "%") factor )*
//! factor  := "-" factor | "!" factor | primary
//! primary := number | string | field | "(" expr ")"
//! ```

use filer_record::Record;
use std::fmt;

/// Error raised while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Expression text is not valid under the grammar
    Parse(String),
    /// A referenced field is absent or null in the record
    UndefinedField(String),
    /// Division or remainder by zero
    DivisionByZero,
    /// Operands have incompatible types for the operator
    TypeMismatch(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Parse(msg) => write!(f, "parse error: {}", msg),
            ExprError::UndefinedField(field) => write!(f, "undefined field '{}'", field),
            ExprError::DivisionByZero => write!(f, "division by zero"),
            ExprError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
        }
    }
}

impl std::error::Error for ExprError {}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Interpret the value as a condition outcome
    pub fn truthy(&self) -> Result<bool, ExprError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ExprError::TypeMismatch(format!(
                "condition evaluated to {:?}, expected a boolean",
                other
            ))),
        }
    }

    /// Convert to a JSON value for writing back into a record
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Bool(b) => serde_json::Value::Bool(b),
        }
    }
}

/// Binary operators, in increasing precedence groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Field(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression string
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(ExprError::Parse(format!(
                "unexpected trailing input at token {}",
                parser.pos
            )));
        }
        Ok(expr)
    }

    /// Evaluate against a record's fields
    pub fn eval(&self, record: &Record) -> Result<Value, ExprError> {
        match self {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Field(name) => field_value(record, name),
            Expr::Neg(inner) => match inner.eval(record)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(ExprError::TypeMismatch(format!(
                    "cannot negate {:?}",
                    other
                ))),
            },
            Expr::Not(inner) => Ok(Value::Bool(!inner.eval(record)?.truthy()?)),
            Expr::Binary(op, lhs, rhs) => {
                // Short-circuit the logical operators
                match op {
                    BinOp::And => {
                        return Ok(Value::Bool(
                            lhs.eval(record)?.truthy()? && rhs.eval(record)?.truthy()?,
                        ));
                    }
                    BinOp::Or => {
                        return Ok(Value::Bool(
                            lhs.eval(record)?.truthy()? || rhs.eval(record)?.truthy()?,
                        ));
                    }
                    _ => {}
                }
                eval_binary(*op, lhs.eval(record)?, rhs.eval(record)?)
            }
        }
    }
}

fn field_value(record: &Record, name: &str) -> Result<Value, ExprError> {
    match record.get(name) {
        None | Some(serde_json::Value::Null) => {
            Err(ExprError::UndefinedField(name.to_string()))
        }
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| ExprError::TypeMismatch(format!("field '{}' is not finite", name))),
        Some(serde_json::Value::String(s)) => Ok(Value::Text(s.clone())),
        Some(serde_json::Value::Bool(b)) => Ok(Value::Bool(*b)),
        Some(other) => Err(ExprError::TypeMismatch(format!(
            "field '{}' has unsupported type {:?}",
            name, other
        ))),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    use BinOp::*;

    match op {
        Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        Lt | Le | Gt | Ge => {
            let (a, b) = numeric_pair(op, lhs, rhs)?;
            let result = match op {
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                Ge => a >= b,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
            (a, b) => Err(ExprError::TypeMismatch(format!(
                "cannot add {:?} and {:?}",
                a, b
            ))),
        },
        Sub | Mul | Div | Rem => {
            let (a, b) = numeric_pair(op, lhs, rhs)?;
            match op {
                Sub => Ok(Value::Number(a - b)),
                Mul => Ok(Value::Number(a * b)),
                Div => {
                    if b == 0.0 {
                        Err(ExprError::DivisionByZero)
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                Rem => {
                    if b == 0.0 {
                        Err(ExprError::DivisionByZero)
                    } else {
                        Ok(Value::Number(a % b))
                    }
                }
                _ => unreachable!(),
            }
        }
        And | Or => unreachable!("logical operators are short-circuited"),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

fn numeric_pair(op: BinOp, lhs: Value, rhs: Value) -> Result<(f64, f64), ExprError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        (a, b) => Err(ExprError::TypeMismatch(format!(
            "operator {:?} requires numbers, got {:?} and {:?}",
            op, a, b
        ))),
    }
}

// Tokenizer

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    _ => "%",
                }));
                i += 1;
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                let next = chars.get(i + 1).copied();
                let (op, len) = match (c, next) {
                    ('=', Some('=')) => ("==", 2),
                    ('!', Some('=')) => ("!=", 2),
                    ('<', Some('=')) => ("<=", 2),
                    ('>', Some('=')) => (">=", 2),
                    ('&', Some('&')) => ("&&", 2),
                    ('|', Some('|')) => ("||", 2),
                    ('<', _) => ("<", 1),
                    ('>', _) => (">", 1),
                    ('!', _) => ("!", 1),
                    _ => {
                        return Err(ExprError::Parse(format!(
                            "unexpected character '{}' at position {}",
                            c, i
                        )))
                    }
                };
                tokens.push(Token::Op(op));
                i += len;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(ExprError::Parse("unterminated string literal".into()));
                }
                tokens.push(Token::Text(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse()
                    .map_err(|_| ExprError::Parse(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(ExprError::Parse(format!(
                    "unexpected character '{}' at position {}",
                    other, i
                )))
            }
        }
    }

    Ok(tokens)
}

// Parser

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if ops.contains(&op) {
                self.pos += 1;
                return Some(op);
            }
        }
        None
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and()?;
        while self.eat_op(&["||"]).is_some() {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.cmp()?;
        while self.eat_op(&["&&"]).is_some() {
            let rhs = self.cmp()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn cmp(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.sum()?;
        if let Some(op) = self.eat_op(&["==", "!=", "<=", ">=", "<", ">"]) {
            let rhs = self.sum()?;
            let bin_op = match op {
                "==" => BinOp::Eq,
                "!=" => BinOp::Ne,
                "<=" => BinOp::Le,
                ">=" => BinOp::Ge,
                "<" => BinOp::Lt,
                _ => BinOp::Gt,
            };
            return Ok(Expr::Binary(bin_op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn sum(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let rhs = self.term()?;
            let bin_op = if op == "+" { BinOp::Add } else { BinOp::Sub };
            lhs = Expr::Binary(bin_op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.factor()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let rhs = self.factor()?;
            let bin_op = match op {
                "*" => BinOp::Mul,
                "/" => BinOp::Div,
                _ => BinOp::Rem,
            };
            lhs = Expr::Binary(bin_op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, ExprError> {
        if self.eat_op(&["-"]).is_some() {
            return Ok(Expr::Neg(Box::new(self.factor()?)));
        }
        if self.eat_op(&["!"]).is_some() {
            return Ok(Expr::Not(Box::new(self.factor()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Text(s)) => {
                self.pos += 1;
                Ok(Expr::Text(s))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(Expr::Field(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(ExprError::Parse("expected ')'".into())),
                }
            }
            other => Err(ExprError::Parse(format!("unexpected token {:?}", other))),
        }
    }
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
