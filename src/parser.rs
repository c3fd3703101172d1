//! Text syntax for symbolic expressions.
//!
//! The grammar is the usual infix arithmetic over rational numbers and
//! identifiers:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | power
//! power  := atom (('^' | '**') unary)?
//! atom   := NUMBER | IDENT | '(' expr ')'
//! ```
//!
//! Decimal literals such as `0.25` denote exact decimal fractions. Exponents
//! must evaluate to integer constants.
//!
//! The parser is a Pratt parser: each binary operator carries a left and a
//! right binding power, and `^` is right-associative.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, Pow};

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(BigRational),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    /// `(left, right)` binding powers.
    fn binding_power(self) -> (u8, u8) {
        match self {
            BinOp::Add | BinOp::Sub => (1, 2),
            BinOp::Mul | BinOp::Div => (3, 4),
            BinOp::Pow => (7, 6),
        }
    }
}

/// Binding power of prefix minus: tighter than `*`, looser than `^`.
const PREFIX_MINUS_BP: u8 = 5;

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '*').is_some() {
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(parse_decimal(&input[start..end])?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(input[start..end].to_string()));
            }
            other => {
                return Err(Error::parse(input, format!("unexpected character '{}'", other)));
            }
        }
    }
    tokens.push(Token::Eof);
    Ok(tokens)
}

/// Parses a decimal literal as an exact rational.
pub fn parse_decimal(text: &str) -> Result<BigRational> {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
        return Err(Error::parse(text, "malformed number"));
    }
    let digits = format!("{}{}", int_part, frac_part);
    let numer = BigInt::from_str_radix(&digits, 10).map_err(|e| Error::parse(text, e.to_string()))?;
    let denom = Pow::pow(BigInt::from(10), frac_part.len());
    Ok(BigRational::new(numer, denom))
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        Ok(Parser {
            input,
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.input, message)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Caret => BinOp::Pow,
                Token::Eof | Token::RParen => break,
                other => return Err(self.error(format!("expected an operator, found {:?}", other))),
            };

            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }

            self.advance(); // consume operator
            let rhs = self.parse_expr_bp(r_bp)?;
            lhs = self.apply(op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Minus => Ok(-self.parse_expr_bp(PREFIX_MINUS_BP)?),
            Token::Plus => self.parse_expr_bp(PREFIX_MINUS_BP),
            Token::Number(value) => Ok(Expr::constant(value)),
            Token::Ident(name) => Ok(Expr::from(Symbol::new(&name))),
            Token::LParen => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Token::RParen => Ok(inner),
                    other => Err(self.error(format!("expected ')', found {:?}", other))),
                }
            }
            Token::Eof => Err(self.error("unexpected end of input")),
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    fn apply(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Result<Expr> {
        match op {
            BinOp::Add => Ok(lhs + rhs),
            BinOp::Sub => Ok(lhs - rhs),
            BinOp::Mul => Ok(lhs * rhs),
            BinOp::Div => lhs.checked_div(&rhs),
            BinOp::Pow => {
                let exponent = rhs
                    .as_rational()
                    .filter(|r| r.is_integer())
                    .ok_or_else(|| self.error(format!("exponent '{}' is not an integer constant", rhs)))?;
                let exponent = i64::try_from(exponent.to_integer())
                    .map_err(|_| self.error(format!("exponent '{}' is too large", rhs)))?;
                lhs.powi(exponent)
            }
        }
    }
}

/// Parses a symbolic expression.
pub fn parse_expr(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input)?;
    if *parser.peek() == Token::Eof {
        return Err(parser.error("empty expression"));
    }
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(parser.error(format!("unexpected trailing {:?}", other))),
    }
}

/// Splits `text` on `separator` occurrences outside of parentheses.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("1 + 2 * 3"), Expr::integer(7));
        assert_eq!(parse("(1 + 2) * 3"), Expr::integer(9));
        assert_eq!(parse("2 ^ 3 ^ 2"), Expr::integer(512));
        assert_eq!(parse("2 ** 3"), Expr::integer(8));
        assert_eq!(parse("-2^2"), Expr::integer(-4));
        assert_eq!(parse("10 - 4 - 3"), Expr::integer(3));
        assert_eq!(parse("12 / 3 / 2"), Expr::integer(2));
    }

    #[test]
    fn test_decimals_are_exact() {
        assert_eq!(parse("0.1"), Expr::rational(1, 10));
        assert_eq!(parse("0.25 + .75"), Expr::one());
        assert_eq!(parse("1.5"), Expr::rational(3, 2));
    }

    #[test]
    fn test_symbols() {
        let e = parse("x^2 + 2*x*y - y/2");
        let x = Expr::symbol("x");
        let y = Expr::symbol("y");
        let expected = &x * &x + Expr::integer(2) * &x * &y - &y * Expr::rational(1, 2);
        assert_eq!(e, expected);
        assert_eq!(parse("x^-1"), x.recip().unwrap());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_expr(""), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("1 +"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("(x"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("x y"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("x $ y"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("x ^ y"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("1.2.3"), Err(Error::Parse { .. })));
        assert!(matches!(parse_expr("1/0"), Err(Error::DivisionByZero)));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("a, f(b, c), d", ','), vec!["a", " f(b, c)", " d"]);
        assert_eq!(split_top_level("x", ';'), vec!["x"]);
    }
}
