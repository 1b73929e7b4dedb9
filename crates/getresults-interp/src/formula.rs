//! Restricted arithmetic expressions.
//!
//! Formulas are loaded from configuration, so they are never handed to a
//! general evaluator. This module accepts decimal literals, the four basic
//! operators, unary signs and parentheses, and nothing else:
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('+' | '-') unary | atom
//! atom  := NUMBER | '(' expr ')'
//! ```
//!
//! Arithmetic is exact decimal arithmetic with checked overflow.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::InterpreterConfig;

/// Errors produced while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Text is not a restricted arithmetic expression.
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset of the offending input.
        position: usize,
        /// What the parser expected.
        message: &'static str,
    },

    /// Expression is longer than the configured ceiling.
    #[error("Expression is {length} bytes long (limit {max})")]
    TooLong {
        /// Length of the expression.
        length: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Parentheses or unary signs nest deeper than the configured ceiling.
    #[error("Expression nests deeper than {max} levels")]
    TooDeep {
        /// Configured ceiling.
        max: usize,
    },

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Result does not fit in a decimal.
    #[error("Arithmetic overflow")]
    Overflow,

    /// A literal is outside the representable range.
    #[error("Numeric literal out of range: {literal}")]
    NumberOutOfRange {
        /// The literal as written.
        literal: String,
    },
}

impl ExprError {
    /// Returns true if the text simply is not an arithmetic expression.
    ///
    /// Only syntax errors let a formula fall through to the named-function
    /// lookup; every other error is final.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ExprError::Syntax { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    position: usize,
}

/// Evaluates a restricted arithmetic expression.
///
/// # Errors
/// Returns [`ExprError::Syntax`] if the text is not an expression of the
/// restricted grammar, and the other variants for resource ceilings and
/// arithmetic failures.
///
/// # Examples
///
/// ```
/// use getresults_interp::formula::evaluate;
/// use getresults_interp::InterpreterConfig;
/// use rust_decimal::Decimal;
///
/// let config = InterpreterConfig::default();
/// assert_eq!(evaluate("(2 + 3) * 4", &config), Ok(Decimal::from(20)));
/// assert!(evaluate("log10(100)", &config).unwrap_err().is_syntax());
/// ```
pub fn evaluate(text: &str, config: &InterpreterConfig) -> Result<Decimal, ExprError> {
    if text.len() > config.max_formula_length {
        return Err(ExprError::TooLong {
            length: text.len(),
            max: config.max_formula_length,
        });
    }

    let tokens = tokenize(text, config.max_exponent)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        max_depth: config.max_nesting_depth,
        end: text.len(),
    };

    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::Syntax {
            position: token.position,
            message: "unexpected token after expression",
        });
    }
    Ok(value)
}

fn tokenize(text: &str, max_exponent: u32) -> Result<Vec<Token>, ExprError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let kind = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                let (value, end) = scan_number(text, i, max_exponent)?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: i,
                });
                i = end;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            _ => {
                return Err(ExprError::Syntax {
                    position: i,
                    message: "unexpected character",
                })
            }
        };
        tokens.push(Token { kind, position: i });
        i += 1;
    }

    Ok(tokens)
}

/// Scans a numeric literal starting at `start`, returning its value and the
/// offset just past it.
fn scan_number(text: &str, start: usize, max_exponent: u32) -> Result<(Decimal, usize), ExprError> {
    let bytes = text.as_bytes();
    let mut i = start;

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &text[int_start..i];

    let mut frac_part = "";
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_part = &text[frac_start..i];
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ExprError::Syntax {
            position: start,
            message: "expected digits",
        });
    }

    let mut exponent: i64 = 0;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let exp_start = i;
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == digits_start {
            return Err(ExprError::Syntax {
                position: exp_start,
                message: "malformed exponent",
            });
        }
        let out_of_range = || ExprError::NumberOutOfRange {
            literal: text[start..j].to_string(),
        };
        exponent = text[exp_start + 1..j].parse().map_err(|_| out_of_range())?;
        if exponent.unsigned_abs() > u64::from(max_exponent) {
            return Err(out_of_range());
        }
        i = j;
    }

    let literal = &text[start..i];
    let out_of_range = || ExprError::NumberOutOfRange {
        literal: literal.to_string(),
    };

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let mantissa = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };

    let value = if exponent == 0 {
        Decimal::from_str(&mantissa).map_err(|_| out_of_range())?
    } else {
        Decimal::from_scientific(&format!("{}e{}", mantissa, exponent))
            .map_err(|_| out_of_range())?
    };

    Ok((value, i))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    end: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExprError::TooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<Decimal, ExprError> {
        let mut acc = self.term()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Plus => {
                    self.advance();
                    let rhs = self.term()?;
                    acc = acc.checked_add(rhs).ok_or(ExprError::Overflow)?;
                }
                TokenKind::Minus => {
                    self.advance();
                    let rhs = self.term()?;
                    acc = acc.checked_sub(rhs).ok_or(ExprError::Overflow)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Decimal, ExprError> {
        let mut acc = self.unary()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Star => {
                    self.advance();
                    let rhs = self.unary()?;
                    acc = acc.checked_mul(rhs).ok_or(ExprError::Overflow)?;
                }
                TokenKind::Slash => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs.is_zero() {
                        return Err(ExprError::DivisionByZero);
                    }
                    acc = acc.checked_div(rhs).ok_or(ExprError::Overflow)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Decimal, ExprError> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Plus) => {
                self.advance();
                self.enter()?;
                let value = self.unary()?;
                self.leave();
                Ok(value)
            }
            Some(TokenKind::Minus) => {
                self.advance();
                self.enter()?;
                let value = self.unary()?;
                self.leave();
                Ok(-value)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Decimal, ExprError> {
        let Some(token) = self.peek() else {
            return Err(ExprError::Syntax {
                position: self.end,
                message: "unexpected end of expression",
            });
        };

        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(value)
            }
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let value = self.expr()?;
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => self.advance(),
                    Some(other) => {
                        return Err(ExprError::Syntax {
                            position: other.position,
                            message: "expected ')'",
                        })
                    }
                    None => {
                        return Err(ExprError::Syntax {
                            position: self.end,
                            message: "expected ')'",
                        })
                    }
                }
                self.leave();
                Ok(value)
            }
            _ => Err(ExprError::Syntax {
                position: token.position,
                message: "expected a number or '('",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Result<Decimal, ExprError> {
        evaluate(text, &InterpreterConfig::default())
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("42"), Ok(dec("42")));
        assert_eq!(eval("100.77"), Ok(dec("100.77")));
        assert_eq!(eval(".5"), Ok(dec("0.5")));
        assert_eq!(eval("5."), Ok(dec("5")));
        assert_eq!(eval("1.5e3"), Ok(dec("1500")));
        assert_eq!(eval("25E-3"), Ok(dec("0.025")));
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Ok(dec("7")));
        assert_eq!(eval("(1 + 2) * 3"), Ok(dec("9")));
        assert_eq!(eval("10 - 4 - 3"), Ok(dec("3")));
        assert_eq!(eval("100 / 10 / 2"), Ok(dec("5")));
        assert_eq!(eval("750000 * 2 / 1000"), Ok(dec("1500")));
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(eval("-5"), Ok(dec("-5")));
        assert_eq!(eval("5 - -3"), Ok(dec("8")));
        assert_eq!(eval("+2 * -(1 + 1)"), Ok(dec("-4")));
    }

    #[test]
    fn test_exact_decimal_arithmetic() {
        assert_eq!(eval("0.1 + 0.2"), Ok(dec("0.3")));
        assert_eq!(eval("1 / 4"), Ok(dec("0.25")));
    }

    #[test]
    fn test_names_and_calls_are_syntax_errors() {
        let texts = [
            "log10(100)",
            "1 + log10(100)",
            "LOG10",
            "value",
            "__import__('os')",
            "1 ** 2",
            "2 % 3",
            "",
        ];
        for text in texts {
            let err = eval(text).unwrap_err();
            assert!(err.is_syntax(), "{text:?} gave {err:?}");
        }
    }

    #[test]
    fn test_syntax_error_positions() {
        assert_eq!(
            eval("1 + x"),
            Err(ExprError::Syntax {
                position: 4,
                message: "unexpected character",
            })
        );
        assert_eq!(
            eval("(1 + 2"),
            Err(ExprError::Syntax {
                position: 6,
                message: "expected ')'",
            })
        );
        assert_eq!(
            eval("1 2"),
            Err(ExprError::Syntax {
                position: 2,
                message: "unexpected token after expression",
            })
        );
        assert!(eval("1e").unwrap_err().is_syntax());
        assert!(eval(".").unwrap_err().is_syntax());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(eval("1 / (2 - 2)"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            eval("79228162514264337593543950335 * 10"),
            Err(ExprError::Overflow)
        );
    }

    #[test]
    fn test_huge_exponent_is_rejected() {
        let err = eval("1e999999").unwrap_err();
        assert_eq!(
            err,
            ExprError::NumberOutOfRange {
                literal: "1e999999".to_string(),
            }
        );
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_length_ceiling() {
        let config = InterpreterConfig {
            max_formula_length: 8,
            ..Default::default()
        };
        assert_eq!(evaluate("1 + 2", &config), Ok(dec("3")));
        assert_eq!(
            evaluate("1 + 2 + 3 + 4", &config),
            Err(ExprError::TooLong { length: 13, max: 8 })
        );
    }

    #[test]
    fn test_depth_ceiling() {
        let config = InterpreterConfig {
            max_nesting_depth: 3,
            ..Default::default()
        };
        assert_eq!(evaluate("((1))", &config), Ok(dec("1")));
        assert_eq!(
            evaluate("((((1))))", &config),
            Err(ExprError::TooDeep { max: 3 })
        );
        assert_eq!(evaluate("----1", &config), Err(ExprError::TooDeep { max: 3 }));

        let roomy = InterpreterConfig {
            max_formula_length: 1024,
            ..Default::default()
        };
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(evaluate(&deep, &roomy), Err(ExprError::TooDeep { max: 32 }));
    }
}
