//! Restricted numeric/array grammar for control values.
//!
//! User-typed control text is parsed, never executed. The grammar covers
//! what control inports actually consume: bare numbers, small arithmetic,
//! and flat array literals for wavetable data:
//!
//! ```text
//! values ::= array | token+          (tokens split on whitespace)
//! array  ::= '[' expr ( ',' expr )* ']' | '[' ']'
//! expr   ::= term ( ('+'|'-') term )*
//! term   ::= factor ( ('*'|'/') factor )*
//! factor ::= number | '-' factor | '(' expr ')'
//! ```
//!
//! Scalar mode mirrors the split-then-evaluate shape of control input: each
//! whitespace-separated token is one complete expression, so `60*2 440` is
//! two values and a stray `-` token is an error rather than a silent NaN.
//! Arithmetic is `f32` with IEEE semantics (division by zero yields
//! infinity).

use thiserror::Error;

/// Errors from control-expression parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    /// The input contained no values.
    #[error("empty control expression")]
    Empty,

    /// Unexpected character during parsing.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// Byte position in the input string.
        pos: usize,
        /// The unexpected character.
        ch: char,
    },

    /// The input ended mid-expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A numeric literal did not parse.
    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber {
        /// Byte position of the literal.
        pos: usize,
        /// The offending literal text.
        text: String,
    },

    /// Array literals do not nest.
    #[error("nested arrays are not supported (position {pos})")]
    NestedArray {
        /// Byte position of the inner `[`.
        pos: usize,
    },

    /// Missing closing bracket for an array literal.
    #[error("unclosed array (expected ']')")]
    UnclosedArray,
}

/// Parses control text into its numeric values.
///
/// Input starting with `[` is an array literal; anything else is one or more
/// whitespace-separated scalar expressions.
///
/// # Errors
///
/// Returns [`ExprError`] on empty input or any syntax error. Parsing is
/// all-or-nothing: no values are produced from partially valid input.
pub fn parse_values(input: &str) -> Result<Vec<f32>, ExprError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExprError::Empty);
    }

    if trimmed.starts_with('[') {
        let offset = input.len() - input.trim_start().len();
        return Parser::new(trimmed, offset).parse_array();
    }

    let bytes = input.as_bytes();
    let mut values = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        values.push(Parser::new(&input[start..i], start).parse_scalar()?);
    }
    Ok(values)
}

/// Recursive descent parser. LL(1), single byte lookahead; positions are
/// reported relative to the original input via `base`.
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, base: usize) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            base,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).map(|&b| b as char)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn here(&self) -> usize {
        self.base + self.pos
    }

    /// Entry: one complete expression, nothing trailing.
    fn parse_scalar(&mut self) -> Result<f32, ExprError> {
        let value = self.parse_expr()?;
        self.skip_ws();
        if let Some(ch) = self.peek() {
            return Err(ExprError::UnexpectedChar {
                pos: self.here(),
                ch,
            });
        }
        Ok(value)
    }

    /// Entry: `'[' expr ( ',' expr )* ']'`, nothing trailing.
    fn parse_array(&mut self) -> Result<Vec<f32>, ExprError> {
        self.advance(); // consume '['
        let mut values = Vec::new();

        self.skip_ws();
        if self.peek() == Some(']') {
            self.advance();
            return self.expect_end(values);
        }

        loop {
            values.push(self.parse_expr()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(']') => {
                    self.advance();
                    return self.expect_end(values);
                }
                Some(ch) => {
                    return Err(ExprError::UnexpectedChar {
                        pos: self.here(),
                        ch,
                    });
                }
                None => return Err(ExprError::UnclosedArray),
            }
        }
    }

    fn expect_end(&mut self, values: Vec<f32>) -> Result<Vec<f32>, ExprError> {
        self.skip_ws();
        if let Some(ch) = self.peek() {
            return Err(ExprError::UnexpectedChar {
                pos: self.here(),
                ch,
            });
        }
        Ok(values)
    }

    /// `expr ::= term ( ('+'|'-') term )*`
    fn parse_expr(&mut self) -> Result<f32, ExprError> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('+') => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some('-') => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// `term ::= factor ( ('*'|'/') factor )*`
    fn parse_term(&mut self) -> Result<f32, ExprError> {
        let mut value = self.parse_factor()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('*') => {
                    self.advance();
                    value *= self.parse_factor()?;
                }
                Some('/') => {
                    self.advance();
                    value /= self.parse_factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// `factor ::= number | '-' factor | '(' expr ')'`
    fn parse_factor(&mut self) -> Result<f32, ExprError> {
        self.skip_ws();
        match self.peek() {
            Some('-') => {
                self.advance();
                Ok(-self.parse_factor()?)
            }
            Some('(') => {
                self.advance();
                let value = self.parse_expr()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return match self.peek() {
                        Some(ch) => Err(ExprError::UnexpectedChar {
                            pos: self.here(),
                            ch,
                        }),
                        None => Err(ExprError::UnexpectedEnd),
                    };
                }
                self.advance();
                Ok(value)
            }
            Some('[') => Err(ExprError::NestedArray { pos: self.here() }),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.parse_number(),
            Some(ch) => Err(ExprError::UnexpectedChar {
                pos: self.here(),
                ch,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    /// `number ::= digits [ '.' digits ] [ ('e'|'E') [sign] digits ]`
    fn parse_number(&mut self) -> Result<f32, ExprError> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || ch == '.') {
            self.advance();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = std::str::from_utf8(&self.input[start..self.pos])
            .unwrap_or("")
            .to_string();
        text.parse::<f32>().map_err(|_| ExprError::InvalidNumber {
            pos: self.base + start,
            text,
        })
    }
}
