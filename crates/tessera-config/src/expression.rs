//! Arithmetic expressions for thread-count settings.
//!
//! Supports `+ - * /`, parentheses, unary minus, integer and decimal
//! literals, and the variable `availableProcessorCount`:
//!
//! ```
//! use tessera_config::expression::evaluate;
//!
//! assert_eq!(evaluate("availableProcessorCount / 2 + 1", 8).unwrap(), 5.0);
//! assert_eq!(evaluate("-(2 - 3) * 1.5", 4).unwrap(), 1.5);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// The variable holding the number of available processors.
pub const AVAILABLE_PROCESSOR_COUNT: &str = "availableProcessorCount";

/// Error while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { position: usize, found: char },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Evaluates `expression`, substituting `available_processor_count`.
pub fn evaluate(expression: &str, available_processor_count: usize) -> Result<f64, ExpressionError> {
    let mut parser = Parser {
        source: expression,
        chars: expression.char_indices().peekable(),
        available_processor_count: available_processor_count as f64,
    };
    let value = parser.expression()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some((position, found)) => Err(ExpressionError::UnexpectedChar { position, found }),
    }
}

// expression := term (('+' | '-') term)*
// term       := factor (('*' | '/') factor)*
// factor     := '-' factor | '(' expression ')' | number | identifier
struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    available_processor_count: f64,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().map(|&(_, c)| c)
    }

    fn expression(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.chars.next();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.chars.next();
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ExpressionError> {
        match self.peek() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.chars.next();
                let value = self.expression()?;
                match self.peek() {
                    Some(')') => {
                        self.chars.next();
                        Ok(value)
                    }
                    Some(found) => Err(self.unexpected(found)),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() => self.variable(),
            Some(found) => Err(self.unexpected(found)),
        }
    }

    fn number(&mut self) -> Result<f64, ExpressionError> {
        let text = self.take_while(|c| c.is_ascii_digit() || c == '.');
        text.parse::<f64>()
            .map_err(|_| ExpressionError::InvalidNumber(text.to_string()))
    }

    fn variable(&mut self) -> Result<f64, ExpressionError> {
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if name == AVAILABLE_PROCESSOR_COUNT {
            Ok(self.available_processor_count)
        } else {
            Err(ExpressionError::UnknownVariable(name.to_string()))
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.chars.peek().map_or(self.source.len(), |&(i, _)| i);
        let mut end = start;
        while let Some((i, c)) = self.chars.next_if(|&(_, c)| accept(c)) {
            end = i + c.len_utf8();
        }
        &self.source[start..end]
    }

    fn unexpected(&mut self, found: char) -> ExpressionError {
        let position = self.chars.peek().map_or(self.source.len(), |&(i, _)| i);
        ExpressionError::UnexpectedChar { position, found }
    }
}
