//! Expression Evaluator
//!
//! Numeric evaluation of arithmetic expressions typed into the chat.
//! The dispatcher only sees the [`Evaluator`] trait, so a session can run
//! with a different evaluator or with none at all.

mod lexer;
mod parser;

use thiserror::Error;

pub use lexer::{Lexer, Spanned, Token};
pub use parser::{Parser, MAX_DEPTH};

/// Evaluator failures. All of them are recoverable: the dispatcher turns
/// them into a hint for the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String },

    #[error("unexpected {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    UnbalancedParens,

    #[error("undefined symbol '{name}'")]
    UndefinedSymbol { name: String },

    #[error("function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("factorial is only defined for non-negative integers, got {value}")]
    Factorial { value: f64 },
}

/// Parses and numerically evaluates an expression string.
pub trait Evaluator {
    fn evaluate(&self, expression: &str) -> Result<f64, EvalError>;
}

/// Built-in evaluator for arithmetic with a handful of functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expression: &str) -> Result<f64, EvalError> {
        Parser::new(expression)?.evaluate()
    }
}

/// Format a result the way a calculator would display it.
///
/// Whole numbers print without a fraction, everything else uses the
/// shortest representation that round-trips.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if value == 0.0 {
        // Also normalizes -0
        "0".to_string()
    } else {
        value.to_string()
    }
}
