//! Recursive descent evaluator
//!
//! Parses and evaluates in one pass; there is no AST because nothing needs
//! to inspect an expression after it has been reduced to a number.
//!
//! # Precedence (lowest to highest)
//!
//! - `+` `-`
//! - `*` `/` `%` and implicit multiplication (`2(3)`, `2pi`)
//! - unary `+` `-`
//! - `^` (right-associative, so `-2^2` is `-4` and `2^3^2` is `512`)
//! - postfix `!`
//!
//! Nesting (parentheses, function arguments, exponents and runs of unary
//! signs) is capped at [`MAX_DEPTH`] so hostile input fails with
//! [`EvalError::TooDeep`] instead of exhausting the stack.

use std::f64::consts;

use super::lexer::{Lexer, Spanned, Token};
use super::EvalError;

/// Deepest nesting the evaluator accepts
pub const MAX_DEPTH: usize = 256;

pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, EvalError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Evaluate the whole input as a single expression
    pub fn evaluate(&mut self) -> Result<f64, EvalError> {
        if self.tokens.is_empty() {
            return Err(EvalError::Empty);
        }

        let value = self.additive()?;

        if let Some(extra) = self.tokens.get(self.position) {
            return Err(EvalError::UnexpectedToken {
                found: extra.token.to_string(),
                position: extra.position,
            });
        }

        Ok(value)
    }

    fn additive(&mut self) -> Result<f64, EvalError> {
        let mut value = self.multiplicative()?;

        loop {
            if self.match_token(&Token::Plus) {
                value += self.multiplicative()?;
            } else if self.match_token(&Token::Minus) {
                value -= self.multiplicative()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn multiplicative(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;

        loop {
            if self.match_token(&Token::Star) {
                value *= self.unary()?;
            } else if self.match_token(&Token::Slash) {
                value /= self.unary()?;
            } else if self.match_token(&Token::Percent) {
                let divisor = self.unary()?;
                value = modulo(value, divisor);
            } else if matches!(self.peek(), Some(Token::LParen) | Some(Token::Ident(_))) {
                value *= self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    /// Runs of signs fold in a loop; each sign still counts toward the depth.
    fn unary(&mut self) -> Result<f64, EvalError> {
        let mut signs = 0;
        let mut negate = false;
        loop {
            if self.match_token(&Token::Minus) {
                negate = !negate;
            } else if !self.match_token(&Token::Plus) {
                break;
            }
            signs += 1;
            if self.depth + signs > MAX_DEPTH {
                return Err(EvalError::TooDeep { limit: MAX_DEPTH });
            }
        }

        let value = self.power()?;
        Ok(if negate { -value } else { value })
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.postfix()?;
        if self.match_token(&Token::Caret) {
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<f64, EvalError> {
        let mut value = self.primary()?;
        while self.match_token(&Token::Bang) {
            value = factorial(value)?;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        let Some(spanned) = self.advance() else {
            return Err(EvalError::UnexpectedEnd);
        };

        match spanned.token {
            Token::Number(n) => Ok(n),
            Token::LParen => {
                let value = self.nested(Self::additive)?;
                self.expect_rparen()?;
                Ok(value)
            }
            Token::Ident(name) => {
                if self.match_token(&Token::LParen) {
                    let args = self.nested(Self::arguments)?;
                    call_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            other => Err(EvalError::UnexpectedToken {
                found: other.to_string(),
                position: spanned.position,
            }),
        }
    }

    /// Comma separated arguments; the opening paren is already consumed.
    fn arguments(&mut self) -> Result<Vec<f64>, EvalError> {
        let mut args = Vec::new();
        if self.match_token(&Token::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.additive()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect_rparen()?;
        Ok(args)
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect_rparen(&mut self) -> Result<(), EvalError> {
        match self.advance() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            Some(other) => Err(EvalError::UnexpectedToken {
                found: other.token.to_string(),
                position: other.position,
            }),
            None => Err(EvalError::UnbalancedParens),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.position).cloned();
        if spanned.is_some() {
            self.position += 1;
        }
        spanned
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }
}

/// Floored modulo: the result takes the sign of the divisor.
fn modulo(value: f64, divisor: f64) -> f64 {
    value - divisor * (value / divisor).floor()
}

fn factorial(value: f64) -> Result<f64, EvalError> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(EvalError::Factorial { value });
    }
    if value > 170.0 {
        return Ok(f64::INFINITY);
    }
    Ok((2..=value as u64).fold(1.0, |acc, n| acc * n as f64))
}

fn constant(name: &str) -> Result<f64, EvalError> {
    match name {
        "pi" | "PI" | "π" => Ok(consts::PI),
        "e" | "E" => Ok(consts::E),
        "tau" | "τ" => Ok(consts::TAU),
        "Infinity" => Ok(f64::INFINITY),
        _ => Err(EvalError::UndefinedSymbol {
            name: name.to_string(),
        }),
    }
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, EvalError> {
        match args {
            [x] => Ok(f(*x)),
            _ => Err(EvalError::Arity {
                name: name.to_string(),
                expected: "1",
                got: args.len(),
            }),
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "cbrt" => unary(f64::cbrt),
        "abs" => unary(f64::abs),
        "exp" => unary(f64::exp),
        "ln" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.ln() / base.ln()),
            _ => Err(EvalError::Arity {
                name: name.to_string(),
                expected: "1 or 2",
                got: args.len(),
            }),
        },
        _ => Err(EvalError::UndefinedSymbol {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> Result<f64, EvalError> {
        Parser::new(input)?.evaluate()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(eval("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(eval("12 / 3 / 2").unwrap(), 2.0);
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        assert_eq!(eval("-2^2").unwrap(), -4.0);
        assert_eq!(eval("2^3^2").unwrap(), 512.0);
        assert_eq!(eval("2^-1").unwrap(), 0.5);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("2(3 + 4)").unwrap(), 14.0);
        assert_eq!(eval("(1 + 1)(2 + 2)").unwrap(), 8.0);
        assert!((eval("2pi").unwrap() - 2.0 * consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(eval("sqrt(16)").unwrap(), 4.0);
        assert_eq!(eval("abs(-3)").unwrap(), 3.0);
        assert!((eval("log(8, 2)").unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(eval("5!").unwrap(), 120.0);
        assert_eq!(eval("7 % 3").unwrap(), 1.0);
        assert_eq!(eval("-7 % 3").unwrap(), 2.0);
    }

    #[test]
    fn test_sign_runs_fold() {
        assert_eq!(eval("--3").unwrap(), 3.0);
        assert_eq!(eval("-+-3").unwrap(), 3.0);
        assert_eq!(eval("2 - -1").unwrap(), 3.0);
        assert_eq!(eval(&format!("{}1", "-".repeat(MAX_DEPTH))).unwrap(), 1.0);
    }

    #[test]
    fn test_nesting_within_limit() {
        let depth = MAX_DEPTH - 1;
        let input = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(eval(&input).unwrap(), 1.0);
        assert_eq!(eval("2^(1+1)^2").unwrap(), 16.0);
    }

    #[test]
    fn test_deep_input_is_rejected() {
        let too_deep = Err(EvalError::TooDeep { limit: MAX_DEPTH });

        let signs = format!("{}1", "-".repeat(200_000));
        assert_eq!(eval(&signs), too_deep);

        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(eval(&parens), too_deep);

        let calls = format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&calls), too_deep);

        let towers = format!("2{}", "^2".repeat(10_000));
        assert_eq!(eval(&towers), too_deep);
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(eval("1/0").unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval(""), Err(EvalError::Empty));
        assert_eq!(eval("2 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("(2 + 3"), Err(EvalError::UnbalancedParens));
        assert_eq!(
            eval("foo + 1"),
            Err(EvalError::UndefinedSymbol {
                name: "foo".to_string()
            })
        );
        assert!(matches!(eval("2 3"), Err(EvalError::UnexpectedToken { .. })));
        assert!(matches!(eval("sqrt(1, 2)"), Err(EvalError::Arity { .. })));
        assert!(matches!(eval("2.5!"), Err(EvalError::Factorial { .. })));
    }
}
