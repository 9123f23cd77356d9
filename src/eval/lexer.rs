//! Lexer for arithmetic expressions
//!
//! Converts user text into a flat [`Token`] stream. Typographic operators
//! (`×`, `÷`, `−`) are folded into their ASCII equivalents so answers pasted
//! from a typeset problem still evaluate.

use std::fmt;

use super::EvalError;

/// Token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),

    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    Caret,   // ^
    Bang,    // !

    LParen, // (
    RParen, // )
    Comma,  // ,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Caret => write!(f, "'^'"),
            Token::Bang => write!(f, "'!'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

/// A token plus the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, EvalError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Spanned, EvalError> {
        let start = self.position;
        let ch = self.peek().ok_or(EvalError::UnexpectedEnd)?;

        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            let token = self.number()?;
            return Ok(Spanned { token, position: start });
        }

        if ch.is_alphabetic() || ch == '_' {
            let token = self.identifier();
            return Ok(Spanned { token, position: start });
        }

        self.position += 1;
        let token = match ch {
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' | '·' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '!' => Token::Bang,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            other => {
                return Err(EvalError::UnexpectedChar {
                    ch: other,
                    position: start,
                })
            }
        };

        Ok(Spanned { token, position: start })
    }

    /// Decimal literal with optional fraction and exponent.
    ///
    /// `2e` is left as `2` followed by the constant `e`; only `e` followed by
    /// digits (optionally signed) is an exponent.
    fn number(&mut self) -> Result<Token, EvalError> {
        let start = self.position;

        self.consume_digits();
        if self.peek() == Some('.') {
            self.position += 1;
            self.consume_digits();
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let has_exponent = match self.peek_at(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.position += 2;
                self.consume_digits();
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| EvalError::InvalidNumber { text })
    }

    fn identifier(&mut self) -> Token {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.position += 1;
        }
        Token::Ident(self.input[start..self.position].iter().collect())
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.position += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
