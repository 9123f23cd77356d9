//! Practice problems
//!
//! Single arithmetic facts with operands in 1..=20. Division problems are
//! built from a product (`a*b / b`) so every answer is a whole number.

use std::fmt;

use rand::Rng;

pub const MIN_OPERAND: u32 = 1;
pub const MAX_OPERAND: u32 = 20;

/// The one outstanding practice question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProblem {
    /// Expression shown to the user
    pub expression: String,
    /// Expression whose value is the expected answer
    pub answer_expression: String,
}

impl PendingProblem {
    pub fn new(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            answer_expression: expression.clone(),
            expression,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Render the expression for two operands.
pub fn problem_expression(a: u32, b: u32, op: Operator) -> String {
    match op {
        Operator::Divide => format!("{}/{}", a * b, b),
        _ => format!("{} {} {}", a, op, b),
    }
}

/// Draw a fresh problem: two operands and a uniformly chosen operator.
pub fn generate<R: Rng>(rng: &mut R) -> PendingProblem {
    let a = rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
    let b = rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
    let op = Operator::ALL[rng.gen_range(0..Operator::ALL.len())];
    PendingProblem::new(problem_expression(a, b, op))
}
