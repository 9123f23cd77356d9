//! Command Dispatcher
//!
//! Turns one line of user input into bot replies. The dispatcher owns no
//! session state: the pending problem comes in as an argument and the new
//! one goes out in the [`Outcome`], together with the score delta.
//!
//! Resolution order (first match wins):
//!
//! 1. A pending problem is open → the input is checked as an answer
//!    (unless it is a `practice` or `give up` command)
//! 2. `practice…` → new problem
//! 3. `give up` with a pending problem → reveal the answer
//! 4. `solve…` or anything containing arithmetic characters → evaluate
//! 5. contains `hello` / `hi` → greeting
//! 6. contains `help` → command list
//! 7. anything else → hint

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::debug;

use crate::eval::{format_number, Evaluator};
use crate::markup::display_math;
use crate::message::Reply;
use crate::practice::{self, PendingProblem};

/// Answers within this absolute distance of the expected value are correct.
pub const ANSWER_TOLERANCE: f64 = 1e-9;

pub const CORRECT: &str = "Correct! 🎉";
pub const TRY_AGAIN: &str = "Not quite. Try again or type `give up` to see the answer.";
pub const ANSWER_PROMPT: &str = "Reply with your answer (just the value).";
pub const PARSE_FAILED: &str =
    "I couldn't parse that expression. Try a simple arithmetic expression.";
pub const EVALUATOR_MISSING: &str = "Math library not loaded.";
pub const GREETING: &str = "Hello! You can type `solve 2+2` or `practice` to get a math problem.";
pub const HELP: &str = "Commands: `solve <expr>`, `practice`, `give up`, or ask normal questions.";
pub const FALLBACK: &str = "I can help with simple math. Try `solve 12/3` or `practice`.";

/// Leading `solve` token, with optional colon
static SOLVE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^solve\s*:?\s*").expect("valid solve regex"));

/// Any character that suggests the input is an expression
static MATH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9().+\-*/^]").expect("valid math regex"));

/// Which rule handled the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Answer { correct: bool },
    Practice,
    GiveUp,
    Solve,
    Greeting,
    Help,
    Fallback,
}

/// Everything a dispatch produces
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub pending: Option<PendingProblem>,
    pub score_delta: u64,
    pub route: Route,
}

impl Outcome {
    fn new(route: Route, replies: Vec<Reply>, pending: Option<PendingProblem>) -> Self {
        Self {
            replies,
            pending,
            score_delta: 0,
            route,
        }
    }
}

/// Routes user input to tutor behaviors
pub struct Dispatcher {
    evaluator: Option<Box<dyn Evaluator>>,
}

impl Dispatcher {
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            evaluator: Some(evaluator),
        }
    }

    /// A dispatcher with no evaluator: answers fall back to string equality
    /// and `solve` reports the missing library.
    pub fn without_evaluator() -> Self {
        Self { evaluator: None }
    }

    /// Handle one line of input. Never fails; every path yields replies.
    ///
    /// Unlike a strict first-match reading of the rules, `give up` skips the
    /// answer check so that it can reach the give-up rule.
    pub fn dispatch<R: Rng>(
        &self,
        input: &str,
        pending: Option<&PendingProblem>,
        rng: &mut R,
    ) -> Outcome {
        let text = input.trim();
        let lower = text.to_lowercase();
        let is_give_up = lower == "give up";

        let outcome = match pending {
            Some(problem) if !lower.starts_with("practice") && !is_give_up => {
                self.answer(text, problem)
            }
            _ if lower.starts_with("practice") => self.practice(rng),
            Some(problem) if is_give_up => self.give_up(problem),
            _ if lower.starts_with("solve") || MATH_CHARS.is_match(text) => {
                self.solve(text, pending)
            }
            _ if lower.contains("hello") || lower.contains("hi") => {
                Outcome::new(Route::Greeting, vec![Reply::text(GREETING)], pending.cloned())
            }
            _ if lower.contains("help") => {
                Outcome::new(Route::Help, vec![Reply::text(HELP)], pending.cloned())
            }
            _ => Outcome::new(Route::Fallback, vec![Reply::text(FALLBACK)], pending.cloned()),
        };

        debug!(input = %text, route = ?outcome.route, "dispatched");
        outcome
    }

    fn answer(&self, given: &str, problem: &PendingProblem) -> Outcome {
        if self.check_answer(&problem.answer_expression, given) {
            let mut outcome = Outcome::new(
                Route::Answer { correct: true },
                vec![Reply::text(CORRECT)],
                None,
            );
            outcome.score_delta = 1;
            outcome
        } else {
            Outcome::new(
                Route::Answer { correct: false },
                vec![Reply::text(TRY_AGAIN)],
                Some(problem.clone()),
            )
        }
    }

    /// Numeric comparison first; exact text comparison when either side
    /// fails to evaluate or the values differ.
    fn check_answer(&self, expected: &str, given: &str) -> bool {
        if let Some(evaluator) = &self.evaluator {
            if let (Ok(want), Ok(got)) = (evaluator.evaluate(expected), evaluator.evaluate(given))
            {
                if (want - got).abs() < ANSWER_TOLERANCE {
                    return true;
                }
            }
        }
        expected.trim() == given.trim()
    }

    fn practice<R: Rng>(&self, rng: &mut R) -> Outcome {
        let problem = practice::generate(rng);
        let replies = vec![
            Reply::markup(format!(
                "Practice problem: {}",
                display_math(&problem.expression)
            )),
            Reply::text(ANSWER_PROMPT),
        ];
        Outcome::new(Route::Practice, replies, Some(problem))
    }

    fn give_up(&self, problem: &PendingProblem) -> Outcome {
        let value = self
            .evaluator
            .as_ref()
            .and_then(|e| e.evaluate(&problem.answer_expression).ok());

        let body = match value {
            Some(v) => format!("{} = {}", problem.answer_expression, format_number(v)),
            None => problem.answer_expression.clone(),
        };

        Outcome::new(
            Route::GiveUp,
            vec![Reply::markup(format!("Answer: {}", display_math(&body)))],
            None,
        )
    }

    fn solve(&self, text: &str, pending: Option<&PendingProblem>) -> Outcome {
        let expression = SOLVE_PREFIX.replace(text, "");

        let reply = match &self.evaluator {
            None => Reply::text(EVALUATOR_MISSING),
            Some(evaluator) => match evaluator.evaluate(&expression) {
                Ok(value) => Reply::markup(display_math(&format!(
                    "{} = {}",
                    expression,
                    format_number(value)
                ))),
                Err(e) => {
                    debug!(expression = %expression, error = %e, "expression rejected");
                    Reply::text(PARSE_FAILED)
                }
            },
        };

        Outcome::new(Route::Solve, vec![reply], pending.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{ArithmeticEvaluator, EvalError};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Box::new(ArithmeticEvaluator::new()))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    fn problem(expr: &str) -> PendingProblem {
        PendingProblem::new(expr)
    }

    /// Evaluator that fails on everything
    struct Broken;

    impl Evaluator for Broken {
        fn evaluate(&self, _expression: &str) -> Result<f64, EvalError> {
            Err(EvalError::Empty)
        }
    }

    #[test]
    fn test_solve_reports_result() {
        let out = dispatcher().dispatch("solve 12/3", None, &mut rng());
        assert_eq!(out.route, Route::Solve);
        assert_eq!(out.replies, vec![Reply::markup("$$12/3 = 4$$")]);
        assert_eq!(out.score_delta, 0);
        assert!(out.pending.is_none());
    }

    #[test]
    fn test_solve_prefix_variants() {
        let d = dispatcher();
        for input in ["Solve: 2+2", "SOLVE 2+2", "solve2+2", "  solve   2+2  "] {
            let out = d.dispatch(input, None, &mut rng());
            assert_eq!(out.replies, vec![Reply::markup("$$2+2 = 4$$")], "{input}");
        }
    }

    #[test]
    fn test_bare_expression_is_solved() {
        let out = dispatcher().dispatch("(1 + 2) * 3", None, &mut rng());
        assert_eq!(out.route, Route::Solve);
        assert_eq!(out.replies[0].text, "$$(1 + 2) * 3 = 9$$");
    }

    #[test]
    fn test_solve_parse_failure() {
        let out = dispatcher().dispatch("solve two plus 2", None, &mut rng());
        assert_eq!(out.replies, vec![Reply::text(PARSE_FAILED)]);
    }

    #[test]
    fn test_solve_without_evaluator() {
        let out = Dispatcher::without_evaluator().dispatch("solve 1+1", None, &mut rng());
        assert_eq!(out.replies, vec![Reply::text(EVALUATOR_MISSING)]);
    }

    #[test]
    fn test_practice_sets_pending() {
        let out = dispatcher().dispatch("practice", None, &mut rng());
        assert_eq!(out.route, Route::Practice);
        let pending = out.pending.expect("pending problem");
        assert_eq!(out.replies.len(), 2);
        assert!(out.replies[0].is_markup);
        assert_eq!(
            out.replies[0].text,
            format!("Practice problem: $${}$$", pending.expression)
        );
        assert_eq!(out.replies[1], Reply::text(ANSWER_PROMPT));
    }

    #[test]
    fn test_practice_replaces_open_problem() {
        let open = problem("1 + 1");
        let out = dispatcher().dispatch("Practice again", Some(&open), &mut rng());
        assert_eq!(out.route, Route::Practice);
        assert!(out.pending.is_some());
        assert_eq!(out.score_delta, 0);
    }

    #[test]
    fn test_correct_answer_clears_and_scores() {
        let open = problem("84/7");
        let out = dispatcher().dispatch(" 12 ", Some(&open), &mut rng());
        assert_eq!(out.route, Route::Answer { correct: true });
        assert_eq!(out.replies, vec![Reply::text(CORRECT)]);
        assert_eq!(out.score_delta, 1);
        assert!(out.pending.is_none());
    }

    #[test]
    fn test_equivalent_expression_is_correct() {
        let open = problem("3 * 4");
        let out = dispatcher().dispatch("6 + 6", Some(&open), &mut rng());
        assert_eq!(out.score_delta, 1);
    }

    #[test]
    fn test_wrong_answer_keeps_pending() {
        let open = problem("3 * 4");
        let out = dispatcher().dispatch("13", Some(&open), &mut rng());
        assert_eq!(out.route, Route::Answer { correct: false });
        assert_eq!(out.replies, vec![Reply::text(TRY_AGAIN)]);
        assert_eq!(out.pending, Some(open));
        assert_eq!(out.score_delta, 0);
    }

    #[test]
    fn test_open_problem_shadows_other_commands() {
        let open = problem("3 * 4");
        let out = dispatcher().dispatch("help", Some(&open), &mut rng());
        assert_eq!(out.route, Route::Answer { correct: false });
        assert_eq!(out.pending, Some(open));
    }

    #[test]
    fn test_string_fallback_when_evaluator_fails() {
        let open = problem("3 * 4");
        let d = Dispatcher::new(Box::new(Broken));

        let out = d.dispatch("3 * 4", Some(&open), &mut rng());
        assert_eq!(out.score_delta, 1);

        let out = d.dispatch("12", Some(&open), &mut rng());
        assert_eq!(out.score_delta, 0);
        assert_eq!(out.pending, Some(open));
    }

    #[test]
    fn test_string_fallback_without_evaluator() {
        let open = problem("5 + 5");
        let d = Dispatcher::without_evaluator();
        assert_eq!(d.dispatch("5 + 5", Some(&open), &mut rng()).score_delta, 1);
        assert_eq!(d.dispatch("10", Some(&open), &mut rng()).score_delta, 0);
    }

    #[test]
    fn test_give_up_reveals_answer() {
        let open = problem("84/7");
        let out = dispatcher().dispatch("Give Up", Some(&open), &mut rng());
        assert_eq!(out.route, Route::GiveUp);
        assert_eq!(out.replies, vec![Reply::markup("Answer: $$84/7 = 12$$")]);
        assert!(out.pending.is_none());
        assert_eq!(out.score_delta, 0);
    }

    #[test]
    fn test_give_up_without_evaluator_shows_expression() {
        let open = problem("84/7");
        let out = Dispatcher::without_evaluator().dispatch("give up", Some(&open), &mut rng());
        assert_eq!(out.replies, vec![Reply::markup("Answer: $$84/7$$")]);
    }

    #[test]
    fn test_give_up_without_pending_falls_through() {
        let out = dispatcher().dispatch("give up", None, &mut rng());
        assert_eq!(out.route, Route::Fallback);
        assert_eq!(out.replies, vec![Reply::text(FALLBACK)]);
        assert_eq!(out.score_delta, 0);
        assert!(out.pending.is_none());
    }

    #[test]
    fn test_greeting_help_and_fallback() {
        let d = dispatcher();
        assert_eq!(d.dispatch("Hello there", None, &mut rng()).route, Route::Greeting);
        // "this" contains "hi"
        assert_eq!(d.dispatch("what is this", None, &mut rng()).route, Route::Greeting);
        assert_eq!(d.dispatch("HELP", None, &mut rng()).replies, vec![Reply::text(HELP)]);
        assert_eq!(d.dispatch("tell me a joke", None, &mut rng()).route, Route::Fallback);
    }

    #[test]
    fn test_arithmetic_chars_win_over_greeting() {
        let out = dispatcher().dispatch("hi 2", None, &mut rng());
        assert_eq!(out.route, Route::Solve);
        assert_eq!(out.replies, vec![Reply::text(PARSE_FAILED)]);
    }

    #[test]
    fn test_score_never_negative_across_paths() {
        let d = dispatcher();
        let open = problem("2 + 2");
        for input in ["practice", "give up", "solve 1", "5", "hello", "help", "zzz"] {
            let out = d.dispatch(input, Some(&open), &mut rng());
            assert!(out.score_delta <= 1);
            let out = d.dispatch(input, None, &mut rng());
            assert_eq!(out.score_delta, 0);
        }
    }

    #[test]
    fn test_answer_within_tolerance_is_correct() {
        let d = dispatcher();
        for (expected, given) in [("0.1 + 0.2", "0.3"), ("1/3", "0.3333333333333333")] {
            let open = problem(expected);
            let out = d.dispatch(given, Some(&open), &mut rng());
            assert_eq!(out.route, Route::Answer { correct: true }, "{expected}");
            assert_eq!(out.score_delta, 1);
            assert!(out.pending.is_none());
        }
    }

    #[test]
    fn test_answer_outside_tolerance_is_wrong() {
        let open = problem("1/4");
        let out = dispatcher().dispatch("0.250001", Some(&open), &mut rng());
        assert_eq!(out.replies, vec![Reply::text(TRY_AGAIN)]);
        assert_eq!(out.pending, Some(open));
        assert_eq!(out.score_delta, 0);
    }

    #[test]
    fn test_deeply_nested_input_is_a_parse_failure() {
        let d = dispatcher();
        let signs = format!("{}1", "-".repeat(200_000));
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));

        for input in [&signs, &parens] {
            let out = d.dispatch(input, None, &mut rng());
            assert_eq!(out.route, Route::Solve);
            assert_eq!(out.replies, vec![Reply::text(PARSE_FAILED)]);

            let out = d.dispatch(&format!("solve {input}"), None, &mut rng());
            assert_eq!(out.replies, vec![Reply::text(PARSE_FAILED)]);
        }
    }

    #[test]
    fn test_deeply_nested_answer_is_wrong() {
        let open = problem("1 + 1");
        let parens = format!("{}2{}", "(".repeat(100_000), ")".repeat(100_000));
        let out = dispatcher().dispatch(&parens, Some(&open), &mut rng());
        assert_eq!(out.route, Route::Answer { correct: false });
        assert_eq!(out.pending, Some(open));
    }

    fn arb_operator() -> impl Strategy<Value = char> {
        prop::sample::select(vec!['+', '-', '*'])
    }

    fn apply(a: i64, op: char, b: i64) -> i64 {
        match op {
            '+' => a + b,
            '-' => a - b,
            _ => a * b,
        }
    }

    proptest! {
        /// `solve e` always shows `e = value`
        #[test]
        fn test_solve_shows_integer_result(
            a in 0i64..1000,
            b in 0i64..1000,
            op in arb_operator(),
        ) {
            let expression = format!("{a} {op} {b}");
            let value = apply(a, op, b) as f64;

            let out = dispatcher().dispatch(&format!("solve {expression}"), None, &mut rng());
            prop_assert_eq!(out.route, Route::Solve);
            prop_assert_eq!(
                out.replies,
                vec![Reply::markup(format!("$${} = {}$$", expression, format_number(value)))]
            );
        }

        /// Any other number leaves the problem open and the score alone
        #[test]
        fn test_wrong_number_keeps_problem(
            a in 1i64..=20,
            b in 1i64..=20,
            op in arb_operator(),
            guess in -1000i64..1000,
        ) {
            prop_assume!(guess != apply(a, op, b));
            let open = problem(&format!("{a} {op} {b}"));

            let out = dispatcher().dispatch(&guess.to_string(), Some(&open), &mut rng());
            prop_assert_eq!(out.route, Route::Answer { correct: false });
            prop_assert_eq!(out.pending, Some(open));
            prop_assert_eq!(out.score_delta, 0);
        }

        /// The score only ever moves up by one, and only for an open problem
        #[test]
        fn test_score_delta_is_bounded(input in "\\PC{0,40}", seed in any::<u64>()) {
            let d = dispatcher();
            let open = problem("2 + 2");

            let out = d.dispatch(&input, Some(&open), &mut StdRng::seed_from_u64(seed));
            prop_assert!(out.score_delta <= 1);

            let out = d.dispatch(&input, None, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(out.score_delta, 0);
        }
    }
}
