//! Mathchat - a small math tutor you can chat with
//!
//! Type an expression (or `solve …`) to have it evaluated, `practice` for
//! an arithmetic question, `give up` to see the answer. Correct answers
//! raise a persisted score.
//!
//! Layers, bottom-up:
//! - [`eval`] evaluates expressions, [`markup`] typesets `$$ … $$` math
//! - [`dispatch`] maps one input line to replies plus state changes
//! - [`store`] persists score and theme, [`message`] keeps the log
//! - [`session`] ties them together; [`tui`] and [`repl`] are front ends

pub mod config;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod markup;
pub mod message;
pub mod practice;
pub mod repl;
pub mod session;
pub mod store;
pub mod tui;

pub use config::TutorConfig;
pub use dispatch::{Dispatcher, Outcome, Route};
pub use error::{FixSuggestion, Result, TutorError};
pub use eval::{ArithmeticEvaluator, EvalError, Evaluator};
pub use message::{Message, MessageLog, Reply, Sender};
pub use practice::PendingProblem;
pub use session::Session;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, Preferences, Theme};
