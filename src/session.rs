//! Session - one running conversation
//!
//! Glues the dispatcher to the message log and the persisted preferences.
//! The pending problem lives here and is threaded through every dispatch.
//!
//! Front ends drive it in two steps: [`Session::submit`] logs the user's
//! line immediately, [`Session::respond`] dispatches it once the thinking
//! delay has elapsed. [`Schedule`] keeps those delayed steps in FIFO order.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dispatch::{Dispatcher, Route};
use crate::error::Result;
use crate::eval::ArithmeticEvaluator;
use crate::message::{MessageLog, Reply, Sender};
use crate::practice::PendingProblem;
use crate::store::{KeyValueStore, Preferences, Theme};

pub const WELCOME: &str = "Hi, I am a math demo chatbot. Type `practice` to begin.";

pub struct Session {
    dispatcher: Dispatcher,
    prefs: Preferences<Box<dyn KeyValueStore>>,
    log: MessageLog,
    pending: Option<PendingProblem>,
    rng: StdRng,
    theme: Theme,
}

impl Session {
    /// Session with the built-in evaluator and an entropy-seeded RNG.
    ///
    /// `forced_theme` wins over the stored theme, which wins over
    /// `system_default`.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        system_default: Theme,
        forced_theme: Option<Theme>,
    ) -> Self {
        Self::with_parts(
            Dispatcher::new(Box::new(ArithmeticEvaluator::new())),
            store,
            StdRng::from_entropy(),
            forced_theme.unwrap_or(system_default),
            forced_theme.is_some(),
        )
    }

    /// Fully injected constructor (tests, alternative evaluators)
    pub fn with_parts(
        dispatcher: Dispatcher,
        store: Box<dyn KeyValueStore>,
        rng: StdRng,
        theme: Theme,
        theme_is_forced: bool,
    ) -> Self {
        let prefs = Preferences::new(store);
        let theme = if theme_is_forced {
            theme
        } else {
            prefs.theme(theme)
        };

        Self {
            dispatcher,
            prefs,
            log: MessageLog::new(),
            pending: None,
            rng,
            theme,
        }
    }

    /// Startup greeting with the persisted score
    pub fn greet(&mut self) {
        let score = self.prefs.score();
        self.log.append(Sender::Bot, Reply::text(WELCOME));
        self.log
            .append(Sender::Bot, Reply::text(format!("Your score: {}", score)));
    }

    /// Log a user line. Returns the trimmed text to hand to [`respond`]
    /// later, or `None` for blank input.
    ///
    /// [`respond`]: Session::respond
    pub fn submit(&mut self, input: &str) -> Option<String> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.log.append(Sender::User, Reply::text(text));
        Some(text.to_string())
    }

    /// Dispatch a submitted line and log the bot's replies.
    ///
    /// A correct answer bumps the persisted score and reports the new total.
    pub fn respond(&mut self, text: &str) -> Result<Route> {
        let outcome = self
            .dispatcher
            .dispatch(text, self.pending.as_ref(), &mut self.rng);

        self.pending = outcome.pending;
        for reply in outcome.replies {
            self.log.append(Sender::Bot, reply);
        }

        if outcome.score_delta > 0 {
            let score = self.prefs.add_to_score(outcome.score_delta)?;
            self.log
                .append(Sender::Bot, Reply::text(format!("Score: {}", score)));
        }

        Ok(outcome.route)
    }

    /// Flip and persist the theme
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.prefs.set_theme(next)?;
        self.theme = next;
        Ok(next)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn score(&self) -> u64 {
        self.prefs.score()
    }

    pub fn pending(&self) -> Option<&PendingProblem> {
        self.pending.as_ref()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut MessageLog {
        &mut self.log
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delayed work
// ─────────────────────────────────────────────────────────────────────────────

/// Work waiting for its deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Greet,
    Respond(String),
}

/// FIFO of jobs with deadlines, polled from the event loop tick.
///
/// Jobs always come out in the order they went in; a job never runs before
/// the ones queued ahead of it.
#[derive(Debug, Default)]
pub struct Schedule {
    queue: VecDeque<(Instant, Job)>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Job, delay: Duration, now: Instant) {
        self.queue.push_back((now + delay, job));
    }

    /// Pop every job whose deadline has passed, oldest first
    pub fn due(&mut self, now: Instant) -> Vec<Job> {
        let mut ready = Vec::new();
        while let Some((deadline, _)) = self.queue.front() {
            if *deadline > now {
                break;
            }
            if let Some((_, job)) = self.queue.pop_front() {
                ready.push(job);
            }
        }
        ready
    }

    /// True while a reply is still being "thought about"
    pub fn is_thinking(&self) -> bool {
        self.queue
            .iter()
            .any(|(_, job)| matches!(job, Job::Respond(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
