//! Message Log - the scrolling conversation
//!
//! Messages are immutable once appended. The log stamps each one with the
//! local time, typesets markup-bearing text, and snaps the view back to the
//! newest entry on every append.

use chrono::{DateTime, Local};

use crate::markup::{typeset_best_effort, Segment, TerminalTypesetter, Typesetter};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "you",
            Sender::Bot => "bot",
        }
    }
}

/// Message text produced by the dispatcher, not yet in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub is_markup: bool,
}

impl Reply {
    /// Plain text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_markup: false,
        }
    }

    /// Reply carrying `$$ … $$` or `\( … \)` math markup
    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_markup: true,
        }
    }
}

/// A logged message
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub is_markup: bool,
    /// Typeset form of `text`; a single text segment for plain messages.
    pub rendered: Vec<Segment>,
}

impl Message {
    /// Human-readable timestamp, e.g. `14:05`
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Append-only conversation log with a scroll position.
pub struct MessageLog {
    messages: Vec<Message>,
    /// Messages hidden below the viewport; 0 follows the newest entry.
    scroll_back: usize,
    typesetter: Box<dyn Typesetter>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::with_typesetter(Box::new(TerminalTypesetter))
    }

    pub fn with_typesetter(typesetter: Box<dyn Typesetter>) -> Self {
        Self {
            messages: Vec::new(),
            scroll_back: 0,
            typesetter,
        }
    }

    /// Append a message stamped with the current local time
    pub fn append(&mut self, sender: Sender, reply: Reply) {
        self.append_at(sender, reply, Local::now());
    }

    /// Append a message with an explicit timestamp
    pub fn append_at(&mut self, sender: Sender, reply: Reply, timestamp: DateTime<Local>) {
        let rendered = if reply.is_markup {
            typeset_best_effort(self.typesetter.as_ref(), &reply.text)
        } else {
            vec![Segment::Text(reply.text.clone())]
        };

        self.messages.push(Message {
            text: reply.text,
            sender,
            timestamp,
            is_markup: reply.is_markup,
            rendered,
        });
        self.scroll_to_bottom();
    }

    pub fn scroll_up(&mut self, count: usize) {
        let max = self.messages.len().saturating_sub(1);
        self.scroll_back = (self.scroll_back + count).min(max);
    }

    pub fn scroll_down(&mut self, count: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(count);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// Messages up to the bottom of the viewport (newest last)
    pub fn visible(&self) -> &[Message] {
        let end = self.messages.len() - self.scroll_back;
        &self.messages[..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
