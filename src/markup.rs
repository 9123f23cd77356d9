//! Math markup and typesetting
//!
//! Bot replies embed math between `$$ … $$` (display) or `\( … \)` (inline)
//! delimiters. A [`Typesetter`] turns such text into [`Segment`]s the front
//! ends can style. Typesetting is cosmetic: [`typeset_best_effort`] never
//! fails and falls back to the raw text.

use thiserror::Error;

const DISPLAY_OPEN: &str = "$$";
const DISPLAY_CLOSE: &str = "$$";
const INLINE_OPEN: &str = "\\(";
const INLINE_CLOSE: &str = "\\)";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypesetError {
    #[error("unterminated {delimiter} at position {position}")]
    Unterminated {
        delimiter: &'static str,
        position: usize,
    },

    #[error("empty math block at position {position}")]
    EmptyMath { position: usize },
}

/// A run of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Math { body: String, display: bool },
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Math { body, .. } => body,
        }
    }
}

/// Converts delimited math markup into typeset segments.
pub trait Typesetter {
    fn typeset(&self, markup: &str) -> Result<Vec<Segment>, TypesetError>;
}

/// Typesets for a character terminal: operators become their typographic
/// forms (`×`, `÷`, `−`) and the delimiters are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalTypesetter;

impl Typesetter for TerminalTypesetter {
    fn typeset(&self, markup: &str) -> Result<Vec<Segment>, TypesetError> {
        let mut segments = Vec::new();
        let mut rest = markup;
        let mut offset = 0;

        while let Some((start, open, close, display)) = next_delimiter(rest) {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }

            let body_start = start + open.len();
            let Some(body_len) = rest[body_start..].find(close) else {
                return Err(TypesetError::Unterminated {
                    delimiter: open,
                    position: offset + start,
                });
            };

            let body = rest[body_start..body_start + body_len].trim();
            if body.is_empty() {
                return Err(TypesetError::EmptyMath {
                    position: offset + start,
                });
            }
            segments.push(Segment::Math {
                body: pretty_operators(body),
                display,
            });

            let consumed = body_start + body_len + close.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(segments)
    }
}

/// Typeset `markup`, falling back to a single text segment on failure.
/// Failures are swallowed without logging.
pub fn typeset_best_effort(typesetter: &dyn Typesetter, markup: &str) -> Vec<Segment> {
    typesetter
        .typeset(markup)
        .unwrap_or_else(|_| vec![Segment::Text(markup.to_string())])
}

/// Wrap `body` in display math delimiters.
pub fn display_math(body: &str) -> String {
    format!("{}{}{}", DISPLAY_OPEN, body, DISPLAY_CLOSE)
}

/// Wrap `body` in inline math delimiters.
pub fn inline_math(body: &str) -> String {
    format!("{}{}{}", INLINE_OPEN, body, INLINE_CLOSE)
}

/// Flatten segments back to a single line of text.
pub fn flatten(segments: &[Segment]) -> String {
    segments.iter().map(Segment::as_str).collect()
}

/// Earliest opening delimiter in `text`: (byte offset, open, close, display).
fn next_delimiter(text: &str) -> Option<(usize, &'static str, &'static str, bool)> {
    let display = text
        .find(DISPLAY_OPEN)
        .map(|i| (i, DISPLAY_OPEN, DISPLAY_CLOSE, true));
    let inline = text
        .find(INLINE_OPEN)
        .map(|i| (i, INLINE_OPEN, INLINE_CLOSE, false));

    match (display, inline) {
        (Some(d), Some(i)) => Some(if d.0 <= i.0 { d } else { i }),
        (d, i) => d.or(i),
    }
}

fn pretty_operators(body: &str) -> String {
    body.chars()
        .map(|c| match c {
            '*' => '×',
            '/' => '÷',
            '-' => '−',
            other => other,
        })
        .collect()
}
