//! TUI Widgets - message list rendering
//!
//! Turns the message log into styled, pre-wrapped lines. Wrapping happens
//! here so the app knows exactly how many rows the conversation takes and
//! can pin the newest line to the bottom of the viewport.

use ratatui::{
    layout::Alignment,
    style::Style,
    text::{Line, Span},
};

use crate::markup::Segment;
use crate::message::{Message, Sender};

use super::theme::Palette;

pub const GUTTER: &str = "  │ ";
pub const THINKING: &str = "thinking…";

/// Lines for every visible message, followed by the thinking indicator
pub fn conversation_lines(
    messages: &[Message],
    palette: &Palette,
    width: usize,
    thinking: bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        lines.extend(message_lines(message, palette, width));
    }

    if thinking {
        lines.push(Line::from(vec![
            Span::styled(Sender::Bot.label(), palette.sender(false)),
            Span::raw(" "),
            Span::styled(THINKING, palette.thinking()),
        ]));
    }

    lines
}

/// Header row (`you 14:05`) plus the wrapped body behind a gutter
pub fn message_lines(message: &Message, palette: &Palette, width: usize) -> Vec<Line<'static>> {
    let is_user = message.sender == Sender::User;
    let alignment = if is_user {
        Alignment::Right
    } else {
        Alignment::Left
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(message.sender.label(), palette.sender(is_user)),
        Span::raw(" "),
        Span::styled(message.time_label(), palette.dimmed()),
    ])
    .alignment(alignment)];

    let styled: Vec<(String, Style)> = message
        .rendered
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => (text.clone(), palette.text()),
            Segment::Math { body, display } => (body.clone(), palette.math(*display)),
        })
        .collect();

    let body_width = width.saturating_sub(GUTTER.chars().count()).max(1);
    let gutter_style = palette.sender(is_user);

    for row in wrap_spans(&styled, body_width) {
        let mut spans = vec![Span::styled(GUTTER, gutter_style)];
        spans.extend(row.into_iter().map(|(text, style)| Span::styled(text, style)));
        lines.push(Line::from(spans).alignment(alignment));
    }

    lines.push(Line::from(""));
    lines
}

/// Hard-wrap styled runs to `width` chars per row, splitting on newlines.
pub fn wrap_spans(runs: &[(String, Style)], width: usize) -> Vec<Vec<(String, Style)>> {
    let width = width.max(1);
    let mut rows: Vec<Vec<(String, Style)>> = vec![Vec::new()];
    let mut used = 0;

    for (text, style) in runs {
        let mut current = String::new();
        for c in text.chars() {
            if c == '\n' || used == width {
                flush(&mut rows, &mut current, *style);
                rows.push(Vec::new());
                used = 0;
                if c == '\n' {
                    continue;
                }
            }
            current.push(c);
            used += 1;
        }
        flush(&mut rows, &mut current, *style);
    }

    rows
}

fn flush(rows: &mut [Vec<(String, Style)>], current: &mut String, style: Style) {
    if current.is_empty() {
        return;
    }
    if let Some(row) = rows.last_mut() {
        row.push((std::mem::take(current), style));
    }
}

/// First line to show so the last `height` lines fill the viewport
pub fn bottom_offset(total: usize, height: usize) -> usize {
    total.saturating_sub(height)
}
