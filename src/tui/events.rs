//! Event Handling - Keyboard input processing

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::input::InputLine;

/// Messages moved per PageUp/PageDown
pub const PAGE: usize = 5;

/// Actions that can be triggered by user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Submit,
    ToggleTheme,
    ScrollUp(usize),
    ScrollDown(usize),
    /// Input line was edited (or the key was ignored)
    None,
}

/// Handle keyboard events. Editing keys are applied to `input` directly.
pub fn handle_key_event(key: KeyEvent, input: &mut InputLine) -> Action {
    // Global keybindings
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('t')) => return Action::ToggleTheme,
        _ => {}
    }

    match key.code {
        KeyCode::Enter => Action::Submit,

        // Message list
        KeyCode::Up => Action::ScrollUp(1),
        KeyCode::Down => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(PAGE),
        KeyCode::PageDown => Action::ScrollDown(PAGE),

        // Input line
        KeyCode::Left => {
            input.cursor_left();
            Action::None
        }
        KeyCode::Right => {
            input.cursor_right();
            Action::None
        }
        KeyCode::Home => {
            input.cursor_home();
            Action::None
        }
        KeyCode::End => {
            input.cursor_end();
            Action::None
        }
        KeyCode::Backspace => {
            input.backspace();
            Action::None
        }
        KeyCode::Delete => {
            input.delete();
            Action::None
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.insert_char(c);
            Action::None
        }
        _ => Action::None,
    }
}

/// Poll for key presses with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            // Windows reports releases too
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}
