//! TUI Application - Main entry point and run loop

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use unicode_width::UnicodeWidthStr;

use super::events::{handle_key_event, poll_event, Action};
use super::input::InputLine;
use super::theme::Palette;
use super::widgets::{bottom_offset, conversation_lines};
use crate::session::{Job, Schedule, Session};

const PROMPT: &str = "> ";

/// Chat screen state
pub struct ChatApp {
    session: Session,
    schedule: Schedule,
    input: InputLine,
    palette: Palette,
    think_delay: Duration,
    should_quit: bool,
}

impl ChatApp {
    /// Create the app; the greeting is queued `greeting_delay` from now.
    pub fn new(session: Session, greeting_delay: Duration, think_delay: Duration) -> Self {
        let palette = Palette::for_theme(session.theme());
        let mut schedule = Schedule::new();
        schedule.push(Job::Greet, greeting_delay, Instant::now());

        Self {
            session,
            schedule,
            input: InputLine::new(),
            palette,
            think_delay,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut terminal = self.setup_terminal()?;

        let result = self.main_loop(&mut terminal).await;

        // Restore even when the loop failed
        self.restore_terminal(&mut terminal)?;

        result
    }

    /// Setup terminal for TUI
    fn setup_terminal(&self) -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop
    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(16); // ~60fps

        loop {
            self.tick(Instant::now())?;

            terminal.draw(|frame| self.render(frame))?;

            if let Some(key) = poll_event(tick_rate)? {
                let action = handle_key_event(key, &mut self.input);
                self.apply(action, Instant::now())?;
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Run every job whose deadline has passed
    fn tick(&mut self, now: Instant) -> anyhow::Result<()> {
        for job in self.schedule.due(now) {
            match job {
                Job::Greet => self.session.greet(),
                Job::Respond(text) => {
                    self.session.respond(&text)?;
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: Action, now: Instant) -> anyhow::Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Submit => {
                let line = self.input.take();
                if let Some(text) = self.session.submit(&line) {
                    self.schedule
                        .push(Job::Respond(text), self.think_delay, now);
                }
            }
            Action::ToggleTheme => {
                let theme = self.session.toggle_theme()?;
                self.palette = Palette::for_theme(theme);
            }
            Action::ScrollUp(n) => self.session.log_mut().scroll_up(n),
            Action::ScrollDown(n) => self.session.log_mut().scroll_down(n),
            Action::None => {}
        }
        Ok(())
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.palette.base()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Conversation
                Constraint::Length(3), // Input
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_messages(frame, chunks[1]);
        self.render_input(frame, chunks[2]);
        self.render_footer(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Line::from(vec![
            Span::styled("∑ MATH CHAT", self.palette.header()),
            Span::styled("  │  ", self.palette.dimmed()),
            Span::styled(
                format!("Score: {}", self.session.score()),
                self.palette.accent(),
            ),
            Span::styled("  │  ", self.palette.dimmed()),
            Span::styled(
                format!("Theme: {}", self.session.theme()),
                self.palette.text(),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.palette.border());

        frame.render_widget(Paragraph::new(header).block(block), area);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.palette.border())
            .title(" CONVERSATION ");
        let inner = block.inner(area);

        let lines = conversation_lines(
            self.session.log().visible(),
            &self.palette,
            inner.width as usize,
            self.schedule.is_thinking(),
        );
        let offset = bottom_offset(lines.len(), inner.height as usize);

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.palette.accent());

        let line = Line::from(vec![
            Span::styled(PROMPT, self.palette.accent()),
            Span::styled(self.input.text().to_string(), self.palette.text()),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);

        frame.set_cursor_position(self.cursor_position(area));
    }

    /// Cursor cell inside the input box, clamped to its right border
    fn cursor_position(&self, area: Rect) -> Position {
        let columns = PROMPT.width() + self.input.width_before_cursor();
        let offset = u16::try_from(columns).unwrap_or(u16::MAX);
        let max_x = area.right().saturating_sub(2);
        let x = area.x.saturating_add(1).saturating_add(offset).min(max_x);
        Position::new(x, area.y.saturating_add(1))
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help = Line::from(vec![
            Span::styled(" [Enter]", self.palette.accent()),
            Span::styled(" send  ", self.palette.dimmed()),
            Span::styled("[Ctrl+T]", self.palette.accent()),
            Span::styled(" theme  ", self.palette.dimmed()),
            Span::styled("[↑↓ PgUp PgDn]", self.palette.accent()),
            Span::styled(" scroll  ", self.palette.dimmed()),
            Span::styled("[Esc]", self.palette.accent()),
            Span::styled(" quit", self.palette.dimmed()),
        ]);

        frame.render_widget(Paragraph::new(help), area);
    }
}
