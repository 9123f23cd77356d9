//! Line mode - the chat on plain stdin/stdout
//!
//! Each input line is logged, the thinking delay is awaited, then every new
//! log entry is printed. `:theme` toggles the persisted theme and `:quit`
//! (or end of input) leaves.

use std::io::Write;
use std::time::Duration;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Result;
use crate::markup::flatten;
use crate::message::{Message, Sender};
use crate::session::Session;

pub const QUIT_COMMAND: &str = ":quit";
pub const THEME_COMMAND: &str = ":theme";

#[derive(Debug, Clone, Copy, Default)]
pub struct Delays {
    pub greeting: Duration,
    pub think: Duration,
}

/// Run the conversation until `:quit` or end of input
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W, delays: Delays) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pause(delays.greeting).await;
    session.greet();
    let mut printed = print_new(session, out, 0)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            QUIT_COMMAND => break,
            THEME_COMMAND => {
                let theme = session.toggle_theme()?;
                writeln!(out, "{} {}", "Theme:".dimmed(), theme)?;
                continue;
            }
            _ => {}
        }

        let Some(text) = session.submit(&line) else {
            continue;
        };

        pause(delays.think).await;
        session.respond(&text)?;

        // The user's own line is already on screen
        printed += 1;
        printed = print_new(session, out, printed)?;
    }

    out.flush()?;
    Ok(())
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Print log entries from `from` onwards, returning the new high-water mark
fn print_new<W: Write>(session: &Session, out: &mut W, from: usize) -> Result<usize> {
    let log = session.log();
    for message in log.iter().skip(from) {
        writeln!(out, "{}", format_line(message))?;
    }
    out.flush()?;
    Ok(log.len())
}

fn format_line(message: &Message) -> String {
    let label = match message.sender {
        Sender::User => message.sender.label().cyan().bold(),
        Sender::Bot => message.sender.label().green().bold(),
    };
    format!(
        "[{}] {} › {}",
        message.time_label().dimmed(),
        label,
        flatten(&message.rendered)
    )
}
