//! TUI Module - full-screen chat
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ∑ MATH CHAT  │  Score: 3  │  Theme: dark     │  header
//! ├─ CONVERSATION ───────────────────────────────┤
//! │ bot 14:05                                    │
//! │   │ Practice problem: 12 × 4                 │  widgets/
//! │                                    you 14:05 │
//! │                                      │ 48    │
//! ├──────────────────────────────────────────────┤
//! │ > _                                          │  input.rs
//! └──────────────────────────────────────────────┘
//!  [Enter] send  [Ctrl+T] theme  ...                footer
//! ```
//!
//! The session does the work; this module only schedules, draws and maps
//! keys (events.rs).

mod app;
mod events;
mod input;
mod theme;

pub mod widgets;

pub use app::ChatApp;
pub use theme::Palette;

use std::time::Duration;

use crate::session::Session;

/// Run the chat screen until the user quits
pub async fn run(
    session: Session,
    greeting_delay: Duration,
    think_delay: Duration,
) -> anyhow::Result<()> {
    let app = ChatApp::new(session, greeting_delay, think_delay);
    app.run().await
}
