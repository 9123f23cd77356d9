//! Palettes - light and dark color sets
//!
//! One [`Palette`] per [`Theme`]; the app swaps palettes when the theme
//! is toggled.

use ratatui::style::{Color, Modifier, Style};

use crate::store::Theme;

/// Chat screen colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub user: Color,
    pub bot: Color,
    pub math: Color,
    pub border: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(250, 250, 247), // #FAFAF7
            text: Color::Rgb(31, 35, 40),          // #1F2328
            muted: Color::Rgb(101, 109, 118),      // #656D76
            accent: Color::Rgb(154, 103, 0),       // #9A6700
            user: Color::Rgb(9, 105, 218),         // #0969DA
            bot: Color::Rgb(26, 127, 55),          // #1A7F37
            math: Color::Rgb(130, 80, 223),        // #8250DF
            border: Color::Rgb(208, 215, 222),     // #D0D7DE
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(13, 17, 23), // #0D1117
            text: Color::Rgb(230, 237, 243),    // #E6EDF3
            muted: Color::Rgb(125, 133, 144),   // #7D8590
            accent: Color::Rgb(255, 191, 0),    // #FFBF00
            user: Color::Rgb(88, 166, 255),     // #58A6FF
            bot: Color::Rgb(63, 185, 80),       // #3FB950
            math: Color::Rgb(210, 168, 255),    // #D2A8FF
            border: Color::Rgb(48, 54, 61),     // #30363D
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    /// Whole-screen base style
    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn header(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Sender label style
    pub fn sender(&self, is_user: bool) -> Style {
        let color = if is_user { self.user } else { self.bot };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Typeset math; display math is bold
    pub fn math(&self, display: bool) -> Style {
        let style = Style::default().fg(self.math);
        if display {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    pub fn thinking(&self) -> Style {
        Style::default()
            .fg(self.muted)
            .add_modifier(Modifier::ITALIC)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}
