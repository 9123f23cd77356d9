//! Input line editing
//!
//! The cursor is a char index, not a byte index, so multi-byte input such
//! as `÷` edits correctly.

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Terminal columns taken by the text left of the cursor
    pub fn width_before_cursor(&self) -> usize {
        self.text[..self.byte_index(self.cursor)].width()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Take the buffer, leaving the line empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}
