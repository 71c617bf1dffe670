//! State management for the compose field.

use unicode_width::UnicodeWidthChar;

/// Default maximum message length, in characters.
pub const DEFAULT_MESSAGE_LENGTH_LIMIT: usize = 1000;

/// What the compose field is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Text of a chat message.
    #[default]
    Message,
    /// Local path of a photo to upload.
    PhotoPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInputState {
    text: String,
    /// Cursor position (character index, not byte).
    cursor_position: usize,
    max_chars: usize,
    mode: InputMode,
}

impl Default for MessageInputState {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MESSAGE_LENGTH_LIMIT)
    }
}

impl MessageInputState {
    pub fn with_limit(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            cursor_position: 0,
            max_chars,
            mode: InputMode::Message,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Switches mode, discarding any text typed for the previous one.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            self.mode = mode;
            self.clear();
        }
    }

    /// The send action is enabled only when there is non-whitespace text.
    pub fn can_send(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Inserts a character at the cursor.
    /// Returns false if the input would exceed the limit.
    ///
    /// Photo paths are not subject to the message limit.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if self.mode == InputMode::Message && self.text.chars().count() >= self.max_chars {
            return false;
        }
        let byte_idx = self.char_to_byte_index(self.cursor_position);
        self.text.insert(byte_idx, ch);
        self.cursor_position += 1;
        true
    }

    /// Deletes the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor_position);
            let next_byte_idx = self.char_to_byte_index(self.cursor_position + 1);
            self.text.drain(byte_idx..next_byte_idx);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete_char_at(&mut self) {
        let char_count = self.text.chars().count();
        if self.cursor_position < char_count {
            let byte_idx = self.char_to_byte_index(self.cursor_position);
            let next_byte_idx = self.char_to_byte_index(self.cursor_position + 1);
            self.text.drain(byte_idx..next_byte_idx);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let char_count = self.text.chars().count();
        if self.cursor_position < char_count {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }

    /// Takes the current text out of the field, leaving it empty.
    pub fn take_text(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.text)
    }

    /// Terminal columns occupied by the text before the cursor.
    pub fn cursor_display_column(&self) -> usize {
        self.text
            .chars()
            .take(self.cursor_position)
            .map(|ch| ch.width().unwrap_or(0))
            .sum()
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}
