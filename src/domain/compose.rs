//! Compose draft and the typing edge detector that rides on it.

use serde::{Deserialize, Serialize};

/// Maximum allowed draft length in characters.
const MAX_DRAFT_LENGTH: usize = 4096;

/// Local typing transitions reported to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Started,
    Stopped,
}

/// What happens to the draft when a send fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPolicy {
    /// Keep the text so the user can resubmit.
    #[default]
    Retain,
    /// Clear the draft as soon as the send starts, whatever the outcome.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMotion {
    Left,
    Right,
    Home,
    End,
}

/// Result of one editing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DraftEdit {
    /// Whether the text changed.
    pub changed: bool,
    /// Edge transition between empty and non-empty text, if any.
    pub signal: Option<TypingSignal>,
}

/// Text taken out of the draft for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    /// Always `Stopped`: a submit ends the typing burst.
    pub signal: TypingSignal,
}

/// The local compose buffer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Composer {
    text: String,
    /// Cursor position (character index, not byte).
    cursor_position: usize,
}

impl Composer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Inserts a character at the cursor. Rejected past the length limit.
    pub fn insert_char(&mut self, ch: char) -> DraftEdit {
        if self.text.chars().count() >= MAX_DRAFT_LENGTH {
            return DraftEdit::default();
        }
        let was_empty = self.text.is_empty();
        let byte_idx = self.char_to_byte_index(self.cursor_position);
        self.text.insert(byte_idx, ch);
        self.cursor_position += 1;
        self.edited(was_empty)
    }

    /// Deletes the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) -> DraftEdit {
        if self.cursor_position == 0 {
            return DraftEdit::default();
        }
        let was_empty = self.text.is_empty();
        self.cursor_position -= 1;
        let byte_idx = self.char_to_byte_index(self.cursor_position);
        let next_byte_idx = self.char_to_byte_index(self.cursor_position + 1);
        self.text.drain(byte_idx..next_byte_idx);
        self.edited(was_empty)
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete_char_at(&mut self) -> DraftEdit {
        if self.cursor_position >= self.text.chars().count() {
            return DraftEdit::default();
        }
        let was_empty = self.text.is_empty();
        let byte_idx = self.char_to_byte_index(self.cursor_position);
        let next_byte_idx = self.char_to_byte_index(self.cursor_position + 1);
        self.text.drain(byte_idx..next_byte_idx);
        self.edited(was_empty)
    }

    /// Replaces the whole draft, truncated to the length limit; the cursor
    /// moves to the end.
    pub fn set_text(&mut self, text: &str) -> DraftEdit {
        let was_empty = self.text.is_empty();
        let previous = std::mem::take(&mut self.text);
        self.text = text.chars().take(MAX_DRAFT_LENGTH).collect();
        self.cursor_position = self.text.chars().count();
        if previous == self.text {
            return DraftEdit::default();
        }
        self.edited(was_empty)
    }

    pub fn move_cursor(&mut self, motion: CursorMotion) {
        match motion {
            CursorMotion::Left => self.move_cursor_left(),
            CursorMotion::Right => self.move_cursor_right(),
            CursorMotion::Home => self.move_cursor_home(),
            CursorMotion::End => self.move_cursor_end(),
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.text.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.text.chars().count();
    }

    /// Takes the trimmed text for sending and ends the typing burst. The
    /// draft itself is left in place; the caller decides when to clear it.
    /// Returns `None` for an empty or whitespace-only draft.
    pub fn submit(&self) -> Option<Submission> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }

        Some(Submission {
            text: text.to_owned(),
            signal: TypingSignal::Stopped,
        })
    }

    /// Clears the draft without emitting a signal.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }

    fn edited(&self, was_empty: bool) -> DraftEdit {
        let signal = match (was_empty, self.text.is_empty()) {
            (true, false) => Some(TypingSignal::Started),
            (false, true) => Some(TypingSignal::Stopped),
            _ => None,
        };

        DraftEdit {
            changed: true,
            signal,
        }
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}
