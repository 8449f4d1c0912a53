/// Single-line text buffer used by the file path prompt.
pub struct InputState {
    pub buffer: String,
    cursor_position: usize,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor_position: 0,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.buffer.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    pub fn handle_backspace(&mut self) {
        if let Some(c) = self.buffer[..self.cursor_position].chars().next_back() {
            self.cursor_position -= c.len_utf8();
            self.buffer.remove(self.cursor_position);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.buffer[..self.cursor_position].chars().next_back() {
            self.cursor_position -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.buffer[self.cursor_position..].chars().next() {
            self.cursor_position += c.len_utf8();
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor_position
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor_position = 0;
    }

    /// Drops surrounding quotes a terminal adds when a file is dragged in.
    pub fn take_path(&mut self) -> Option<String> {
        let raw = self.buffer.trim();
        let unquoted = raw
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
            .unwrap_or(raw)
            .to_string();
        self.clear();
        (!unquoted.is_empty()).then_some(unquoted)
    }
}
