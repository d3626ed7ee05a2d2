use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Single-line editable text with a cursor.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub value: String,
    /// Cursor position in characters (not bytes).
    pub cursor: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn handle_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Trimmed value, `None` when blank.
    pub fn trimmed(&self) -> Option<&str> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

pub fn render(frame: &mut Frame, field: &TextField, title: &str, focused: bool, area: Rect) {
    let color = if focused { Color::Yellow } else { Color::DarkGray };

    let text = if focused {
        let idx = field.byte_index(field.cursor);
        format!("{}|{}", &field.value[..idx], &field.value[idx..])
    } else {
        field.value.clone()
    };

    let input = Paragraph::new(text)
        .style(Style::default().fg(if focused { Color::Yellow } else { Color::White }))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .border_style(Style::default().fg(color)),
        );
    frame.render_widget(input, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut field = TextField::new();
        for c in "chat é".chars() {
            field.handle_char(c);
        }
        assert_eq!(field.value, "chat é");
        assert_eq!(field.cursor, 6);

        field.move_cursor_left();
        field.backspace();
        assert_eq!(field.value, "chaté");

        field.move_cursor_home();
        field.delete();
        assert_eq!(field.value, "haté");

        field.move_cursor_end();
        field.backspace();
        assert_eq!(field.value, "hat");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut field = TextField::with_value("ab");
        field.move_cursor_right();
        assert_eq!(field.cursor, 2);
        field.move_cursor_home();
        field.move_cursor_left();
        field.backspace();
        assert_eq!(field.cursor, 0);
        assert_eq!(field.value, "ab");
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(TextField::with_value("  cat ").trimmed(), Some("cat"));
        assert_eq!(TextField::with_value("   ").trimmed(), None);
    }
}
