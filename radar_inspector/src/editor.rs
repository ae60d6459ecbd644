use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a line editor is currently editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Title,
    Subtitle,
    Command,
}

impl EditTarget {
    pub fn label(self) -> &'static str {
        match self {
            EditTarget::Title => "Title",
            EditTarget::Subtitle => "Subtitle",
            EditTarget::Command => "Command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Pending,
    Commit(String),
    Cancel,
}

/// Single-line text input. Enter commits, Esc cancels and keeps the old value.
#[derive(Debug, Clone)]
pub struct LineEditor {
    target: EditTarget,
    buffer: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    pub fn new(target: EditTarget, initial: &str) -> Self {
        let buffer: Vec<char> = initial.chars().collect();
        let cursor = buffer.len();
        Self {
            target,
            buffer,
            cursor,
        }
    }

    pub fn target(&self) -> EditTarget {
        self.target
    }

    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditOutcome {
        match key.code {
            KeyCode::Enter => return EditOutcome::Commit(self.text()),
            KeyCode::Esc => return EditOutcome::Cancel,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(ch) => {
                self.buffer.insert(self.cursor, ch);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.buffer.remove(self.cursor);
            }
            KeyCode::Delete if self.cursor < self.buffer.len() => {
                self.buffer.remove(self.cursor);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            _ => {}
        }
        EditOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(editor: &mut LineEditor, code: KeyCode) -> EditOutcome {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(editor: &mut LineEditor, text: &str) {
        for ch in text.chars() {
            press(editor, KeyCode::Char(ch));
        }
    }

    #[test]
    fn typing_and_commit() {
        let mut editor = LineEditor::new(EditTarget::Title, "Radar");
        type_text(&mut editor, " Q3");
        assert_eq!(
            press(&mut editor, KeyCode::Enter),
            EditOutcome::Commit("Radar Q3".into())
        );
    }

    #[test]
    fn cursor_movement_and_deletion() {
        let mut editor = LineEditor::new(EditTarget::Command, "expot png");
        for _ in 0..5 {
            press(&mut editor, KeyCode::Left);
        }
        type_text(&mut editor, "r");
        assert_eq!(editor.text(), "export png");
        press(&mut editor, KeyCode::End);
        press(&mut editor, KeyCode::Backspace);
        press(&mut editor, KeyCode::Home);
        press(&mut editor, KeyCode::Delete);
        assert_eq!(editor.text(), "xport pn");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn escape_cancels() {
        let mut editor = LineEditor::new(EditTarget::Subtitle, "keep me");
        type_text(&mut editor, "!!!");
        assert_eq!(press(&mut editor, KeyCode::Esc), EditOutcome::Cancel);
        assert_eq!(editor.target(), EditTarget::Subtitle);
    }

    #[test]
    fn ctrl_u_clears_to_start() {
        let mut editor = LineEditor::new(EditTarget::Command, "import old.csv");
        editor.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(editor.text(), "");
    }
}
